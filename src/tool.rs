use crate::types::{FrameSample, Pose, Port};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a registered tool.
pub type ToolHandle = Arc<Tool>;

/// Everything the acquisition loop knows about a tool after one cycle.
///
/// Snapshots are replaced as a whole, so the fields always belong to the same cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolState {
    pub pose: Pose,
    /// Whether a frame sample has been committed for this tool.
    pub valid: bool,
    /// Time since tracking started, on the monotonic tracking clock.
    pub timestamp: Duration,
    /// Acquisition cycle that committed this snapshot. 0 before the first commit.
    pub cycle: u64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            valid: false,
            timestamp: Duration::ZERO,
            cycle: 0,
        }
    }
}

/// A logical tool bound to a hardware port.
#[derive(Debug)]
pub struct Tool {
    name: String,
    port: Port,
    state: RwLock<ToolState>,
}

impl Tool {
    fn new(name: &str, port: Port) -> Self {
        Self {
            name: name.to_string(),
            port,
            state: RwLock::new(ToolState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> Port {
        self.port
    }

    /// Latest committed state.
    pub fn snapshot(&self) -> ToolState {
        *self.state.read()
    }

    pub fn pose(&self) -> Pose {
        self.snapshot().pose
    }

    pub fn is_valid(&self) -> bool {
        self.snapshot().valid
    }

    pub(crate) fn commit(&self, sample: &FrameSample, timestamp: Duration, cycle: u64) {
        *self.state.write() = ToolState {
            pose: sample.pose,
            valid: true,
            timestamp,
            cycle,
        };
    }
}

/// Ordered set of tools, unique by port.
///
/// Order is registration order and is the index used by [`ToolRegistry::get_tool`]
/// and by the acquisition loop to map frame samples to tools.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolHandle>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool on `port`. If the port is taken, the existing tool is returned
    /// and nothing is added.
    pub fn add_tool(&mut self, name: &str, port: Port) -> ToolHandle {
        if let Some(existing) = self.find_by_port(port) {
            log::debug!(
                "Port {} already used by tool '{}', returning existing tool",
                port,
                existing.name()
            );
            return existing;
        }

        let tool = Arc::new(Tool::new(name, port));
        self.tools.push(tool.clone());
        tool
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get_tool(&self, index: usize) -> Option<ToolHandle> {
        self.tools.get(index).cloned()
    }

    pub fn find_by_port(&self, port: Port) -> Option<ToolHandle> {
        self.tools.iter().find(|t| t.port() == port).cloned()
    }

    /// Snapshot of the current tool list. Later registrations do not show up in it.
    pub fn all_tools(&self) -> Vec<ToolHandle> {
        self.tools.clone()
    }

    /// Ports in registration order.
    pub fn ports(&self) -> Vec<Port> {
        self.tools.iter().map(|t| t.port()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolHandle> {
        self.tools.iter()
    }
}
