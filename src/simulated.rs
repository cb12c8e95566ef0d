//! In-process tracking hardware.
//!
//! `SimulatedTracker` implements [`TrackerHardware`] without any transport. Frames
//! are scripted through a [`SimulatedTrackerHandle`], which stays usable after the
//! tracker has been moved into a [`TrackingDevice`](crate::TrackingDevice):
//!
//! ```
//! use magtrack::{Pose, SimulatedTracker, TrackerConfig, TrackingDevice};
//!
//! let tracker = SimulatedTracker::new(vec![1]);
//! let handle = tracker.handle();
//! let mut device = TrackingDevice::new(tracker, TrackerConfig::default());
//! device.add_tool("Pointer", 1);
//! device.open_connection().unwrap();
//! handle.push_frame(vec![(1, Pose::IDENTITY)]);
//! ```

use crate::hardware::TrackerHardware;
use crate::types::{FrameSample, Hemisphere, Pose, Port};
use crate::{Result, TrackerError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_HEMISPHERE: Hemisphere = [1.0, 0.0, 0.0];

#[derive(Debug, Default)]
struct SimState {
    channels: Vec<Port>,
    connected: bool,
    streaming: bool,
    hemisphere_tracking: bool,
    hemispheres: HashMap<Port, Hemisphere>,
    script: VecDeque<Result<Vec<FrameSample>>>,
    latest: Vec<FrameSample>,
    connect_failure: Option<String>,
    start_failure: Option<String>,
    connects: usize,
    disconnects: usize,
    hemisphere_tracking_writes: usize,
}

impl SimState {
    fn require_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(TrackerError::Hardware("simulated device is not connected".into()))
        }
    }

    fn require_channel(&self, port: Port) -> Result<()> {
        self.require_connected()?;
        if self.channels.contains(&port) {
            Ok(())
        } else {
            Err(TrackerError::Hardware(format!("no sensor on port {}", port)))
        }
    }

    /// Advance the script by one entry, or repeat the latest frame.
    fn next_frame(&mut self) -> Result<Vec<FrameSample>> {
        match self.script.pop_front() {
            Some(Ok(frame)) => {
                self.latest = frame.clone();
                Ok(frame)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.latest.clone()),
        }
    }
}

/// Scriptable tracking hardware.
pub struct SimulatedTracker {
    inner: Arc<Mutex<SimState>>,
    frame_interval: Duration,
}

impl SimulatedTracker {
    /// A tracker with sensors on `channels`, reported in that order.
    pub fn new(channels: Vec<Port>) -> Self {
        let state = SimState {
            channels,
            ..SimState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
            frame_interval: Duration::from_millis(1),
        }
    }

    /// Time each `poll_latest_frame` call takes, emulating the device frame rate.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn handle(&self) -> SimulatedTrackerHandle {
        SimulatedTrackerHandle {
            inner: self.inner.clone(),
        }
    }
}

impl TrackerHardware for SimulatedTracker {
    fn connect(&mut self) -> Result<()> {
        let mut state = self.inner.lock();
        if let Some(reason) = state.connect_failure.take() {
            return Err(TrackerError::Connection(reason));
        }
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.inner.lock();
        state.connected = false;
        state.streaming = false;
        state.disconnects += 1;
        Ok(())
    }

    fn reported_channels(&self) -> Vec<Port> {
        let state = self.inner.lock();
        if state.connected {
            state.channels.clone()
        } else {
            Vec::new()
        }
    }

    fn start_streaming(&mut self) -> Result<()> {
        let mut state = self.inner.lock();
        state.require_connected()?;
        if let Some(reason) = state.start_failure.take() {
            return Err(TrackerError::Streaming(reason));
        }
        state.streaming = true;
        Ok(())
    }

    fn stop_streaming(&mut self) {
        self.inner.lock().streaming = false;
    }

    fn poll_latest_frame(&mut self) -> Result<Vec<FrameSample>> {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        let mut state = self.inner.lock();
        if !state.streaming {
            return Err(TrackerError::Hardware("simulated device is not streaming".into()));
        }
        state.next_frame()
    }

    fn poll_single_frame(&mut self) -> Result<Vec<FrameSample>> {
        let mut state = self.inner.lock();
        state.require_connected()?;
        if state.script.is_empty() && state.latest.is_empty() {
            return Ok(state
                .channels
                .iter()
                .map(|&port| FrameSample {
                    port,
                    pose: Pose::IDENTITY,
                })
                .collect());
        }
        state.next_frame()
    }

    fn set_hemisphere_tracking(&mut self, enabled: bool) -> Result<()> {
        let mut state = self.inner.lock();
        state.require_connected()?;
        state.hemisphere_tracking = enabled;
        state.hemisphere_tracking_writes += 1;
        Ok(())
    }

    fn toggle_hemisphere(&mut self, port: Option<Port>) -> Result<()> {
        let mut state = self.inner.lock();
        let ports = match port {
            Some(port) => {
                state.require_channel(port)?;
                vec![port]
            }
            None => {
                state.require_connected()?;
                state.channels.clone()
            }
        };
        for port in ports {
            let hemisphere = state.hemispheres.entry(port).or_insert(DEFAULT_HEMISPHERE);
            for c in hemisphere.iter_mut() {
                *c = -*c;
            }
        }
        Ok(())
    }

    fn set_hemisphere(&mut self, port: Port, hemisphere: Hemisphere) -> Result<()> {
        let mut state = self.inner.lock();
        state.require_channel(port)?;
        state.hemispheres.insert(port, hemisphere);
        Ok(())
    }

    fn get_hemisphere(&self, port: Port) -> Result<Hemisphere> {
        let state = self.inner.lock();
        state.require_channel(port)?;
        Ok(state
            .hemispheres
            .get(&port)
            .copied()
            .unwrap_or(DEFAULT_HEMISPHERE))
    }

    fn get_hemisphere_tracking(&self, port: Port) -> Result<bool> {
        let state = self.inner.lock();
        state.require_channel(port)?;
        Ok(state.hemisphere_tracking)
    }
}

/// Control side of a [`SimulatedTracker`].
#[derive(Clone)]
pub struct SimulatedTrackerHandle {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedTrackerHandle {
    /// Queue a frame built from `(port, pose)` pairs. Once the queue drains,
    /// polls keep returning the last frame.
    pub fn push_frame(&self, samples: Vec<(Port, Pose)>) {
        let frame = samples
            .into_iter()
            .map(|(port, pose)| FrameSample { port, pose })
            .collect();
        self.inner.lock().script.push_back(Ok(frame));
    }

    /// Queue a polling failure.
    pub fn push_error(&self, reason: &str) {
        self.inner
            .lock()
            .script
            .push_back(Err(TrackerError::Hardware(reason.to_string())));
    }

    /// Scripted entries not yet consumed by a poll.
    pub fn pending(&self) -> usize {
        self.inner.lock().script.len()
    }

    pub fn fail_next_connect(&self, reason: &str) {
        self.inner.lock().connect_failure = Some(reason.to_string());
    }

    pub fn fail_next_start(&self, reason: &str) {
        self.inner.lock().start_failure = Some(reason.to_string());
    }

    /// Replace the set of plugged-in sensors.
    pub fn set_channels(&self, channels: Vec<Port>) {
        self.inner.lock().channels = channels;
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.lock().streaming
    }

    pub fn hemisphere_tracking(&self) -> bool {
        self.inner.lock().hemisphere_tracking
    }

    /// Number of `set_hemisphere_tracking` calls that reached the device.
    pub fn hemisphere_tracking_writes(&self) -> usize {
        self.inner.lock().hemisphere_tracking_writes
    }

    pub fn connects(&self) -> usize {
        self.inner.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.inner.lock().disconnects
    }
}
