use crate::acquisition::{Acquisition, AcquisitionStats, Counters};
use crate::config::TrackerConfig;
use crate::hardware::TrackerHardware;
use crate::tool::{ToolHandle, ToolRegistry};
use crate::types::{DeviceState, DeviceTypeInfo, Features, Hemisphere, Port};
use crate::{Result, TrackerError};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

/// State shared between a [`TrackingDevice`] and its acquisition thread.
pub(crate) struct Shared<H> {
    pub(crate) hardware: Mutex<H>,
    state: Mutex<DeviceState>,
    pub(crate) counters: Counters,
}

impl<H: TrackerHardware> Shared<H> {
    pub(crate) fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    fn set_state(&self, state: DeviceState) {
        *self.state.lock() = state;
    }

    /// Called by the acquisition thread when polling fails: stop the hardware
    /// stream and fall back to `Ready`.
    pub(crate) fn abort_tracking(&self) {
        self.hardware.lock().stop_streaming();
        let mut state = self.state.lock();
        if *state == DeviceState::Tracking {
            *state = DeviceState::Ready;
        }
    }
}

/// Check that every tool port is reported by the hardware, each channel used once,
/// and that no channel is left without a tool.
fn validate_tool_ports(ports: &[Port], mut channels: Vec<Port>) -> Result<()> {
    if ports.len() != channels.len() {
        return Err(TrackerError::ToolCountMismatch {
            registered: ports.len(),
            reported: channels.len(),
        });
    }

    for &port in ports {
        match channels.iter().position(|&c| c == port) {
            Some(i) => {
                channels.swap_remove(i);
            }
            None => return Err(TrackerError::ToolNotConnected(port)),
        }
    }
    Ok(())
}

/// A tracking device: tool registry, lifecycle state machine and acquisition thread.
///
/// ```text
///   Setup --open_connection--> Ready --start_tracking--> Tracking
///     ^                          ^ <------stop_tracking------ |
///     +----close_connection------+----------------------------+
/// ```
///
/// Tools are registered before connecting; `open_connection` refuses a tool set
/// that does not match the hardware channels. While tracking, frame samples are
/// assigned to tools by registration order, so tools must be registered in the
/// order the hardware reports its channels.
pub struct TrackingDevice<H: TrackerHardware> {
    shared: Arc<Shared<H>>,
    registry: ToolRegistry,
    config: TrackerConfig,
    acquisition: Option<Acquisition>,
    fault_tx: Sender<TrackerError>,
    fault_rx: Receiver<TrackerError>,
}

impl<H: TrackerHardware> TrackingDevice<H> {
    pub fn new(hardware: H, config: TrackerConfig) -> Self {
        let (fault_tx, fault_rx) = crossbeam_channel::unbounded();
        Self {
            shared: Arc::new(Shared {
                hardware: Mutex::new(hardware),
                state: Mutex::new(DeviceState::Setup),
                counters: Counters::default(),
            }),
            registry: ToolRegistry::new(),
            config,
            acquisition: None,
            fault_tx,
            fault_rx,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.shared.state()
    }

    pub fn device_type(&self) -> &DeviceTypeInfo {
        &self.config.device_type
    }

    /// Register a tool on `port`. Returns the existing tool if the port is taken.
    ///
    /// Tools added after `open_connection` are not validated against the hardware
    /// and are not tracked until the next connection.
    pub fn add_tool(&mut self, name: &str, port: Port) -> ToolHandle {
        self.registry.add_tool(name, port)
    }

    pub fn tool_count(&self) -> usize {
        self.registry.tool_count()
    }

    pub fn get_tool(&self, index: usize) -> Option<ToolHandle> {
        self.registry.get_tool(index)
    }

    pub fn all_tools(&self) -> Vec<ToolHandle> {
        self.registry.all_tools()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Connect the hardware and validate the registered tools against its channels.
    ///
    /// On any failure the hardware is left disconnected and the state stays `Setup`.
    pub fn open_connection(&mut self) -> Result<()> {
        let state = self.state();
        if state != DeviceState::Setup {
            return Err(TrackerError::InvalidState {
                operation: "open connection",
                state,
            });
        }

        {
            let mut hardware = self.shared.hardware.lock();
            if let Err(e) = hardware.connect() {
                log::error!("Cannot connect {} device: {}", self.config.device_type.model, e);
                return Err(match e {
                    TrackerError::Connection(_) => e,
                    other => TrackerError::Connection(other.to_string()),
                });
            }

            if self.config.device_type.supports(Features::HEMISPHERE_TRACKING) {
                if let Err(e) = hardware.set_hemisphere_tracking(self.config.hemisphere_tracking) {
                    log::error!("Cannot apply hemisphere tracking setting: {}", e);
                    let _ = hardware.disconnect();
                    return Err(e);
                }
            }

            let channels = hardware.reported_channels();
            if let Err(e) = validate_tool_ports(&self.registry.ports(), channels) {
                log::warn!("Cannot connect device, tool set does not match hardware: {}", e);
                if let Err(de) = hardware.disconnect() {
                    log::warn!("Disconnect after refused connection failed: {}", de);
                }
                return Err(e);
            }
        }

        self.shared.set_state(DeviceState::Ready);
        log::info!(
            "Connected {} {} with {} tool(s)",
            self.config.device_type.line,
            self.config.device_type.model,
            self.registry.tool_count()
        );
        Ok(())
    }

    /// Stop tracking if needed and disconnect. A no-op in `Setup`.
    ///
    /// The state is `Setup` afterwards even if the hardware reports an error.
    pub fn close_connection(&mut self) -> Result<()> {
        if self.state() == DeviceState::Setup {
            return Ok(());
        }

        let stopped = self.stop_tracking();
        let disconnected = self.shared.hardware.lock().disconnect();
        self.shared.set_state(DeviceState::Setup);
        log::info!("Connection closed");

        stopped.and(disconnected)
    }

    /// Start streaming and spawn the acquisition thread.
    ///
    /// If the hardware refuses to stream the device stays `Ready`.
    pub fn start_tracking(&mut self) -> Result<()> {
        self.reap_finished();

        let state = self.state();
        if state != DeviceState::Ready {
            return Err(TrackerError::InvalidState {
                operation: "start tracking",
                state,
            });
        }

        if let Err(e) = self.shared.hardware.lock().start_streaming() {
            log::error!("Error while trying to start the device: {}", e);
            return Err(match e {
                TrackerError::Streaming(_) => e,
                other => TrackerError::Streaming(other.to_string()),
            });
        }

        // The loop only runs while the state is Tracking, so enter it before spawning.
        self.shared.set_state(DeviceState::Tracking);
        match Acquisition::start(
            self.shared.clone(),
            self.registry.all_tools(),
            self.fault_tx.clone(),
        ) {
            Ok(acquisition) => {
                self.acquisition = Some(acquisition);
                log::info!("Tracking started");
                Ok(())
            }
            Err(e) => {
                log::error!("{}", e);
                self.shared.hardware.lock().stop_streaming();
                self.shared.set_state(DeviceState::Ready);
                Err(e)
            }
        }
    }

    /// Signal the acquisition thread, wait for it and stop streaming.
    ///
    /// Returns once the thread has terminated. Outside `Tracking` this only
    /// reaps a thread that already stopped on an acquisition fault.
    pub fn stop_tracking(&mut self) -> Result<()> {
        let Some(acquisition) = self.acquisition.take() else {
            return Ok(());
        };

        let result = match acquisition.stop() {
            Ok(()) => {
                self.shared.hardware.lock().stop_streaming();
                log::info!("Tracking stopped");
                Ok(())
            }
            Err(TrackerError::AcquisitionPanicked) => {
                log::error!("Acquisition thread panicked");
                self.shared.hardware.lock().stop_streaming();
                Err(TrackerError::AcquisitionPanicked)
            }
            // Already published on the fault channel; streaming was stopped by the thread.
            Err(fault) => {
                log::debug!("Reaped acquisition thread that stopped on: {}", fault);
                Ok(())
            }
        };

        if self.state() == DeviceState::Tracking {
            self.shared.set_state(DeviceState::Ready);
        }
        result
    }

    fn reap_finished(&mut self) {
        if self.acquisition.as_ref().is_some_and(|a| a.is_finished()) {
            if let Err(e) = self.stop_tracking() {
                log::warn!("{}", e);
            }
        }
    }

    /// Discover the sensors plugged into the hardware.
    ///
    /// Connects, reads one frame and disconnects again. Returns a new registry
    /// with one tool named `Sensor-<port>` per sample; this device's own tools
    /// are left untouched.
    pub fn auto_detect_tools(&mut self) -> Result<ToolRegistry> {
        self.require_feature(Features::AUTO_DETECT, "tool auto-detection")?;
        let state = self.state();
        if state != DeviceState::Setup {
            return Err(TrackerError::InvalidState {
                operation: "auto-detect tools",
                state,
            });
        }

        let frame = {
            let mut hardware = self.shared.hardware.lock();
            hardware.connect().map_err(|e| match e {
                TrackerError::Connection(_) => e,
                other => TrackerError::Connection(other.to_string()),
            })?;

            let mut frame = Ok(Vec::new());
            if self.config.device_type.supports(Features::HEMISPHERE_TRACKING) {
                frame = hardware
                    .set_hemisphere_tracking(self.config.hemisphere_tracking)
                    .map(|_| Vec::new());
            }
            if frame.is_ok() {
                frame = hardware.poll_single_frame();
            }
            if let Err(e) = hardware.disconnect() {
                log::warn!("Disconnect after auto-detection failed: {}", e);
            }
            frame?
        };

        log::info!("Found {} tool(s)", frame.len());
        let mut detected = ToolRegistry::new();
        for sample in &frame {
            detected.add_tool(&format!("Sensor-{}", sample.port), sample.port);
        }
        Ok(detected)
    }

    /// Enable or disable hemisphere tracking. The hardware is only told when the
    /// value changes and a connection is open; otherwise it is applied on connect.
    pub fn set_hemisphere_tracking(&mut self, enabled: bool) -> Result<()> {
        self.require_feature(Features::HEMISPHERE_TRACKING, "hemisphere tracking")?;
        if self.config.hemisphere_tracking == enabled {
            return Ok(());
        }
        if self.state() != DeviceState::Setup {
            self.shared.hardware.lock().set_hemisphere_tracking(enabled)?;
        }
        self.config.hemisphere_tracking = enabled;
        Ok(())
    }

    /// Flip the hemisphere of one port, or of all ports for `None`.
    pub fn toggle_hemisphere(&mut self, port: Option<Port>) -> Result<()> {
        self.require_hemisphere_connection("toggle hemisphere")?;
        self.shared.hardware.lock().toggle_hemisphere(port)
    }

    pub fn set_hemisphere(&mut self, port: Port, hemisphere: Hemisphere) -> Result<()> {
        self.require_hemisphere_connection("set hemisphere")?;
        self.shared.hardware.lock().set_hemisphere(port, hemisphere)
    }

    pub fn get_hemisphere(&self, port: Port) -> Result<Hemisphere> {
        self.require_hemisphere_connection("get hemisphere")?;
        self.shared.hardware.lock().get_hemisphere(port)
    }

    /// Hemisphere tracking flag of one port, or the device-wide setting for `None`.
    pub fn get_hemisphere_tracking(&self, port: Option<Port>) -> Result<bool> {
        self.require_feature(Features::HEMISPHERE_TRACKING, "hemisphere tracking")?;
        match port {
            None => Ok(self.config.hemisphere_tracking),
            Some(port) => {
                self.require_hemisphere_connection("get hemisphere tracking")?;
                self.shared.hardware.lock().get_hemisphere_tracking(port)
            }
        }
    }

    /// Counters of the current or last tracking session.
    pub fn stats(&self) -> AcquisitionStats {
        self.shared.counters.snapshot()
    }

    /// Receiver of acquisition faults. Each fault is delivered to one receiver.
    pub fn fault_receiver(&self) -> Receiver<TrackerError> {
        self.fault_rx.clone()
    }

    /// Next pending acquisition fault, if any.
    pub fn take_fault(&self) -> Option<TrackerError> {
        self.fault_rx.try_recv().ok()
    }

    fn require_feature(&self, feature: Features, name: &'static str) -> Result<()> {
        if self.config.device_type.supports(feature) {
            Ok(())
        } else {
            Err(TrackerError::Unsupported(name))
        }
    }

    fn require_hemisphere_connection(&self, operation: &'static str) -> Result<()> {
        self.require_feature(Features::HEMISPHERE_TRACKING, "hemisphere tracking")?;
        let state = self.state();
        if state == DeviceState::Setup {
            return Err(TrackerError::InvalidState { operation, state });
        }
        Ok(())
    }
}

impl<H: TrackerHardware> Drop for TrackingDevice<H> {
    fn drop(&mut self) {
        if let Err(e) = self.close_connection() {
            log::warn!("Error while closing tracking device: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::simulated::{SimulatedTracker, SimulatedTrackerHandle};
    use crate::types::Pose;
    use std::time::{Duration, Instant};

    fn device_with(
        channels: Vec<Port>,
        tools: &[Port],
    ) -> (TrackingDevice<SimulatedTracker>, SimulatedTrackerHandle) {
        let tracker = SimulatedTracker::new(channels);
        let handle = tracker.handle();
        let mut device = TrackingDevice::new(tracker, TrackerConfig::default());
        for &port in tools {
            device.add_tool(&format!("Tool {}", port), port);
        }
        (device, handle)
    }

    fn wait_until(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    fn pose(x: f64) -> Pose {
        Pose::new([x, x, x], [0.0, 0.0, 0.0, 1.0])
    }

    #[test]
    fn test_validate_tool_ports_is_order_independent() {
        assert!(validate_tool_ports(&[2, 5], vec![5, 2]).is_ok());
        assert_eq!(
            validate_tool_ports(&[2, 5], vec![2, 5, 7]),
            Err(TrackerError::ToolCountMismatch {
                registered: 2,
                reported: 3
            })
        );
        assert_eq!(
            validate_tool_ports(&[1, 2], vec![1, 3]),
            Err(TrackerError::ToolNotConnected(2))
        );
        assert_eq!(
            validate_tool_ports(&[1, 2], vec![1, 1]),
            Err(TrackerError::ToolNotConnected(2))
        );
        assert!(validate_tool_ports(&[], vec![]).is_ok());
    }

    #[test]
    fn test_full_lifecycle_maps_samples_by_position() {
        let (mut device, handle) = device_with(vec![5, 2], &[2, 5]);

        device.open_connection().unwrap();
        assert_eq!(device.state(), DeviceState::Ready);

        device.start_tracking().unwrap();
        assert_eq!(device.state(), DeviceState::Tracking);
        assert!(handle.is_streaming());

        handle.push_frame(vec![(2, pose(2.0)), (5, pose(5.0))]);
        let tool0 = device.get_tool(0).unwrap();
        let tool1 = device.get_tool(1).unwrap();
        assert!(wait_until(|| tool0.is_valid() && tool1.is_valid()));
        assert_eq!(tool0.pose(), pose(2.0));
        assert_eq!(tool1.pose(), pose(5.0));

        device.stop_tracking().unwrap();
        assert_eq!(device.state(), DeviceState::Ready);
        assert!(!handle.is_streaming());

        device.close_connection().unwrap();
        assert_eq!(device.state(), DeviceState::Setup);
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_open_refused_on_channel_count_mismatch() {
        let (mut device, handle) = device_with(vec![1, 2, 3], &[1, 2]);
        let err = device.open_connection().unwrap_err();
        assert_eq!(
            err,
            TrackerError::ToolCountMismatch {
                registered: 2,
                reported: 3
            }
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(device.state(), DeviceState::Setup);
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_open_refused_on_missing_port() {
        let (mut device, _handle) = device_with(vec![1, 3], &[1, 2]);
        assert_eq!(
            device.open_connection(),
            Err(TrackerError::ToolNotConnected(2))
        );
        assert_eq!(device.state(), DeviceState::Setup);
    }

    #[test]
    fn test_connect_failure_is_recoverable() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        handle.fail_next_connect("no device on bus");
        let err = device.open_connection().unwrap_err();
        assert!(err.is_hardware());
        assert_eq!(device.state(), DeviceState::Setup);

        device.open_connection().unwrap();
        assert_eq!(device.state(), DeviceState::Ready);
    }

    #[test]
    fn test_lifecycle_operations_check_state() {
        let (mut device, _handle) = device_with(vec![1], &[1]);
        assert_eq!(
            device.start_tracking(),
            Err(TrackerError::InvalidState {
                operation: "start tracking",
                state: DeviceState::Setup
            })
        );

        device.open_connection().unwrap();
        assert_eq!(
            device.open_connection().unwrap_err().kind(),
            ErrorKind::State
        );
        assert!(device.stop_tracking().is_ok());
        assert_eq!(device.state(), DeviceState::Ready);
    }

    #[test]
    fn test_start_streaming_failure_stays_ready() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.open_connection().unwrap();
        handle.fail_next_start("field generator off");

        let err = device.start_tracking().unwrap_err();
        assert_eq!(err, TrackerError::Streaming("field generator off".into()));
        assert_eq!(device.state(), DeviceState::Ready);

        device.start_tracking().unwrap();
        assert_eq!(device.state(), DeviceState::Tracking);
    }

    #[test]
    fn test_stop_tracking_terminates_loop() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.open_connection().unwrap();
        device.start_tracking().unwrap();
        handle.push_frame(vec![(1, pose(1.0))]);
        assert!(wait_until(|| device.stats().cycles > 0));

        device.stop_tracking().unwrap();
        let cycles = device.stats().cycles;
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(device.stats().cycles, cycles);
        assert_eq!(device.state(), DeviceState::Ready);
    }

    #[test]
    fn test_desync_leaves_tools_unchanged() {
        let (mut device, handle) = device_with(vec![1, 2], &[1, 2]);
        device.open_connection().unwrap();
        device.start_tracking().unwrap();

        handle.push_frame(vec![(1, pose(1.0)), (2, pose(2.0))]);
        let tools = device.all_tools();
        assert!(wait_until(|| tools.iter().all(|t| t.is_valid())));

        handle.push_frame(vec![(1, pose(9.0))]);
        assert!(wait_until(|| device.stats().desyncs > 0));

        let before: Vec<_> = tools.iter().map(|t| t.snapshot()).collect();
        let desyncs = device.stats().desyncs;
        assert!(wait_until(|| device.stats().desyncs > desyncs));
        let after: Vec<_> = tools.iter().map(|t| t.snapshot()).collect();

        assert_eq!(before, after);
        assert_eq!(after[0].pose, pose(1.0));
        assert_eq!(after[1].pose, pose(2.0));
        assert!(after.iter().all(|s| s.valid));
        assert_eq!(device.state(), DeviceState::Tracking);
    }

    #[test]
    fn test_acquisition_fault_stops_tracking() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        let faults = device.fault_receiver();
        device.open_connection().unwrap();
        device.start_tracking().unwrap();

        handle.push_error("usb transfer failed");
        let fault = faults.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(fault.kind(), ErrorKind::Acquisition);
        assert!(fault.to_string().contains("usb transfer failed"));

        assert!(wait_until(|| device.state() == DeviceState::Ready));
        assert!(!handle.is_streaming());

        // Retry after the fault.
        device.start_tracking().unwrap();
        assert_eq!(device.state(), DeviceState::Tracking);
        device.stop_tracking().unwrap();
        assert!(device.take_fault().is_none());
    }

    #[test]
    fn test_snapshots_never_mix_cycles() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.open_connection().unwrap();
        device.start_tracking().unwrap();

        let tool = device.get_tool(0).unwrap();
        let reader = std::thread::spawn(move || {
            let mut last = tool.snapshot();
            for _ in 0..20_000 {
                let s = tool.snapshot();
                let [x, y, z] = s.pose.position;
                assert!(x == y && y == z, "torn pose {:?}", s.pose.position);
                assert!(s.cycle >= last.cycle);
                assert!(s.timestamp >= last.timestamp);
                if s.cycle == last.cycle {
                    assert_eq!(s, last);
                }
                last = s;
            }
        });

        for k in 0..200 {
            handle.push_frame(vec![(1, pose(k as f64))]);
            std::thread::sleep(Duration::from_micros(200));
        }
        reader.join().unwrap();
        device.stop_tracking().unwrap();
    }

    #[test]
    fn test_auto_detect_does_not_touch_registry() {
        let (mut device, handle) = device_with(vec![7], &[3]);
        let detected = device.auto_detect_tools().unwrap();

        assert_eq!(detected.tool_count(), 1);
        let tool = detected.get_tool(0).unwrap();
        assert_eq!(tool.port(), 7);
        assert_eq!(tool.name(), "Sensor-7");

        assert_eq!(device.tool_count(), 1);
        assert_eq!(device.get_tool(0).unwrap().port(), 3);
        assert_eq!(device.state(), DeviceState::Setup);
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_auto_detect_requires_feature() {
        let tracker = SimulatedTracker::new(vec![7]);
        let mut device_type = DeviceTypeInfo::simulated();
        device_type.features = Features::empty();
        let mut device = TrackingDevice::new(
            tracker,
            TrackerConfig::default().with_device_type(device_type),
        );
        assert_eq!(
            device.auto_detect_tools().unwrap_err(),
            TrackerError::Unsupported("tool auto-detection")
        );
    }

    #[test]
    fn test_hemisphere_flag_is_cached() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.set_hemisphere_tracking(false).unwrap();
        assert_eq!(handle.hemisphere_tracking_writes(), 0);

        device.open_connection().unwrap();
        assert_eq!(handle.hemisphere_tracking_writes(), 1);
        assert!(!handle.hemisphere_tracking());

        device.set_hemisphere_tracking(false).unwrap();
        assert_eq!(handle.hemisphere_tracking_writes(), 1);

        device.set_hemisphere_tracking(true).unwrap();
        assert_eq!(handle.hemisphere_tracking_writes(), 2);
        assert_eq!(device.get_hemisphere_tracking(None), Ok(true));
        assert_eq!(device.get_hemisphere_tracking(Some(1)), Ok(true));
    }

    #[test]
    fn test_hemisphere_pass_through() {
        let (mut device, _handle) = device_with(vec![1, 2], &[1, 2]);
        assert_eq!(
            device.toggle_hemisphere(Some(1)).unwrap_err().kind(),
            ErrorKind::State
        );

        device.open_connection().unwrap();
        device.set_hemisphere(2, [0.0, 0.0, 1.0]).unwrap();
        device.toggle_hemisphere(Some(1)).unwrap();
        assert_eq!(device.get_hemisphere(1), Ok([-1.0, 0.0, 0.0]));
        assert_eq!(device.get_hemisphere(2), Ok([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_hemisphere_unsupported_device() {
        let tracker = SimulatedTracker::new(vec![1]);
        let handle = tracker.handle();
        let mut device = TrackingDevice::new(
            tracker,
            TrackerConfig::default().with_device_type(DeviceTypeInfo::simulated()),
        );
        device.add_tool("A", 1);
        device.open_connection().unwrap();
        assert_eq!(handle.hemisphere_tracking_writes(), 0);
        assert_eq!(
            device.set_hemisphere_tracking(false),
            Err(TrackerError::Unsupported("hemisphere tracking"))
        );
        assert!(device.toggle_hemisphere(None).is_err());
    }

    #[test]
    fn test_close_while_tracking() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.open_connection().unwrap();
        device.start_tracking().unwrap();

        device.close_connection().unwrap();
        assert_eq!(device.state(), DeviceState::Setup);
        assert!(!handle.is_streaming());
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_close_in_setup_is_noop() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.close_connection().unwrap();
        assert_eq!(handle.disconnects(), 0);
    }

    #[test]
    fn test_drop_closes_connection() {
        let (mut device, handle) = device_with(vec![1], &[1]);
        device.open_connection().unwrap();
        device.start_tracking().unwrap();
        drop(device);
        assert!(!handle.is_connected());
        assert_eq!(handle.connects(), 1);
    }

    #[test]
    fn test_re_adding_port_keeps_count() {
        let (mut device, _handle) = device_with(vec![1], &[]);
        let first = device.add_tool("A", 1);
        let second = device.add_tool("B", 1);
        assert_eq!(device.tool_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
