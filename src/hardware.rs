use crate::types::{FrameSample, Hemisphere, Port};
use crate::Result;

/// Vendor protocol boundary of a tracking device.
///
/// Implementations own the transport (USB, serial, ...) and translate frames
/// into [`FrameSample`]s. The [`TrackingDevice`](crate::TrackingDevice) owns
/// the implementation and shares it with its acquisition thread, so every
/// call is made with exclusive access.
///
/// Failures are reported as `Err`; implementations must not panic on I/O errors.
pub trait TrackerHardware: Send + 'static {
    /// Open the transport and bring the device into a queryable state.
    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    /// Channels with a sensor plugged in, in the order the device reports them in frames.
    fn reported_channels(&self) -> Vec<Port>;

    /// Switch the device into continuous output mode.
    fn start_streaming(&mut self) -> Result<()>;

    fn stop_streaming(&mut self);

    /// Most recent complete frame, or an empty frame if none arrived yet. Must not block
    /// for longer than one frame period.
    fn poll_latest_frame(&mut self) -> Result<Vec<FrameSample>>;

    /// Request and wait for a single frame. Used for discovery while not streaming.
    fn poll_single_frame(&mut self) -> Result<Vec<FrameSample>>;

    fn set_hemisphere_tracking(&mut self, enabled: bool) -> Result<()>;

    /// Flip the hemisphere of one channel, or of every channel for `None`.
    fn toggle_hemisphere(&mut self, port: Option<Port>) -> Result<()>;

    fn set_hemisphere(&mut self, port: Port, hemisphere: Hemisphere) -> Result<()>;

    fn get_hemisphere(&self, port: Port) -> Result<Hemisphere>;

    fn get_hemisphere_tracking(&self, port: Port) -> Result<bool>;
}
