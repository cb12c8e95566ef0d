/// Hardware channel a sensor is plugged into.
pub type Port = u8;

/// Hemisphere direction vector [x, y, z] used to resolve the magnetic field ambiguity.
pub type Hemisphere = [f64; 3];

/// 6DOF pose of a single sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position [x, y, z] in millimeters.
    pub position: [f64; 3],
    /// Unit quaternion [qx, qy, qz, qw].
    pub orientation: [f64; 4],
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: [0.0; 3],
        orientation: [0.0, 0.0, 0.0, 1.0],
    };

    pub fn new(position: [f64; 3], orientation: [f64; 4]) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::IDENTITY
    }
}

/// One sensor's entry in a hardware frame. Only meaningful for the instant it was read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub port: Port,
    pub pose: Pose,
}

/// Lifecycle state of a tracking device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    /// Not connected. Tools may be registered.
    #[default]
    Setup,
    /// Connected and tool set validated, not streaming.
    Ready,
    /// Streaming; the acquisition thread is running.
    Tracking,
}

bitflags::bitflags! {
    /// Capabilities of a tracking device line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const AUTO_DETECT         = 1 << 0;
        const HEMISPHERE_TRACKING = 1 << 1;
        const SINGLE_FRAME        = 1 << 2;
    }
}

/// Description of a tracking device type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTypeInfo {
    /// Product line, e.g. "Polhemus".
    pub line: String,
    /// Model name within the line.
    pub model: String,
    pub features: Features,
}

impl DeviceTypeInfo {
    pub fn polhemus_liberty() -> Self {
        Self {
            line: "Polhemus".into(),
            model: "Liberty".into(),
            features: Features::all(),
        }
    }

    pub fn polhemus_patriot() -> Self {
        Self {
            line: "Polhemus".into(),
            model: "Patriot".into(),
            features: Features::all(),
        }
    }

    /// In-process device without hemisphere support.
    pub fn simulated() -> Self {
        Self {
            line: "Simulated".into(),
            model: "Virtual tracker".into(),
            features: Features::AUTO_DETECT | Features::SINGLE_FRAME,
        }
    }

    pub fn supports(&self, features: Features) -> bool {
        self.features.contains(features)
    }
}

impl Default for DeviceTypeInfo {
    fn default() -> Self {
        DeviceTypeInfo::polhemus_liberty()
    }
}
