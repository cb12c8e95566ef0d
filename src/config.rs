use crate::types::DeviceTypeInfo;

pub const ENV_HEMISPHERE_TRACKING: &str = "MAGTRACK_HEMISPHERE_TRACKING";
pub const ENV_DEVICE_TYPE: &str = "MAGTRACK_DEVICE_TYPE";

/// Settings passed to [`TrackingDevice::new`](crate::TrackingDevice::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub device_type: DeviceTypeInfo,
    /// Hemisphere tracking flag applied to the hardware on every connect.
    pub hemisphere_tracking: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceTypeInfo::polhemus_liberty(),
            hemisphere_tracking: true,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `MAGTRACK_DEVICE_TYPE` (liberty|patriot|simulated)
    /// and `MAGTRACK_HEMISPHERE_TRACKING`.
    pub fn from_env() -> Self {
        let defaults = TrackerConfig::default();
        let device_type = match read_env_string(ENV_DEVICE_TYPE, "liberty").as_str() {
            "liberty" => DeviceTypeInfo::polhemus_liberty(),
            "patriot" => DeviceTypeInfo::polhemus_patriot(),
            "simulated" => DeviceTypeInfo::simulated(),
            other => {
                log::warn!(
                    "Unknown {}='{}', using liberty (supported: liberty|patriot|simulated)",
                    ENV_DEVICE_TYPE,
                    other
                );
                DeviceTypeInfo::polhemus_liberty()
            }
        };

        Self {
            device_type,
            hemisphere_tracking: read_env_bool(
                ENV_HEMISPHERE_TRACKING,
                defaults.hemisphere_tracking,
            ),
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceTypeInfo) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_hemisphere_tracking(mut self, enabled: bool) -> Self {
        self.hemisphere_tracking = enabled;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn read_env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn read_env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
