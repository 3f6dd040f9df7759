use serde::{Deserialize, Serialize};

/// Class of device, inferred from the viewport size.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewportPreferences {
    /// Viewports narrower than this (in logical pixels) are treated as mobile
    /// devices.
    pub mobile_breakpoint: f32,
}
impl Default for ViewportPreferences {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
        }
    }
}
impl ViewportPreferences {
    /// Returns the device class for a viewport of the given width.
    pub fn device_class(&self, viewport_width: f32) -> DeviceClass {
        if viewport_width < self.mobile_breakpoint {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}
