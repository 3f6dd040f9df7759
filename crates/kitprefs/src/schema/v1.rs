use serde::{Deserialize, Serialize};

pub use crate::{AnimationPreferences, StorePreferences, ViewportPreferences};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub animation: AnimationPreferences,
    pub viewport: ViewportPreferences,
    pub store: StorePreferences,
}
