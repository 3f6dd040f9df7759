use kitstore::Currency;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct StorePreferences {
    /// Currency used to display prices.
    pub currency: Currency,
}
