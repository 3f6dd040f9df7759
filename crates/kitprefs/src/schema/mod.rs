use serde::{Deserialize, Serialize};

pub mod v1;

pub use v1 as current;

pub const CURRENT_VERSION: &str = "v1";

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "version")]
pub enum AnyVersion {
    #[serde(rename = "v1")]
    V1(Box<v1::Preferences>),
}
impl AnyVersion {
    pub fn into_current(self) -> current::Preferences {
        match self {
            AnyVersion::V1(p) => *p,
            // for future versions, migrate past versions one step forward
        }
    }
}
