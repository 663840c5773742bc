//! Last-used profile pointer (best-effort, never fatal)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_config: Option<String>,
}

impl Preferences {
    pub fn new(last_config: impl Into<String>) -> Self {
        Self {
            last_config: Some(last_config.into()),
        }
    }
}
