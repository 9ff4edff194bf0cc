use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadSettings {
    /// Fields volunteered to an app contact when the thread is first opened.
    pub greeting_fields: Vec<String>,
    /// How many groups deep the control panel will open.
    pub max_menu_depth: usize,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ThreadSettings {
    fn default() -> Self {
        Self {
            greeting_fields: vec!["paymentAddress".into(), "language".into()],
            max_menu_depth: 4,
            log_filter: "sofa_thread=info,sofa_cli=info".into(),
        }
    }
}

impl ThreadSettings {
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
