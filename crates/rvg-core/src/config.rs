//! Process configuration loaded from JSON.

use crate::error::{Result, RvgError};
use crate::recording::{FixedMetrics, RecordingBackend};
use crate::units;
use serde::{Deserialize, Serialize};

/// Settings applied before scenes are built.
///
/// ```json
/// { "dpi": 90.0, "metrics": { "advance": 0.5 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RvgConfig {
    /// Resolution for physical length units. Can only be installed once.
    pub dpi: Option<f64>,
    /// Metrics model of the recording backend.
    pub metrics: Option<FixedMetrics>,
}

impl RvgConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RvgError::validation(format!("invalid config: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RvgError::validation(format!("invalid config: {e}")))
    }

    /// Install the DPI if one is configured.
    pub fn apply(&self) -> Result<()> {
        if let Some(dpi) = self.dpi {
            units::set_dpi(dpi)?;
        }
        Ok(())
    }

    pub fn recording_backend(&self) -> RecordingBackend {
        RecordingBackend::new().with_metrics(self.metrics.unwrap_or_default())
    }
}
