use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ContextBuilder;
use crate::error::Result;
use crate::indices::Formulation;

/// Analysis options that can be read from a YAML document.
///
/// ```yaml
/// formulation: dynamic
/// two_dimensional: false
/// gravity: [0.0, 0.0, -9.81]
/// angular_velocity: [0.0, 0.0, 1.0]
/// force_scaling: 1024.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisSettings {
    /// Required; there is no implicit formulation
    pub formulation: Formulation,
    #[serde(default)]
    pub two_dimensional: bool,
    #[serde(default)]
    pub gravity: [f64; 3],
    #[serde(default)]
    pub linear_velocity: [f64; 3],
    #[serde(default)]
    pub angular_velocity: [f64; 3],
    #[serde(default)]
    pub linear_acceleration: [f64; 3],
    #[serde(default)]
    pub angular_acceleration: [f64; 3],
    /// `None` selects the default scaling of the assembly
    #[serde(default)]
    pub force_scaling: Option<f64>,
}

impl AnalysisSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Self::from_yaml_str(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), ?settings, "loaded analysis settings");
        Ok(settings)
    }

    /// Copies the settings onto a context builder.
    pub fn apply<'a>(&self, builder: ContextBuilder<'a>) -> ContextBuilder<'a> {
        let [gx, gy, gz] = self.gravity;
        let builder = builder
            .gravity(gx, gy, gz)
            .linear_velocity(self.linear_velocity)
            .angular_velocity(self.angular_velocity)
            .linear_acceleration(self.linear_acceleration)
            .angular_acceleration(self.angular_acceleration)
            .two_dimensional(self.two_dimensional);
        match self.force_scaling {
            Some(s) => builder.force_scaling(s),
            None => builder,
        }
    }
}
