//! Pipeline configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::ToolStyle;
use crate::filters::douglas_peucker::DEFAULT_EPSILON;
use crate::filters::savitzky_golay::{DEFAULT_STRENGTH, DEFAULT_WINDOW};
use crate::filters::SimplifyMethod;
use crate::smoothers::antigrain::DEFAULT_SMOOTH_FACTOR;
use crate::smoothers::{AntigrainSmoother, LineSmoother, Smoother};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub simplify: SimplifyConfig,
    pub smoothing: SmoothingConfig,
    pub smoother: SmootherKind,
    /// Style of curves drawn before the first tool event
    pub style: ToolStyle,
}

/// Douglas–Peucker stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    pub enabled: bool,
    pub epsilon: f64,
    pub method: SimplifyMethod,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            epsilon: DEFAULT_EPSILON,
            method: SimplifyMethod::default(),
        }
    }
}

/// Savitzky–Golay stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// Half width, clamped to `2..=12`
    pub window: usize,
    /// Blend factor, clamped to `0..=1`
    pub strength: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: DEFAULT_WINDOW,
            strength: DEFAULT_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmootherKind {
    Line,
    Antigrain {
        #[serde(default = "default_smooth_factor")]
        smooth_factor: f64,
    },
}

fn default_smooth_factor() -> f64 {
    DEFAULT_SMOOTH_FACTOR
}

impl Default for SmootherKind {
    fn default() -> Self {
        SmootherKind::Antigrain {
            smooth_factor: DEFAULT_SMOOTH_FACTOR,
        }
    }
}

impl SmootherKind {
    pub fn build(&self) -> Box<dyn Smoother> {
        match self {
            SmootherKind::Line => Box::new(LineSmoother),
            SmootherKind::Antigrain { smooth_factor } => {
                Box::new(AntigrainSmoother::new(*smooth_factor))
            }
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no stage can work with. Out-of-range window and strength
    /// values are clamped by the smoothing stage instead.
    pub fn validate(&self) -> Result<()> {
        let epsilon = self.simplify.epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(invalid(format!("simplify epsilon must be finite and >= 0, got {epsilon}")));
        }
        if !self.smoothing.strength.is_finite() {
            return Err(invalid("smoothing strength must be finite".to_string()));
        }
        if let SmootherKind::Antigrain { smooth_factor } = self.smoother {
            if !smooth_factor.is_finite() || smooth_factor < 0.0 {
                return Err(invalid(format!(
                    "smooth factor must be finite and >= 0, got {smooth_factor}"
                )));
            }
        }
        let width = self.style.width;
        if !width.is_finite() || width <= 0.0 {
            return Err(invalid(format!("style width must be positive, got {width}")));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.simplify.enabled);
        assert_eq!(config.simplify.epsilon, 2.0);
        assert_eq!(config.smoothing.window, 2);
        assert_eq!(config.smoother, SmootherKind::Antigrain { smooth_factor: 0.7 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "simplify": { "enabled": false },
            "smoothing": { "window": 5 },
            "smoother": { "kind": "line" },
            "style": { "width": 3.0, "color": null }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(!config.simplify.enabled);
        assert_eq!(config.simplify.method, SimplifyMethod::Iterative);
        assert_eq!(config.smoothing.window, 5);
        assert_eq!(config.smoothing.strength, 1.0);
        assert_eq!(config.smoother, SmootherKind::Line);
        assert!(config.style.is_eraser());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.simplify.epsilon = -1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let mut config = PipelineConfig::default();
        config.style.width = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let mut config = PipelineConfig::default();
        config.smoother = SmootherKind::Antigrain {
            smooth_factor: f64::NAN,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("ink_stream_config_{}.json", std::process::id()));
        let mut config = PipelineConfig::default();
        config.smoothing.enabled = false;
        config.to_file(&path).unwrap();
        let loaded = PipelineConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
