//! Configuration for the network sandbox.
//!
//! Supports YAML configuration files with sensible defaults. The defaults of
//! [`LimitsConfig`] are the global size limits every mutation and import is
//! checked against.

use crate::neural::Network;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of layers, input layer included
pub const MAX_LAYERS: usize = 20;
/// Maximum neurons in a single layer
pub const MAX_NEURONS_PER_LAYER: usize = 128;
/// Maximum number of weights across the whole network
pub const MAX_TOTAL_WEIGHTS: usize = 20_000;
/// Byte ceiling for untrusted import text, checked before parsing
pub const MAX_IMPORT_BYTES: usize = 5_000_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Size limits applied to structural edits and imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum layers (input layer included)
    pub max_layers: usize,
    /// Maximum neurons per layer
    pub max_neurons_per_layer: usize,
    /// Maximum total weights
    pub max_total_weights: usize,
    /// Maximum bytes accepted from import text or files
    pub max_import_bytes: usize,
}

/// Heatmap sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Samples per side of the square grid
    pub resolution: usize,
}

/// Solution reveal animation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Length of the reveal animation in milliseconds
    pub duration_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_layers: MAX_LAYERS,
            max_neurons_per_layer: MAX_NEURONS_PER_LAYER,
            max_total_weights: MAX_TOTAL_WEIGHTS,
            max_import_bytes: MAX_IMPORT_BYTES,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: crate::grid::GRID_RESOLUTION,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self { duration_ms: 900 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_layers < 2 {
            return Err("max_layers must be at least 2".to_string());
        }
        if self.limits.max_neurons_per_layer == 0 {
            return Err("max_neurons_per_layer must be > 0".to_string());
        }
        if self.limits.max_total_weights < crate::neural::INPUT_WIDTH {
            return Err("max_total_weights cannot hold the identity network".to_string());
        }
        if self.limits.max_import_bytes == 0 {
            return Err("max_import_bytes must be > 0".to_string());
        }
        if self.grid.resolution < 2 {
            return Err("grid resolution must be at least 2".to_string());
        }
        Ok(())
    }
}

/// A structural edit or import would exceed one of the global limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralLimitError {
    TooManyLayers { found: usize, max: usize },
    TooManyNeurons { layer: usize, found: usize, max: usize },
    TooManyWeights { found: usize, max: usize },
}

impl std::fmt::Display for StructuralLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyLayers { max, .. } => {
                write!(f, "Layer limit reached: at most {} layers are allowed", max)
            }
            Self::TooManyNeurons { layer, max, .. } => write!(
                f,
                "Neuron limit reached: layer {} can hold at most {} neurons",
                layer, max
            ),
            Self::TooManyWeights { found, max } => write!(
                f,
                "Weight limit reached: {} weights exceeds the maximum of {}",
                found, max
            ),
        }
    }
}

impl std::error::Error for StructuralLimitError {}

impl LimitsConfig {
    /// Check a candidate network against the layer, neuron and weight limits
    pub fn check(&self, net: &Network) -> Result<(), StructuralLimitError> {
        let layers = net.layer_count();
        if layers > self.max_layers {
            return Err(StructuralLimitError::TooManyLayers {
                found: layers,
                max: self.max_layers,
            });
        }

        for (i, layer) in net.layers.iter().enumerate() {
            if layer.neurons.len() > self.max_neurons_per_layer {
                return Err(StructuralLimitError::TooManyNeurons {
                    layer: i + 1,
                    found: layer.neurons.len(),
                    max: self.max_neurons_per_layer,
                });
            }
        }

        let weights = net.total_weights();
        if weights > self.max_total_weights {
            return Err(StructuralLimitError::TooManyWeights {
                found: weights,
                max: self.max_total_weights,
            });
        }

        Ok(())
    }
}
