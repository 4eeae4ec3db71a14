//! Configuration types for detection and calibration.
//!
//! Loads settings from config.json at startup. Provides default correlation
//! thresholds, the threshold sweep range, circle-fallback parameters, and
//! the worker count. All values are empirically tuned for the Madani page
//! scans and can be overridden without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::page::PageClass;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<PipelineConfig> = OnceLock::new();

/// Inclusive, ascending range of correlation thresholds to sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSweep {
    pub start: f32,
    pub end: f32,
    pub step: f32,
}

impl Default for ThresholdSweep {
    fn default() -> Self {
        Self {
            start: 0.200,
            end: 0.495,
            step: 0.005,
        }
    }
}

impl ThresholdSweep {
    /// Thresholds in sweep order. Computed by index to avoid float drift.
    pub fn thresholds(&self) -> Vec<f32> {
        if self.step <= 0.0 || self.end < self.start {
            return Vec::new();
        }
        let count = ((self.end - self.start) / self.step).round() as usize + 1;
        (0..count)
            .map(|i| self.start + i as f32 * self.step)
            .collect()
    }
}

/// Circle-fallback detector parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    /// Sensitivities tried in order (accumulator vote threshold).
    pub sensitivities: Vec<u32>,
    /// Smallest accepted glyph radius (pixels)
    pub min_radius: u32,
    /// Largest accepted glyph radius (pixels)
    pub max_radius: u32,
    /// Minimum distance between accepted circle centers (pixels)
    pub min_distance: f32,
    /// Canny high threshold; low threshold is half of it
    pub edge_threshold: f32,
    /// Circles with center y at or above this are page ornamentation
    pub top_margin: u32,
    /// Circles with center y within this distance of the bottom are page ornamentation
    pub bottom_margin: u32,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            sensitivities: vec![30, 28, 25],
            min_radius: 12,
            max_radius: 22,
            min_distance: 15.0,
            edge_threshold: 50.0,
            top_margin: 40,
            bottom_margin: 50,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Default correlation threshold for pages 1-2
    #[serde(default = "default_first_class_threshold")]
    pub first_class_threshold: f32,
    /// Default correlation threshold for pages 3-604
    #[serde(default = "default_standard_class_threshold")]
    pub standard_class_threshold: f32,
    /// Thresholds tried when the default misses the expected count
    #[serde(default)]
    pub sweep: ThresholdSweep,
    /// Circle fallback parameters
    #[serde(default)]
    pub circles: CircleConfig,
    /// Number of page worker threads (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,
}

fn default_first_class_threshold() -> f32 {
    0.4
}

fn default_standard_class_threshold() -> f32 {
    0.2685
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            first_class_threshold: default_first_class_threshold(),
            standard_class_threshold: default_standard_class_threshold(),
            sweep: ThresholdSweep::default(),
            circles: CircleConfig::default(),
            workers: 0,
        }
    }
}

impl PipelineConfig {
    /// Default correlation threshold for a page class.
    pub fn default_threshold(&self, class: PageClass) -> f32 {
        match class {
            PageClass::First => self.first_class_threshold,
            PageClass::Standard => self.standard_class_threshold,
        }
    }

    /// Resolved worker count, never zero.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Loads configuration from `path` or returns defaults.
pub fn load_config(path: &Path) -> PipelineConfig {
    crate::log(&format!("Looking for config at: {}", path.display()));

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    PipelineConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(path: &Path) {
    let _ = CONFIG.set(load_config(path));
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static PipelineConfig {
    CONFIG.get_or_init(PipelineConfig::default)
}
