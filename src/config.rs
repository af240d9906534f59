//! Rule thresholds, with defaults that can be overridden from a TOML file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// The cutoffs the rule evaluator compares summaries against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Attendance rate below this raises a low-attendance alert.
    #[serde(default = "default_min_attendance_rate")]
    pub min_attendance_rate: f64,

    /// Attendance rate below this escalates the alert to critical.
    #[serde(default = "default_critical_attendance_rate")]
    pub critical_attendance_rate: f64,

    /// Overall academic average below this raises a low-academic alert.
    #[serde(default = "default_min_overall_average")]
    pub min_overall_average: f64,

    /// Overall academic average below this escalates the alert to critical.
    #[serde(default = "default_critical_overall_average")]
    pub critical_overall_average: f64,

    /// Fewer logins than this over the window raises a low-engagement alert.
    #[serde(default = "default_min_logins")]
    pub min_logins: u32,

    /// Submission rate below this raises a missing-assignments alert.
    #[serde(default = "default_min_submission_rate")]
    pub min_submission_rate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_attendance_rate: default_min_attendance_rate(),
            critical_attendance_rate: default_critical_attendance_rate(),
            min_overall_average: default_min_overall_average(),
            critical_overall_average: default_critical_overall_average(),
            min_logins: default_min_logins(),
            min_submission_rate: default_min_submission_rate(),
        }
    }
}

fn default_min_attendance_rate() -> f64 {
    0.75
}

fn default_critical_attendance_rate() -> f64 {
    0.5
}

fn default_min_overall_average() -> f64 {
    70.0
}

fn default_critical_overall_average() -> f64 {
    50.0
}

fn default_min_logins() -> u32 {
    15
}

fn default_min_submission_rate() -> f64 {
    0.8
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
