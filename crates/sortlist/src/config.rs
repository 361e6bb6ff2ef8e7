#![forbid(unsafe_code)]

//! List configuration as data.
//!
//! [`ListConfig`] collects every tunable of the list in one struct that is
//! validated once, when the list is built. With the `config-file` feature it
//! can also be loaded from TOML or JSON:
//!
//! ```toml
//! # sortlist.toml
//! axis = "horizontal"
//! activation_delay_ms = 350
//!
//! [autoscroll]
//! area = 80.0
//! interval_ms = 50
//! ```
//!
//! ```rust,ignore
//! let config = ListConfig::from_toml_file("sortlist.toml")?;
//! let config = ListConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `ListConfig::default()` is a vertical list with sorting and scrolling
//! enabled, a 200ms activation delay, and a 60px autoscroll band ticking
//! every 100ms with 30px steps that grow to 60px after the third tick.

#[cfg(feature = "config-file")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use sortlist_core::geometry::Axis;
use sortlist_core::gesture::RowGestureConfig;

/// Upper bound accepted for the activation delay.
pub const MAX_ACTIVATION_DELAY_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Top-level ListConfig
// ---------------------------------------------------------------------------

/// Configuration of a [`SortableList`](crate::list::SortableList).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct ListConfig {
    /// Axis rows are stacked and dragged along.
    pub axis: Axis,
    /// Rows can be dragged at all.
    pub sorting_enabled: bool,
    /// The viewport can scroll (user scroll and autoscroll).
    pub scroll_enabled: bool,
    /// Rows activate only through an explicit `activate_row` call.
    pub manual_activation: bool,
    /// Press duration before a row becomes draggable.
    pub activation_delay_ms: u64,
    /// Wait for a header measurement before the first layout.
    pub has_header: bool,
    /// Wait for a footer measurement before the first layout.
    pub has_footer: bool,
    /// Edge autoscroll parameters.
    pub autoscroll: AutoscrollConfig,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Vertical,
            sorting_enabled: true,
            scroll_enabled: true,
            manual_activation: false,
            activation_delay_ms: 200,
            has_header: false,
            has_footer: false,
            autoscroll: AutoscrollConfig::default(),
        }
    }
}

impl ListConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ListConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ListConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ListConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ListConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ListConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ListConfigError::Json)?
            .validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ListConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ListConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.activation_delay_ms > MAX_ACTIVATION_DELAY_MS {
            errors.push(format!(
                "activation_delay_ms must be <= {MAX_ACTIVATION_DELAY_MS}, got {}",
                self.activation_delay_ms
            ));
        }

        let auto = &self.autoscroll;
        if !auto.area.is_finite() || auto.area < 0.0 {
            errors.push(format!("autoscroll.area must be >= 0, got {}", auto.area));
        }
        if auto.interval_ms == 0 {
            errors.push("autoscroll.interval_ms must be > 0".into());
        }
        if !auto.step.is_finite() || auto.step <= 0.0 {
            errors.push(format!("autoscroll.step must be > 0, got {}", auto.step));
        }
        if !auto.fast_step.is_finite() || auto.fast_step < auto.step {
            errors.push(format!(
                "autoscroll.fast_step must be >= autoscroll.step ({}), got {}",
                auto.step, auto.fast_step
            ));
        }

        errors
    }

    /// Return `self` if valid, or every validation error.
    pub fn validated(self) -> Result<Self, ListConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ListConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }

    /// Build the per-row gesture settings from this config.
    #[must_use]
    pub fn to_gesture_config(&self) -> RowGestureConfig {
        RowGestureConfig {
            activation_delay: self.activation_delay(),
            axis: self.axis,
            manual_activation: self.manual_activation,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Edge autoscroll parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct AutoscrollConfig {
    /// Width of the band at each viewport edge that triggers scrolling.
    pub area: f32,
    /// Period between scroll steps.
    pub interval_ms: u64,
    /// Step size for the first ticks.
    pub step: f32,
    /// Step size once the tick counter passes `accelerate_after`.
    pub fast_step: f32,
    /// Number of ticks run at `step` before switching to `fast_step`.
    pub accelerate_after: u32,
}

impl Default for AutoscrollConfig {
    fn default() -> Self {
        Self {
            area: 60.0,
            interval_ms: 100,
            step: 30.0,
            fast_step: 60.0,
            accelerate_after: 3,
        }
    }
}

impl AutoscrollConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Step size for the zero-based tick `index`.
    #[must_use]
    pub fn step_for(&self, index: u32) -> f32 {
        if index > self.accelerate_after {
            self.fast_step
        } else {
            self.step
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when building or loading a list configuration.
#[derive(Debug)]
pub enum ListConfigError {
    /// I/O error reading a file.
    #[cfg(feature = "config-file")]
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ListConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "config-file")]
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ListConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "config-file")]
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
