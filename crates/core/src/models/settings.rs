use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Which funds the price clock perturbs on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationScope {
    /// Every fund in the catalog.
    All,
    /// Only the first `n` funds in catalog order.
    Prefix(usize),
}

impl Default for SimulationScope {
    fn default() -> Self {
        SimulationScope::Prefix(100)
    }
}

/// Linear scale mapping a percentage to a bar length: `|v| * factor + offset`, capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarScale {
    pub factor: f64,
    pub offset: f64,
}

impl Default for BarScale {
    fn default() -> Self {
        Self {
            factor: 2.0,
            offset: 5.0,
        }
    }
}

/// Settings for the AI commentary provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeSettings {
    pub base_url: String,
    pub model: String,
    /// Without a key no provider is registered and every request yields the fallback text.
    pub api_key: Option<String>,
    /// Enable web-grounded retrieval on the provider side.
    pub grounded_search: bool,
    /// Request timeout override. `None` keeps the HTTP client's own default.
    pub timeout_secs: Option<u64>,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key: None,
            grounded_search: false,
            timeout_secs: None,
        }
    }
}

/// Dashboard configuration. Every field has a default, so a partial JSON
/// document is a valid settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Milliseconds between two price clock ticks.
    pub tick_interval_ms: u64,

    /// Half-width of the uniform random delta added per tick, in percent points.
    pub drift_half_width: f64,

    pub simulation_scope: SimulationScope,

    /// Storage key holding the serialized favorites list.
    pub favorites_key: String,

    pub drawdown_bar: BarScale,

    pub narrative: NarrativeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10_000,
            drift_half_width: 2.0,
            simulation_scope: SimulationScope::default(),
            favorites_key: "fund_favorites".to_string(),
            drawdown_bar: BarScale::default(),
            narrative: NarrativeSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Fill the narrative API key from `GEMINI_API_KEY` (or `API_KEY`) when not already set.
    pub fn with_env_api_key(mut self) -> Self {
        if self.narrative.api_key.is_none() {
            self.narrative.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tick_interval_ms == 0 {
            return Err(CoreError::ValidationError(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        // The drift range spans 2 * half-width, which must stay finite as well.
        let span = 2.0 * self.drift_half_width;
        if !span.is_finite() || self.drift_half_width < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "drift_half_width must be a finite, non-negative number (got {})",
                self.drift_half_width
            )));
        }
        if self.favorites_key.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "favorites_key must not be empty".into(),
            ));
        }
        if !self.drawdown_bar.factor.is_finite() || !self.drawdown_bar.offset.is_finite() {
            return Err(CoreError::ValidationError(
                "drawdown_bar factor and offset must be finite".into(),
            ));
        }
        Ok(())
    }
}
