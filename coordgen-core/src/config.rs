use serde::{Deserialize, Serialize};

use crate::error::{CoordGenError, Result};

/// Bornes [min, max] en millisecondes ou en pixels, tirées par le script consommateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(CoordGenError::Config(format!(
                "{name} : min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorLimits {
    /// Plafond de tentatives = attempt_factor × nombre demandé.
    pub attempt_factor: usize,
    /// Taille maximale projetée de la stratégie exhaustive.
    pub max_exhaustive: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            attempt_factor: 50,
            max_exhaustive: 100_000,
        }
    }
}

impl GeneratorLimits {
    pub fn validate(&self) -> Result<()> {
        if self.attempt_factor == 0 {
            return Err(CoordGenError::Config(
                "attempt_factor doit être au moins 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub enter_x: i64,
    pub enter_y: i64,
    pub tap_delay: Range,
    pub post_numbers_delay: Range,
    pub jitter_x: i64,
    pub jitter_y: i64,
    pub final_delay: Range,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            enter_x: 607,
            enter_y: 2016,
            tap_delay: Range::new(500, 900),
            post_numbers_delay: Range::new(350, 656),
            jitter_x: 5,
            jitter_y: 3,
            final_delay: Range::new(5950, 5999),
        }
    }
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<()> {
        self.tap_delay.validate("tap_delay")?;
        self.post_numbers_delay.validate("post_numbers_delay")?;
        self.final_delay.validate("final_delay")?;
        if self.jitter_x < 0 || self.jitter_y < 0 {
            return Err(CoordGenError::Config(format!(
                "jitter négatif : ({}, {})",
                self.jitter_x, self.jitter_y
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorLimits,
    pub emitter: EmitterConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.generator.validate()?;
        config.emitter.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
