//! Simulator configuration, read from an optional YAML file.

use anyhow::{Context, Result};
use arcade_execution::{
    BalloonConfig, GameConfig, GameRegistry, LeverageConfig, MinesConfig, RocketConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    pub seed: u64,
    pub trials: u64,
    pub stake: u64,
    pub balloon: BalloonConfig,
    pub rocket: RocketConfig,
    pub mines: MinesConfig,
    pub leverage: LeverageConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            trials: 100_000,
            stake: 100,
            balloon: BalloonConfig::default(),
            rocket: RocketConfig::default(),
            mines: MinesConfig::default(),
            leverage: LeverageConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw).context("invalid simulator config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.trials > 0, "trials must be positive");
        self.balloon.validate()?;
        self.rocket.validate()?;
        self.mines.validate()?;
        self.leverage.validate()?;
        Ok(())
    }

    /// Registry carrying this config's engine settings.
    pub fn registry(&self) -> Result<GameRegistry> {
        let mut registry = GameRegistry::new();
        registry.set_config(GameConfig::Balloon(self.balloon.clone()))?;
        registry.set_config(GameConfig::Rocket(self.rocket.clone()))?;
        registry.set_config(GameConfig::Mines(self.mines.clone()))?;
        registry.set_config(GameConfig::TradeBoss(self.leverage.clone()))?;
        Ok(registry)
    }
}
