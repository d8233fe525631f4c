//! Configuration inspection

use anyhow::{Context, Result};
use clap::Subcommand;
use sgns_common::SgnsConfig;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration (file, environment and flags merged)
    Show,
    /// Print the built-in defaults
    Default,
}

impl ConfigAction {
    pub fn render(&self, config: &SgnsConfig) -> Result<String> {
        match self {
            Self::Show => config.to_toml().context("Failed to serialize configuration"),
            Self::Default => SgnsConfig::default_toml().context("Failed to serialize default configuration"),
        }
    }

    pub fn execute(&self, config: &SgnsConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }
}
