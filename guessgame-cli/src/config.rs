use guessgame_core::{GameConfig, GameError, Result};
use std::path::{Path, PathBuf};

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guessgame")
        .join("config.json")
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub rpc_url: Option<String>,
    pub proxy_url: Option<String>,
    pub contract: Option<String>,
    pub chain_id: Option<u64>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut GameConfig) {
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(url) = &self.proxy_url {
            config.proxy_url = url.clone();
        }
        if let Some(contract) = &self.contract {
            config.contract_address = Some(contract.clone());
        }
        if let Some(chain_id) = self.chain_id {
            config.chain.chain_id = chain_id;
        }
    }
}

/// Config file, then environment, then flags.
pub fn load_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<GameConfig> {
    let _ = dotenvy::dotenv();

    let mut config = read_file(path)?;
    config.apply_env()?;
    overrides.apply(&mut config);
    config.validate()?;

    tracing::debug!("Using config: {:?}", config);
    Ok(config)
}

fn read_file(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) if !path.exists() => Err(GameError::config(format!(
            "Config file {} does not exist",
            path.display()
        ))),
        Some(path) => GameConfig::from_file(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                GameConfig::from_file(&path)
            } else {
                Ok(GameConfig::default())
            }
        }
    }
}
