use std::{net::SocketAddr, time::Duration};

use anyhow::Result;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "0.0.0.0:4001".to_string()
}

fn default_result_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// How long a stored result survives before the sweep evicts it.
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub structured_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: default_listen_addr(),
            result_ttl_secs: default_result_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            structured_logging: false,
        }
    }
}

impl ServerConfig {
    pub fn from_path(path: &str) -> Result<ServerConfig> {
        let config_str = std::fs::read_to_string(path)?;
        let config: ServerConfig = Figment::new().merge(Yaml::string(&config_str)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "invalid listen address: {}",
                self.listen_addr
            ));
        }
        if self.result_ttl_secs == 0 {
            return Err(anyhow::anyhow!("result_ttl_secs must be greater than 0"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "sweep_interval_secs must be greater than 0"
            ));
        }
        Ok(())
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        ServerConfig::default().validate().unwrap();
    }

    #[test]
    fn loads_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_addr: \"127.0.0.1:9000\"").unwrap();
        writeln!(file, "result_ttl_secs: 120").unwrap();

        let config = ServerConfig::from_path(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.result_ttl(), Duration::from_secs(120));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let config = ServerConfig {
            listen_addr: "not-an-addr".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = ServerConfig {
            result_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
