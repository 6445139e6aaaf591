use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the port of `listen_addr`.
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Flat directory holding the gzip artifacts.
    pub files_dir: String,
    /// File metadata document; the one compiled into the binary is used
    /// when unset.
    pub metadata_path: Option<String>,
    pub structured_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            files_dir: "files".to_string(),
            metadata_path: None,
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

    /// Replaces the port of `listen_addr`.
    pub fn with_port(mut self, port: &str) -> Result<Self> {
        let port = validate_port(port)?;
        let mut addr: SocketAddr = self
            .listen_addr
            .parse()
            .map_err(|_| anyhow!("invalid listen address: {}", self.listen_addr))?;
        addr.set_port(port);
        self.listen_addr = addr.to_string();
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow!("invalid listen address: {}", self.listen_addr));
        }
        if self.files_dir.is_empty() {
            return Err(anyhow!("files_dir must not be empty"));
        }
        Ok(())
    }
}

// make sure the port is numeric and in the right range
pub fn validate_port(port: &str) -> Result<u16> {
    let p: i64 = port
        .parse()
        .map_err(|e| anyhow!("wrong port format; {}", e))?;
    if p <= 0 || p > u16::MAX as i64 {
        return Err(anyhow!("wrong port number; {}", p));
    }
    Ok(p as u16)
}
