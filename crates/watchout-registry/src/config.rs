//! Registry configuration.

use std::net::SocketAddr;

use crate::error::{RegistryError, Result};

/// Where the registry listens.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// HTTP API address
    pub api_addr: SocketAddr,
    /// Broadcast hub address
    pub broadcast_addr: SocketAddr,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([127, 0, 0, 1], 1337)),
            broadcast_addr: SocketAddr::from(([127, 0, 0, 1], 1338)),
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            api_addr: addr(&var, "WATCHOUT_REGISTRY_ADDR", defaults.api_addr)?,
            broadcast_addr: addr(&var, "WATCHOUT_BROADCAST_ADDR", defaults.broadcast_addr)?,
        })
    }
}

fn addr<F>(var: &F, key: &str, default: SocketAddr) -> Result<SocketAddr>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| RegistryError::Config(format!("invalid {key} {value:?}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = RegistryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_addr.port(), 1337);
        assert_eq!(config.broadcast_addr.port(), 1338);

        let config = RegistryConfig::from_lookup(|key| {
            (key == "WATCHOUT_REGISTRY_ADDR").then(|| "0.0.0.0:8080".to_string())
        })
        .unwrap();
        assert_eq!(config.api_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());

        assert!(matches!(
            RegistryConfig::from_lookup(|_| Some("nope".into())),
            Err(RegistryError::Config(_))
        ));
    }
}
