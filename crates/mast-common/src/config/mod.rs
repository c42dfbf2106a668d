use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub topology: TopologyConfig,
}

/// Identity and packaging information for the topology managed by the
/// application master. The values are opaque to the scheduler core and are
/// forwarded to every executor task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub name: String,
    pub jar: String,
    pub package_name: String,
    pub core_package_name: String,
    pub role: String,
    pub env: String,
    pub cluster: String,
    pub verbose: bool,
}

impl AppConfig {
    /// Loads the application configuration from the embedded defaults,
    /// overridden by `MAST_`-prefixed environment variables
    /// (e.g. `MAST_TOPOLOGY__NAME` maps to `topology.name`).
    pub fn load() -> CommonResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .merge(Env::prefixed("MAST_").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}
