//! A dedicated module for the application master options so that they stay
//! read-only once constructed.

use mast_common::config::AppConfig;

use crate::error::SchedulerError;

#[readonly::make]
pub struct MasterOptions {
    pub topology_name: String,
    pub topology_jar: String,
    pub topology_package_name: String,
    pub core_package_name: String,
    pub role: String,
    pub env: String,
    pub cluster: String,
    pub verbose: bool,
}

impl TryFrom<&AppConfig> for MasterOptions {
    type Error = SchedulerError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        if config.topology.name.is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "the topology name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            topology_name: config.topology.name.clone(),
            topology_jar: config.topology.jar.clone(),
            topology_package_name: config.topology.package_name.clone(),
            core_package_name: config.topology.core_package_name.clone(),
            role: config.topology.role.clone(),
            env: config.topology.env.clone(),
            cluster: config.topology.cluster.clone(),
            verbose: config.topology.verbose,
        })
    }
}
