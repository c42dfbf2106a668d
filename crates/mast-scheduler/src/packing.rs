use std::collections::BTreeMap;

use crate::error::{SchedulerError, SchedulerResult};
use crate::id::{WorkerId, TOPOLOGY_MASTER_ID};
use crate::resource::{ByteAmount, Resource};

/// One container the topology needs, together with its required resources.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerPlan {
    id: WorkerId,
    resource: Resource,
}

impl ContainerPlan {
    pub fn new(id: impl Into<WorkerId>, resource: Resource) -> Self {
        Self {
            id: id.into(),
            resource,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// The declarative specification of every container the topology needs,
/// plus the component-ram distribution carried opaquely to the workers.
#[derive(Debug, Clone)]
pub struct PackingPlan {
    containers: BTreeMap<WorkerId, ContainerPlan>,
    component_ram_map: String,
}

impl PackingPlan {
    pub fn try_new(
        containers: Vec<ContainerPlan>,
        component_ram_map: impl Into<String>,
    ) -> SchedulerResult<Self> {
        let mut map = BTreeMap::new();
        for container in containers {
            if container.id() == TOPOLOGY_MASTER_ID {
                return Err(SchedulerError::InvalidArgument(format!(
                    "worker id {TOPOLOGY_MASTER_ID} is reserved for the topology master"
                )));
            }
            if container.resource().ram == ByteAmount::ZERO {
                return Err(SchedulerError::InvalidArgument(format!(
                    "worker {} requires a positive amount of ram",
                    container.id()
                )));
            }
            let cpu = container.resource().cpu;
            if cpu.is_nan() || cpu <= 0.0 {
                return Err(SchedulerError::InvalidArgument(format!(
                    "worker {} requires a positive cpu amount",
                    container.id()
                )));
            }
            let id = container.id();
            if map.insert(id, container).is_some() {
                return Err(SchedulerError::InvalidArgument(format!(
                    "duplicate container plan for worker {id}"
                )));
            }
        }
        Ok(Self {
            containers: map,
            component_ram_map: component_ram_map.into(),
        })
    }

    /// The planned containers in ascending worker id order.
    pub fn containers(&self) -> impl Iterator<Item = &ContainerPlan> {
        self.containers.values()
    }

    pub fn component_ram_map(&self) -> &str {
        &self.component_ram_map
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<WorkerId, ContainerPlan>, String) {
        (self.containers, self.component_ram_map)
    }
}
