use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// The worker id reserved for the topology master, which runs inside the
/// application master's own container and never goes through the resource
/// manager.
pub const TOPOLOGY_MASTER_ID: WorkerId = WorkerId(0);

/// The identifier of a logical worker, unique within one topology.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WorkerId(u32);

impl From<u32> for WorkerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<WorkerId> for u32 {
    fn from(id: WorkerId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(WorkerId)
    }
}
