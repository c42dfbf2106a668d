use crate::master::registry::LogicalWorker;
use crate::resource::ByteAmount;

/// Finds the biggest awaiting worker that fits the granted container.
///
/// The resource manager allocates in fixed memory and cpu increments, so a
/// granted container may be larger than any single request, and grants are
/// not correlated with requests. Memory is always a hard constraint. Core
/// fitting can be ignored for cluster configurations where cpu scheduling is
/// disabled and the granted core count is a default value.
pub(crate) fn find_largest_fitting_worker(
    granted_memory: ByteAmount,
    granted_cores: u32,
    candidates: Vec<LogicalWorker>,
    ignore_cpu: bool,
) -> Option<LogicalWorker> {
    let mut best: Option<LogicalWorker> = None;
    for candidate in candidates {
        if candidate.mem() > granted_memory {
            continue;
        }
        if !ignore_cpu && candidate.cores() > granted_cores {
            continue;
        }
        if let Some(current) = &best {
            // The current best is kept unless the candidate is at least as
            // large on both dimensions, so incomparable candidates resolve
            // in iteration order.
            if candidate.mem() < current.mem() || candidate.cores() < current.cores() {
                continue;
            }
        }
        best = Some(candidate);
    }
    best
}
