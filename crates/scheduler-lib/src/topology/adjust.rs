//! Pending-resource adjustment of topology snapshots
//!
//! The zone a pending pod will land on is unknown until the node reports
//! back, so pending resources are subtracted from *every* zone carrying
//! them. That may under-report availability on the zones that will not
//! get the pod, but never over-reports it on any single zone: a rejected
//! node only delays scheduling, while an over-optimistic view ends in a
//! topology affinity error on the kubelet.

use super::{NodeResourceTopology, ResourceInfo};
use crate::error::{AdjustError, AdjustReason};
use crate::resources::{Quantity, ResourceCounter};

/// Decrement every zone's availability by the pending resources, in place
///
/// Resources a zone does not carry are skipped (devices often sit on a
/// single NUMA zone). A decrement that would go below zero clamps the
/// value to zero and is reported. Negative pending quantities are
/// reported and skipped, and an availability reported above capacity is
/// first clamped to capacity.
pub fn adjust_with_resource_counters(
    nrt: &mut NodeResourceTopology,
    pending: &ResourceCounter,
) -> Vec<AdjustError> {
    let mut errors = Vec::new();

    for zone in nrt.zones.iter_mut() {
        for info in zone.resources.iter_mut() {
            if !pending.contains(&info.name) {
                continue;
            }
            let requested = pending.get(&info.name);

            if requested.is_negative() {
                errors.push(adjust_error(
                    &nrt.name,
                    &zone.name,
                    info,
                    AdjustReason::NegativeRequest,
                    requested,
                ));
                continue;
            }

            if info.available > info.capacity {
                errors.push(adjust_error(
                    &nrt.name,
                    &zone.name,
                    info,
                    AdjustReason::AvailableAboveCapacity,
                    requested,
                ));
                info.available = info.capacity;
            }

            if info.available < requested {
                errors.push(adjust_error(
                    &nrt.name,
                    &zone.name,
                    info,
                    AdjustReason::Insufficient,
                    requested,
                ));
                info.available = Quantity::zero();
                continue;
            }

            info.available -= requested;
        }
    }

    errors
}

fn adjust_error(
    node: &str,
    zone: &str,
    info: &ResourceInfo,
    reason: AdjustReason,
    requested: Quantity,
) -> AdjustError {
    AdjustError {
        node: node.to_string(),
        zone: zone.to_string(),
        resource: info.name.clone(),
        reason,
        available: info.available,
        requested,
    }
}

/// Adjusted copy of `nrt`; the original is left as is
pub fn adjusted(
    nrt: &NodeResourceTopology,
    pending: &ResourceCounter,
) -> (NodeResourceTopology, Vec<AdjustError>) {
    let mut copy = nrt.clone();
    let errors = adjust_with_resource_counters(&mut copy, pending);
    (copy, errors)
}
