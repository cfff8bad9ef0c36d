//! Per-resource quantity accumulator

use super::Quantity;
use crate::error::ResourceError;
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Mapping from resource name to accumulated quantity
///
/// A resource missing from the map counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCounter(BTreeMap<String, Quantity>);

impl ResourceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the resource limits of every container in the pod
    ///
    /// Requests are ignored, and so are init containers. Limits that do not
    /// parse or are negative are skipped.
    pub fn from_pod(pod: &Pod) -> Self {
        let mut counter = Self::new();
        let Some(spec) = pod.spec.as_ref() else {
            return counter;
        };

        for container in &spec.containers {
            let Some(limits) = container
                .resources
                .as_ref()
                .and_then(|res| res.limits.as_ref())
            else {
                continue;
            };

            for (name, raw) in limits {
                match Quantity::try_from(raw) {
                    Ok(qty) if qty.is_negative() => warn!(
                        pod = ?pod.metadata.name,
                        container = %container.name,
                        resource = %name,
                        limit = %qty,
                        "Skipping negative resource limit"
                    ),
                    Ok(qty) => counter.add_quantity(name, qty),
                    Err(e) => warn!(
                        pod = ?pod.metadata.name,
                        container = %container.name,
                        resource = %name,
                        error = %e,
                        "Skipping unparseable resource limit"
                    ),
                }
            }
        }

        counter
    }

    /// Quantity tracked for `name`, zero if absent
    pub fn get(&self, name: &str) -> Quantity {
        self.0.get(name).copied().unwrap_or_default()
    }

    /// Add `qty` to a single resource
    pub fn add_quantity(&mut self, name: &str, qty: Quantity) {
        *self.0.entry(name.to_string()).or_default() += qty;
    }

    /// Add all the resources tracked by `other`, in place
    pub fn add(&mut self, other: &ResourceCounter) {
        for (name, qty) in &other.0 {
            self.add_quantity(name, *qty);
        }
    }

    /// Subtract all the resources tracked by `other`, in place
    ///
    /// A resource that is missing here, or holds less than `other` asks for,
    /// is left untouched and reported; the remaining resources are still
    /// subtracted. A negative request is reported and skipped. No value
    /// ever goes negative.
    pub fn sub_with_checks(&mut self, other: &ResourceCounter) -> Vec<ResourceError> {
        let mut errors = Vec::new();

        for (name, requested) in &other.0 {
            if requested.is_negative() {
                errors.push(ResourceError::NegativeRequest {
                    resource: name.clone(),
                    requested: *requested,
                });
                continue;
            }

            let Some(current) = self.0.get_mut(name) else {
                errors.push(ResourceError::MissingBaseResource {
                    resource: name.clone(),
                    requested: *requested,
                });
                continue;
            };

            if *current < *requested {
                errors.push(ResourceError::SubtractionUnderflow {
                    resource: name.clone(),
                    requested: *requested,
                    available: *current,
                });
                continue;
            }

            *current -= *requested;
        }

        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when no resource holds a non-zero quantity
    pub fn is_zero(&self) -> bool {
        self.0.values().all(Quantity::is_zero)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.0.iter().map(|(name, qty)| (name.as_str(), qty))
    }
}

impl FromIterator<(String, Quantity)> for ResourceCounter {
    fn from_iter<I: IntoIterator<Item = (String, Quantity)>>(iter: I) -> Self {
        let mut counter = Self::new();
        for (name, qty) in iter {
            counter.add_quantity(&name, qty);
        }
        counter
    }
}

/// Renders as `cpu=16 memory=4Gi` for log fields
impl fmt::Display for ResourceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, qty) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, qty)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_pod, GPU_NAME, NIC_NAME};

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn two_container_pod() -> Pod {
        make_pod(
            "pod-a",
            &[
                &[("cpu", "4"), ("memory", "2Gi"), (NIC_NAME, "2")],
                &[("cpu", "1"), ("memory", "1Gi"), (GPU_NAME, "1")],
            ],
        )
    }

    #[test]
    fn test_from_pod_with_empty_value() {
        let rc = ResourceCounter::from_pod(&Pod::default());
        assert!(rc.is_empty());

        let pod = make_pod("empty", &[]);
        assert!(ResourceCounter::from_pod(&pod).is_empty());
    }

    #[test]
    fn test_from_pod_with_multiple_containers() {
        let rc = ResourceCounter::from_pod(&two_container_pod());

        assert_eq!(rc.len(), 4);
        assert_eq!(rc.get("cpu"), q("5"));
        assert_eq!(rc.get("memory"), q("3Gi"));
        assert_eq!(rc.get(GPU_NAME), q("1"));
        assert_eq!(rc.get(NIC_NAME), q("2"));
    }

    #[test]
    fn test_from_pod_ignores_requests() {
        let mut pod = make_pod("pod-r", &[&[("cpu", "2")]]);
        let resources = pod.spec.as_mut().unwrap().containers[0]
            .resources
            .as_mut()
            .unwrap();
        resources.requests = Some(
            [("memory".to_string(), q("8Gi").into())]
                .into_iter()
                .collect(),
        );

        let rc = ResourceCounter::from_pod(&pod);
        assert_eq!(rc.get("cpu"), q("2"));
        assert!(!rc.contains("memory"));
    }

    #[test]
    fn test_from_pod_skips_unparseable_limit() {
        let pod = make_pod("pod-bad", &[&[("cpu", "2"), ("memory", "lots")]]);
        let rc = ResourceCounter::from_pod(&pod);

        assert_eq!(rc.get("cpu"), q("2"));
        assert!(!rc.contains("memory"));
    }

    #[test]
    fn test_from_pod_skips_negative_limit() {
        let pod = make_pod("pod-neg", &[&[("cpu", "-4"), ("memory", "1Gi")], &[("cpu", "1")]]);
        let rc = ResourceCounter::from_pod(&pod);

        assert_eq!(rc.get("cpu"), q("1"));
        assert_eq!(rc.get("memory"), q("1Gi"));
        assert!(rc.iter().all(|(_, qty)| !qty.is_negative()));
    }

    #[test]
    fn test_sub_rejects_negative_request() {
        let mut rc: ResourceCounter = [("cpu".to_string(), q("2")), ("memory".to_string(), q("4Gi"))]
            .into_iter()
            .collect();
        let ask: ResourceCounter = [("cpu".to_string(), q("-3")), ("memory".to_string(), q("1Gi"))]
            .into_iter()
            .collect();

        let errors = rc.sub_with_checks(&ask);

        assert_eq!(
            errors,
            vec![ResourceError::NegativeRequest {
                resource: "cpu".to_string(),
                requested: q("-3"),
            }]
        );
        assert_eq!(rc.get("cpu"), q("2"));
        assert_eq!(rc.get("memory"), q("3Gi"));
    }

    #[test]
    fn test_add_accumulates_across_pods() {
        let mut rc = ResourceCounter::from_pod(&two_container_pod());
        let rc2 = ResourceCounter::from_pod(&make_pod(
            "pod-b",
            &[&[("cpu", "8"), ("memory", "16Gi"), (GPU_NAME, "2")]],
        ));
        rc.add(&rc2);

        assert_eq!(rc.get("cpu"), q("13"));
        assert_eq!(rc.get("memory"), q("19Gi"));
        assert_eq!(rc.get(GPU_NAME), q("3"));
        assert_eq!(rc.get(NIC_NAME), q("2"));
    }

    #[test]
    fn test_sub_from_empty() {
        let mut rc = ResourceCounter::new();
        let errors = rc.sub_with_checks(&ResourceCounter::from_pod(&two_container_pod()));

        assert!(rc.is_empty(), "created resources while subtracting from empty");
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ResourceError::MissingBaseResource { .. })));
    }

    #[test]
    fn test_sub_handles_negatives() {
        let mut rc = ResourceCounter::from_pod(&make_pod(
            "pod-1",
            &[&[("cpu", "4"), ("memory", "2Gi"), (NIC_NAME, "2")]],
        ));
        let rc2 = ResourceCounter::from_pod(&make_pod(
            "pod-2",
            &[&[("cpu", "1"), ("memory", "1Gi"), (GPU_NAME, "1")]],
        ));

        let errors = rc.sub_with_checks(&rc2);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].resource(), GPU_NAME);
        assert_eq!(rc.get("cpu"), q("3"));
        assert_eq!(rc.get("memory"), q("1Gi"));
        assert!(!rc.contains(GPU_NAME), "created resource by subtraction");
        assert_eq!(rc.get(NIC_NAME), q("2"));
    }

    #[test]
    fn test_sub_underflow_leaves_value_unchanged() {
        let mut rc: ResourceCounter = [("cpu".to_string(), q("2")), ("memory".to_string(), q("4Gi"))]
            .into_iter()
            .collect();
        let ask: ResourceCounter = [("cpu".to_string(), q("3")), ("memory".to_string(), q("1Gi"))]
            .into_iter()
            .collect();

        let errors = rc.sub_with_checks(&ask);

        assert_eq!(
            errors,
            vec![ResourceError::SubtractionUnderflow {
                resource: "cpu".to_string(),
                requested: q("3"),
                available: q("2"),
            }]
        );
        assert_eq!(rc.get("cpu"), q("2"));
        assert_eq!(rc.get("memory"), q("3Gi"));
        assert!(rc.iter().all(|(_, qty)| !qty.is_negative()));
    }

    #[test]
    fn test_add_then_sub_restores_original() {
        let original = ResourceCounter::from_pod(&two_container_pod());
        let other = ResourceCounter::from_pod(&make_pod(
            "pod-b",
            &[&[("cpu", "8"), ("memory", "16Gi"), (GPU_NAME, "2")]],
        ));

        let mut rc = original.clone();
        rc.add(&other);
        assert_eq!(rc.get("memory"), q("19Gi"));

        let errors = rc.sub_with_checks(&other);
        assert!(errors.is_empty());
        assert_eq!(rc, original);
    }

    #[test]
    fn test_is_zero_after_matching_sub() {
        let pod_counter = ResourceCounter::from_pod(&two_container_pod());
        let mut rc = ResourceCounter::new();
        rc.add(&pod_counter);
        assert!(!rc.is_zero());

        assert!(rc.sub_with_checks(&pod_counter).is_empty());
        assert!(!rc.is_empty());
        assert!(rc.is_zero());
    }

    #[test]
    fn test_display_is_sorted() {
        let rc: ResourceCounter = [("memory".to_string(), q("4Gi")), ("cpu".to_string(), q("16"))]
            .into_iter()
            .collect();
        assert_eq!(rc.to_string(), "cpu=16 memory=4Gi");
    }
}
