//! Shared fixtures for unit tests

use crate::topology::{NodeResourceTopology, ResourceInfo, Zone};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub const NIC_NAME: &str = "vendor_A.com/nic";
pub const GPU_NAME: &str = "vendor_B.com/gpu";

/// Pod whose containers carry the given resource limits
pub fn make_pod(name: &str, containers: &[&[(&str, &str)]]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: containers
                .iter()
                .enumerate()
                .map(|(idx, limits)| Container {
                    name: format!("cnt-{}", idx),
                    resources: Some(ResourceRequirements {
                        limits: Some(
                            limits
                                .iter()
                                .map(|(res, qty)| (res.to_string(), K8sQuantity(qty.to_string())))
                                .collect(),
                        ),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn make_res_info(name: &str, capacity: &str, available: &str) -> ResourceInfo {
    ResourceInfo {
        name: name.to_string(),
        capacity: capacity.parse().unwrap(),
        allocatable: capacity.parse().unwrap(),
        available: available.parse().unwrap(),
    }
}

pub fn make_zone(name: &str, resources: Vec<ResourceInfo>) -> Zone {
    Zone {
        name: name.to_string(),
        zone_type: "Node".to_string(),
        resources,
    }
}

/// Two NUMA zones; only the second one carries the NIC
pub fn make_two_zone_topology(node: &str) -> NodeResourceTopology {
    NodeResourceTopology {
        name: node.to_string(),
        topology_policies: vec!["SingleNUMANodePodLevel".to_string()],
        zones: vec![
            make_zone(
                "node-0",
                vec![
                    make_res_info("cpu", "20", "20"),
                    make_res_info("memory", "32Gi", "32Gi"),
                ],
            ),
            make_zone(
                "node-1",
                vec![
                    make_res_info("cpu", "20", "20"),
                    make_res_info("memory", "32Gi", "32Gi"),
                    make_res_info(NIC_NAME, "8", "8"),
                ],
            ),
        ],
    }
}
