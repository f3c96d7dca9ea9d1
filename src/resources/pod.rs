//! Pod generation for PodSet resources.
//!
//! Builds the deterministic pod template a PodSet owns, with the ownership
//! labels the controller also uses when listing pods. The two must stay in
//! lockstep: a pod created without the listing labels is invisible to every
//! future reconcile pass.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::ResourceExt;

use crate::crd::PodSet;

/// Label value identifying the pod template revision.
pub const VERSION_LABEL: &str = "v0.1";

/// Ownership labels applied to every pod a PodSet owns.
pub fn pod_labels(podset_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), podset_name.to_string());
    labels.insert("version".to_string(), VERSION_LABEL.to_string());
    labels
}

/// Label selector matching [`pod_labels`], for listing owned pods.
pub fn pod_selector(podset_name: &str) -> String {
    format!("app={},version={}", podset_name, VERSION_LABEL)
}

/// Create an owner reference pointing at a PodSet.
///
/// `controller` and `block_owner_deletion` are set so the cluster garbage
/// collector cascades pod deletion when the PodSet is deleted.
pub fn owner_reference(podset: &PodSet) -> OwnerReference {
    OwnerReference {
        api_version: "podset.example.com/v1alpha1".to_string(),
        kind: "PodSet".to_string(),
        name: podset.name_any(),
        uid: podset.uid().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Build a new pod for a PodSet.
///
/// Deterministic template: busybox sleeping, named with the owner as prefix
/// (`generate_name`, so the API server appends a unique suffix), labeled
/// with the ownership pair and owned via [`owner_reference`]. Pure; the
/// caller is responsible for creating the pod.
pub fn build_pod(podset: &PodSet) -> Pod {
    let name = podset.name_any();

    Pod {
        metadata: ObjectMeta {
            generate_name: Some(format!("{}-pod", name)),
            namespace: podset.namespace(),
            labels: Some(pod_labels(&name)),
            owner_references: Some(vec![owner_reference(podset)]),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "busybox".to_string(),
                image: Some("busybox".to_string()),
                command: Some(vec!["sleep".to_string(), "3600".to_string()]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}
