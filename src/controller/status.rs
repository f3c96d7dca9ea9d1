//! Observed-state derivation for PodSet resources.
//!
//! Pure helpers that turn a pod listing into the PodSet status. The status
//! is a cache recomputed from a fresh listing every pass; the scaling
//! decision never reads it back.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::crd::PodSetStatus;

/// Whether a pod counts toward `availableReplicas`.
///
/// A pod is available when it has no deletion marker and its phase is
/// `Pending` or `Running`. `Succeeded`, `Failed` and `Unknown` pods are
/// never available, deletion marker or not.
pub fn is_available(pod: &Pod) -> bool {
    if pod.metadata.deletion_timestamp.is_some() {
        return false;
    }
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Pending" | "Running")
    )
}

/// Filter a listing down to the available pods, preserving listing order.
pub fn available_pods(pods: Vec<Pod>) -> Vec<Pod> {
    pods.into_iter().filter(is_available).collect()
}

/// Derive the observed status from a pod listing.
///
/// Filters internally, so raw listings and pre-filtered available lists
/// both produce the same result. An empty listing yields an empty,
/// zero-count status.
pub fn observed_status(pods: &[Pod]) -> PodSetStatus {
    let pod_names: Vec<String> = pods
        .iter()
        .filter(|pod| is_available(pod))
        .map(|pod| pod.name_any())
        .collect();

    PodSetStatus {
        available_replicas: pod_names.len() as i32,
        pod_names,
    }
}
