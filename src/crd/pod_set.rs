//! PodSet Custom Resource Definition.
//!
//! A PodSet declares a desired number of fungible pods. The controller
//! converges the live set of owned pods onto `spec.replicaCount` and
//! publishes the observed state in `status`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum allowed replica count.
pub const MIN_REPLICAS: i32 = 1;

/// Maximum allowed replica count.
pub const MAX_REPLICAS: i32 = 10;

/// PodSet is a custom resource declaring "N fungible workload instances".
///
/// Example:
/// ```yaml
/// apiVersion: podset.example.com/v1alpha1
/// kind: PodSet
/// metadata:
///   name: my-podset
/// spec:
///   replicaCount: 3
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "podset.example.com",
    version = "v1alpha1",
    kind = "PodSet",
    plural = "podsets",
    shortname = "ps",
    status = "PodSetStatus",
    namespaced,
    // Print columns for kubectl get
    printcolumn = r#"{"name":"Desired", "type":"integer", "jsonPath":".spec.replicaCount"}"#,
    printcolumn = r#"{"name":"Available", "type":"integer", "jsonPath":".status.availableReplicas"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PodSetSpec {
    /// Desired number of pods (1..=10).
    /// The controller creates or deletes owned pods until the number of
    /// available pods matches this count.
    #[serde(default = "default_replica_count")]
    pub replica_count: i32,
}

impl Default for PodSetSpec {
    fn default() -> Self {
        Self {
            replica_count: default_replica_count(),
        }
    }
}

fn default_replica_count() -> i32 {
    1
}

/// Observed state of a PodSet.
///
/// Recomputed from a fresh pod listing on every reconcile pass; never used
/// as an input to the scaling decision.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodSetStatus {
    /// Names of the available pods, in listing order.
    #[serde(default)]
    pub pod_names: Vec<String>,

    /// Number of available pods (phase Pending or Running, not marked for
    /// deletion) at the time the listing was taken.
    #[serde(default)]
    pub available_replicas: i32,
}
