//! Custom Resource Definitions (CRDs) for podset-operator.
//!
//! - `PodSet`: declares a desired count of fungible pods owned by the resource

mod pod_set;

pub use pod_set::*;
