//! Resource generation for podset-operator.
//!
//! Pure builders for the Kubernetes objects a PodSet owns.

pub mod pod;
