// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Unit tests for podset-operator.
//!
//! These tests run without a Kubernetes cluster and test individual
//! components in isolation.

#[path = "../common/mod.rs"]
mod common;

mod crd_tests {
    use podset_operator::crd::{MAX_REPLICAS, MIN_REPLICAS, PodSet, PodSetSpec, PodSetStatus};

    #[test]
    fn test_replica_bounds() {
        assert_eq!(MIN_REPLICAS, 1);
        assert_eq!(MAX_REPLICAS, 10);
    }

    #[test]
    fn test_resource_wire_format() {
        let podset = PodSet::new("my-podset", PodSetSpec { replica_count: 3 });

        let json = serde_json::to_value(&podset).unwrap();
        assert_eq!(json["spec"]["replicaCount"], 3);
        assert_eq!(json["apiVersion"], "podset.example.com/v1alpha1");
        assert_eq!(json["kind"], "PodSet");
    }

    #[test]
    fn test_status_roundtrip() {
        let status = PodSetStatus {
            pod_names: vec!["a".to_string(), "b".to_string()],
            available_replicas: 2,
        };

        let json = serde_json::to_string(&status).unwrap();
        let parsed: PodSetStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_crd_schema_generation() {
        use kube::CustomResourceExt;

        let crd = PodSet::crd();
        assert_eq!(crd.spec.group, "podset.example.com");
        assert_eq!(crd.spec.names.kind, "PodSet");
        assert_eq!(crd.spec.names.plural, "podsets");
        assert_eq!(crd.spec.versions.len(), 1);
        assert!(
            crd.spec.versions[0]
                .subresources
                .as_ref()
                .is_some_and(|s| s.status.is_some()),
            "status must be a subresource so patch_status works"
        );
    }
}

mod error_tests {
    use podset_operator::controller::error::Error;

    fn api_error(code: u16) -> Error {
        Error::Kube(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "error".to_string(),
            reason: "Error".to_string(),
            code,
        }))
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(api_error(500).is_retryable());
        assert!(api_error(504).is_retryable());
        assert!(api_error(429).is_retryable());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = api_error(404);
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_is_not_retryable() {
        let err = Error::Validation("replicaCount must be at least 1".to_string());
        assert!(!err.is_retryable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_transient_is_retryable() {
        let err = Error::Transient("temporary failure".to_string());
        assert!(err.is_retryable());
        assert!(err.requeue_after() < std::time::Duration::from_secs(60));
    }
}

mod status_tests {
    use crate::common::fixtures::{owned_pod, running_pod, terminating};
    use podset_operator::controller::status::{available_pods, observed_status};

    #[test]
    fn test_terminating_pod_not_available_even_when_running() {
        let pods = vec![
            terminating(running_pod("ps", "ps-pod-a")),
            running_pod("ps", "ps-pod-b"),
        ];

        let status = observed_status(&pods);
        assert_eq!(status.available_replicas, 1);
        assert_eq!(status.pod_names, vec!["ps-pod-b"]);
    }

    #[test]
    fn test_terminal_phases_not_available_without_deletion_marker() {
        let pods = vec![
            owned_pod("ps", "ps-pod-a", "Succeeded"),
            owned_pod("ps", "ps-pod-b", "Failed"),
        ];

        assert_eq!(observed_status(&pods).available_replicas, 0);
    }

    #[test]
    fn test_empty_listing_is_not_an_error() {
        let status = observed_status(&[]);
        assert_eq!(status.available_replicas, 0);
        assert!(status.pod_names.is_empty());
    }

    #[test]
    fn test_filter_preserves_listing_order() {
        let pods = vec![
            running_pod("ps", "c"),
            owned_pod("ps", "x", "Failed"),
            owned_pod("ps", "a", "Pending"),
        ];

        let names: Vec<String> = available_pods(pods)
            .iter()
            .map(|p| p.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["c", "a"]);
    }
}

mod scale_tests {
    use crate::common::fixtures::running_pod;
    use podset_operator::controller::scale::{ScaleAction, VictimPolicy, plan};

    #[test]
    fn test_five_available_two_desired_deletes_three() {
        let available: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|n| running_pod("ps", n))
            .collect();

        match plan(&available, 2, VictimPolicy::ListOrder) {
            ScaleAction::Delete(victims) => {
                let names: Vec<String> = victims
                    .iter()
                    .map(|p| p.metadata.name.clone().unwrap())
                    .collect();
                assert_eq!(names, vec!["a", "b", "c"]);
            }
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_deficit_creates_exactly_one() {
        let available = vec![running_pod("ps", "a")];
        assert_eq!(plan(&available, 3, VictimPolicy::ListOrder), ScaleAction::CreateOne);
    }

    #[test]
    fn test_converged_emits_none() {
        let available = vec![running_pod("ps", "a"), running_pod("ps", "b")];
        assert_eq!(plan(&available, 2, VictimPolicy::ListOrder), ScaleAction::None);
    }
}

mod pod_factory_tests {
    use crate::common::fixtures::test_podset;
    use podset_operator::controller::status::is_available;
    use podset_operator::resources::pod::{build_pod, pod_labels, pod_selector};

    #[test]
    fn test_created_pod_is_selected_by_listing() {
        // The factory labels and the listing selector must agree, or pods
        // become permanently invisible to future reconciles.
        let podset = test_podset("web", "default", 3);
        let pod = build_pod(&podset);

        let labels = pod.metadata.labels.as_ref().unwrap();
        assert_eq!(*labels, pod_labels("web"));
        assert_eq!(pod_selector("web"), "app=web,version=v0.1");
    }

    #[test]
    fn test_new_pod_not_yet_available() {
        // A freshly built pod has no phase until the store schedules it.
        let podset = test_podset("web", "default", 3);
        let pod = build_pod(&podset);

        assert!(!is_available(&pod));
    }

    #[test]
    fn test_owner_reference_enables_cascading_deletion() {
        let podset = test_podset("web", "default", 3);
        let pod = build_pod(&podset);

        let owner = &pod.metadata.owner_references.as_ref().unwrap()[0];
        assert_eq!(owner.controller, Some(true));
        assert_eq!(owner.block_owner_deletion, Some(true));
        assert_eq!(owner.uid, "test-uid-web");
    }
}
