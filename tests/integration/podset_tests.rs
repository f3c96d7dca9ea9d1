//! End-to-end tests for the PodSet controller against a real cluster.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::{Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;

use podset_operator::controller::context::Context;
use podset_operator::controller::reconciler::reconcile;
use podset_operator::crd::PodSet;
use podset_operator::resources::pod::pod_selector;

use crate::common::fixtures::test_podset;
use crate::fixtures::{DEFAULT_TIMEOUT, init_test};
use crate::namespace::TestNamespace;
use crate::operator::ScopedOperator;
use crate::wait::{wait_for_available_replicas, wait_for_pod_count};

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_podset_scales_up_to_desired() {
    let client = init_test().await;
    let ns = TestNamespace::create(client.clone(), "podset-up").await;
    let _operator = ScopedOperator::start(client.clone(), ns.name()).await;

    let podsets: Api<PodSet> = ns.api();
    let pods: Api<Pod> = ns.api();

    podsets
        .create(&PostParams::default(), &test_podset("web", ns.name(), 2))
        .await
        .expect("Failed to create PodSet");

    wait_for_pod_count(&pods, &pod_selector("web"), 2, DEFAULT_TIMEOUT).await;
    wait_for_available_replicas(&podsets, "web", 2, DEFAULT_TIMEOUT).await;

    let status = podsets
        .get("web")
        .await
        .expect("Failed to get PodSet")
        .status
        .expect("PodSet should have a status");
    assert_eq!(status.pod_names.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_podset_scales_down_on_spec_change() {
    let client = init_test().await;
    let ns = TestNamespace::create(client.clone(), "podset-down").await;
    let _operator = ScopedOperator::start(client.clone(), ns.name()).await;

    let podsets: Api<PodSet> = ns.api();
    let pods: Api<Pod> = ns.api();

    podsets
        .create(&PostParams::default(), &test_podset("web", ns.name(), 3))
        .await
        .expect("Failed to create PodSet");
    wait_for_pod_count(&pods, &pod_selector("web"), 3, DEFAULT_TIMEOUT).await;

    // The whole excess goes in one pass once the spec shrinks.
    let patch = serde_json::json!({ "spec": { "replicaCount": 1 } });
    podsets
        .patch("web", &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .expect("Failed to patch PodSet");

    wait_for_pod_count(&pods, &pod_selector("web"), 1, DEFAULT_TIMEOUT).await;
    wait_for_available_replicas(&podsets, "web", 1, DEFAULT_TIMEOUT).await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_deleted_pod_is_replaced() {
    let client = init_test().await;
    let ns = TestNamespace::create(client.clone(), "podset-replace").await;
    let _operator = ScopedOperator::start(client.clone(), ns.name()).await;

    let podsets: Api<PodSet> = ns.api();
    let pods: Api<Pod> = ns.api();

    podsets
        .create(&PostParams::default(), &test_podset("web", ns.name(), 1))
        .await
        .expect("Failed to create PodSet");
    wait_for_pod_count(&pods, &pod_selector("web"), 1, DEFAULT_TIMEOUT).await;

    let victim = pods
        .list(&kube::api::ListParams::default().labels(&pod_selector("web")))
        .await
        .expect("Failed to list pods")
        .items
        .into_iter()
        .next()
        .expect("Expected one pod");
    pods.delete(
        victim.metadata.name.as_deref().expect("pod has a name"),
        &kube::api::DeleteParams::default(),
    )
    .await
    .expect("Failed to delete pod");

    // The controller observes the deletion and restores the count.
    wait_for_pod_count(&pods, &pod_selector("web"), 1, DEFAULT_TIMEOUT).await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Kubernetes cluster"]
async fn test_missing_podset_reconciles_to_done() {
    let client = init_test().await;
    let ns = TestNamespace::create(client.clone(), "podset-missing").await;

    // Reconcile a PodSet that was never created: done, no store mutation.
    let ctx = Arc::new(Context::new(client.clone(), None));
    let ghost = Arc::new(test_podset("ghost", ns.name(), 3));

    let action = reconcile(ghost, ctx)
        .await
        .expect("Reconcile of a missing PodSet must not fail");
    assert_eq!(action, Action::await_change());

    let pods: Api<Pod> = ns.api();
    let listed = pods
        .list(&kube::api::ListParams::default().labels(&pod_selector("ghost")))
        .await
        .expect("Failed to list pods");
    assert!(listed.items.is_empty(), "no pods may be created");
}
