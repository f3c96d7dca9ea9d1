//! Reconciliation loop for PodSet.
//!
//! Each pass is level-triggered and independent: fetch the PodSet, list the
//! pods it owns, publish the observed state, then apply at most one
//! corrective action. All state lives in the cluster store and is re-derived
//! every pass.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use k8s_openapi::api::core::v1::Pod;
use kube::{
    Api, ResourceExt,
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
    runtime::controller::Action,
};
use tracing::{debug, error, info, warn};

use crate::{
    controller::{
        context::Context,
        error::Error,
        scale::{ScaleAction, VictimPolicy, plan},
        status,
    },
    crd::{MAX_REPLICAS, MIN_REPLICAS, PodSet},
    resources,
};

/// Field manager name for server-side apply
pub const FIELD_MANAGER: &str = "podset-operator";

/// Requeue delay after a corrective action, giving the store time to
/// observe the creation or deletions before the next pass.
const ACTION_REQUEUE: Duration = Duration::from_secs(1);

/// Reconcile a PodSet
///
/// This is the main reconciliation function called by the controller.
/// It converges the set of owned pods onto `spec.replicaCount` and keeps
/// `status` in sync with the observed pod listing.
pub async fn reconcile(obj: Arc<PodSet>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start_time = Instant::now();
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    debug!(name = %name, namespace = %namespace, "Reconciling PodSet");

    let podsets: Api<PodSet> = Api::namespaced(ctx.client.clone(), &namespace);

    // Fetch the current PodSet; a missing resource has already been deleted
    // and needs no further work.
    let Some(podset) = podsets.get_opt(&name).await? else {
        debug!(name = %name, "PodSet not found (likely deleted)");
        return Ok(Action::await_change());
    };

    if let Err(e) = validate_spec(&podset) {
        error!(name = %name, error = %e, "Validation failed");
        ctx.publish_warning_event(&podset, "ValidationFailed", "Validating", Some(e.to_string()))
            .await;
        return Err(e);
    }

    // List the pods this PodSet owns, filtered by the ownership label pair.
    let pods_api: Api<Pod> = Api::namespaced(ctx.client.clone(), &namespace);
    let selector = resources::pod::pod_selector(&name);
    let pod_list = pods_api
        .list(&ListParams::default().labels(&selector))
        .await?;

    let available = status::available_pods(pod_list.items);
    let observed = status::observed_status(&available);

    // Persist the observed state when it changed. Status is a recomputed
    // cache: the scaling decision below never reads it back.
    if podset.status.as_ref() != Some(&observed) {
        let patch = serde_json::json!({ "status": observed });
        podsets
            .patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        debug!(
            name = %name,
            available = observed.available_replicas,
            "Updated PodSet status"
        );
    }

    let desired = podset.spec.replica_count;

    // Record metrics before the corrective action so desired/available
    // reflect this pass's snapshot.
    if let Some(ref health_state) = ctx.health_state {
        let duration = start_time.elapsed().as_secs_f64();
        health_state
            .metrics
            .record_reconcile(&namespace, &name, duration);
        health_state.metrics.set_podset_replicas(
            &namespace,
            &name,
            i64::from(desired),
            i64::from(observed.available_replicas),
        );
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        health_state.last_reconcile.store(now, Ordering::Relaxed);
    }

    match plan(&available, desired, VictimPolicy::default()) {
        ScaleAction::Delete(victims) => {
            info!(
                name = %name,
                available = available.len(),
                desired = desired,
                deleting = victims.len(),
                "Scaling down pods"
            );
            for victim in &victims {
                let pod_name = victim.name_any();
                if let Err(e) = pods_api.delete(&pod_name, &DeleteParams::default()).await {
                    // Abort on first failure; already-deleted pods stay
                    // deleted and the next pass recomputes availability.
                    warn!(name = %name, pod = %pod_name, error = %e, "Failed to delete pod");
                    return Err(Error::Kube(e));
                }
                debug!(name = %name, pod = %pod_name, "Deleted pod");
                if let Some(ref health_state) = ctx.health_state {
                    health_state.metrics.record_pod_deleted(&namespace, &name);
                }
            }
            ctx.publish_normal_event(
                &podset,
                "ScalingDown",
                "DeletePods",
                Some(format!(
                    "Deleted {} excess pods ({} available, {} desired)",
                    victims.len(),
                    available.len(),
                    desired
                )),
            )
            .await;
            Ok(Action::requeue(ACTION_REQUEUE))
        }
        ScaleAction::CreateOne => {
            info!(
                name = %name,
                available = available.len(),
                desired = desired,
                "Scaling up pods"
            );
            let pod = resources::pod::build_pod(&podset);
            let created = pods_api.create(&PostParams::default(), &pod).await?;
            debug!(name = %name, pod = %created.name_any(), "Created pod");
            if let Some(ref health_state) = ctx.health_state {
                health_state.metrics.record_pod_created(&namespace, &name);
            }
            ctx.publish_normal_event(
                &podset,
                "ScalingUp",
                "CreatePod",
                Some(format!(
                    "Created pod ({} available, {} desired)",
                    available.len(),
                    desired
                )),
            )
            .await;
            Ok(Action::requeue(ACTION_REQUEUE))
        }
        ScaleAction::None => {
            debug!(name = %name, available = available.len(), "PodSet converged");
            Ok(Action::await_change())
        }
    }
}

/// Error policy for the controller
pub fn error_policy(obj: Arc<PodSet>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    // Record error metric
    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_error(&namespace, &name);
    }

    if error.is_not_found() {
        debug!(name = %name, "Resource not found (likely deleted)");
        return Action::await_change();
    }

    if error.is_retryable() {
        warn!(name = %name, error = %error, "Retryable error, will retry");
        Action::requeue(error.requeue_after())
    } else {
        error!(name = %name, error = %error, "Non-retryable error");
        Action::requeue(Duration::from_secs(300))
    }
}

/// Validate the PodSet spec
fn validate_spec(podset: &PodSet) -> Result<(), Error> {
    if podset.spec.replica_count < MIN_REPLICAS {
        return Err(Error::Validation(format!(
            "replicaCount must be at least {}",
            MIN_REPLICAS
        )));
    }
    if podset.spec.replica_count > MAX_REPLICAS {
        return Err(Error::Validation(format!(
            "replicaCount cannot exceed {}",
            MAX_REPLICAS
        )));
    }
    Ok(())
}
