//! Scaling decisions for PodSet resources.
//!
//! Compares observed availability against the desired replica count and
//! emits a single corrective action per pass. Scale-down removes the whole
//! excess in one pass; scale-up creates one pod per pass and relies on the
//! requeue contract to converge.

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// One corrective action per reconcile pass.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleAction {
    /// Observed state matches desired state.
    None,
    /// Create a single pod; the pass requeues to re-evaluate.
    CreateOne,
    /// Delete the selected excess pods.
    Delete(Vec<Pod>),
}

/// How scale-down victims are chosen from the available listing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum VictimPolicy {
    /// A deterministic prefix of the listing. Listing order is not stable
    /// across calls, so pod choice may vary between passes; the excess
    /// count removed never does.
    #[default]
    ListOrder,
    /// Oldest pods first, by creation timestamp. Pods without a timestamp
    /// sort first.
    OldestFirst,
}

impl VictimPolicy {
    /// Select `excess` victims from the available pods.
    fn select(self, available: &[Pod], excess: usize) -> Vec<Pod> {
        match self {
            VictimPolicy::ListOrder => available.iter().take(excess).cloned().collect(),
            VictimPolicy::OldestFirst => {
                let mut pods: Vec<Pod> = available.to_vec();
                pods.sort_by_key(|pod| pod.creation_timestamp());
                pods.truncate(excess);
                pods
            }
        }
    }
}

/// Decide the corrective action for one reconcile pass.
///
/// `available` is the filtered pod listing in listing order; `desired` is
/// the declared replica count. Emits exactly one of no-op, a single
/// creation, or a deletion of exactly `available - desired` pods — never
/// creations and deletions together.
pub fn plan(available: &[Pod], desired: i32, policy: VictimPolicy) -> ScaleAction {
    let desired = usize::try_from(desired).unwrap_or(0);

    if available.len() > desired {
        let excess = available.len() - desired;
        ScaleAction::Delete(policy.select(available, excess))
    } else if available.len() < desired {
        ScaleAction::CreateOne
    } else {
        ScaleAction::None
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use k8s_openapi::chrono::{TimeZone, Utc};

    fn pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pod_created_at(name: &str, secs: i64) -> Pod {
        let mut pod = pod(name);
        pod.metadata.creation_timestamp = Some(Time(Utc.timestamp_opt(secs, 0).unwrap()));
        pod
    }

    fn names(pods: &[Pod]) -> Vec<String> {
        pods.iter().map(ResourceExt::name_any).collect()
    }

    #[test]
    fn test_deficit_creates_one_pod_only() {
        let available = vec![pod("a")];
        assert_eq!(
            plan(&available, 3, VictimPolicy::default()),
            ScaleAction::CreateOne
        );
    }

    #[test]
    fn test_empty_listing_creates_one_pod() {
        assert_eq!(plan(&[], 3, VictimPolicy::default()), ScaleAction::CreateOne);
    }

    #[test]
    fn test_converged_is_noop() {
        let available = vec![pod("a"), pod("b"), pod("c")];
        assert_eq!(plan(&available, 3, VictimPolicy::default()), ScaleAction::None);
    }

    #[test]
    fn test_excess_deletes_prefix_of_listing() {
        let available = vec![pod("a"), pod("b"), pod("c"), pod("d"), pod("e")];

        match plan(&available, 2, VictimPolicy::ListOrder) {
            ScaleAction::Delete(victims) => {
                assert_eq!(names(&victims), vec!["a", "b", "c"]);
            }
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_excess_of_one_deletes_one() {
        let available = vec![pod("a"), pod("b"), pod("c"), pod("d")];

        match plan(&available, 3, VictimPolicy::ListOrder) {
            ScaleAction::Delete(victims) => assert_eq!(names(&victims), vec!["a"]),
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_oldest_first_ignores_listing_order() {
        let available = vec![
            pod_created_at("young", 3_000),
            pod_created_at("oldest", 1_000),
            pod_created_at("older", 2_000),
        ];

        match plan(&available, 1, VictimPolicy::OldestFirst) {
            ScaleAction::Delete(victims) => {
                assert_eq!(names(&victims), vec!["oldest", "older"]);
            }
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_oldest_first_sorts_missing_timestamp_first() {
        let available = vec![pod_created_at("stamped", 1_000), pod("unstamped")];

        match plan(&available, 1, VictimPolicy::OldestFirst) {
            ScaleAction::Delete(victims) => assert_eq!(names(&victims), vec!["unstamped"]),
            other => panic!("expected Delete, got {:?}", other),
        }
    }

    #[test]
    fn test_policies_agree_on_excess_count() {
        let available = vec![
            pod_created_at("a", 5),
            pod_created_at("b", 4),
            pod_created_at("c", 3),
            pod_created_at("d", 2),
            pod_created_at("e", 1),
        ];

        for policy in [VictimPolicy::ListOrder, VictimPolicy::OldestFirst] {
            match plan(&available, 2, policy) {
                ScaleAction::Delete(victims) => assert_eq!(victims.len(), 3),
                other => panic!("expected Delete under {:?}, got {:?}", policy, other),
            }
        }
    }

    #[test]
    fn test_scale_down_to_zero_desired_is_clamped_like_zero() {
        // plan() is total: a desired count below the validated range still
        // yields a well-formed deletion of the whole listing.
        let available = vec![pod("a"), pod("b")];

        match plan(&available, 0, VictimPolicy::ListOrder) {
            ScaleAction::Delete(victims) => assert_eq!(victims.len(), 2),
            other => panic!("expected Delete, got {:?}", other),
        }
    }
}
