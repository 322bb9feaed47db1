//! Preflight aggregation against mocked clusters.

use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use crate::migration::preflight::{self, MASTER_DEPLOYMENTS, SEED_DEPLOYMENTS};
use crate::migration::test_support::{
    mock_client, mount_get, mount_quiescent_cluster, options_for, unreachable_client,
};

#[tokio::test]
async fn quiescent_clusters_pass() {
    let master = MockServer::start().await;
    mount_quiescent_cluster(&master, "meridian", MASTER_DEPLOYMENTS).await;

    let opts = options_for(mock_client(&master)).await;
    let problems = preflight::check(&opts).await;

    assert!(problems.is_empty(), "unexpected problems: {problems:?}");
}

#[tokio::test]
async fn running_controller_is_reported() {
    let master = MockServer::start().await;

    // meridian-api still has ready replicas; everything else is quiet.
    mount_get(
        &master,
        "/apis/apps/v1/namespaces/meridian/deployments/meridian-api",
        ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "meridian-api", "namespace": "meridian"},
            "spec": {"replicas": 2},
            "status": {"replicas": 2, "readyReplicas": 2},
        })),
    )
    .await;
    let quiet: Vec<&str> = MASTER_DEPLOYMENTS
        .iter()
        .copied()
        .filter(|name| *name != "meridian-api")
        .collect();
    mount_quiescent_cluster(&master, "meridian", &quiet).await;

    let opts = options_for(mock_client(&master)).await;
    let problems = preflight::check(&opts).await;

    assert_eq!(problems.len(), 1, "{problems:?}");
    assert!(problems[0].contains("meridian-api"));
    assert!(problems[0].contains("2 ready replica"));
}

#[tokio::test]
async fn lingering_webhook_is_reported() {
    let master = MockServer::start().await;
    mount_get(
        &master,
        "/apis/admissionregistration.k8s.io/v1/validatingwebhookconfigurations/meridian-admission",
        ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "ValidatingWebhookConfiguration",
            "metadata": {"name": "meridian-admission"},
        })),
    )
    .await;
    mount_quiescent_cluster(&master, "meridian", MASTER_DEPLOYMENTS).await;

    let opts = options_for(mock_client(&master)).await;
    let problems = preflight::check(&opts).await;

    assert_eq!(problems.len(), 1, "{problems:?}");
    assert!(problems[0].contains("ValidatingWebhookConfiguration meridian-admission"));
}

// One unreachable seed must produce exactly one problem and must not stop
// the remaining seeds from being checked.
#[tokio::test]
async fn unreachable_seed_does_not_abort_the_pass() {
    let master = MockServer::start().await;
    mount_quiescent_cluster(&master, "meridian", MASTER_DEPLOYMENTS).await;

    let reachable = MockServer::start().await;
    mount_quiescent_cluster(&reachable, "meridian", SEED_DEPLOYMENTS).await;

    let mut opts = options_for(mock_client(&master)).await;
    // BTreeMap iteration is ordered: the broken seed is visited first.
    opts.seeds
        .insert("alpha-broken".to_string(), unreachable_client());
    opts.seeds
        .insert("zulu-healthy".to_string(), mock_client(&reachable));

    let problems = preflight::check(&opts).await;

    assert_eq!(problems.len(), 1, "{problems:?}");
    assert!(problems[0].contains("alpha-broken"));
    assert!(problems[0].contains("cannot reach cluster"));

    // The healthy seed was still probed after the broken one failed.
    let probed = reachable.received_requests().await.unwrap();
    assert!(!probed.is_empty());
}
