//! Shared helpers for tests that point a `kube::Client` at a mock API
//! server (or at nothing at all).

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::crd::legacy;
use crate::migration::preflight::ADMISSION_WEBHOOKS;
use crate::migration::MigrationOptions;

/// A client talking to the given mock server over plain HTTP.
pub(crate) fn mock_client(server: &MockServer) -> kube::Client {
    let config = kube::Config::new(server.uri().parse().unwrap());
    kube::Client::try_from(config).unwrap()
}

/// A client whose endpoint nothing listens on; every call errors.
pub(crate) fn unreachable_client() -> kube::Client {
    let config = kube::Config::new("http://127.0.0.1:1".parse().unwrap());
    kube::Client::try_from(config).unwrap()
}

/// Minimal options: one (mocked or unreachable) master, no seeds.
pub(crate) async fn options_with_master() -> MigrationOptions {
    options_for(unreachable_client()).await
}

pub(crate) async fn options_for(master: kube::Client) -> MigrationOptions {
    MigrationOptions {
        namespace: "meridian".to_string(),
        config: legacy::MeridianConfiguration::new(
            "meridian",
            legacy::MeridianConfigurationSpec {
                ingress: crate::crd::types::IngressConfiguration {
                    domain: "meridian.example.com".to_string(),
                    class_name: "nginx".to_string(),
                },
                exposure_strategy: Default::default(),
                feature_gates: Default::default(),
            },
        ),
        master,
        seeds: Default::default(),
        backup_directory: "./backups".into(),
        charts_directory: "./charts".into(),
    }
}

/// A Kubernetes `Status` error body; kube only maps error codes cleanly
/// when the body parses as one.
pub(crate) fn status_response(code: u16, reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": reason,
        "reason": reason,
        "code": code,
    }))
}

/// A typed list response for the given group/kind.
pub(crate) fn list_response(
    api_version: &str,
    kind: &str,
    items: serde_json::Value,
) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "apiVersion": api_version,
        "kind": format!("{kind}List"),
        "metadata": {},
        "items": items,
    }))
}

pub(crate) async fn mount_get(server: &MockServer, url_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount what preflight probes on a healthy, quiescent cluster: the
/// platform namespace exists, the named deployments and all admission
/// webhooks do not.
pub(crate) async fn mount_quiescent_cluster(
    server: &MockServer,
    namespace: &str,
    absent_deployments: &[&str],
) {
    mount_get(
        server,
        &format!("/api/v1/namespaces/{namespace}"),
        ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {"name": namespace},
        })),
    )
    .await;

    for name in absent_deployments {
        mount_get(
            server,
            &format!("/apis/apps/v1/namespaces/{namespace}/deployments/{name}"),
            status_response(404, "NotFound"),
        )
        .await;
    }

    for name in ADMISSION_WEBHOOKS {
        mount_get(
            server,
            &format!("/apis/admissionregistration.k8s.io/v1/validatingwebhookconfigurations/{name}"),
            status_response(404, "NotFound"),
        )
        .await;
        mount_get(
            server,
            &format!("/apis/admissionregistration.k8s.io/v1/mutatingwebhookconfigurations/{name}"),
            status_response(404, "NotFound"),
        )
        .await;
    }
}
