//! Retirement ordering against a mocked API server.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::migration::test_support::{list_response, mock_client, status_response};
use crate::migration::{kinds, retire};

async fn mount_empty_lists(server: &MockServer, except: &[&str]) {
    for migration in kinds::migrations().unwrap() {
        if except.contains(&migration.kind) {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(format!(
                "/apis/meridian.k8s.io/v1/{}",
                migration.plural
            )))
            .respond_with(list_response(
                "meridian.k8s.io/v1",
                migration.kind,
                json!([]),
            ))
            .mount(server)
            .await;
    }
}

// The kind table runs in reverse during retirement: the Addon (dependent)
// must be released and deleted before the Cluster (owner) it references.
#[tokio::test]
async fn dependents_are_deleted_before_their_owners() {
    let server = MockServer::start().await;
    mount_empty_lists(&server, &["Cluster", "Addon"]).await;

    let addon = json!({
        "apiVersion": "meridian.k8s.io/v1",
        "kind": "Addon",
        "metadata": {
            "name": "dns",
            "namespace": "cluster-abcd1234",
            "uid": "addon-uid",
            "finalizers": ["meridian.k8s.io/cleanup"],
        },
    });
    let cluster = json!({
        "apiVersion": "meridian.k8s.io/v1",
        "kind": "Cluster",
        "metadata": {"name": "abcd1234", "uid": "cluster-uid"},
    });

    Mock::given(method("GET"))
        .and(path("/apis/meridian.k8s.io/v1/addons"))
        .respond_with(list_response(
            "meridian.k8s.io/v1",
            "Addon",
            json!([addon.clone()]),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/meridian.k8s.io/v1/clusters"))
        .respond_with(list_response(
            "meridian.k8s.io/v1",
            "Cluster",
            json!([cluster.clone()]),
        ))
        .mount(&server)
        .await;

    let addon_path = "/apis/meridian.k8s.io/v1/namespaces/cluster-abcd1234/addons/dns";
    let cluster_path = "/apis/meridian.k8s.io/v1/clusters/abcd1234";

    Mock::given(method("PATCH"))
        .and(path(addon_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(addon))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(cluster_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(cluster))
        .mount(&server)
        .await;

    let deleted = json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Success",
    });
    Mock::given(method("DELETE"))
        .and(path(addon_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(deleted.clone()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(cluster_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(deleted))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    retire::run(&client).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let position = |verb: &str, url_path: &str| {
        requests
            .iter()
            .position(|request| {
                request.method.to_string() == verb && request.url.path() == url_path
            })
            .unwrap_or_else(|| panic!("no {verb} {url_path} recorded"))
    };

    // Finalizers and owner references are stripped before each delete.
    assert!(position("PATCH", addon_path) < position("DELETE", addon_path));
    assert!(position("PATCH", cluster_path) < position("DELETE", cluster_path));

    // Reverse kind order: the dependent goes first.
    assert!(position("DELETE", addon_path) < position("DELETE", cluster_path));
}

#[tokio::test]
async fn already_absent_objects_are_a_noop() {
    let server = MockServer::start().await;
    mount_empty_lists(&server, &["Preset"]).await;

    // The preset is listed but vanishes before we get to it.
    Mock::given(method("GET"))
        .and(path("/apis/meridian.k8s.io/v1/presets"))
        .respond_with(list_response(
            "meridian.k8s.io/v1",
            "Preset",
            json!([{
                "apiVersion": "meridian.k8s.io/v1",
                "kind": "Preset",
                "metadata": {"name": "corporate", "uid": "preset-uid"},
            }]),
        ))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/meridian.k8s.io/v1/presets/corporate"))
        .respond_with(status_response(404, "NotFound"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/apis/meridian.k8s.io/v1/presets/corporate"))
        .respond_with(status_response(404, "NotFound"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    retire::run(&client).await.unwrap();
}
