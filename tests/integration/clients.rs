//! HTTP client tests against the fake API server.

use std::time::Duration;

use hyper::StatusCode;
use meshcheck::control_plane::{ControlPlaneApi, HttpControlPlaneClient, SubsystemResult};
use meshcheck::k8s::{
    ClusterApi, ClusterConnector, KubeconfigConnector, KubernetesApi, RestConfig,
};
use meshcheck::version::{check_server_version, HttpVersionLookup, VersionLookup};
use meshcheck::CheckError;

use crate::helpers::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn cluster(server: &RunningServer, token: Option<&str>) -> KubernetesApi {
    let rest = RestConfig {
        server: server.url(),
        token: token.map(String::from),
        ..Default::default()
    };
    KubernetesApi::new(rest, TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_get_version_info() {
    let server = FakeApiServer::default().start().await;
    let api = cluster(&server, None);
    let client = api.new_client().unwrap();

    let info = api.get_version_info(&client).await.unwrap();

    assert_eq!(info.git_version, "v1.9.3-gke.2");
    assert_eq!(info.platform, "linux/amd64");
    assert!(server.saw("GET /version"));
}

#[tokio::test]
async fn test_get_version_info_unexpected_status() {
    let server = FakeApiServer {
        version_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Default::default()
    }
    .start()
    .await;
    let api = cluster(&server, None);
    let client = api.new_client().unwrap();

    let err = api.get_version_info(&client).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unexpected Kubernetes API response: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_get_version_info_malformed_body() {
    let server = FakeApiServer {
        raw_version_body: Some("<html>not json</html>".to_string()),
        ..Default::default()
    }
    .start()
    .await;
    let api = cluster(&server, None);
    let client = api.new_client().unwrap();

    let err = api.get_version_info(&client).await.unwrap_err();

    match &err {
        CheckError::Protocol { service, .. } => assert_eq!(service, "Kubernetes API"),
        other => panic!("expected a protocol error, got {:?}", other),
    }
    assert!(err
        .to_string()
        .starts_with("Unexpected Kubernetes API response: invalid body"));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = FakeApiServer {
        token: Some("s3cret".to_string()),
        ..Default::default()
    }
    .start()
    .await;

    let api = cluster(&server, Some("s3cret"));
    let client = api.new_client().unwrap();
    assert!(api.get_version_info(&client).await.is_ok());

    let api = cluster(&server, Some("wrong"));
    let client = api.new_client().unwrap();
    let err = api.get_version_info(&client).await.unwrap_err();
    assert!(matches!(err, CheckError::Protocol { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_check_namespace_exists() {
    let server = FakeApiServer::default().start().await;
    let api = cluster(&server, None);
    let client = api.new_client().unwrap();

    assert!(api.check_namespace_exists(&client, "linkerd").await.is_ok());

    let err = api.check_namespace_exists(&client, "missing").await.unwrap_err();
    assert_eq!(err, CheckError::NamespaceNotFound("missing".to_string()));
    assert!(server.saw("GET /api/v1/namespaces/missing"));
}

#[tokio::test]
async fn test_connection_refused() {
    let rest = RestConfig {
        server: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    };
    let api = KubernetesApi::new(rest, TIMEOUT).unwrap();
    let client = api.new_client().unwrap();

    let err = api.get_version_info(&client).await.unwrap_err();
    assert!(
        matches!(err, CheckError::Connection { .. }),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_kubeconfig_connector() {
    let server = FakeApiServer {
        token: Some("from-file".to_string()),
        ..Default::default()
    }
    .start()
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(&dir, &server.url(), Some("from-file"));

    let connector = KubeconfigConnector::new(cluster_config(path), TIMEOUT);
    let api = connector.connect().unwrap();
    let client = api.new_client().unwrap();

    let info = api.get_version_info(&client).await.unwrap();
    assert_eq!(info.git_version, "v1.9.3-gke.2");
}

#[tokio::test]
async fn test_internal_control_plane_client() {
    let server = FakeApiServer {
        subsystems: vec![
            SubsystemResult::ok("kubernetes", "can talk to Kubernetes"),
            SubsystemResult::failed("prometheus", "can talk to Prometheus", "connection refused"),
        ],
        ..Default::default()
    }
    .start()
    .await;

    let client =
        HttpControlPlaneClient::new_internal("linkerd", &server.addr.to_string(), TIMEOUT).unwrap();

    let rsp = client.self_check().await.unwrap();
    assert_eq!(rsp.results.len(), 2);
    assert!(rsp.results[0].status.is_ok());
    assert!(!rsp.results[1].status.is_ok());
    assert_eq!(
        rsp.results[1].friendly_message_to_user,
        "connection refused"
    );

    assert_eq!(client.version().await.unwrap(), "stable-2.1.0");
    assert!(server.saw("POST /api/v1/SelfCheck"));
    assert!(server.saw("POST /api/v1/Version"));
}

#[tokio::test]
async fn test_external_control_plane_client() {
    let server = FakeApiServer::default().start().await;
    let api = cluster(&server, None);

    let client = HttpControlPlaneClient::new_external(
        "linkerd",
        &api,
        "http:linkerd-controller-api:8085",
        TIMEOUT,
    )
    .unwrap();

    let rsp = client.self_check().await.unwrap();
    assert_eq!(rsp.results.len(), 2);
    assert!(server.saw(
        "POST /api/v1/namespaces/linkerd/services/http:linkerd-controller-api:8085\
         /proxy/api/v1/SelfCheck"
    ));
}

#[tokio::test]
async fn test_external_client_wrong_namespace() {
    let server = FakeApiServer::default().start().await;
    let api = cluster(&server, None);

    let client =
        HttpControlPlaneClient::new_external("nowhere", &api, "http:cp:8085", TIMEOUT).unwrap();

    let err = client.self_check().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unexpected control plane API response: 404 Not Found"
    );
}

#[tokio::test]
async fn test_check_server_version() {
    let server = FakeApiServer {
        control_plane_version: "stable-2.0.0".to_string(),
        ..Default::default()
    }
    .start()
    .await;
    let client =
        HttpControlPlaneClient::new_internal("linkerd", &server.addr.to_string(), TIMEOUT).unwrap();

    assert!(check_server_version(&client, "stable-2.0.0").await.is_ok());

    let err = check_server_version(&client, "stable-2.1.0").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "is running version stable-2.0.0 but the latest version is stable-2.1.0"
    );
}

#[tokio::test]
async fn test_version_lookup() {
    let server = FakeApiServer {
        latest_version: "stable-2.2.0".to_string(),
        ..Default::default()
    }
    .start()
    .await;

    let lookup = HttpVersionLookup::new(format!("{}/version.json", server.url()), "0.1.0", TIMEOUT);
    assert_eq!(lookup.latest_version().await.unwrap(), "stable-2.2.0");
    assert!(server.saw("GET /version.json?version=0.1.0&source=cli"));

    let lookup =
        HttpVersionLookup::new(format!("{}/missing.json", server.url()), "0.1.0", TIMEOUT);
    let err = lookup.latest_version().await.unwrap_err();
    assert!(matches!(err, CheckError::Protocol { .. }));
}

#[tokio::test]
async fn test_version_lookup_malformed_body() {
    let server = FakeApiServer {
        raw_version_body: Some("<html>not json</html>".to_string()),
        ..Default::default()
    }
    .start()
    .await;

    let lookup = HttpVersionLookup::new(format!("{}/version", server.url()), "0.1.0", TIMEOUT);
    let err = lookup.latest_version().await.unwrap_err();

    match &err {
        CheckError::Protocol { service, .. } => assert_eq!(service, "version check"),
        other => panic!("expected a protocol error, got {:?}", other),
    }
}
