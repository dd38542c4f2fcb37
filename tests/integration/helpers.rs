//! Test helpers and utilities

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming as IncomingBody;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tempfile::TempDir;
use tokio::net::TcpListener;

use meshcheck::config::ClusterConfig;
use meshcheck::control_plane::SubsystemResult;
use meshcheck::LeafOutcome;

/// Behaviour of the fake API server.
#[derive(Clone)]
pub struct FakeApiServer {
    pub git_version: String,
    pub version_status: StatusCode,
    /// Served verbatim from `/version` instead of the JSON document.
    pub raw_version_body: Option<String>,
    pub namespaces: Vec<String>,
    pub subsystems: Vec<SubsystemResult>,
    pub control_plane_version: String,
    pub latest_version: String,
    /// Bearer token required on cluster and control-plane routes.
    pub token: Option<String>,
    pub self_check_delay: Duration,
}

impl Default for FakeApiServer {
    fn default() -> Self {
        Self {
            git_version: "v1.9.3-gke.2".to_string(),
            version_status: StatusCode::OK,
            raw_version_body: None,
            namespaces: vec!["default".to_string(), "linkerd".to_string()],
            subsystems: vec![
                SubsystemResult::ok("kubernetes", "can talk to Kubernetes"),
                SubsystemResult::ok("prometheus", "can talk to Prometheus"),
            ],
            control_plane_version: "stable-2.1.0".to_string(),
            latest_version: "stable-2.1.0".to_string(),
            token: None,
            self_check_delay: Duration::ZERO,
        }
    }
}

/// A fake server bound to a local port.
pub struct RunningServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests seen so far, as "METHOD /path?query".
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn saw(&self, prefix: &str) -> bool {
        self.requests().iter().any(|r| r.starts_with(prefix))
    }
}

impl FakeApiServer {
    /// Bind to an ephemeral port and serve until the test runtime shuts down.
    pub async fn start(self) -> RunningServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake server");
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(self);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&state);
                let log = Arc::clone(&log);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        let log = Arc::clone(&log);
                        async move { Ok::<_, Infallible>(handle(&state, &log, req).await) }
                    });

                    let io = TokioIo::new(stream);
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        RunningServer { addr, requests }
    }
}

async fn handle(
    state: &FakeApiServer,
    log: &Mutex<Vec<String>>,
    req: Request<IncomingBody>,
) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    log.lock().unwrap().push(format!("{} {}", req.method(), req.uri()));

    if path != "/version.json" {
        if let Some(token) = &state.token {
            let expected = format!("Bearer {}", token);
            let actual = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            if actual != Some(expected.as_str()) {
                return empty(StatusCode::UNAUTHORIZED);
            }
        }
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (req.method(), segments.as_slice()) {
        (&Method::GET, ["version"]) => {
            if state.version_status != StatusCode::OK {
                return empty(state.version_status);
            }
            if let Some(body) = &state.raw_version_body {
                return text(body);
            }
            json(serde_json::json!({
                "major": "1",
                "minor": "9",
                "gitVersion": state.git_version,
                "platform": "linux/amd64",
            }))
        }
        (&Method::GET, ["version.json"]) => {
            let query = req.uri().query().unwrap_or_default();
            if !query.contains("source=cli") {
                return empty(StatusCode::BAD_REQUEST);
            }
            json(serde_json::json!({ "version": state.latest_version }))
        }
        (&Method::GET, ["api", "v1", "namespaces", ns]) => {
            if state.namespaces.iter().any(|n| n == ns) {
                json(serde_json::json!({ "kind": "Namespace", "metadata": { "name": ns } }))
            } else {
                empty(StatusCode::NOT_FOUND)
            }
        }
        (&Method::POST, ["api", "v1", method]) => control_plane(state, method).await,
        (
            &Method::POST,
            ["api", "v1", "namespaces", ns, "services", _, "proxy", "api", "v1", method],
        ) => {
            if !state.namespaces.iter().any(|n| n == ns) {
                return empty(StatusCode::NOT_FOUND);
            }
            control_plane(state, method).await
        }
        _ => empty(StatusCode::NOT_FOUND),
    }
}

async fn control_plane(state: &FakeApiServer, method: &str) -> Response<Full<Bytes>> {
    match method {
        "SelfCheck" => {
            if !state.self_check_delay.is_zero() {
                tokio::time::sleep(state.self_check_delay).await;
            }
            json(serde_json::json!({ "results": state.subsystems }))
        }
        "Version" => json(serde_json::json!({ "release_version": state.control_plane_version })),
        _ => empty(StatusCode::NOT_FOUND),
    }
}

fn json(value: serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(value.to_string())))
        .unwrap()
}

fn text(body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Write a single-context kubeconfig pointing at `server`.
pub fn write_kubeconfig(dir: &TempDir, server: &str, token: Option<&str>) -> PathBuf {
    let user = match token {
        Some(token) => format!("    token: {}\n", token),
        None => "    {}\n".to_string(),
    };
    let content = format!(
        "apiVersion: v1\n\
         kind: Config\n\
         current-context: test\n\
         clusters:\n\
         - name: fake\n  cluster:\n    server: {server}\n\
         contexts:\n\
         - name: test\n  context:\n    cluster: fake\n    user: tester\n\
         users:\n\
         - name: tester\n  user:\n{user}",
        server = server,
        user = user,
    );

    let path = dir.path().join("kubeconfig");
    std::fs::write(&path, content).expect("Failed to write kubeconfig");
    path
}

/// Cluster configuration reading only the given kubeconfig.
pub fn cluster_config(kubeconfig: PathBuf) -> ClusterConfig {
    ClusterConfig {
        kubeconfig: Some(kubeconfig),
        ..Default::default()
    }
}

/// Failed outcomes as "category / description: error".
#[allow(dead_code)]
pub fn failures(outcomes: &[LeafOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.error
                .as_ref()
                .map(|e| format!("{} / {}: {}", o.category, o.description, e))
        })
        .collect()
}
