use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use meshcheck::config::Config;
use meshcheck::control_plane::HttpControlPlaneConnector;
use meshcheck::healthcheck::{HealthChecker, LeafOutcome};
use meshcheck::k8s::KubeconfigConnector;
use meshcheck::version::HttpVersionLookup;

const OK_MARK: &str = "\u{221A}";
const FAIL_MARK: &str = "\u{00D7}";

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    meshcheck::logging::init(&config.logging)?;

    info!("meshcheck {}", meshcheck::VERSION);
    config.log_summary();

    // Checks run one at a time; a single-threaded runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let success = runtime.block_on(run(config))?;

    if !success {
        std::process::exit(2);
    }
    Ok(())
}

async fn run(config: Config) -> io::Result<bool> {
    let check = &config.check;

    let mut checker = HealthChecker::new()
        .with_rpc_timeout(check.rpc_timeout)
        .with_min_kubernetes_version(check.min_kubernetes_version);

    checker
        .add_kubernetes_api_checks(
            Arc::new(KubeconfigConnector::new(config.cluster.clone(), check.request_timeout)),
            &check.namespace,
        )
        .add_control_plane_api_checks(
            Arc::new(HttpControlPlaneConnector::new(
                check.control_plane_service.clone(),
                check.request_timeout,
            )),
            check.api_addr.clone(),
            &check.namespace,
        );

    if !check.skip_version_checks {
        checker.add_version_checks(
            Arc::new(HttpVersionLookup::new(
                check.version_check_url.clone(),
                meshcheck::PKG_VERSION,
                check.request_timeout,
            )),
            check.expected_version.clone(),
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut last_category: Option<String> = None;
    let mut write_error: Option<io::Error> = None;

    // Output stops at the first failed write; the checks still run to completion
    let success = checker
        .run_checks(|outcome| {
            if write_error.is_none() {
                if let Err(e) = print_outcome(&mut out, &mut last_category, outcome) {
                    write_error = Some(e);
                }
            }
        })
        .await;

    if let Some(e) = write_error {
        return Err(e);
    }
    print_summary(&mut out, success)?;

    Ok(success)
}

/// Print one outcome, preceded by its category header when the category changes.
fn print_outcome<W: Write>(
    out: &mut W,
    last_category: &mut Option<String>,
    outcome: &LeafOutcome,
) -> io::Result<()> {
    // Sub-results ("category[subsystem]") stay under their parent header
    let header = outcome.category.split('[').next().unwrap_or_default();
    if last_category.as_deref() != Some(header) {
        if last_category.is_some() {
            writeln!(out)?;
        }
        writeln!(out, "{}", header)?;
        writeln!(out, "{}", "-".repeat(header.chars().count()))?;
        *last_category = Some(header.to_string());
    }
    writeln!(out, "{}", render(outcome))
}

fn print_summary<W: Write>(out: &mut W, success: bool) -> io::Result<()> {
    let mark = if success { OK_MARK } else { FAIL_MARK };
    writeln!(out, "\nStatus check results are {}", mark)?;
    out.flush()
}

fn render(outcome: &LeafOutcome) -> String {
    match &outcome.error {
        None => format!("{} {}", OK_MARK, outcome.description),
        Some(err) => format!("{} {}\n    {}", FAIL_MARK, outcome.description, err),
    }
}
