// Main entry point - Dependency injection, server setup and replay client
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::motor_service::MotorService;
use crate::application::observer::{BroadcastObserver, TracingObserver};
use crate::application::replay_service::ReplayService;
use crate::infrastructure::config::{load_app_config, AppConfig};
use crate::infrastructure::csv_sink::CsvSinkProvider;
use crate::infrastructure::http_client::HttpMotorClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    end_session, health_check, push_sample, start_session, stream_events,
};

const USAGE: &str = "usage: motor-telemetry [serve | replay <csv-path>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("replay") => {
            let Some(path) = args.get(1) else {
                anyhow::bail!(USAGE);
            };
            replay(config, PathBuf::from(path)).await
        }
        Some(other) => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    // Persistence (infrastructure layer)
    let sinks = Arc::new(CsvSinkProvider::new(config.storage.root.clone()));

    // Engine and its observers (application layer)
    let events = BroadcastObserver::new(256);
    let motor_service = Arc::new(
        MotorService::new(sinks)
            .with_observer(Arc::new(TracingObserver))
            .with_observer(Arc::new(events.clone())),
    );

    let state = Arc::new(AppState {
        motor_service,
        events,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/session/start", post(start_session))
        .route("/session/sample", post(push_sample))
        .route("/session/end", post(end_session))
        .route("/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!(
        %addr,
        storage = %config.storage.root.display(),
        "PMSM motor monitoring server listening"
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}

async fn replay(config: AppConfig, csv_path: PathBuf) -> anyhow::Result<()> {
    if !csv_path.is_file() {
        anyhow::bail!("motor CSV not found: {}", csv_path.display());
    }

    let client = Arc::new(HttpMotorClient::new(config.replay.server_url.clone()));
    let service = ReplayService::new(client, config.replay.max_samples, config.replay.reject_dir);
    let session = config
        .thresholds
        .session_config(Uuid::new_v4().simple().to_string());

    let report = service.replay(&csv_path, session).await?;
    println!(
        "Motor session {} finished: {:?}\nLoaded={}, Success={}, Failed={}, Accepted={}, Rejected={}\nRejects: {}",
        report.session_id,
        report.end_status,
        report.loaded,
        report.successful,
        report.failed,
        report.accepted,
        report.rejected,
        report.reject_log.display()
    );
    Ok(())
}
