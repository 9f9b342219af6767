//! Guru - teaching assistant API for multi-grade classrooms

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use guru_agent::backend::OpenAiBackend;
use guru_agent::{Coordinator, ExternalServices, LlmBackend};
use pedagogy::DifferentiationModel;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guru_server::auth::TokenAuth;
use guru_server::config::Args;
use guru_server::session::SessionStore;
use guru_server::{build_router, AppState};

/// How often expired sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("guru_server={log_level},guru_agent={log_level},pedagogy={log_level},info")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Guru - Multi-grade Teaching Assistant");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("LLM: {} ({})", args.llm_model, args.llm_base_url);
    info!("======================================");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(args.request_timeout_ms))
        .build()?;

    let backend: Arc<dyn LlmBackend> = Arc::new(
        OpenAiBackend::new(&args.llm_base_url, &args.llm_model, args.llm_api_key.clone())
            .with_client(client.clone()),
    );

    let services = match &args.google_api_key {
        Some(key) => ExternalServices::google_with_client(key, client),
        None => {
            warn!("GOOGLE_API_KEY not set (dev mode), using mock OCR, translation and speech");
            ExternalServices::mock()
        }
    };

    let mut differentiation = DifferentiationModel::new();
    if let Some(path) = &args.curriculum_file {
        differentiation = differentiation.load_rules_file(path)?;
    }

    let coordinator = Coordinator::new(vec![backend], services)
        .await
        .with_differentiation(differentiation);
    if let Some(timeout_ms) = args.capability_timeout_ms {
        coordinator.capabilities().set_timeout_all(timeout_ms).await;
        info!(timeout_ms, "Capability timeout overridden");
    }
    if !coordinator.has_backend().await {
        warn!("LLM backend not reachable at startup; requests will fall back to keyword routing");
    }

    let auth = TokenAuth::new(args.token_map().map_err(anyhow::Error::msg)?)
        .with_dev_mode(args.dev_mode);
    let state = Arc::new(
        AppState::new(coordinator, auth)
            .with_sessions(SessionStore::with_ttl(chrono::Duration::days(
                args.session_ttl_days,
            )))
            .with_max_image_bytes(args.max_image_bytes)
            .with_dev_mode(args.dev_mode),
    );

    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper.sessions.purge_expired();
            if removed > 0 {
                info!(removed, "Expired sessions purged");
            }
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Listening on {}", args.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
