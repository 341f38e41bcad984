//! Enquiry Desk console binary.
//!
//! Serves the console on `CONSOLE_HOST:CONSOLE_PORT` (default
//! `127.0.0.1:3000`) and talks to the enquiry backend at `ENQUIRY_API_URL`.
//! HTTPS is served directly when `CONSOLE_TLS_CERT` and `CONSOLE_TLS_KEY`
//! are set.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use enquiry_desk_console::config::{ConsoleConfig, TlsConfig};
use enquiry_desk_console::notifications::spawn_pruner;
use enquiry_desk_console::state::AppState;

/// How often expired toasts and idle list views are purged.
const HOUSEKEEPING_PERIOD: Duration = Duration::from_secs(60);

/// Retained list views untouched this long are dropped.
const LIST_VIEW_IDLE: Duration = Duration::from_secs(60 * 60);

/// In-flight requests get this long to finish once a shutdown signal arrives.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ConsoleConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber: env filter, JSON or text output, Sentry.
fn init_tracing(json_logs: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "enquiry_desk_console=info,tower_http=debug".into());

    let json_layer =
        json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Periodically drop expired toasts and idle list views.
fn spawn_housekeeping(state: &AppState) {
    let _notifier_task = spawn_pruner(state.notifier().clone(), HOUSEKEEPING_PERIOD);

    let state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HOUSEKEEPING_PERIOD);
        loop {
            ticker.tick().await;
            let removed = state.prune_list_views(LIST_VIEW_IDLE);
            if removed > 0 {
                tracing::debug!(removed, "pruned idle list views");
            }
        }
    });
}

async fn serve_https(addr: SocketAddr, tls: &TlsConfig, app: Router) {
    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");

    let handle = Handle::new();
    let on_signal = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!(%addr, "console listening on https");
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}

async fn serve_http(addr: SocketAddr, app: Router) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!(%addr, "console listening on http");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

#[tokio::main]
async fn main() {
    // Must precede any TLS use, including the backend client.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = ConsoleConfig::from_env().expect("Failed to load configuration");

    // Before tracing, so the Sentry layer has a client.
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.json_logs);

    let state = AppState::new(config.clone()).expect("Failed to create application state");
    tracing::info!(backend = %state.api().base_url(), "backend configured");
    spawn_housekeeping(&state);

    let app = enquiry_desk_console::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    match &config.tls {
        Some(tls) => serve_https(addr, tls, app).await,
        None => serve_http(addr, app).await,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
