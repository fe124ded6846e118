use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitup_api::config::ServerConfig;
use fitup_api::router::build_app_router;
use fitup_api::state::AppState;
use fitup_api::{background, ws};
use fitup_db::PgRepository;
use fitup_events::{EmailDelivery, InvitationMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitup_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = fitup_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fitup_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let repo = Arc::new(PgRepository::new(pool));

    // --- App state (services, hub, event bus) ---
    let state = AppState::new(repo, config.clone());
    state
        .repo
        .health_check()
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&state.hub), cancel.clone());

    let expiry_handle = tokio::spawn(background::invitation_expiry::run(
        Arc::clone(&state.services.coaching),
        cancel.clone(),
    ));

    let delivery = match config.email.clone().map(EmailDelivery::new).transpose() {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::error!(error = %e, "Email delivery unavailable; invitation links will be logged");
            None
        }
    };
    if delivery.is_none() {
        tracing::warn!("RESEND_API_KEY/EMAIL_FROM not set; invitation emails are disabled");
    }
    let mailer = InvitationMailer::new(delivery, config.frontend_url.clone());
    let mailer_handle = tokio::spawn(mailer.run(state.event_bus.subscribe(), cancel.clone()));

    tracing::info!("Background tasks started (heartbeat, invitation expiry, invitation mailer)");

    // --- Router ---
    let hub = Arc::clone(&state.hub);
    let app = build_app_router(state).expect("Invalid router configuration");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    for (name, handle) in [
        ("heartbeat", heartbeat_handle),
        ("invitation expiry", expiry_handle),
        ("invitation mailer", mailer_handle),
    ] {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            tracing::warn!(task = name, "Background task did not stop in time");
        }
    }

    let closed = hub
        .close_with_timeout(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    tracing::info!(closed, "Realtime connections closed");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
