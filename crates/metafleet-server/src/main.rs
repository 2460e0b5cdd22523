use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use metafleet_auth::{
    AuthenticationOrchestrator, AuthorizationEvaluator, LoginFailureHandler, LoginSuccessHandler,
};
use metafleet_cache::{
    CredentialStore, InMemorySource, MetadataDispatcher, PasswordCipher, TenantCacheStore,
};
use metafleet_core::mode::{AuthenticationMode, DeploymentMode};

use metafleet_server::captcha::HttpCaptchaVerifier;
use metafleet_server::cli::{Cli, Command};
use metafleet_server::config::{AppConfig, LogFormat};
use metafleet_server::broadcast::InvalidationBroadcaster;
use metafleet_server::metrics::{self, Metrics};
use metafleet_server::observer::LoginObserver;
use metafleet_server::rest;
use metafleet_server::service::MetadataService;

#[cfg(feature = "telemetry")]
use metafleet_server::telemetry;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // OTel layer is typed to bare Registry, so it must be added first.
    let registry = tracing_subscriber::registry();

    #[cfg(feature = "telemetry")]
    let otel_provider = telemetry::init_telemetry(&config.tracing);

    #[cfg(feature = "telemetry")]
    let otel_layer = otel_provider.as_ref().map(telemetry::make_otel_layer);

    #[cfg(feature = "telemetry")]
    let registry = registry.with(otel_layer);

    let registry = registry.with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer().json();
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().pretty();
            registry.with(fmt_layer).init();
        }
    }

    // Keep the provider alive for the process lifetime; the runtime flushes
    // on exit.
    #[cfg(feature = "telemetry")]
    if let Some(provider) = otel_provider {
        std::mem::forget(provider);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::GenerateKey) => {
            println!("{}", PasswordCipher::generate_key());
            Ok(())
        }
        Some(Command::EncryptPassword { password }) => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let key = config
                .auth
                .cipher_key
                .as_deref()
                .ok_or("auth.cipher_key is not configured")?;
            let cipher = PasswordCipher::from_key_str(key)?;
            println!("{}", cipher.encrypt(&password)?);
            Ok(())
        }
        Some(Command::Serve) | None => {
            let config = AppConfig::load(cli.config.as_deref())?;
            init_logging(&config);
            run_serve(config).await
        }
    }
}

async fn run_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        http_addr = %config.http_addr(),
        node_address = %config.fleet.node_address,
        peers = config.fleet.peers.len(),
        "starting metafleet server"
    );

    let store = Arc::new(TenantCacheStore::new(InMemorySource::new()));
    let credentials = Arc::new(CredentialStore::new());
    let metrics = Arc::new(Metrics::new());

    let mut dispatcher =
        MetadataDispatcher::new(Arc::clone(&store), config.auth.mode);
    if config.auth.mode == AuthenticationMode::Local {
        // Presence is enforced by config validation in local mode.
        let key = config
            .auth
            .cipher_key
            .as_deref()
            .ok_or("auth.cipher_key is not configured")?;
        let cipher = PasswordCipher::from_key_str(key)?;
        dispatcher = dispatcher.with_credentials(Arc::clone(&credentials), cipher);
    }
    let dispatcher = Arc::new(dispatcher);

    let broadcaster = Arc::new(InvalidationBroadcaster::new(&config.fleet)?);
    tracing::info!(peer_count = broadcaster.peer_count(), "fleet broadcast configured");

    let service = Arc::new(MetadataService::new(
        dispatcher,
        broadcaster,
        Arc::clone(&metrics),
    ));

    let observer = Arc::new(LoginObserver::new(Arc::clone(&metrics)));
    let mut orchestrator = AuthenticationOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&credentials),
        config.auth.mode,
        config.auth.deployment,
    )
    .with_directory_authority(config.auth.directory_authority)
    .on_success(Arc::clone(&observer) as Arc<dyn LoginSuccessHandler>)
    .on_failure(observer as Arc<dyn LoginFailureHandler>);

    if config.auth.deployment == DeploymentMode::Hosted
        && let Some(url) = config.auth.captcha_url.clone()
    {
        let verifier = HttpCaptchaVerifier::new(url, config.auth.captcha_secret.clone())?;
        orchestrator = orchestrator.with_captcha(Arc::new(verifier));
    }

    let evaluator = Arc::new(
        AuthorizationEvaluator::new(Arc::clone(&store))
            .with_attributes(config.auth.principal_attributes())
            .with_directory_authority(config.auth.directory_authority),
    );

    let state = rest::AppState {
        service,
        orchestrator: Arc::new(orchestrator),
        evaluator,
        metrics: Arc::clone(&metrics),
    };
    let router = rest::create_router(state).route(
        "/metrics",
        axum::routing::get(metrics::metrics_handler).with_state(Arc::clone(&metrics)),
    );

    let addr: std::net::SocketAddr = config.http_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(());
    tokio::spawn(shutdown_signal(shutdown_tx));

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: tokio::sync::watch::Sender<()>) {
    let ctrl_c = tokio::signal::ctrl_c();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => { tracing::info!("received SIGINT"); }
                _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler, using SIGINT only");
            let _ = ctrl_c.await;
            tracing::info!("received SIGINT");
        }
    }

    let _ = shutdown_tx.send(());
}
