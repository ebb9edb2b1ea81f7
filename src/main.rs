use clap::Parser;
use dotenvy::dotenv;
use s3_upload_gateway::config::GatewayConfig;
use s3_upload_gateway::infrastructure::storage::S3Connector;
use s3_upload_gateway::services::backend::StoreHandle;
use s3_upload_gateway::{AppState, create_app};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the HTTP server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Directory with index.html and assets/ (overrides WEB_ROOT)
    #[arg(long)]
    web_root: Option<PathBuf>,

    /// Directory for staged uploads (overrides STAGING_DIR)
    #[arg(long)]
    staging_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine, the environment may already be populated.
    let dotenv_result = dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_upload_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv_result {
        warn!("No .env file loaded: {}", e);
    }

    info!("🚀 Starting S3 Upload Gateway...");

    let mut config = GatewayConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(web_root) = args.web_root {
        config.web_root = web_root;
    }
    if let Some(staging_dir) = args.staging_dir {
        config.staging_dir = staging_dir;
    }

    info!(
        "🛡️  Gateway Config: Max Form Size={}MB, Staging={}, Backend Timeout={}s",
        config.max_form_size / 1024 / 1024,
        config.staging_dir.display(),
        config.backend_timeout.as_secs()
    );

    // The S3 client connects lazily on the first request that needs it.
    let store = Arc::new(StoreHandle::new(Arc::new(S3Connector::new(
        config.s3.clone(),
    ))));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, store.clone());
    state.staging.prepare().await?;

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.teardown().await;
    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
