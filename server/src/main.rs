use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use server::{
    config::{load_config, DEFAULT_CONFIG_PATH, TRACKS_FOLDER_ENV},
    routes,
    server_state::ServerState,
};
use track_viewer_data_management::DataManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "track_viewer")]
#[command(about = "Serves a folder of GPX tracks as maps, statistics and reports", long_about = None)]
struct Args {
    /// Folder containing the GPX files. Overrides the environment and the config file
    tracks_path: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log filter, e.g. `debug` or `server=trace`. Takes precedence over RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let file_layer = match &config.log_file {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info,track_viewer_data_management=info", env!("CARGO_CRATE_NAME")).into()
        }),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    tracing::info!("Starting server...");

    let tracks_folder = config.resolve_tracks_folder(args.tracks_path, std::env::var(TRACKS_FOLDER_ENV).ok())?;
    let data_manager = DataManager::load(&tracks_folder)
        .with_context(|| format!("Failed to load tracks from {}", tracks_folder.display()))?;

    let addr = format!("{}:{}", config.host, config.port);
    let server_state = Arc::new(ServerState::new(data_manager, config)?);
    let app = routes::router(server_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
