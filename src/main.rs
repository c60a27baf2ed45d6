use std::sync::atomic::{AtomicU32, Ordering};

use clap::Parser;
use feedline::api::start_api_server;
use feedline::config::Config;
use feedline::{in_memory, mongo};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static NUM: AtomicU32 = AtomicU32::new(0);

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!("cannot listen for shutdown signal: {}", e),
    }
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    let app = match config.mongo_uri {
        Some(ref uri) => {
            tracing::info!("using mongodb database `{}`", config.db_name);
            mongo(&config, uri).await?
        },
        None => {
            tracing::warn!("MONGO_URI is not set, falling back to in-memory repositories");
            in_memory(&config)
        },
    };

    start_api_server(&config, app, shutdown_signal()).await
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,feedline=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| format!("feedline-worker-{}", NUM.fetch_add(1, Ordering::SeqCst)))
        .build()
    {
        Ok(r) => r,
        Err(e) => return eprintln!("{}", e),
    };

    if let Err(e) = rt.block_on(async_main(config)) {
        tracing::error!("server stopped: {:?}", e);
        std::process::exit(1);
    }
}
