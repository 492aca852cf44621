mod auth;
mod config;
mod errors;
mod models;
mod render;
mod review;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{MemorySessions, RedisSessions};
use crate::config::{Config, RedisS3Config, StorageBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{memory, MemoryBlobs, MemoryKv, RedisKv, S3Blobs};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume review v{}", env!("CARGO_PKG_VERSION"));

    let state = build_state(config.clone()).await?;

    // Pages idle past the limit are torn down, releasing their object URLs
    state.viewers.clone().spawn_sweeper(config.page_idle);

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received ctrl+c, shutting down");
        })
        .await?;

    Ok(())
}

async fn build_state(config: Config) -> Result<AppState> {
    match &config.storage {
        StorageBackend::RedisS3(backend) => {
            let redis = redis::Client::open(backend.redis_url.clone())?;
            info!("Redis client initialized");

            let s3 = build_s3_client(backend).await;
            info!("S3 client initialized (bucket: {})", backend.s3_bucket);

            Ok(AppState::new(
                config.clone(),
                Arc::new(RedisKv::new(redis.clone())),
                Arc::new(S3Blobs::new(s3, backend.s3_bucket.clone())),
                Arc::new(RedisSessions::new(redis)),
            ))
        }
        StorageBackend::Memory { seed_file } => {
            let (kv, blobs, sessions) = match seed_file {
                Some(path) => {
                    let seeded = memory::load_seed(path).await?;
                    (seeded.kv, seeded.blobs, seeded.sessions)
                }
                None => (MemoryKv::default(), MemoryBlobs::default(), HashSet::new()),
            };
            info!("Using in-memory storage backend");

            Ok(AppState::new(
                config.clone(),
                Arc::new(kv),
                Arc::new(blobs),
                Arc::new(MemorySessions::new(sessions)),
            ))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &RedisS3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resume-review-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
