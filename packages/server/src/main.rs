use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use common::BlobStore;
use tracing::{Level, info};

use hunarkart::config::{AppConfig, StorageBackend, StorageConfig};
use hunarkart::services::media::MediaService;
use hunarkart::state::AppState;
use hunarkart::{build_router, database, seed};

async fn build_blob_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match storage.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(
                storage.root.clone(),
                storage.public_base_url.clone(),
                storage.max_upload_size,
            )
            .await
            .with_context(|| format!("failed to open blob root {}", storage.root.display()))?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let settings = storage
                .s3
                .as_ref()
                .context("storage.s3 must be set when storage.backend = \"s3\"")?;
            let store = common::storage::s3::S3BlobStore::new(
                settings,
                storage.public_base_url.clone(),
                storage.max_upload_size,
            )?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => {
            anyhow::bail!("the s3 storage backend requires the `object-storage` feature")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    let level: Level = config.log.level.parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = database::init_db(&config.database)
        .await
        .context("failed to initialise database")?;
    seed::ensure_indexes(&db).await?;

    tokio::fs::create_dir_all(&config.storage.upload_tmp_dir)
        .await
        .context("failed to create upload staging directory")?;
    let store = build_blob_store(&config.storage).await?;
    let media = MediaService::new(
        store,
        config.storage.upload_tmp_dir.clone(),
        config.storage.max_upload_size,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        media,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("HunarKart back-office listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
