//! Application state for bookstore-server

use std::path::Path;
use std::sync::Arc;

use shared::models::BookUpsert;

use crate::config::{Config, StorageBackend};
use crate::db::PgStorage;
use crate::embedded::EmbeddedStorage;
use crate::orders::OrderService;
use crate::storage::{InventoryLedger, Storage};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// File name of the embedded database inside `DATA_DIR`
const EMBEDDED_DB_FILE: &str = "bookstore.redb";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Order workflow over the configured backend
    pub orders: Arc<OrderService<Storage>>,
    /// JWT secret for user authentication
    pub jwt_secret: String,
}

impl AppState {
    /// Open the configured backend and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let storage: Storage = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set for the postgres backend")?;
                PgStorage::connect(url, config.database_max_connections)
                    .await?
                    .with_tx_timeout_ms(config.pay_timeout_ms)
                    .into()
            }
            StorageBackend::Embedded => {
                std::fs::create_dir_all(&config.data_dir)?;
                let path = config.data_dir.join(EMBEDDED_DB_FILE);
                tracing::info!(path = %path.display(), "Opening embedded database");
                EmbeddedStorage::open(path)?.into()
            }
        };
        tracing::info!(backend = storage.backend_name(), "Storage ready");

        if let Some(seed_file) = &config.books_seed_file {
            let count = seed_books(&storage, seed_file).await?;
            tracing::info!(count, file = %seed_file.display(), "Seeded books");
        }

        Ok(Self::with_storage(
            storage,
            config.pay_timeout(),
            config.jwt_secret.clone(),
        ))
    }

    /// Build state over an already opened backend
    pub fn with_storage(
        storage: Storage,
        pay_timeout: std::time::Duration,
        jwt_secret: impl Into<String>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(storage, pay_timeout)),
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Upsert every book listed in a JSON seed file
async fn seed_books(storage: &Storage, path: &Path) -> Result<usize, BoxError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let books: Vec<BookUpsert> = serde_json::from_str(&raw)?;
    let count = books.len();
    for book in books {
        storage.upsert_book(book).await?;
    }
    Ok(count)
}
