pub mod memory;
pub mod models;
pub mod supabase;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, StoreBackend};

pub use memory::MemoryStore;
pub use models::{NewSensorReading, SensorReading};
pub use supabase::SupabaseStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_postgrest(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// The remote `sensor_data` table. Each call is a single request against
/// the store; nothing is cached locally.
#[async_trait]
pub trait SensorStore: Send + Sync {
    async fn insert(&self, reading: &NewSensorReading) -> Result<()>;

    /// Rows ordered by `time`, optionally capped at `limit`.
    async fn select_ordered(
        &self,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<SensorReading>>;

    /// Returns the number of rows removed.
    async fn delete_by_id(&self, id: i64) -> Result<u64>;
}

pub type DynStore = Arc<dyn SensorStore>;

pub fn from_config(config: &Config) -> Result<DynStore> {
    match config.store_backend {
        StoreBackend::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL is required for the supabase store")?;
            let key = config
                .supabase_key
                .as_deref()
                .context("SUPABASE_KEY is required for the supabase store")?;
            info!(url = %url, table = %config.supabase_table, "Using Supabase store");
            Ok(Arc::new(SupabaseStore::new(url, key, &config.supabase_table)?))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; readings are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
