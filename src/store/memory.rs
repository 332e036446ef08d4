use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    models::{NewSensorReading, SensorReading},
    SensorStore, SortOrder,
};

/// In-process `sensor_data` table with auto-incrementing ids.
///
/// Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Table>>,
}

#[derive(Default)]
struct Table {
    rows: Vec<SensorReading>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Store a row as-is, e.g. one with null columns.
    #[cfg(test)]
    pub async fn insert_row(&self, row: SensorReading) {
        let mut table = self.inner.write().await;
        table.next_id = table.next_id.max(row.id);
        table.rows.push(row);
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn insert(&self, reading: &NewSensorReading) -> Result<()> {
        let mut table = self.inner.write().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(reading.clone().into_reading(id));
        Ok(())
    }

    async fn select_ordered(
        &self,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<SensorReading>> {
        let mut rows = self.inner.read().await.rows.clone();
        // Ties on `time` fall back to insertion order.
        rows.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        if order == SortOrder::Descending {
            rows.reverse();
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64> {
        let mut table = self.inner.write().await;
        let before = table.rows.len();
        table.rows.retain(|r| r.id != id);
        Ok((before - table.rows.len()) as u64)
    }
}
