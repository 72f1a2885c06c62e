use bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::models::{Conversion, NewConversion};
use crate::Result;

use super::ConversionStorage;

/// Historial en memoria con la misma semántica que la colección de MongoDB
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<Conversion>>,
}
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConversionStorage for MemoryStorage {
    async fn insert(&self, record: NewConversion) -> Result<Conversion> {
        let timestamp = record.timestamp.unwrap_or_else(chrono::Utc::now);
        // la misma precisión que un Date de BSON
        let timestamp = bson::DateTime::from_chrono(timestamp).to_chrono();
        let conversion = Conversion {
            id: ObjectId::new().to_hex(),
            timestamp,
            amount: record.amount,
            from_currency: record.from_currency,
            to_currency: record.to_currency,
            result: record.result,
            rate: record.rate,
        };
        self.records.write().await.push(conversion.clone());
        Ok(conversion)
    }
    async fn list_recent(&self, limit: i64) -> Result<Vec<Conversion>> {
        let mut result = self.records.read().await.clone();
        result.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        result.truncate(usize::try_from(limit).unwrap_or_default());
        Ok(result)
    }
    async fn delete_all(&self) -> Result<u64> {
        let mut records = self.records.write().await;
        let deleted = records.len() as u64;
        records.clear();
        tracing::info!("Eliminadas {deleted} conversiones del historial");
        Ok(deleted)
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
