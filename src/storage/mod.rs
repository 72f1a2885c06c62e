mod memory;
mod mongo;

pub use memory::MemoryStorage;
pub use mongo::MongoStorage;

use crate::{
    models::{Conversion, NewConversion},
    AppError, Result,
};

pub const DATABASE: &str = "conversor";
pub const CONVERSION_COLLECTION: &str = "conversions";
/// Cuántas conversiones devuelve el listado
pub const RECENT_LIMIT: i64 = 10;

#[async_trait::async_trait]
pub trait ConversionStorage: Send + Sync {
    /// Guarda la conversión y la devuelve con su id y su fecha definitiva
    async fn insert(&self, record: NewConversion) -> Result<Conversion>;
    /// Las `limit` conversiones más recientes, de la más nueva a la más antigua
    async fn list_recent(&self, limit: i64) -> Result<Vec<Conversion>>;
    /// Borra todo el historial y devuelve cuántos registros se eliminaron
    async fn delete_all(&self) -> Result<u64>;
    async fn ping(&self) -> Result<()>;
}

/// Almacenamiento que no se pudo configurar al arrancar.
///
/// El proceso sigue escuchando y cada operación falla por separado.
pub struct UnavailableStorage {
    reason: String,
}
impl UnavailableStorage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
    fn error(&self) -> AppError {
        AppError::PersistenceError(format!("almacenamiento no disponible: {}", self.reason))
    }
}

#[async_trait::async_trait]
impl ConversionStorage for UnavailableStorage {
    async fn insert(&self, _record: NewConversion) -> Result<Conversion> {
        Err(self.error())
    }
    async fn list_recent(&self, _limit: i64) -> Result<Vec<Conversion>> {
        Err(self.error())
    }
    async fn delete_all(&self) -> Result<u64> {
        Err(self.error())
    }
    async fn ping(&self) -> Result<()> {
        Err(self.error())
    }
}
