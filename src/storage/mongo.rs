use std::time::Duration;

use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Conversion, NewConversion};
use crate::Result;

use super::{ConversionStorage, CONVERSION_COLLECTION};

const APP_NAME: &str = "conversor-api";

#[derive(Clone)]
pub struct MongoStorage {
    database: mongodb::Database,
}
impl MongoStorage {
    /// Interpreta la cadena de conexión y crea el cliente.
    ///
    /// El driver se conecta de forma perezosa: aquí no hay peticiones de red.
    /// `timeout` acota la selección de servidor y la conexión, también cuando
    /// la URI pide un valor mayor.
    pub async fn connect(uri: &str, database: &str, timeout: Duration) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(
            options
                .server_selection_timeout
                .map_or(timeout, |t| t.min(timeout)),
        );
        options.connect_timeout = Some(options.connect_timeout.map_or(timeout, |t| t.min(timeout)));
        let client = mongodb::Client::with_options(options)?;
        let database = client.database(database);
        Ok(Self { database })
    }
    /// Comprueba la conexión y crea el índice por fecha. Los fallos solo se registran.
    ///
    /// Sin respuesta al ping no se intenta el índice.
    pub async fn init(&self) {
        match self.ping().await {
            Ok(()) => info!("Conectado a MongoDB, base de datos '{}'", self.database.name()),
            Err(e) => {
                tracing::error!("Error MongoDB: {e:?}");
                return;
            }
        }
        let index = IndexModel::builder()
            .keys(doc! { "timestamp": -1 })
            .build();
        match self.collection().create_index(index).await {
            Ok(r) => info!("Índice por fecha en '{CONVERSION_COLLECTION}': {}", r.index_name),
            Err(e) => tracing::error!("No se pudo crear el índice por fecha: {e:?}"),
        }
    }
    fn collection(&self) -> Collection<ConversionDTO> {
        self.database.collection(CONVERSION_COLLECTION)
    }
}

#[async_trait::async_trait]
impl ConversionStorage for MongoStorage {
    async fn insert(&self, record: NewConversion) -> Result<Conversion> {
        let mut dto = ConversionDTO::from(record);
        let inserted = self.collection().insert_one(&dto).await?;
        dto.id = inserted.inserted_id.as_object_id();
        Ok(dto.into())
    }
    async fn list_recent(&self, limit: i64) -> Result<Vec<Conversion>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let mut cursor = self
            .collection()
            .find(doc! {})
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .limit(limit)
            .await?;
        let mut result = Vec::new();
        while let Some(item) = cursor.try_next().await? {
            result.push(item.into())
        }
        Ok(result)
    }
    async fn delete_all(&self) -> Result<u64> {
        let deleted = self.collection().delete_many(doc! {}).await?.deleted_count;
        info!("Eliminadas {deleted} conversiones del historial");
        Ok(deleted)
    }
    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversionDTO {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    timestamp: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<f64>,
}
impl From<NewConversion> for ConversionDTO {
    fn from(value: NewConversion) -> Self {
        let timestamp = value.timestamp.unwrap_or_else(chrono::Utc::now);
        Self {
            id: None,
            timestamp: bson::DateTime::from_chrono(timestamp),
            amount: value.amount,
            from_currency: value.from_currency,
            to_currency: value.to_currency,
            result: value.result,
            rate: value.rate,
        }
    }
}
impl From<ConversionDTO> for Conversion {
    fn from(value: ConversionDTO) -> Self {
        Self {
            id: value.id.map(|id| id.to_hex()).unwrap_or_default(),
            timestamp: value.timestamp.to_chrono(),
            amount: value.amount,
            from_currency: value.from_currency,
            to_currency: value.to_currency,
            result: value.result,
            rate: value.rate,
        }
    }
}
