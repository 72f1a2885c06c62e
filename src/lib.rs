pub mod config;
mod error;
use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result};
use models::AppState;
use storage::{ConversionStorage, MongoStorage, UnavailableStorage};
pub mod log;
pub mod models;
pub mod routes;
pub mod storage;

pub struct ConversorService {
    config: Config,
}
impl ConversorService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
    /// Crea el cliente del almacenamiento y espera al primer intento de conexión.
    ///
    /// Si la conexión no se puede ni configurar, el servicio sigue en pie con un
    /// almacenamiento que falla en cada petición.
    pub async fn storage(&self) -> Arc<dyn ConversionStorage> {
        let Some(uri) = self.config.mongodb_uri.as_deref() else {
            tracing::error!("Error MongoDB: MONGODB_URI no está definida");
            return Arc::new(UnavailableStorage::new("MONGODB_URI no está definida"));
        };
        let storage: Arc<dyn ConversionStorage> =
            match MongoStorage::connect(uri, &self.config.mongodb_db, self.config.store_timeout)
                .await
            {
                Ok(storage) => {
                    storage.init().await;
                    Arc::new(storage)
                }
                Err(e) => {
                    tracing::error!("Error MongoDB: {e:?}");
                    Arc::new(UnavailableStorage::new(e.to_string()))
                }
            };
        storage
    }
    pub async fn run(&self) -> Result<()> {
        let storage = self.storage().await;
        let state = AppState::new(storage);
        let router = routes::init(state, self.config.request_timeout);
        let listener = tokio::net::TcpListener::bind(self.config.addr()).await?;
        tracing::info!("Servidor corriendo en http://{}", listener.local_addr()?);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("Servidor detenido");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("No se pudo escuchar la señal de parada: {e:?}");
        std::future::pending::<()>().await;
    }
}
