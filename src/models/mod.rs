mod conversion;
use std::sync::Arc;

pub use conversion::*;

use crate::storage::ConversionStorage;

/// Datos compartidos por los manejadores: el cliente del almacenamiento creado al arrancar
#[derive(Clone)]
pub struct AppState {
    pub conversion_storage: Arc<dyn ConversionStorage>,
}
impl AppState {
    pub fn new(conversion_storage: Arc<dyn ConversionStorage>) -> Self {
        Self { conversion_storage }
    }
}
