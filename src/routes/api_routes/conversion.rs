use crate::models::{AppState, Conversion, ErrorBody, MessageBody, NewConversion};
use crate::storage::{ConversionStorage, RECENT_LIMIT};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde_json::Value;

const LIST_ERROR: &str = "Error al obtener conversiones";
const SAVE_ERROR: &str = "Error al guardar conversión";
const CLEAR_ERROR: &str = "Error al limpiar historial";
const CLEARED: &str = "Historial limpiado";
const INVALID_JSON: &str = "JSON inválido";

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.conversion_storage.list_recent(RECENT_LIMIT).await {
        Ok(conversions) => (StatusCode::OK, Json(conversions)).into_response(),
        Err(err) => {
            tracing::error!("{LIST_ERROR}: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(LIST_ERROR))).into_response()
        }
    }
}

/// Cualquier objeto JSON se acepta tal cual; el esquema decide qué se guarda.
///
/// Un cuerpo sin `Content-Type: application/json` no se lee y se guarda un
/// registro vacío.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let value = match parse_body(is_json(&headers), &body) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("{INVALID_JSON}: {err}");
            return (StatusCode::BAD_REQUEST, Json(ErrorBody::new(INVALID_JSON))).into_response();
        }
    };
    match save(state.conversion_storage.as_ref(), value).await {
        Ok(conversion) => (StatusCode::CREATED, Json(conversion)).into_response(),
        Err(err) => {
            tracing::error!("{SAVE_ERROR}: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(SAVE_ERROR))).into_response()
        }
    }
}

pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    match state.conversion_storage.delete_all().await {
        Ok(_) => (StatusCode::OK, Json(MessageBody::new(CLEARED))).into_response(),
        Err(err) => {
            tracing::error!("{CLEAR_ERROR}: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(CLEAR_ERROR))).into_response()
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

// solo objetos y arrays en la raíz; cuerpo vacío = documento vacío
fn parse_body(json: bool, body: &[u8]) -> Result<Value, String> {
    if !json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        Ok(value) => Err(format!("se esperaba un objeto o un array, llegó {value}")),
        Err(e) => Err(e.to_string()),
    }
}

async fn save(storage: &dyn ConversionStorage, value: Value) -> crate::Result<Conversion> {
    let record = NewConversion::try_from(value)?;
    storage.insert(record).await
}
