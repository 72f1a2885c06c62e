use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppError, Result};

// fechas sin zona horaria, interpretadas en UTC
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Registro de conversión tal como lo devuelve la API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

/// Conversión enviada por el cliente, antes de guardarla.
///
/// Se construye a partir de un JSON arbitrario con las mismas reglas de
/// conversión de tipos que aplica el esquema del almacén: las claves
/// desconocidas se descartan, `null` equivale a un campo ausente y un valor
/// que no se puede convertir rechaza toda la escritura.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewConversion {
    pub timestamp: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub result: Option<f64>,
    pub rate: Option<f64>,
}

impl TryFrom<Value> for NewConversion {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(cast_error("documento", &value));
        };
        Ok(Self {
            timestamp: coerce_timestamp(&fields)?,
            amount: coerce_number(&fields, "amount")?,
            from_currency: coerce_string(&fields, "from_currency")?,
            to_currency: coerce_string(&fields, "to_currency")?,
            result: coerce_number(&fields, "result")?,
            rate: coerce_number(&fields, "rate")?,
        })
    }
}

/// Cuerpo de las respuestas de error: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Cuerpo de las respuestas informativas: `{"message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}
impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn cast_error(field: &str, value: &Value) -> AppError {
    AppError::PersistenceError(format!(
        "no se pudo convertir el valor {value} del campo '{field}'"
    ))
}

fn present<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    fields.get(field).filter(|v| !v.is_null())
}

fn coerce_number(fields: &Map<String, Value>, field: &str) -> Result<Option<f64>> {
    let Some(value) = present(fields, field) else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| cast_error(field, value)),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| cast_error(field, value)),
        _ => Err(cast_error(field, value)),
    }
}

fn coerce_string(fields: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    let Some(value) = present(fields, field) else {
        return Ok(None);
    };
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(cast_error(field, value)),
    }
}

fn coerce_timestamp(fields: &Map<String, Value>) -> Result<Option<DateTime<Utc>>> {
    let field = "timestamp";
    let Some(value) = present(fields, field) else {
        return Ok(None);
    };
    match value {
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(Some(dt.with_timezone(&Utc)));
            }
            if let Some(dt) = NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
            {
                return Ok(Some(dt.and_utc()));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Some(dt.and_utc()))
                .ok_or_else(|| cast_error(field, value))
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| cast_error(field, value)),
        _ => Err(cast_error(field, value)),
    }
}
