use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use conversor_api::models::{AppState, Conversion, ErrorBody, MessageBody};
use conversor_api::Config;
use conversor_api::storage::{ConversionStorage, MemoryStorage, MongoStorage, UnavailableStorage};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base: String,
    client: reqwest::Client,
}
impl TestServer {
    async fn spawn(storage: Arc<dyn ConversionStorage>) -> Result<Self> {
        Self::spawn_with_timeout(storage, Duration::from_secs(5)).await
    }
    async fn spawn_with_timeout(
        storage: Arc<dyn ConversionStorage>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let router = conversor_api::routes::init(AppState::new(storage), request_timeout);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });
        Ok(Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        })
    }
    fn conversions(&self) -> String {
        format!("{}/api/conversiones", self.base)
    }
    async fn list(&self) -> Result<Vec<Conversion>> {
        let response = self.client.get(self.conversions()).send().await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(response.json().await?)
    }
    async fn post(&self, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.conversions()).json(&body).send().await?)
    }
    async fn delete(&self) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.conversions()).send().await?)
    }
}

async fn in_memory() -> Result<TestServer> {
    TestServer::spawn(Arc::new(MemoryStorage::new())).await
}

#[tokio::test]
async fn test_round_trip() -> Result<()> {
    let server = in_memory().await?;
    let response = server
        .post(json!({
            "amount": 100,
            "from_currency": "USD",
            "to_currency": "EUR",
            "result": 92,
            "rate": 0.92
        }))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Conversion = response.json().await?;
    assert_eq!(created.amount, Some(100.0));
    assert_eq!(created.from_currency.as_deref(), Some("USD"));
    assert_eq!(created.to_currency.as_deref(), Some("EUR"));
    assert_eq!(created.result, Some(92.0));
    assert_eq!(created.rate, Some(0.92));
    assert!(!created.id.is_empty());

    let listed = server.list().await?;
    assert_eq!(listed, vec![created]);
    Ok(())
}

#[tokio::test]
async fn test_list_returns_ten_newest_first() -> Result<()> {
    let server = in_memory().await?;
    for day in 1..=12 {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
        let response = server
            .post(json!({ "amount": day, "timestamp": timestamp.to_rfc3339() }))
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let listed = server.list().await?;
    assert_eq!(listed.len(), 10);
    let amounts = listed.iter().filter_map(|c| c.amount).collect::<Vec<_>>();
    let expected = (3..=12u32).rev().map(f64::from).collect::<Vec<_>>();
    assert_eq!(amounts, expected);
    assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    Ok(())
}

#[tokio::test]
async fn test_fewer_than_ten_records() -> Result<()> {
    let server = in_memory().await?;
    for amount in [1, 2, 3] {
        server.post(json!({ "amount": amount })).await?;
    }
    assert_eq!(server.list().await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_delete_clears_history() -> Result<()> {
    let server = in_memory().await?;
    server.post(json!({ "amount": 1 })).await?;
    server.post(json!({ "amount": 2 })).await?;

    let response = server.delete().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageBody = response.json().await?;
    assert_eq!(body.message, "Historial limpiado");
    assert!(server.list().await?.is_empty());

    let response = server.delete().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageBody = response.json().await?;
    assert_eq!(body.message, "Historial limpiado");
    Ok(())
}

#[tokio::test]
async fn test_unknown_fields_are_dropped_and_timestamp_defaulted() -> Result<()> {
    let server = in_memory().await?;
    let before = Utc::now() - chrono::Duration::seconds(1);
    let response = server
        .post(json!({ "amount": "5", "comentario": "sin esquema", "rate": null }))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    let object = body.as_object().cloned().unwrap_or_default();
    assert!(!object.contains_key("comentario"));
    assert!(!object.contains_key("rate"));
    assert_eq!(object.get("amount"), Some(&json!(5.0)));

    let created: Conversion = serde_json::from_value(body)?;
    assert!(created.timestamp >= before);
    Ok(())
}

#[tokio::test]
async fn test_empty_body_creates_empty_record() -> Result<()> {
    let server = in_memory().await?;
    let response = server.client.post(server.conversions()).send().await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Conversion = response.json().await?;
    assert_eq!(created.amount, None);
    assert_eq!(server.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_uncastable_body_is_a_save_error() -> Result<()> {
    let server = in_memory().await?;
    for body in [json!({ "amount": "cien" }), json!([1, 2, 3])] {
        let response = server.post(body).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorBody = response.json().await?;
        assert_eq!(error.error, "Error al guardar conversión");
    }
    assert!(server.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() -> Result<()> {
    let server = in_memory().await?;
    let response = server
        .client
        .post(server.conversions())
        .header("content-type", "application/json")
        .body("{\"amount\": ")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_json_content_type_saves_empty_record() -> Result<()> {
    let server = in_memory().await?;
    let response = server
        .client
        .post(server.conversions())
        .header("content-type", "text/plain")
        .body("amount=100")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Conversion = response.json().await?;
    assert_eq!(created.amount, None);
    assert_eq!(server.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_top_level_scalar_is_a_bad_request() -> Result<()> {
    let server = in_memory().await?;
    for body in [json!("USD"), json!(42), json!(true)] {
        let response = server.post(body).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(server.list().await?.is_empty());
    Ok(())
}

async fn assert_store_errors(server: &TestServer) -> Result<()> {
    let response = server.client.get(server.conversions()).send().await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = response.json().await?;
    assert_eq!(error.error, "Error al obtener conversiones");

    let response = server.post(json!({ "amount": 1 })).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = response.json().await?;
    assert_eq!(error.error, "Error al guardar conversión");

    let response = server.delete().await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = response.json().await?;
    assert_eq!(error.error, "Error al limpiar historial");

    let health = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_unconfigured_store_fails_per_request() -> Result<()> {
    let server = TestServer::spawn(Arc::new(UnavailableStorage::new("sin MONGODB_URI"))).await?;
    assert_store_errors(&server).await
}

#[tokio::test]
async fn test_unreachable_mongo_fails_per_request() -> Result<()> {
    let storage =
        MongoStorage::connect("mongodb://127.0.0.1:1", "conversor", Duration::from_millis(200))
            .await?;
    let server = TestServer::spawn(Arc::new(storage)).await?;
    assert_store_errors(&server).await
}

#[tokio::test]
async fn test_unreachable_mongo_with_default_config() -> Result<()> {
    let config = Config::from_lookup(|_| None)?;
    let storage =
        MongoStorage::connect("mongodb://127.0.0.1:1", &config.mongodb_db, config.store_timeout)
            .await?;
    let server = TestServer::spawn_with_timeout(Arc::new(storage), config.request_timeout).await?;

    let (list, save, clear) = tokio::join!(
        server.client.get(server.conversions()).send(),
        server.post(json!({ "amount": 1 })),
        server.delete(),
    );
    for (response, message) in [
        (list?, "Error al obtener conversiones"),
        (save?, "Error al guardar conversión"),
        (clear?, "Error al limpiar historial"),
    ] {
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorBody = response.json().await?;
        assert_eq!(error.error, message);
    }
    Ok(())
}

#[tokio::test]
async fn test_any_origin_is_allowed() -> Result<()> {
    let server = in_memory().await?;
    let response = server
        .client
        .get(server.conversions())
        .header("origin", "http://localhost:5173")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok());
    assert_eq!(allowed, Some("*"));
    Ok(())
}
