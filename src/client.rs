//! HTTP client for the external prediction service.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::forecast::RawForecast;
use crate::logging::log_request;

pub const PREDICT_PATH: &str = "/api/predict";
pub const MODEL_INFO_PATH: &str = "/api/model/info";
pub const HEALTH_PATH: &str = "/api/health";

/// A failed forecast request. `Display` is the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// Error text reported by the service in its JSON body
    #[error("{0}")]
    Server(String),
    /// Transport or HTTP status failure without a usable server message
    #[error("{0}")]
    Transport(String),
    /// Successful round trip whose body carries no predictions
    #[error("Invalid response format")]
    InvalidResponse,
    #[error("Failed to generate predictions")]
    Unknown,
}

impl RequestFailure {
    fn transport(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.trim().is_empty() {
            RequestFailure::Unknown
        } else {
            RequestFailure::Transport(msg)
        }
    }
}

/// Model confidence as reported alongside a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub score: f64,
    pub level: String,
    pub explanation: String,
}

impl Confidence {
    pub fn is_high(&self) -> bool {
        self.score >= 90.0
    }
}

/// A successful forecast response.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub predictions: RawForecast,
    pub scenario: Option<String>,
    pub confidence: Option<Confidence>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(rename = "n_route")]
    pub route_count: u32,
    #[serde(rename = "n_his")]
    pub history_window: u32,
    #[serde(rename = "n_pred")]
    pub prediction_horizon: u32,
    pub batch_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(rename = "model_name")]
    pub name: String,
    pub description: String,
    #[serde(rename = "model_loaded")]
    pub is_loaded: bool,
    pub parameters: ModelParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}

#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// One outbound prediction request. No retries.
    async fn request_forecast(&self) -> Result<Forecast, RequestFailure>;
    async fn model_info(&self) -> Result<ModelDescriptor>;
    async fn health(&self) -> Result<HealthStatus>;
}

pub struct ForecastClient {
    client: Client,
    predict_url: Url,
    model_info_url: Url,
    health_url: Url,
}

impl ForecastClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            predict_url: cfg.endpoint(PREDICT_PATH)?,
            model_info_url: cfg.endpoint(MODEL_INFO_PATH)?,
            health_url: cfg.endpoint(HEALTH_PATH)?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url, path: &str) -> Result<T> {
        let started = Instant::now();
        let resp = self.client.get(url.clone()).send().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                log_request(path, None, elapsed_ms, false);
                return Err(e.into());
            }
        };
        let status = resp.status();
        log_request(path, Some(status.as_u16()), elapsed_ms, status.is_success());
        Ok(resp.error_for_status()?.json::<T>().await?)
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn request_forecast(&self) -> Result<Forecast, RequestFailure> {
        let started = Instant::now();
        let sent = self
            .client
            .post(self.predict_url.clone())
            .json(&json!({}))
            .send()
            .await;
        let resp = match sent {
            Ok(r) => r,
            Err(e) => {
                log_request(PREDICT_PATH, None, started.elapsed().as_secs_f64() * 1000.0, false);
                return Err(RequestFailure::transport(e.to_string()));
            }
        };
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RequestFailure::transport(e.to_string()))?;
        log_request(
            PREDICT_PATH,
            Some(status.as_u16()),
            started.elapsed().as_secs_f64() * 1000.0,
            status.is_success(),
        );

        if !status.is_success() {
            return Err(failure_from_error_body(status.as_u16(), &body));
        }
        parse_forecast_body(&body)
    }

    async fn model_info(&self) -> Result<ModelDescriptor> {
        self.get_json(&self.model_info_url, MODEL_INFO_PATH).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.get_json(&self.health_url, HEALTH_PATH).await
    }
}

/// Failure for a non-2xx response: the body's `error` string when present,
/// else a generic status message.
pub fn failure_from_error_body(status: u16, body: &str) -> RequestFailure {
    let server_msg = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty());
    match server_msg {
        Some(msg) => RequestFailure::Server(msg),
        None => RequestFailure::transport(format!("Request failed with status code {}", status)),
    }
}

/// Validate a 2xx body. `predictions` must be present and truthy; optional
/// fields that fail to decode are dropped.
pub fn parse_forecast_body(body: &str) -> Result<Forecast, RequestFailure> {
    let value: Value = serde_json::from_str(body).map_err(|_| RequestFailure::InvalidResponse)?;
    let predictions = match value.get("predictions") {
        Some(p) if is_truthy(p) => RawForecast::from(p),
        _ => return Err(RequestFailure::InvalidResponse),
    };
    let non_empty_str = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let confidence = value
        .get("confidence")
        .cloned()
        .and_then(|c| serde_json::from_value::<Confidence>(c).ok());

    Ok(Forecast {
        predictions,
        scenario: non_empty_str("scenario"),
        confidence,
        message: non_empty_str("message"),
    })
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message_wins() {
        let f = failure_from_error_body(500, r#"{"error": "model unavailable"}"#);
        assert_eq!(f.to_string(), "model unavailable");
        assert_eq!(f, RequestFailure::Server("model unavailable".into()));
    }

    #[test]
    fn test_status_message_without_error_field() {
        let f = failure_from_error_body(502, "<html>bad gateway</html>");
        assert_eq!(f.to_string(), "Request failed with status code 502");
        let f = failure_from_error_body(500, r#"{"error": ""}"#);
        assert_eq!(f.to_string(), "Request failed with status code 500");
        let f = failure_from_error_body(500, r#"{"error": {"code": 1}}"#);
        assert_eq!(f.to_string(), "Request failed with status code 500");
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(RequestFailure::transport("  ").to_string(), "Failed to generate predictions");
    }

    #[test]
    fn test_missing_predictions_is_invalid() {
        for body in [
            r#"{"message": "ok"}"#,
            r#"{"predictions": null}"#,
            r#"{"predictions": 0}"#,
            r#"{"predictions": ""}"#,
            "not json",
        ] {
            assert_eq!(parse_forecast_body(body), Err(RequestFailure::InvalidResponse), "{}", body);
        }
        assert_eq!(RequestFailure::InvalidResponse.to_string(), "Invalid response format");
    }

    #[test]
    fn test_full_body_passes_through() {
        let body = r#"{
            "predictions": [[[0.1], [0.2]]],
            "message": "Prediction successful",
            "scenario": "Light Traffic Scenario",
            "confidence": {"score": 93, "level": "High", "explanation": "MAPE 5.2-8.8%"}
        }"#;
        let f = parse_forecast_body(body).unwrap();
        assert_eq!(f.predictions.len(), 1);
        assert_eq!(f.scenario.as_deref(), Some("Light Traffic Scenario"));
        assert_eq!(f.message.as_deref(), Some("Prediction successful"));
        let c = f.confidence.unwrap();
        assert_eq!(c.score, 93.0);
        assert!(c.is_high());
    }

    #[test]
    fn test_empty_predictions_array_is_valid() {
        let f = parse_forecast_body(r#"{"predictions": []}"#).unwrap();
        assert!(f.predictions.is_empty());
        assert!(f.scenario.is_none());
        assert!(f.confidence.is_none());
    }

    #[test]
    fn test_malformed_confidence_is_dropped() {
        let f = parse_forecast_body(r#"{"predictions": [[1]], "confidence": {"score": "high"}}"#).unwrap();
        assert!(f.confidence.is_none());
    }

    #[test]
    fn test_model_descriptor_wire_names() {
        let d: ModelDescriptor = serde_json::from_str(
            r#"{"model_name": "STGCN", "description": "graph conv", "model_loaded": true,
                "parameters": {"n_route": 228, "n_his": 12, "n_pred": 9, "batch_size": 50}}"#,
        )
        .unwrap();
        assert_eq!(d.name, "STGCN");
        assert!(d.is_loaded);
        assert_eq!(d.parameters.route_count, 228);
        assert_eq!(d.parameters.history_window, 12);
        assert_eq!(d.parameters.prediction_horizon, 9);
    }
}
