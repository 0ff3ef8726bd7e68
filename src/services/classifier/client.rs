use crate::error::AppError;
use crate::models::classify_types::{
    HealthReport, ModelInfo, ModelStatus, PredictionRecord, RawResult, GENERIC_FAILURE,
};
use crate::models::file_types::CandidateFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("xray-lens/", env!("CARGO_PKG_VERSION"));
/// Multipart field shared by every uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// The remote classification service.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn health(&self) -> Result<HealthReport, AppError>;

    async fn model_info(&self) -> Result<ModelInfo, AppError>;

    /// One result per submitted file, in submission order.
    async fn predict(&self, files: &[CandidateFile]) -> Result<Vec<RawResult>, AppError>;
}

pub fn model_status(probe: &Result<HealthReport, AppError>) -> ModelStatus {
    match probe {
        Ok(report) if report.model_loaded => ModelStatus::Ready,
        Ok(_) => ModelStatus::NotLoaded,
        Err(_) => ModelStatus::Offline,
    }
}

pub struct HttpPredictionService {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPredictionService {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn health(&self) -> Result<HealthReport, AppError> {
        let report: HealthReport = self
            .http_client
            .get(self.endpoint("health"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(model_loaded = report.model_loaded, "Health probe answered");
        Ok(report)
    }

    async fn model_info(&self) -> Result<ModelInfo, AppError> {
        let response = self.http_client.get(self.endpoint("model-info")).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Service(service_error_text(&body)));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn predict(&self, files: &[CandidateFile]) -> Result<Vec<RawResult>, AppError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes().to_vec())
                .file_name(file.name().to_string())
                .mime_str(file.media_type())?;
            form = form.part(UPLOAD_FIELD, part);
        }

        debug!(files = files.len(), url = %self.endpoint("predict"), "Posting prediction request");

        let response = self
            .http_client
            .post(self.endpoint("predict"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let results = parse_predict_response(status, &body)?;

        if results.len() != files.len() {
            warn!(
                submitted = files.len(),
                received = results.len(),
                "Service returned a different number of results than files submitted"
            );
        }

        info!(results = results.len(), "Prediction response received");
        Ok(results)
    }
}

/// Turn a `/predict` answer into per-file results.
///
/// The body is either a single result object or `{ predictions: [...] }`.
/// A non-2xx status or a top-level `success: false` fails the whole request.
pub fn parse_predict_response(status: u16, body: &str) -> Result<Vec<RawResult>, AppError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        AppError::Transport(format!("Malformed response (HTTP {}): {}", status, e))
    })?;

    if !(200..300).contains(&status) {
        return Err(AppError::Service(error_text(&value)));
    }

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AppError::Service(error_text(&value)));
    }

    match value.get("predictions") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                serde_json::from_value::<PredictionRecord>(item.clone())
                    .map(RawResult::from)
                    .map_err(AppError::from)
            })
            .collect(),
        Some(_) => Err(AppError::Transport(
            "Malformed response: predictions is not a list".to_string(),
        )),
        None => {
            let record: PredictionRecord = serde_json::from_value(value)?;
            Ok(vec![RawResult::from(record)])
        }
    }
}

fn error_text(value: &Value) -> String {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(GENERIC_FAILURE)
        .to_string()
}

fn service_error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .map(|v| error_text(&v))
        .unwrap_or_else(|_| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_result_is_normalized_to_a_list() {
        let body = r#"{
            "success": true,
            "predicted_class": "Normal",
            "confidence": 0.92,
            "confidence_percentage": "92.00%",
            "interpretation": "No abnormality detected.",
            "all_probabilities": {"Tuberculosis": 0.05, "Normal": 0.92, "Covid-19": 0.03},
            "filename": "scan.png"
        }"#;

        let results = parse_predict_response(200, body).unwrap();
        assert_eq!(results.len(), 1);
        match &results[0] {
            RawResult::Success(s) => {
                assert_eq!(s.predicted_class, "Normal");
                assert_eq!(s.filename.as_deref(), Some("scan.png"));
                let labels: Vec<_> = s.all_probabilities.iter().map(|(l, _)| l.as_str()).collect();
                assert_eq!(labels, ["Tuberculosis", "Normal", "Covid-19"]);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn batch_keeps_per_item_failures_inline() {
        let body = r#"{
            "success": true,
            "count": 2,
            "predictions": [
                {"success": true, "predicted_class": "Emphysema", "confidence": 0.7},
                {"success": false, "filename": "x.gif", "error": "Invalid file type."}
            ]
        }"#;

        let results = parse_predict_response(200, body).unwrap();
        assert_eq!(results.len(), 2);
        match &results[0] {
            RawResult::Success(s) => assert_eq!(s.confidence_percentage, "70.00%"),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(
            results[1],
            RawResult::Failure {
                filename: Some("x.gif".to_string()),
                error: "Invalid file type.".to_string()
            }
        );
    }

    #[test]
    fn non_2xx_uses_service_error_text() {
        let body = r#"{"success": false, "error": "bad image"}"#;
        let err = parse_predict_response(400, body).unwrap_err();
        assert!(matches!(&err, AppError::Service(msg) if msg == "bad image"));
    }

    #[test]
    fn non_2xx_without_error_text_uses_fallback() {
        let err = parse_predict_response(500, "{}").unwrap_err();
        assert_eq!(err.message(), GENERIC_FAILURE);
    }

    #[test]
    fn top_level_success_false_fails_even_with_200() {
        let body = r#"{"success": false, "error": "Model not loaded"}"#;
        let err = parse_predict_response(200, body).unwrap_err();
        assert!(matches!(err, AppError::Service(_)));
    }

    #[test]
    fn malformed_body_is_a_transport_error() {
        let err = parse_predict_response(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn success_without_class_becomes_item_failure() {
        let results = parse_predict_response(200, r#"{"success": true}"#).unwrap();
        assert!(matches!(results[0], RawResult::Failure { .. }));
    }

    #[test]
    fn health_probe_maps_to_three_states() {
        let report = |loaded| HealthReport {
            model_loaded: loaded,
            status: Some("healthy".to_string()),
            service: None,
            version: None,
        };
        assert_eq!(model_status(&Ok(report(true))), ModelStatus::Ready);
        assert_eq!(model_status(&Ok(report(false))), ModelStatus::NotLoaded);
        assert_eq!(
            model_status(&Err(AppError::Transport("connection refused".to_string()))),
            ModelStatus::Offline
        );
    }
}
