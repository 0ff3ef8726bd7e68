//! `HttpPredictionService` against a local axum server speaking the
//! classification API.

mod common;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{jpeg, png};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use xray_lens_lib::config::ClientConfig;
use xray_lens_lib::error::AppError;
use xray_lens_lib::models::classify_types::{ModelStatus, RawResult};
use xray_lens_lib::models::session_types::SessionStatus;
use xray_lens_lib::services::classifier::client::{
    model_status, HttpPredictionService, PredictionService,
};
use xray_lens_lib::services::workbench::Workbench;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> HttpPredictionService {
    HttpPredictionService::new(&format!("http://{}/api/", addr)).unwrap()
}

fn healthy(model_loaded: bool) -> Router {
    Router::new().route(
        "/api/health",
        get(move || async move {
            Json(json!({
                "status": "healthy",
                "service": "Chest X-Ray Prediction API",
                "model_loaded": model_loaded,
                "version": "1.0.0"
            }))
        }),
    )
}

#[tokio::test]
async fn health_reports_model_state() {
    let ready = client(serve(healthy(true)).await);
    let report = ready.health().await.unwrap();
    assert!(report.model_loaded);
    assert_eq!(report.version.as_deref(), Some("1.0.0"));
    assert_eq!(model_status(&Ok(report)), ModelStatus::Ready);

    let not_loaded = client(serve(healthy(false)).await);
    assert_eq!(model_status(&not_loaded.health().await), ModelStatus::NotLoaded);
}

#[tokio::test]
async fn unreachable_service_is_offline() {
    // Bind then release a port so nothing is listening on it.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let probe = client(addr).health().await;
    assert!(matches!(probe, Err(AppError::Transport(_))));
    assert_eq!(model_status(&probe), ModelStatus::Offline);
}

#[tokio::test]
async fn predict_uploads_every_file_under_one_field() {
    let seen: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let app = Router::new().route(
        "/api/predict",
        post({
            let seen = seen.clone();
            move |body: Bytes| async move {
                *seen.lock().unwrap() = Some(body.to_vec());
                Json(json!({
                    "success": true,
                    "count": 2,
                    "predictions": [
                        {
                            "success": true,
                            "filename": "first.png",
                            "predicted_class": "Covid-19",
                            "confidence": 0.81,
                            "confidence_percentage": "81.00%",
                            "interpretation": "Signs consistent with COVID-19.",
                            "all_probabilities": {"Covid-19": 0.81, "Normal": 0.19}
                        },
                        {
                            "success": false,
                            "filename": "second.jpg",
                            "error": "Could not read image"
                        }
                    ]
                }))
            }
        }),
    );
    let service = client(serve(app).await);

    let results = service.predict(&[png("first.png"), jpeg("second.jpg")]).await.unwrap();
    assert_eq!(results.len(), 2);
    match &results[0] {
        RawResult::Success(s) => {
            assert_eq!(s.predicted_class, "Covid-19");
            let labels: Vec<_> = s.all_probabilities.iter().map(|(l, _)| l.as_str()).collect();
            assert_eq!(labels, ["Covid-19", "Normal"]);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert!(matches!(
        &results[1],
        RawResult::Failure { error, .. } if error == "Could not read image"
    ));

    let body = seen.lock().unwrap().take().unwrap();
    let body = String::from_utf8_lossy(&body);
    assert_eq!(body.matches("name=\"file\"").count(), 2);
    let first = body.find("filename=\"first.png\"").unwrap();
    let second = body.find("filename=\"second.jpg\"").unwrap();
    assert!(first < second);
    let lowered = body.to_lowercase();
    assert!(lowered.contains("content-type: image/png"));
    assert!(lowered.contains("content-type: image/jpeg"));
}

#[tokio::test]
async fn single_object_response_is_one_result() {
    let app = Router::new().route(
        "/api/predict",
        post(|| async {
            Json(json!({
                "success": true,
                "filename": "only.png",
                "predicted_class": "Normal",
                "confidence": 0.97,
                "confidence_percentage": "97.00%",
                "interpretation": "No signs of disease.",
                "all_probabilities": {"Normal": 0.97}
            }))
        }),
    );
    let results = client(serve(app).await).predict(&[png("only.png")]).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        RawResult::Success(s) if s.filename.as_deref() == Some("only.png")
    ));
}

#[tokio::test]
async fn unavailable_model_fails_the_session() {
    let app = Router::new().route(
        "/api/predict",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"success": false, "error": "Model not loaded"})),
            )
        }),
    );
    let addr = serve(app).await;

    let err = client(addr).predict(&[png("a.png")]).await.unwrap_err();
    assert!(matches!(&err, AppError::Service(msg) if msg == "Model not loaded"));

    let workbench = Workbench::new(Arc::new(client(addr)), &ClientConfig::default());
    workbench.add_files(vec![png("a.png")]).await;
    assert!(workbench.submit().await.is_err());
    assert_eq!(workbench.session_status(), SessionStatus::Failed);
    assert!(workbench.results().is_empty());
    assert_eq!(workbench.current_notification().unwrap().text, "Model not loaded");
    assert!(workbench.control().enabled);
}

#[tokio::test]
async fn non_json_error_page_is_a_transport_error() {
    let app = Router::new().route(
        "/api/predict",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let err = client(serve(app).await).predict(&[png("a.png")]).await.unwrap_err();
    assert!(matches!(&err, AppError::Transport(msg) if msg.contains("HTTP 502")));
}

#[tokio::test]
async fn model_info_is_decoded() {
    let app = Router::new().route(
        "/api/model-info",
        get(|| async {
            Json(json!({
                "loaded": true,
                "model_path": "models/xray.h5",
                "input_shape": [null, 224, 224, 3],
                "output_shape": [null, 6],
                "total_parameters": 24_000_000u64,
                "classes": [
                    "Covid-19",
                    "Emphysema",
                    "Normal",
                    "Pneumonia-Bacterial",
                    "Pneumonia-Viral",
                    "Tuberculosis"
                ]
            }))
        }),
    );
    let info = client(serve(app).await).model_info().await.unwrap();
    assert!(info.loaded);
    assert_eq!(info.input_shape, Some(vec![None, Some(224), Some(224), Some(3)]));
    assert_eq!(info.classes.map(|c| c.len()), Some(6));

    let missing = Router::new().route(
        "/api/model-info",
        get(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"loaded": false, "message": "Model not loaded"})),
            )
        }),
    );
    let err = client(serve(missing).await).model_info().await.unwrap_err();
    assert!(matches!(err, AppError::Service(_)));
}

#[test]
fn probabilities_keep_service_order() {
    let body: Value = json!({
        "success": true,
        "predicted_class": "Tuberculosis",
        "confidence": 0.5,
        "all_probabilities": {"Tuberculosis": 0.5, "Covid-19": 0.3, "Emphysema": 0.2}
    });
    let results =
        xray_lens_lib::services::classifier::client::parse_predict_response(200, &body.to_string())
            .unwrap();
    let RawResult::Success(s) = &results[0] else {
        panic!("expected success");
    };
    let labels: Vec<_> = s.all_probabilities.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, ["Tuberculosis", "Covid-19", "Emphysema"]);
}
