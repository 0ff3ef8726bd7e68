#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use xray_lens_lib::config::ClientConfig;
use xray_lens_lib::error::AppError;
use xray_lens_lib::models::classify_types::{
    HealthReport, ModelInfo, PredictionSuccess, RawResult,
};
use xray_lens_lib::models::file_types::CandidateFile;
use xray_lens_lib::services::classifier::client::PredictionService;
use xray_lens_lib::services::workbench::Workbench;

type PredictFn = dyn Fn(&[CandidateFile]) -> Result<Vec<RawResult>, AppError> + Send + Sync;
type HealthFn = dyn Fn() -> Result<HealthReport, AppError> + Send + Sync;

/// In-process stand-in for the classification service.
pub struct MockService {
    predict_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    submitted: Mutex<Vec<Vec<String>>>,
    respond: Box<PredictFn>,
    health: Box<HealthFn>,
    gated: bool,
    /// Signalled when a gated predict call has started.
    pub started: Notify,
    /// Lets a gated predict call return.
    pub release: Notify,
}

impl MockService {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&[CandidateFile]) -> Result<Vec<RawResult>, AppError> + Send + Sync + 'static,
    {
        Self {
            predict_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            health: Box::new(|| Ok(health_report(true))),
            gated: false,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Every file gets the same class and confidence.
    pub fn always(class: &'static str, confidence: f64) -> Self {
        Self::new(move |files| {
            Ok(files.iter().map(|f| success(f.name(), class, confidence)).collect())
        })
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_| Err(AppError::Service(message.to_string())))
    }

    /// Hold predict calls until `release` is notified.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn with_health<F>(mut self, health: F) -> Self
    where
        F: Fn() -> Result<HealthReport, AppError> + Send + Sync + 'static,
    {
        self.health = Box::new(health);
        self
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    /// Most predict calls that were ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// File names of each request, in call order.
    pub fn submitted(&self) -> Vec<Vec<String>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictionService for MockService {
    async fn health(&self) -> Result<HealthReport, AppError> {
        (self.health)()
    }

    async fn model_info(&self) -> Result<ModelInfo, AppError> {
        Ok(ModelInfo {
            loaded: true,
            classes: Some(vec!["Normal".to_string(), "Covid-19".to_string()]),
            ..Default::default()
        })
    }

    async fn predict(&self, files: &[CandidateFile]) -> Result<Vec<RawResult>, AppError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push(files.iter().map(|f| f.name().to_string()).collect());

        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(files)
    }
}

pub fn health_report(model_loaded: bool) -> HealthReport {
    HealthReport {
        model_loaded,
        status: Some("healthy".to_string()),
        service: Some("Chest X-Ray Prediction API".to_string()),
        version: Some("1.0.0".to_string()),
    }
}

pub fn success(filename: &str, class: &str, confidence: f64) -> RawResult {
    RawResult::Success(PredictionSuccess {
        filename: Some(filename.to_string()),
        predicted_class: class.to_string(),
        confidence,
        confidence_percentage: format!("{:.2}%", confidence * 100.0),
        interpretation: format!("Predicted {}.", class),
        all_probabilities: vec![
            (class.to_string(), confidence),
            ("Other".to_string(), 1.0 - confidence),
        ],
    })
}

pub fn workbench(service: Arc<MockService>) -> Workbench {
    Workbench::new(service, &ClientConfig::default())
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn png(name: &str) -> CandidateFile {
    CandidateFile::new(name, "image/png", png_bytes(32, 24))
}

pub fn jpeg(name: &str) -> CandidateFile {
    let img = RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    CandidateFile::new(name, "image/jpeg", out.into_inner())
}
