use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelStatus {
    Ready,
    NotLoaded,
    Offline,
}

impl ModelStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ModelStatus::Ready => "Model Ready",
            ModelStatus::NotLoaded => "Model Not Loaded",
            ModelStatus::Offline => "Server Offline",
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthReport {
    pub model_loaded: bool,
    pub status: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
}

/// Body of `GET /api/model-info`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ModelInfo {
    pub loaded: bool,
    pub message: Option<String>,
    pub model_path: Option<String>,
    pub input_shape: Option<Vec<Option<u64>>>,
    pub output_shape: Option<Vec<Option<u64>>>,
    pub total_parameters: Option<u64>,
    pub classes: Option<Vec<String>>,
}

/// One result object as the service sends it.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PredictionRecord {
    #[serde(default)]
    pub success: bool,
    pub predicted_class: Option<String>,
    pub confidence: Option<f64>,
    pub confidence_percentage: Option<String>,
    pub interpretation: Option<String>,
    pub all_probabilities: Option<serde_json::Map<String, serde_json::Value>>,
    pub error: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSuccess {
    pub filename: Option<String>,
    pub predicted_class: String,
    pub confidence: f64,
    pub confidence_percentage: String,
    pub interpretation: String,
    /// Label/probability pairs in the order the service listed them.
    pub all_probabilities: Vec<(String, f64)>,
}

/// Per-file outcome, positionally aligned with the submitted files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawResult {
    Success(PredictionSuccess),
    Failure {
        filename: Option<String>,
        error: String,
    },
}

pub const GENERIC_FAILURE: &str = "Prediction failed";

impl From<PredictionRecord> for RawResult {
    fn from(record: PredictionRecord) -> Self {
        if !record.success {
            return RawResult::Failure {
                filename: record.filename,
                error: record.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            };
        }

        let (predicted_class, confidence) = match (record.predicted_class, record.confidence) {
            (Some(class), Some(confidence)) => (class, confidence),
            _ => {
                return RawResult::Failure {
                    filename: record.filename,
                    error: "Malformed prediction: missing class or confidence".to_string(),
                }
            }
        };

        let all_probabilities = record
            .all_probabilities
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(label, value)| value.as_f64().map(|p| (label, p)))
            .collect();

        RawResult::Success(PredictionSuccess {
            filename: record.filename,
            predicted_class,
            confidence,
            confidence_percentage: record
                .confidence_percentage
                .unwrap_or_else(|| format!("{:.2}%", confidence * 100.0)),
            interpretation: record.interpretation.unwrap_or_default(),
            all_probabilities,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "low",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::High => "high",
        }
    }
}

/// Classes the service is known to emit. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Disease {
    Normal,
    Covid19,
    Emphysema,
    PneumoniaBacterial,
    PneumoniaViral,
    Tuberculosis,
    Unknown(String),
}

impl Disease {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Normal" => Disease::Normal,
            "Covid-19" => Disease::Covid19,
            "Emphysema" => Disease::Emphysema,
            "Pneumonia-Bacterial" => Disease::PneumoniaBacterial,
            "Pneumonia-Viral" => Disease::PneumoniaViral,
            "Tuberculosis" => Disease::Tuberculosis,
            other => Disease::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Disease::Normal => "Normal",
            Disease::Covid19 => "Covid-19",
            Disease::Emphysema => "Emphysema",
            Disease::PneumoniaBacterial => "Pneumonia-Bacterial",
            Disease::PneumoniaViral => "Pneumonia-Viral",
            Disease::Tuberculosis => "Tuberculosis",
            Disease::Unknown(raw) => raw,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Disease::Normal)
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Disease {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseDisplay {
    pub symbol: &'static str,
    pub text: String,
    pub style: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResult {
    /// Position in the submitted batch.
    pub index: usize,
    pub filename: Option<String>,
    pub disease: Disease,
    pub display: DiseaseDisplay,
    pub confidence: f64,
    pub confidence_text: String,
    pub tier: ConfidenceTier,
    pub interpretation: String,
    pub probabilities: Vec<(String, f64)>,
    /// Preview of the submitted image, when one was rendered.
    #[serde(skip_serializing)]
    pub preview: Option<String>,
}

/// One card in the results view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderEntry {
    Result(DisplayResult),
    Error {
        index: usize,
        filename: Option<String>,
        message: String,
    },
}

impl RenderEntry {
    pub fn as_result(&self) -> Option<&DisplayResult> {
        match self {
            RenderEntry::Result(result) => Some(result),
            RenderEntry::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityBar {
    pub label: String,
    pub probability: f64,
    pub percent_text: String,
    /// Bar width as a percentage of the full track, clamped to 0..=100.
    pub width_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub headline: String,
    pub predicted_class: String,
    pub confidence_text: String,
    pub bars: Vec<ProbabilityBar>,
    pub advisory: String,
    #[serde(skip_serializing)]
    pub preview: Option<String>,
}
