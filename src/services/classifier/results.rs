use crate::models::classify_types::{
    ConfidenceTier, DetailView, Disease, DiseaseDisplay, DisplayResult, ProbabilityBar, RawResult,
    RenderEntry,
};

const MEDIUM_THRESHOLD: f64 = 0.60;
const HIGH_THRESHOLD: f64 = 0.80;

const ADVISORY: &str = "This is an AI-based analysis for educational purposes only. \
Always consult healthcare professionals for medical diagnosis.";

/// Lower bounds are inclusive: 0.60 is Medium, 0.80 is High.
pub fn confidence_tier(confidence: f64) -> ConfidenceTier {
    if confidence < MEDIUM_THRESHOLD {
        ConfidenceTier::Low
    } else if confidence < HIGH_THRESHOLD {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::High
    }
}

pub fn disease_display(disease: &Disease) -> DiseaseDisplay {
    let (symbol, text, style) = match disease {
        Disease::Normal => ("✅", "NORMAL", "normal"),
        Disease::Covid19 => ("🦠", "COVID-19", "covid"),
        Disease::Emphysema => ("🫁", "EMPHYSEMA", "disease"),
        Disease::PneumoniaBacterial => ("⚠️", "PNEUMONIA (Bacterial)", "pneumonia"),
        Disease::PneumoniaViral => ("⚠️", "PNEUMONIA (Viral)", "pneumonia"),
        Disease::Tuberculosis => ("🔴", "TUBERCULOSIS", "disease"),
        Disease::Unknown(raw) => {
            return DiseaseDisplay {
                symbol: "❓",
                text: raw.to_uppercase(),
                style: "disease",
            }
        }
    };
    DiseaseDisplay {
        symbol,
        text: text.to_string(),
        style,
    }
}

/// Map one raw result to its card. `preview` is the thumbnail of the file
/// submitted at `index`, if there was one.
pub fn classify(index: usize, raw: &RawResult, preview: Option<&str>) -> RenderEntry {
    match raw {
        RawResult::Failure { filename, error } => RenderEntry::Error {
            index,
            filename: filename.clone(),
            message: error.clone(),
        },
        RawResult::Success(success) => {
            let disease = Disease::from_label(&success.predicted_class);
            RenderEntry::Result(DisplayResult {
                index,
                filename: success.filename.clone(),
                display: disease_display(&disease),
                disease,
                confidence: success.confidence,
                confidence_text: success.confidence_percentage.clone(),
                tier: confidence_tier(success.confidence),
                interpretation: success.interpretation.clone(),
                probabilities: success.all_probabilities.clone(),
                preview: preview.map(str::to_string),
            })
        }
    }
}

/// Classify a whole batch, pairing each result with the preview at the same
/// submission position.
pub fn classify_all(raws: &[RawResult], previews: &[Option<String>]) -> Vec<RenderEntry> {
    raws.iter()
        .enumerate()
        .map(|(i, raw)| classify(i, raw, previews.get(i).and_then(|p| p.as_deref())))
        .collect()
}

/// Bars keep the service's label order, not probability order.
pub fn probability_bars(probabilities: &[(String, f64)]) -> Vec<ProbabilityBar> {
    probabilities
        .iter()
        .map(|(label, probability)| ProbabilityBar {
            label: label.clone(),
            probability: *probability,
            percent_text: format!("{:.2}%", probability * 100.0),
            width_percent: (probability * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}

pub fn detail_view(result: &DisplayResult) -> DetailView {
    let symbol = result.display.symbol;
    let headline = if result.disease.is_normal() {
        format!("{} Normal Chest X-Ray", symbol)
    } else {
        format!("{} {} Detected", symbol, result.display.text)
    };

    let advisory = if result.interpretation.is_empty() {
        ADVISORY.to_string()
    } else {
        format!("{} {}", result.interpretation, ADVISORY)
    };

    DetailView {
        headline,
        predicted_class: result.disease.label().to_string(),
        confidence_text: result.confidence_text.clone(),
        bars: probability_bars(&result.probabilities),
        advisory,
        preview: result.preview.clone(),
    }
}
