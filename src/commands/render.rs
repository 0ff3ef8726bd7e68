use crate::models::classify_types::{DetailView, ModelInfo, ModelStatus, RenderEntry};
use crate::models::notification_types::{Notification, Severity};
use crate::models::preview_types::PreviewEntry;
use crate::services::events::ClientEvent;
use std::fmt::Write;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

const BAR_WIDTH: usize = 30;

pub fn format_notification(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Error => "error",
    };
    format!("[{}] {}", tag, notification.text)
}

pub fn format_model_status(status: ModelStatus) -> String {
    let marker = match status {
        ModelStatus::Ready => "●",
        ModelStatus::NotLoaded | ModelStatus::Offline => "○",
    };
    format!("{} {}", marker, status.label())
}

pub fn format_previews(previews: &[PreviewEntry]) -> String {
    if previews.is_empty() {
        return "No images selected.".to_string();
    }

    let mut out = format!("Selected images ({}):", previews.len());
    for entry in previews {
        let size = match (entry.width, entry.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "not decodable".to_string(),
        };
        let _ = write!(out, "\n  [{}] {}  ({})", entry.index, entry.name, size);
    }
    out
}

pub fn format_results(entries: &[RenderEntry]) -> String {
    if entries.is_empty() {
        return "No results.".to_string();
    }

    let mut out = String::from("Results:");
    for entry in entries {
        match entry {
            RenderEntry::Result(result) => {
                let _ = write!(
                    out,
                    "\n  [{}] {} {}  {} ({})",
                    result.index,
                    result.display.symbol,
                    result.display.text,
                    result.confidence_text,
                    result.tier.as_str()
                );
                if let Some(name) = &result.filename {
                    let _ = write!(out, "  {}", name);
                }
                if !result.interpretation.is_empty() {
                    let _ = write!(out, "\n      {}", result.interpretation);
                }
            }
            RenderEntry::Error { index, message, .. } => {
                let _ = write!(out, "\n  [{}] Error: {}", index, message);
            }
        }
    }
    out
}

pub fn format_detail(view: &DetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.headline);
    let _ = writeln!(out, "  Predicted Class: {}", view.predicted_class);
    let _ = writeln!(out, "  Confidence: {}", view.confidence_text);
    let _ = writeln!(out, "  Class Probabilities:");

    let label_width = view.bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    for bar in &view.bars {
        let filled = ((bar.width_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let _ = writeln!(
            out,
            "    {:<width$}  {}{}  {}",
            bar.label,
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
            bar.percent_text,
            width = label_width
        );
    }
    let _ = write!(out, "  Important: {}", view.advisory);
    out
}

pub fn format_model_info(info: &ModelInfo) -> String {
    if !info.loaded {
        return format!(
            "Model not loaded{}",
            info.message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default()
        );
    }

    let mut out = String::from("Model loaded");
    if let Some(path) = &info.model_path {
        let _ = write!(out, "\n  Path: {}", path);
    }
    if let Some(shape) = &info.input_shape {
        let _ = write!(out, "\n  Input shape: {}", format_shape(shape));
    }
    if let Some(shape) = &info.output_shape {
        let _ = write!(out, "\n  Output shape: {}", format_shape(shape));
    }
    if let Some(params) = info.total_parameters {
        let _ = write!(out, "\n  Parameters: {}", params);
    }
    if let Some(classes) = &info.classes {
        let _ = write!(out, "\n  Classes: {}", classes.join(", "));
    }
    out
}

fn format_shape(shape: &[Option<u64>]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .map(|d| d.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string()))
        .collect();
    format!("({})", dims.join(", "))
}

/// Print every event the workbench publishes until the bus closes.
pub fn spawn_renderer(mut rx: broadcast::Receiver<ClientEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{}", text);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Renderer lagged behind events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub fn render_event(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::SelectionChanged { .. } => None,
        ClientEvent::PreviewsRendered { previews, .. } => Some(format_previews(previews)),
        ClientEvent::SessionChanged { control, .. } if !control.enabled => {
            Some(control.label.to_string())
        }
        ClientEvent::SessionChanged { .. } => None,
        ClientEvent::ResultsRendered { entries } => Some(format_results(entries)),
        ClientEvent::ResultsCleared => Some("Results cleared.".to_string()),
        ClientEvent::ModelStatusChanged(status) => Some(format_model_status(*status)),
        ClientEvent::Notification(notification) => Some(format_notification(notification)),
    }
}
