use crate::commands::render;
use crate::error::AppError;
use crate::models::classify_types::ModelStatus;
use crate::models::session_types::SubmitOutcome;
use crate::services::workbench::Workbench;
use std::path::PathBuf;

pub async fn health(workbench: &Workbench) -> Result<ModelStatus, AppError> {
    let status = workbench.check_health().await;
    println!("{}", render::format_model_status(status));
    Ok(status)
}

pub async fn model_info(workbench: &Workbench) -> Result<(), AppError> {
    let info = workbench.model_info().await?;
    println!("{}", render::format_model_info(&info));
    Ok(())
}

/// Select `paths`, submit once and print what came back.
pub async fn predict(
    workbench: &Workbench,
    paths: &[PathBuf],
    detail: bool,
    json: bool,
) -> Result<(), AppError> {
    workbench.add_paths(paths).await?;

    // Rejections were raised while adding; surface them before submitting.
    for notification in workbench.notifier().history() {
        eprintln!("{}", render::format_notification(&notification));
    }

    match workbench.submit().await? {
        SubmitOutcome::Completed { .. } => {}
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => {
            return Err("Prediction did not complete".into());
        }
    }

    let entries = workbench.results();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", render::format_results(&entries));
    if detail {
        for index in 0..entries.len() {
            if let Some(view) = workbench.detail(index) {
                println!("\n[{}] {}", index, render::format_detail(&view));
            }
        }
    }
    Ok(())
}
