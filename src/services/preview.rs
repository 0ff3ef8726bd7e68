use crate::models::file_types::CandidateFile;
use crate::models::preview_types::PreviewEntry;
use crate::services::thumbnail_service;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Builds the full preview list from a selection snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PreviewProjector {
    thumbnail_size: u32,
}

impl PreviewProjector {
    pub fn new(thumbnail_size: u32) -> Self {
        Self {
            thumbnail_size: thumbnail_size.max(1),
        }
    }

    /// Decode every file off the async executor. Decodes run in parallel and
    /// finish in any order; each entry keeps the index it had in `files`.
    ///
    /// Always yields one entry per file. If the decode task itself dies, every
    /// tile falls back to the raw bytes.
    pub async fn project(&self, files: Vec<CandidateFile>) -> Vec<PreviewEntry> {
        if files.is_empty() {
            return Vec::new();
        }

        let size = self.thumbnail_size;
        let batch = files.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            batch
                .par_iter()
                .enumerate()
                .map(|(index, file)| render_entry(index, file, size))
                .collect::<Vec<_>>()
        })
        .await;

        match rendered {
            Ok(previews) => {
                debug!(count = previews.len(), "Rendered previews");
                previews
            }
            Err(e) => {
                warn!(count = files.len(), "Preview task failed, showing raw bytes: {}", e);
                raw_entries(&files)
            }
        }
    }
}

impl Default for PreviewProjector {
    fn default() -> Self {
        Self::new(thumbnail_service::DEFAULT_THUMBNAIL_SIZE)
    }
}

fn render_entry(index: usize, file: &CandidateFile, size: u32) -> PreviewEntry {
    match thumbnail_service::generate_thumbnail(file.bytes(), size) {
        Ok(thumb) => PreviewEntry {
            index,
            file_id: file.id(),
            name: file.name().to_string(),
            data_uri: thumb.data_uri(),
            width: Some(thumb.width),
            height: Some(thumb.height),
        },
        Err(e) => {
            warn!(file = %file.name(), "Preview decode failed, showing raw bytes: {}", e);
            raw_entry(index, file)
        }
    }
}

/// Undecoded tiles for `files`, by position.
fn raw_entries(files: &[CandidateFile]) -> Vec<PreviewEntry> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| raw_entry(index, file))
        .collect()
}

fn raw_entry(index: usize, file: &CandidateFile) -> PreviewEntry {
    PreviewEntry {
        index,
        file_id: file.id(),
        name: file.name().to_string(),
        data_uri: thumbnail_service::data_uri(file.media_type(), file.bytes()),
        width: None,
        height: None,
    }
}
