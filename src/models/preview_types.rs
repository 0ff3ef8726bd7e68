use crate::models::file_types::FileId;
use serde::Serialize;

/// One preview tile, positioned by its index in the selection at render time.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PreviewEntry {
    pub index: usize,
    pub file_id: FileId,
    pub name: String,
    /// `data:` URI of the thumbnail, or of the raw bytes when decoding failed.
    pub data_uri: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PreviewEntry {
    pub fn is_decoded(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}
