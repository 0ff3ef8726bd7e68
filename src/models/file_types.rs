use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a selected file. Two candidates with the same
/// name are still different files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(u64);

impl FileId {
    fn next() -> Self {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user-supplied image blob considered for submission. Immutable once built;
/// clones share the same bytes and identity.
#[derive(Clone)]
pub struct CandidateFile {
    id: FileId,
    name: String,
    media_type: String,
    size_bytes: u64,
    bytes: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: FileId::next(),
            name: name.into(),
            media_type: media_type.into(),
            size_bytes: bytes.len() as u64,
            bytes: bytes.into(),
        }
    }

    /// A file known only by its metadata. Used for files too large to be
    /// worth reading; the validator refuses them on size alone.
    pub(crate) fn unread(
        name: impl Into<String>,
        media_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            id: FileId::next(),
            name: name.into(),
            media_type: media_type.into(),
            size_bytes,
            bytes: Arc::from(Vec::new()),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

impl PartialEq for CandidateFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CandidateFile {}

/// Why the validator refused a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    UnsupportedType { media_type: String },
    TooLarge { name: String, size_bytes: u64 },
}

impl Rejection {
    /// User-facing text for the error notification.
    pub fn message(&self) -> String {
        match self {
            Rejection::UnsupportedType { .. } => {
                "Invalid file type. Only JPG, JPEG, and PNG are allowed.".to_string()
            }
            Rejection::TooLarge { name, .. } => {
                format!("File {} is too large. Max size is 16MB.", name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted,
    Rejected(Rejection),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted)
    }
}
