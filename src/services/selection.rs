use crate::models::file_types::CandidateFile;

/// Ordered working set of validated files pending submission.
///
/// Every effective mutation bumps `revision`, which tags preview rebuilds so a
/// rebuild started before a later mutation can be recognised as stale.
#[derive(Debug, Default)]
pub struct SelectionStore {
    files: Vec<CandidateFile>,
    revision: u64,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append already-validated files, keeping their relative order.
    /// Returns true when the store changed.
    pub fn append(&mut self, files: Vec<CandidateFile>) -> bool {
        if files.is_empty() {
            return false;
        }
        self.files.extend(files);
        self.revision += 1;
        true
    }

    /// Remove the file at `index`; later files shift down by one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`. Callers bound the index to the tiles
    /// they rendered.
    pub fn remove_at(&mut self, index: usize) -> CandidateFile {
        assert!(
            index < self.files.len(),
            "remove_at index {} out of range for selection of {}",
            index,
            self.files.len()
        );
        let removed = self.files.remove(index);
        self.revision += 1;
        removed
    }

    /// Returns true when the store changed.
    pub fn clear(&mut self) -> bool {
        if self.files.is_empty() {
            return false;
        }
        self.files.clear();
        self.revision += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    /// Cheap copy of the current contents; bytes are shared.
    pub fn snapshot(&self) -> Vec<CandidateFile> {
        self.files.clone()
    }
}
