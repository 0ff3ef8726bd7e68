use crate::error::AppError;
use crate::models::file_types::CandidateFile;
use crate::services::validator::MAX_FILE_BYTES;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Media type a file picker would report for this path, keyed on extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Replace each directory with the regular files directly inside it, sorted by
/// name. Hidden entries are skipped. Plain files pass through unchanged.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut expanded = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
                .map(|entry| entry.into_path())
                .collect();

            files.sort_by_key(|p| {
                p.file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_lowercase()
            });
            expanded.extend(files);
        } else if path.is_file() {
            expanded.push(path.clone());
        } else {
            return Err(format!("Path does not exist: {}", path.display()).into());
        }
    }

    Ok(expanded)
}

pub async fn load_candidate(path: &Path) -> Result<CandidateFile, AppError> {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let media_type = media_type_for(path);

    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_FILE_BYTES {
        return Ok(CandidateFile::unread(name, media_type, size));
    }

    let bytes = tokio::fs::read(path).await?;
    Ok(CandidateFile::new(name, media_type, bytes))
}

/// Load every file named by `paths` (directories expanded), in order.
pub async fn load_candidates(paths: &[PathBuf]) -> Result<Vec<CandidateFile>, AppError> {
    let files = expand_paths(paths)?;
    futures::future::try_join_all(files.iter().map(|p| load_candidate(p))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_follows_extension_case_insensitively() {
        assert_eq!(media_type_for(Path::new("a/SCAN.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for(Path::new("scan.gif")), "image/gif");
        assert_eq!(media_type_for(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn directories_expand_to_sorted_visible_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("A.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join(".hidden.png"), b"h").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"c").unwrap();

        let expanded = expand_paths(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = expanded
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["A.jpg", "b.png"]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(expand_paths(&[dir.path().join("nope.png")]).is_err());
    }

    #[tokio::test]
    async fn load_reads_bytes_and_infers_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chest.png");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let files = load_candidates(&[path]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "chest.png");
        assert_eq!(files[0].media_type(), "image/png");
        assert_eq!(files[0].bytes(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn oversize_file_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_BYTES + 1).unwrap();

        let candidate = load_candidate(&path).await.unwrap();
        assert_eq!(candidate.size_bytes(), MAX_FILE_BYTES + 1);
        assert!(candidate.bytes().is_empty());
    }
}
