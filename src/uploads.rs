use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

/// File extensions accepted by the upload endpoint.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["txt", "pdf", "png", "jpg", "jpeg", "gif", "mp3", "wav"];

fn safe_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\-. \u{00A0}-\u{FFFF}]+$").unwrap())
}

fn is_safe_filename(filename: &str) -> bool {
    if filename.is_empty() || filename.len() > 255 {
        return false;
    }
    safe_filename_re().is_match(filename)
}

/// Whether a filename carries an allow-listed extension.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        }
        _ => false,
    }
}

/// Reduce a client-supplied filename to its final component and reject
/// anything that could escape the upload directory.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let sanitized = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid filename: {}", filename))?
        .to_string();

    if !is_safe_filename(&sanitized) {
        return Err(anyhow::anyhow!("Invalid characters in filename: {}", filename));
    }

    Ok(sanitized)
}

/// Save upload bytes under `upload_dir`, returning the path written.
pub async fn save_upload(upload_dir: &str, filename: &str, data: &[u8]) -> Result<PathBuf> {
    let safe_name = sanitize_filename(filename)?;
    let base_dir = PathBuf::from(upload_dir);
    tokio::fs::create_dir_all(&base_dir).await?;

    let full_path = base_dir.join(&safe_name);
    if !full_path.starts_with(&base_dir) {
        return Err(anyhow::anyhow!("Invalid path: Path traversal detected"));
    }

    tokio::fs::write(&full_path, data).await?;
    tracing::debug!("Saved upload: {:?}", full_path);

    Ok(full_path)
}
