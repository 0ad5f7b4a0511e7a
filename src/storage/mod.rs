use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn generate_template_id() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d"),
        &Uuid::new_v4().simple().to_string()[..8]
    )
}

pub fn ensure_dirs(upload_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)
}

/// Keeps only the final path component of a client-supplied file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        "template.pdf".to_string()
    } else {
        base.to_string()
    }
}

/// Writes an uploaded template as `<id>_<file name>` and returns its path.
pub fn save_template(
    upload_folder: &Path,
    id: &str,
    file_name: &str,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    ensure_dirs(upload_folder)?;
    let path = upload_folder.join(format!("{}_{}", id, sanitize_file_name(file_name)));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
