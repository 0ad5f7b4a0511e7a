use std::path::{Path, PathBuf};

pub const DEFAULT_CERTIFICATE_NUMBER: &str = "NO: 13.024/IMPCT/V/2025";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Template loaded into the session at startup, if it exists.
    pub template_path: PathBuf,
    pub font_dir: PathBuf,
    pub upload_folder: PathBuf,
    pub certificate_number: String,
    pub issue_place: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let base_dir = std::env::current_dir()?;
        Ok(Self::from_lookup(&base_dir, |key| std::env::var(key).ok()))
    }

    /// Builds the config from any key lookup. Relative paths are resolved
    /// against `base_dir`.
    pub fn from_lookup<F>(base_dir: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port: u16 = var("PORT", "5001").trim().parse().unwrap_or(5001);

        Self {
            host: var("HOST", "0.0.0.0"),
            port,
            template_path: base_dir.join(var("TEMPLATE_PATH", "files/certificate-template.pdf")),
            font_dir: base_dir.join(var("FONT_DIR", "fonts")),
            upload_folder: base_dir.join(var("UPLOAD_FOLDER", "uploads")),
            certificate_number: var("CERTIFICATE_NUMBER", DEFAULT_CERTIFICATE_NUMBER),
            issue_place: var("ISSUE_PLACE", "Jakarta"),
        }
    }
}
