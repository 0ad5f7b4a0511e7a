use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tera::Tera;

static TERA: OnceLock<Tera> = OnceLock::new();

const BUILTIN_INDEX: &str = include_str!("../templates/index.html");

/// Page templates from `templates/`, falling back to the copy compiled into
/// the binary when the directory is missing or fails to load.
pub fn get_tera() -> &'static Tera {
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        let files = html_files(Path::new("templates"));
        if !files.is_empty() {
            if let Err(e) = tera.add_template_files(files) {
                tracing::error!("Failed to load templates: {}", e);
            }
        }
        if tera.get_template_names().all(|n| n != "index.html") {
            if let Err(e) = tera.add_raw_template("index.html", BUILTIN_INDEX) {
                tracing::error!("Failed to load built-in index template: {}", e);
            }
        }
        tera
    })
}

fn html_files(dir: &Path) -> Vec<(PathBuf, Option<String>)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            Some((p, Some(name)))
        })
        .collect()
}
