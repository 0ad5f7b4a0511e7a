mod config;
mod error;
mod export;
mod layout;
mod model;
mod pdf;
mod routes;
mod session;
mod state;
mod storage;
mod templates;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::model::CertificateData;
use crate::pdf::template::Template;
use crate::session::EditorSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certgen=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    crate::storage::ensure_dirs(&config.upload_folder)?;

    let data = CertificateData::initial(
        &config.certificate_number,
        &config.issue_place,
        chrono::Local::now().date_naive(),
    );
    let mut session = EditorSession::new(data);
    match load_template(&config.template_path) {
        Ok(template) => session.set_template(template),
        Err(e) => tracing::warn!(
            path = %config.template_path.display(),
            "No startup template: {}",
            e
        ),
    }

    let state = Arc::new(state::AppState::new(config.clone(), session));
    let fonts = state.fonts.clone();
    tokio::task::spawn_blocking(move || fonts.preload()).await?;

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/template", post(routes::upload_template))
        .route("/api/session", get(routes::get_session))
        .route("/api/certificate", put(routes::put_certificate))
        .route("/api/elements/:id", patch(routes::patch_element))
        .route("/api/zoom", post(routes::post_zoom))
        .route("/api/preview", get(routes::get_preview))
        .route("/api/pointer", post(routes::post_pointer))
        .route("/api/template", get(routes::get_template))
        .route("/api/export", post(routes::export_certificate))
        .route("/api/export/bulk", post(routes::export_bulk_certificates))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Certgen listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_template(path: &Path) -> Result<Template, Box<dyn std::error::Error + Send + Sync>> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("template.pdf");
    Ok(Template::from_bytes(name, bytes)?)
}
