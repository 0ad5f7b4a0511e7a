use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse},
    Json,
};
use std::sync::Arc;
use tera::Context;
use tracing::info;

use crate::error::ApiError;
use crate::model::FontFamily;
use crate::pdf::template::Template;
use crate::session::TemplateInfo;
use crate::state::AppState;
use crate::storage::{generate_template_id, sanitize_file_name, save_template};

pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    // a freshly loaded editor has no pointer held down
    session.cancel_drag();

    let fields: Vec<serde_json::Value> = session
        .elements()
        .iter()
        .map(|e| serde_json::json!({ "id": e.id.as_str(), "label": e.id.label() }))
        .collect();
    let fonts: Vec<&str> = FontFamily::ALL.iter().map(|f| f.display_name()).collect();

    let mut ctx = Context::new();
    ctx.insert("template_name", &session.template().map(|t| t.name.clone()));
    ctx.insert("fields", &fields);
    ctx.insert("fonts", &fonts);
    drop(session);

    render_template("index.html", ctx)
}

/// Accepts a multipart upload whose `template` field holds the PDF.
pub async fn upload_template(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("template") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("template.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No template file uploaded".to_string()))?;
    let template = install_template(&state, &file_name, bytes).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "template": template,
    })))
}

/// Validates, persists and activates an uploaded template. The session keeps
/// its previous template if any step fails.
pub async fn install_template(
    state: &AppState,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<TemplateInfo, ApiError> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    if mime != mime_guess::mime::APPLICATION_PDF {
        return Err(ApiError::BadRequest(
            "Please upload a PDF template".to_string(),
        ));
    }

    let template = Template::from_bytes(sanitize_file_name(file_name), bytes)?;
    let id = generate_template_id();
    let path = save_template(&state.config.upload_folder, &id, file_name, template.bytes())?;
    info!(path = %path.display(), "template stored");

    let info = TemplateInfo::from(&template);
    state.session.lock().await.set_template(template);
    Ok(info)
}

fn render_template(name: &str, ctx: Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera.render(name, &ctx).unwrap_or_else(|e| {
        tracing::error!("Failed to render {}: {}", name, e);
        format!("Template error: {}", name)
    });
    Html(rendered)
}
