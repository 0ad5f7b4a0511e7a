use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::export::{run_export, ExportArtifact, ExportKind};
use crate::layout::PointerOutcome;
use crate::model::{CertificateData, ElementPatch, FieldKind, ModelError, TextElement};
use crate::session::{PointerEvent, Preview, SessionView, ZoomCommand, ZoomView};
use crate::state::AppState;

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.session.lock().await.view())
}

pub async fn put_certificate(
    State(state): State<Arc<AppState>>,
    Json(data): Json<CertificateData>,
) -> Json<CertificateData> {
    let mut session = state.session.lock().await;
    session.set_data(data);
    Json(session.data().clone())
}

pub async fn patch_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ElementPatch>,
) -> Result<Json<TextElement>, ApiError> {
    let not_found = |id: &str| ApiError::NotFound(format!("Element not found: {}", id));

    let kind: FieldKind = id.parse().map_err(|_| not_found(&id))?;
    let mut session = state.session.lock().await;
    match session.update_element(kind, patch) {
        Ok(element) => Ok(Json(element.clone())),
        Err(ModelError::UnknownField(_)) => Err(not_found(&id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn post_zoom(
    State(state): State<Arc<AppState>>,
    Json(command): Json<ZoomCommand>,
) -> Json<ZoomView> {
    let zoom = state.session.lock().await.apply_zoom(command);
    Json(zoom.into())
}

pub async fn get_preview(State(state): State<Arc<AppState>>) -> Json<Preview> {
    let session = state.session.lock().await;
    Json(session.preview(state.fonts.as_ref()))
}

pub async fn post_pointer(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PointerEvent>,
) -> Json<PointerOutcome> {
    let mut session = state.session.lock().await;
    Json(session.pointer(event, state.fonts.as_ref()))
}

/// The active template, for the editor background.
pub async fn get_template(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let session = state.session.lock().await;
    let template = session
        .template()
        .ok_or_else(|| ApiError::NotFound("No template loaded".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "application/pdf")],
        template.bytes().to_vec(),
    )
        .into_response())
}

pub async fn export_certificate(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let job = state.session.lock().await.snapshot();
    let artifact = run_export(job, ExportKind::Single, state.fonts.clone()).await?;
    Ok(attachment(artifact))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub recipients: String,
}

pub async fn export_bulk_certificates(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRequest>,
) -> Result<Response, ApiError> {
    let job = state.session.lock().await.snapshot();
    let kind = ExportKind::Bulk {
        recipients: request.recipients,
    };
    let artifact = run_export(job, kind, state.fonts.clone()).await?;
    Ok(attachment(artifact))
}

fn attachment(artifact: ExportArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&artifact.file_name),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}

/// Plain `filename` for ASCII names, plus an RFC 5987 `filename*` otherwise.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    if ascii == file_name {
        return format!("attachment; filename=\"{}\"", file_name);
    }

    let encoded: String = file_name
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                char::from(b).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pdf::template::{blank_pdf, Template};
    use crate::session::{EditorSession, PointerPhase};
    use axum::http::StatusCode;

    fn state(dir: &std::path::Path) -> Arc<AppState> {
        let config = Config::from_lookup(dir, |_| None);
        let data = CertificateData::initial(
            &config.certificate_number,
            &config.issue_place,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
        );
        Arc::new(AppState::new(Arc::new(config), EditorSession::new(data)))
    }

    async fn with_template(state: &Arc<AppState>) {
        let template = Template::from_bytes("t.pdf", blank_pdf(800, 600)).unwrap();
        state.session.lock().await.set_template(template);
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_session_starts_with_default_layout() {
        let dir = tempfile::tempdir().unwrap();
        let Json(view) = get_session(State(state(dir.path()))).await;
        assert!(view.template.is_none());
        assert_eq!(view.elements.len(), 3);
        assert_eq!(view.data.issue_date, "Jakarta, 19/1/2026");
        assert_eq!(view.zoom.zoom.percent(), 100);
    }

    #[tokio::test]
    async fn test_put_certificate_replaces_data() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let data = CertificateData {
            recipient_name: "Alice".into(),
            certificate_number: "NO: 1.001/X".into(),
            issue_date: "Bandung, 1/2/2026".into(),
        };
        put_certificate(State(state.clone()), Json(data.clone())).await;
        let Json(view) = get_session(State(state)).await;
        assert_eq!(view.data, data);
    }

    #[tokio::test]
    async fn test_patch_element() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let patch: ElementPatch =
            serde_json::from_str(r#"{"fontSize": 30, "fontFamily": "Georgia"}"#).unwrap();
        let Json(el) = patch_element(State(state.clone()), Path("certNumber".into()), Json(patch))
            .await
            .unwrap();
        assert_eq!(el.font_size, 30.0);
        assert_eq!(el.font_family, crate::model::FontFamily::Georgia);

        let err = patch_element(
            State(state.clone()),
            Path("signature".into()),
            Json(ElementPatch::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let bad: ElementPatch = serde_json::from_str(r#"{"width": -5}"#).unwrap();
        let err = patch_element(State(state), Path("name".into()), Json(bad))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_zoom_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let Json(view) = post_zoom(State(state.clone()), Json(ZoomCommand::Set { percent: 400 })).await;
        assert_eq!(view.zoom.percent(), 150);
        assert_eq!(view.pixel_width, 1200.0);
        let Json(view) = post_zoom(State(state), Json(ZoomCommand::Reset)).await;
        assert_eq!(view.zoom.percent(), 100);
    }

    #[tokio::test]
    async fn test_pointer_drag_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let Json(preview) = get_preview(State(state.clone())).await;
        let name = &preview.elements[0];
        assert_eq!(name.content, "Recipient Name");
        let grab = (name.anchor_x, name.anchor_y + 10.0);

        let event = |phase, x, y| Json(PointerEvent { phase, x, y });
        let Json(started) =
            post_pointer(State(state.clone()), event(PointerPhase::Down, grab.0, grab.1)).await;
        assert_eq!(
            started,
            PointerOutcome::Started {
                element: FieldKind::Name
            }
        );

        let Json(moved) = post_pointer(
            State(state.clone()),
            event(PointerPhase::Move, grab.0 + 10.0, grab.1 - 4.0),
        )
        .await;
        assert_eq!(
            moved,
            PointerOutcome::Moved {
                element: FieldKind::Name,
                x: 410.0,
                y: 270.0
            }
        );

        post_pointer(State(state.clone()), event(PointerPhase::Up, 0.0, 0.0)).await;
        let Json(view) = get_session(State(state)).await;
        assert_eq!((view.elements[0].x, view.elements[0].y), (410.0, 270.0));
    }

    #[tokio::test]
    async fn test_release_clears_rejected_press() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let event = |phase| Json(PointerEvent { phase, x: 400.0, y: 290.0 });

        // first press never released
        post_pointer(State(state.clone()), event(PointerPhase::Down)).await;
        let Json(again) = post_pointer(State(state.clone()), event(PointerPhase::Down)).await;
        assert_eq!(
            again,
            PointerOutcome::Rejected {
                dragging: FieldKind::Name
            }
        );

        let Json(released) = post_pointer(State(state.clone()), event(PointerPhase::Up)).await;
        assert_eq!(
            released,
            PointerOutcome::Ended {
                element: Some(FieldKind::Name)
            }
        );
        let Json(retry) = post_pointer(State(state), event(PointerPhase::Down)).await;
        assert_eq!(
            retry,
            PointerOutcome::Started {
                element: FieldKind::Name
            }
        );
    }

    #[tokio::test]
    async fn test_position_is_fixed_at_release() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let event = |phase, x, y| Json(PointerEvent { phase, x, y });

        post_pointer(State(state.clone()), event(PointerPhase::Down, 400.0, 290.0)).await;
        for step in 1..=5 {
            let x = 400.0 + step as f64 * 10.0;
            post_pointer(State(state.clone()), event(PointerPhase::Move, x, 290.0)).await;
        }
        post_pointer(State(state.clone()), event(PointerPhase::Up, 450.0, 290.0)).await;

        // a move delivered after the release must not drag the element along
        let Json(late) =
            post_pointer(State(state.clone()), event(PointerPhase::Move, 700.0, 100.0)).await;
        assert_eq!(late, PointerOutcome::Ignored);

        let Json(view) = get_session(State(state)).await;
        assert_eq!((view.elements[0].x, view.elements[0].y), (450.0, 274.0));
    }

    #[tokio::test]
    async fn test_export_needs_template_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let err = export_certificate(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        with_template(&state).await;
        let err = export_certificate(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let response = err.into_response();
        let json: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Please enter the recipient name");
    }

    #[tokio::test]
    async fn test_single_export_downloads_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        with_template(&state).await;
        state.session.lock().await.set_data(CertificateData {
            recipient_name: "Alice Smith".into(),
            certificate_number: "NO: 13.024/IMPCT/V/2025".into(),
            issue_date: "Jakarta, 19/1/2026".into(),
        });

        let response = export_certificate(State(state.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Certificate_Alice_Smith.pdf\""
        );
        assert!(body(response).await.starts_with(b"%PDF"));

        // exporting never touches the session
        let Json(view) = get_session(State(state)).await;
        assert_eq!(view.data.certificate_number, "NO: 13.024/IMPCT/V/2025");
    }

    #[tokio::test]
    async fn test_bulk_export_downloads_zip() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        with_template(&state).await;

        let err = export_bulk_certificates(
            State(state.clone()),
            Json(BulkRequest {
                recipients: " , ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = export_bulk_certificates(
            State(state.clone()),
            Json(BulkRequest {
                recipients: "Ann, Ben".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"Certificates_Bulk_"));

        let bytes = body(response).await;
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let Json(view) = get_session(State(state)).await;
        assert_eq!(view.data.certificate_number, "NO: 13.024/IMPCT/V/2025");
    }

    #[tokio::test]
    async fn test_template_download() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let err = get_template(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        with_template(&state).await;
        let response = get_template(State(state)).await.unwrap();
        assert!(body(response).await.starts_with(b"%PDF"));
    }

    #[test]
    fn test_content_disposition_encodes_non_ascii() {
        assert_eq!(
            content_disposition("Certificate_Ann.pdf"),
            "attachment; filename=\"Certificate_Ann.pdf\""
        );
        assert_eq!(
            content_disposition("Certificate_José.pdf"),
            "attachment; filename=\"Certificate_Jos_.pdf\"; filename*=UTF-8''Certificate_Jos%C3%A9.pdf"
        );
    }
}
