// The editing session: template, element layout, certificate data, zoom and
// the pointer drag state, all driven by HTTP requests.
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::export::ExportJob;
use crate::layout::{
    project, DisplayGeometry, DragController, DragState, Point, PointerOutcome, TextMeasure, Zoom,
};
use crate::model::{
    default_elements, CertificateData, ElementPatch, FieldKind, ModelError, TextElement,
};
use crate::pdf::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ZoomCommand {
    In,
    Out,
    Reset,
    Set { percent: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer event in screen pixels relative to the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub name: String,
    pub page_width: f64,
    pub page_height: f64,
}

impl From<&Template> for TemplateInfo {
    fn from(t: &Template) -> Self {
        Self {
            name: t.name.clone(),
            page_width: t.page_width,
            page_height: t.page_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomView {
    pub zoom: Zoom,
    pub pixel_width: f64,
    pub scale: f64,
}

impl From<Zoom> for ZoomView {
    fn from(zoom: Zoom) -> Self {
        Self {
            zoom,
            pixel_width: zoom.pixel_width(),
            scale: zoom.scale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub template: Option<TemplateInfo>,
    pub elements: Vec<TextElement>,
    pub data: CertificateData,
    #[serde(flatten)]
    pub zoom: ZoomView,
    pub drag: DragState,
}

/// What the editor should draw at the current zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    #[serde(flatten)]
    pub zoom: ZoomView,
    /// Page height in screen pixels, present once a template is loaded.
    pub pixel_height: Option<f64>,
    pub elements: Vec<DisplayGeometry>,
}

#[derive(Debug)]
pub struct EditorSession {
    template: Option<Template>,
    elements: Vec<TextElement>,
    data: CertificateData,
    zoom: Zoom,
    drag: DragController,
}

impl EditorSession {
    pub fn new(data: CertificateData) -> Self {
        Self {
            template: None,
            elements: default_elements(),
            data,
            zoom: Zoom::default(),
            drag: DragController::new(),
        }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn set_template(&mut self, template: Template) {
        info!(
            name = %template.name,
            width = template.page_width,
            height = template.page_height,
            "template loaded"
        );
        self.template = Some(template);
    }

    pub fn elements(&self) -> &[TextElement] {
        &self.elements
    }

    pub fn data(&self) -> &CertificateData {
        &self.data
    }

    pub fn set_data(&mut self, data: CertificateData) {
        self.data = data;
    }

    /// Applies a partial style/geometry edit. Nothing changes if the patch
    /// carries an invalid value.
    pub fn update_element(
        &mut self,
        id: FieldKind,
        patch: ElementPatch,
    ) -> Result<&TextElement, ModelError> {
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ModelError::UnknownField(id.to_string()))?;
        element.apply(patch)?;
        Ok(element)
    }

    pub fn apply_zoom(&mut self, command: ZoomCommand) -> Zoom {
        self.zoom = match command {
            ZoomCommand::In => self.zoom.zoom_in(),
            ZoomCommand::Out => self.zoom.zoom_out(),
            ZoomCommand::Reset => Zoom::default(),
            ZoomCommand::Set { percent } => Zoom::new(percent),
        };
        debug!(zoom = self.zoom.percent(), "zoom changed");
        self.zoom
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            template: self.template.as_ref().map(TemplateInfo::from),
            elements: self.elements.clone(),
            data: self.data.clone(),
            zoom: self.zoom.into(),
            drag: self.drag.state(),
        }
    }

    /// Screen geometry for every element. Empty fields show their placeholder.
    pub fn geometry(&self, measure: &dyn TextMeasure) -> Vec<DisplayGeometry> {
        let scale = self.zoom.scale();
        self.elements
            .iter()
            .map(|element| {
                let text = self.data.text_for(element.kind);
                let content = if text.is_empty() {
                    element.kind.placeholder()
                } else {
                    text
                };
                project(element, content, scale, measure)
            })
            .collect()
    }

    pub fn preview(&self, measure: &dyn TextMeasure) -> Preview {
        let zoom = ZoomView::from(self.zoom);
        let pixel_height = self
            .template
            .as_ref()
            .map(|t| zoom.pixel_width * t.page_height / t.page_width);
        Preview {
            zoom,
            pixel_height,
            elements: self.geometry(measure),
        }
    }

    /// Topmost element under the pointer. Later elements are drawn on top.
    pub fn hit_test(&self, pointer: Point, measure: &dyn TextMeasure) -> Option<DisplayGeometry> {
        self.geometry(measure)
            .into_iter()
            .rev()
            .find(|g| g.contains(pointer.x, pointer.y))
    }

    pub fn pointer(&mut self, event: PointerEvent, measure: &dyn TextMeasure) -> PointerOutcome {
        let point = Point::new(event.x, event.y);
        match event.phase {
            PointerPhase::Down => match self.hit_test(point, measure) {
                Some(hit) => self.drag.pointer_down(&hit, point),
                None => match self.drag.state() {
                    DragState::Dragging(session) => PointerOutcome::Rejected {
                        dragging: session.element,
                    },
                    DragState::Idle => PointerOutcome::Ignored,
                },
            },
            PointerPhase::Move => {
                let scale = self.zoom.scale();
                self.drag.pointer_move(&mut self.elements, point, scale)
            }
            PointerPhase::Up => self.drag.pointer_up(),
        }
    }

    /// Drops any drag left behind by a client that never sent pointer-up.
    pub fn cancel_drag(&mut self) -> Option<FieldKind> {
        match self.drag.pointer_up() {
            PointerOutcome::Ended {
                element: Some(element),
            } => {
                info!(%element, "abandoned drag cancelled");
                Some(element)
            }
            _ => None,
        }
    }

    /// Copies what an export needs. The canvas width is the editor's current
    /// pixel width, which sets the export scale.
    pub fn snapshot(&self) -> ExportJob {
        ExportJob {
            template: self.template.clone(),
            elements: self.elements.clone(),
            data: self.data.clone(),
            canvas_width: self.zoom.pixel_width(),
        }
    }
}
