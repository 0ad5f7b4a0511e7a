use crate::config::Config;
use crate::pdf::fonts::FontLibrary;
use crate::session::EditorSession;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub config: Arc<Config>,
    /// The single editing session. Exports copy what they need and release
    /// the lock before rendering.
    pub session: Mutex<EditorSession>,
    pub fonts: Arc<FontLibrary>,
}

impl AppState {
    pub fn new(config: Arc<Config>, session: EditorSession) -> Self {
        let fonts = Arc::new(FontLibrary::new(config.font_dir.clone()));
        Self {
            config,
            session: Mutex::new(session),
            fonts,
        }
    }
}
