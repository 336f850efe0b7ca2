use deckchat_common::{Intent, Slide};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the session worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SessionConfigured {},
    TaskStarted { intent: Intent },
    DeckReplaced { slides: Vec<Slide> },
    AgentMessage { message: String },
    DeckCleared,
    ChatCleared,
    ExportComplete { path: PathBuf },
    TaskComplete,
    Error { message: String },
    ShutdownComplete,
}

/// Requests a front end submits to the session worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Op {
    UserInput { text: String },
    LoadPresentation { id: u64 },
    ClearSlides,
    ClearChat,
    Export { dir: Option<PathBuf> },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub op: Op,
}

impl Submission {
    pub fn new(op: Op) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            op,
        }
    }
}
