//! Slide session core: the session manager that owns the deck, the worker
//! that serializes requests to it, and the export path.

pub mod client;
pub mod config;
pub mod conversation_manager;
pub mod deck_file;
pub mod error;
pub mod export;
pub mod intent;
pub mod layout;
pub mod message_history;
pub mod pptx;
pub mod session;

pub use client::{HttpSlideService, SlideService};
pub use config::Config;
pub use conversation_manager::{ConversationManager, WorkerOptions};
pub use error::{ConfigError, ExportError, SessionError};
pub use pptx::PptxWriter;
pub use session::{Outcome, SessionState, SlideSession};
