pub mod interactive;
pub mod preview;
pub mod slide_card;

use anyhow::Result;
use deckchat_core::{deck_file, ConversationManager};
use std::path::Path;

pub use interactive::*;
pub use preview::*;

/// Run slide preview for a saved deck file
pub async fn run_preview<P: AsRef<Path>>(file_path: P) -> Result<()> {
    let slides = deck_file::read_deck(file_path.as_ref()).await?;
    let mut preview = SlidePreview::new(slides);
    preview.run().await
}

/// Run the interactive chat against an already spawned session worker
pub async fn run_interactive(manager: ConversationManager) -> Result<()> {
    let mut app = InteractiveApp::new(manager);
    app.run().await
}
