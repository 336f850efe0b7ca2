use anyhow::{Context, Result};
use deckchat_common::Slide;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum DeckFile {
    Bare(Vec<Slide>),
    Wrapped { slides: Vec<Slide> },
}

/// Read a saved deck. Accepts a bare slide array or a service response
/// (`{"slides": [...], ...}`).
pub async fn read_deck(path: &Path) -> Result<Vec<Slide>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_deck(&content).with_context(|| format!("{} is not a slide deck", path.display()))
}

pub fn parse_deck(content: &str) -> Result<Vec<Slide>> {
    let slides = match serde_json::from_str::<DeckFile>(content)? {
        DeckFile::Bare(slides) | DeckFile::Wrapped { slides } => slides,
    };
    Ok(slides)
}

pub async fn write_deck(path: &Path, slides: &[Slide]) -> Result<()> {
    let content = serde_json::to_string_pretty(slides)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
