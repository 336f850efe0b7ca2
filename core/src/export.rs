use chrono::{NaiveDate, Utc};
use deckchat_common::{Slide, SlideContent};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::error::ExportError;
use crate::layout::{slide_layout, Frame, FOOTER_FRAME, NUMBER_FRAME, TITLE_FRAME};

pub const FOOTER_TEXT: &str = "Generated by AI PowerPoint Assistant";
pub const FILE_PREFIX: &str = "AI_Presentation_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub author: String,
    pub company: String,
    pub title: String,
    pub subject: String,
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self {
            author: "AI PowerPoint Generator".to_string(),
            company: "Gemini AI".to_string(),
            title: "AI Generated Presentation".to_string(),
            subject: "Auto-generated presentation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u32,
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    /// Content boxes are top aligned.
    #[serde(default)]
    pub valign_top: bool,
}

impl TextStyle {
    fn new(font_size: u32, color: &str) -> Self {
        Self {
            font_size,
            color: color.to_string(),
            bold: false,
            align: None,
            valign_top: false,
        }
    }

    fn number() -> Self {
        Self {
            align: Some(Align::Left),
            ..Self::new(12, "666666")
        }
    }

    fn title() -> Self {
        Self {
            bold: true,
            align: Some(Align::Left),
            ..Self::new(32, "1F4788")
        }
    }

    fn body() -> Self {
        Self {
            valign_top: true,
            ..Self::new(16, "333333")
        }
    }

    fn footer() -> Self {
        Self {
            align: Some(Align::Center),
            ..Self::new(10, "999999")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Text {
        text: String,
        frame: Frame,
        style: TextStyle,
    },
    /// One bullet per item, each styled with `style`.
    Bullets {
        items: Vec<String>,
        frame: Frame,
        style: TextStyle,
    },
    Image {
        url: String,
        frame: Frame,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSlide {
    pub number: usize,
    pub elements: Vec<Element>,
}

/// Everything a presentation encoder needs, already laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub file_stem: String,
    pub properties: DocumentProperties,
    pub slides: Vec<ExportedSlide>,
}

pub trait PresentationWriter {
    fn extension(&self) -> &str;

    /// What the written file is, as shown to the user.
    fn label(&self) -> &str;

    fn write(&self, plan: &ExportPlan, path: &Path) -> Result<(), ExportError>;
}

/// Writes the plan itself as pretty JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter;

impl PresentationWriter for JsonWriter {
    fn extension(&self) -> &str {
        "json"
    }

    fn label(&self) -> &str {
        "Export plan"
    }

    fn write(&self, plan: &ExportPlan, path: &Path) -> Result<(), ExportError> {
        let content = serde_json::to_string_pretty(plan)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn file_stem(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}", date.format("%Y-%m-%d"))
}

/// Lay out `slides`. Relative image URLs are resolved against `image_base`.
pub fn build_plan(
    slides: &[Slide],
    image_base: Option<&Url>,
    date: NaiveDate,
) -> Result<ExportPlan, ExportError> {
    if slides.is_empty() {
        return Err(ExportError::EmptyDeck);
    }

    let slides = slides
        .iter()
        .enumerate()
        .map(|(index, slide)| export_slide(index + 1, slide, image_base))
        .collect();

    Ok(ExportPlan {
        file_stem: file_stem(date),
        properties: DocumentProperties::default(),
        slides,
    })
}

fn export_slide(number: usize, slide: &Slide, image_base: Option<&Url>) -> ExportedSlide {
    let layout = slide_layout(slide);
    let mut elements = vec![
        Element::Text {
            text: number.to_string(),
            frame: NUMBER_FRAME,
            style: TextStyle::number(),
        },
        Element::Text {
            text: slide.display_title().to_string(),
            frame: TITLE_FRAME,
            style: TextStyle::title(),
        },
    ];

    match &slide.content {
        Some(SlideContent::Bullets(items)) if !items.is_empty() => {
            elements.push(Element::Bullets {
                items: items.clone(),
                frame: layout.content,
                style: TextStyle::body(),
            });
        }
        Some(SlideContent::Text(text)) => {
            elements.push(Element::Text {
                text: text.clone(),
                frame: layout.content,
                style: TextStyle::body(),
            });
        }
        _ => {}
    }

    if let (Some(url), Some(frame)) = (slide.image(), layout.image) {
        elements.push(Element::Image {
            url: resolve_image_url(url, image_base),
            frame,
        });
    }

    elements.push(Element::Text {
        text: FOOTER_TEXT.to_string(),
        frame: FOOTER_FRAME,
        style: TextStyle::footer(),
    });

    ExportedSlide { number, elements }
}

/// Unparseable URLs are passed through untouched.
fn resolve_image_url(url: &str, base: Option<&Url>) -> String {
    let Some(base) = base else {
        return url.to_string();
    };
    match base.join(url) {
        Ok(resolved) => resolved.into(),
        Err(e) => {
            warn!("keeping image URL {url:?} as is: {e}");
            url.to_string()
        }
    }
}

/// Build the plan for today (UTC) and write it into `dir`.
pub fn export_deck(
    slides: &[Slide],
    image_base: Option<&Url>,
    dir: &Path,
    writer: &dyn PresentationWriter,
) -> Result<PathBuf, ExportError> {
    let plan = build_plan(slides, image_base, Utc::now().date_naive())?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", plan.file_stem, writer.extension()));
    writer.write(&plan, &path)?;
    info!(slides = plan.slides.len(), "exported to {}", path.display());
    Ok(path)
}
