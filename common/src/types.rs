use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const UNTITLED_SLIDE: &str = "Untitled Slide";

/// A single slide as exchanged with the generation service.
///
/// Slides are written by a language model, so every field the client reads
/// tolerates values of the wrong type. Those are carried as raw JSON and
/// ignored by display and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Loose<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<SlideContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_image: Option<Loose<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Loose<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_position: Option<Loose<ImagePosition>>,
    /// Fields the client does not interpret (e.g. `image_search_query`).
    /// Kept so the deck sent back on the edit path matches what was received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A value of the expected type, or whatever the service sent instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loose<T> {
    Valid(T),
    Raw(Value),
}

impl<T> Loose<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Loose::Valid(value) => Some(value),
            Loose::Raw(_) => None,
        }
    }
}

impl<T> From<T> for Loose<T> {
    fn from(value: T) -> Self {
        Loose::Valid(value)
    }
}

impl Slide {
    pub fn new(title: impl Into<String>, content: SlideContent) -> Self {
        Self {
            title: Some(Loose::Valid(title.into())),
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, url: impl Into<String>, position: ImagePosition) -> Self {
        self.has_image = Some(Loose::Valid(true));
        self.image_url = Some(Loose::Valid(url.into()));
        self.image_position = Some(Loose::Valid(position));
        self
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_ref().and_then(Loose::valid) {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED_SLIDE,
        }
    }

    /// The image URL, but only when the slide is flagged as having an image
    /// and the URL is non-empty.
    pub fn image(&self) -> Option<&str> {
        if self.has_image.as_ref().and_then(Loose::valid) != Some(&true) {
            return None;
        }
        self.image_url
            .as_ref()
            .and_then(Loose::valid)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn position(&self) -> ImagePosition {
        self.image_position
            .as_ref()
            .and_then(Loose::valid)
            .cloned()
            .unwrap_or_default()
    }
}

/// Slide body: a bullet list, one block of text, or anything else the
/// service produced (kept verbatim, never displayed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideContent {
    Bullets(Vec<String>),
    Text(String),
    Other(Value),
}

impl SlideContent {
    pub fn bullets<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SlideContent::Bullets(items.into_iter().map(Into::into).collect())
    }
}

/// Where the image sits on an exported slide.
///
/// The service is free to send positions outside the four laid out ones
/// (`center`, `background`, ...). Those are kept verbatim in `Other` and are
/// laid out like `Right`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImagePosition {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
    Other(String),
}

impl ImagePosition {
    pub fn as_str(&self) -> &str {
        match self {
            ImagePosition::Top => "top",
            ImagePosition::Bottom => "bottom",
            ImagePosition::Left => "left",
            ImagePosition::Right => "right",
            ImagePosition::Other(raw) => raw,
        }
    }
}

impl From<String> for ImagePosition {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "top" => ImagePosition::Top,
            "bottom" => ImagePosition::Bottom,
            "left" => ImagePosition::Left,
            "right" => ImagePosition::Right,
            _ => ImagePosition::Other(raw),
        }
    }
}

impl From<ImagePosition> for String {
    fn from(position: ImagePosition) -> Self {
        match position {
            ImagePosition::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ImagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which endpoint an utterance is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Create,
    Edit,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Create => f.write_str("create"),
            Intent::Edit => f.write_str("edit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_accepts_list_or_text() {
        let list: Slide = serde_json::from_value(json!({
            "title": "Intro",
            "content": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(list.content, Some(SlideContent::bullets(["a", "b"])));

        let text: Slide = serde_json::from_value(json!({
            "title": "Intro",
            "content": "just text"
        }))
        .unwrap();
        assert_eq!(text.content, Some(SlideContent::Text("just text".into())));
    }

    #[test]
    fn unknown_fields_and_positions_are_kept() {
        let raw = json!({
            "title": "Cover",
            "content": ["x"],
            "image_search_query": "rocket launch",
            "image_position": "background"
        });
        let slide: Slide = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(slide.position(), ImagePosition::Other("background".into()));
        assert_eq!(serde_json::to_value(&slide).unwrap(), raw);
    }

    #[test]
    fn image_requires_flag_and_url() {
        let mut slide = Slide::new("t", SlideContent::Text(String::new()));
        slide.image_url = Some("/static/uploads/a.jpg".to_string().into());
        assert_eq!(slide.image(), None);

        slide.has_image = Some(true.into());
        assert_eq!(slide.image(), Some("/static/uploads/a.jpg"));

        slide.image_url = Some(String::new().into());
        assert_eq!(slide.image(), None);
    }

    #[test]
    fn odd_shapes_are_kept_verbatim() {
        let raw = json!({
            "title": 7,
            "content": ["Revenue up", 42, ["nested"]],
            "has_image": "yes",
            "image_url": {"src": "/static/a.jpg"},
            "image_position": 3
        });
        let slide: Slide = serde_json::from_value(raw.clone()).unwrap();

        assert!(matches!(slide.content, Some(SlideContent::Other(_))));
        assert_eq!(slide.display_title(), UNTITLED_SLIDE);
        assert_eq!(slide.image(), None);
        assert_eq!(slide.position(), ImagePosition::Right);
        assert_eq!(serde_json::to_value(&slide).unwrap(), raw);
    }

    #[test]
    fn display_title_falls_back() {
        let slide = Slide::default();
        assert_eq!(slide.display_title(), UNTITLED_SLIDE);
        assert_eq!(slide.position(), ImagePosition::Right);
    }
}
