//! Fixed slide geometry, in inches on a 10 x 7.5 page.
//!
//! Not a layout engine: four literal coordinate sets keyed on the image
//! position, plus one for slides without an image.

use deckchat_common::{ImagePosition, Slide};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideLayout {
    pub content: Frame,
    pub image: Option<Frame>,
}

pub const NUMBER_FRAME: Frame = Frame::new(0.5, 0.3, 0.5, 0.3);
pub const TITLE_FRAME: Frame = Frame::new(0.5, 0.7, 9.0, 0.8);
pub const FOOTER_FRAME: Frame = Frame::new(0.5, 7.0, 9.0, 0.3);
pub const FULL_WIDTH_CONTENT: Frame = Frame::new(0.7, 1.7, 8.6, 5.0);

const TOP: SlideLayout = SlideLayout {
    image: Some(Frame::new(2.5, 1.7, 5.0, 2.8)),
    content: Frame::new(0.7, 4.8, 8.6, 2.0),
};

const BOTTOM: SlideLayout = SlideLayout {
    content: Frame::new(0.7, 1.7, 8.6, 2.5),
    image: Some(Frame::new(2.5, 4.5, 5.0, 2.5)),
};

const LEFT: SlideLayout = SlideLayout {
    image: Some(Frame::new(0.5, 1.7, 4.2, 5.0)),
    content: Frame::new(5.0, 1.7, 4.5, 5.0),
};

const RIGHT: SlideLayout = SlideLayout {
    content: Frame::new(0.7, 1.7, 4.5, 5.0),
    image: Some(Frame::new(5.5, 1.7, 4.0, 5.0)),
};

const NO_IMAGE: SlideLayout = SlideLayout {
    content: FULL_WIDTH_CONTENT,
    image: None,
};

/// Unknown positions fall through to `Right`.
pub fn image_layout(position: &ImagePosition) -> SlideLayout {
    match position {
        ImagePosition::Top => TOP,
        ImagePosition::Bottom => BOTTOM,
        ImagePosition::Left => LEFT,
        ImagePosition::Right | ImagePosition::Other(_) => RIGHT,
    }
}

pub fn slide_layout(slide: &Slide) -> SlideLayout {
    match slide.image() {
        Some(_) => image_layout(&slide.position()),
        None => NO_IMAGE,
    }
}
