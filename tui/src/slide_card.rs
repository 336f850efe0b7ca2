use deckchat_common::{Slide, SlideContent};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Lines for one slide in the deck pane.
pub fn slide_card_lines(index: usize, slide: &Slide, selected: bool) -> Vec<Line<'static>> {
    let mut title_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    if selected {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{:>2} ", index + 1),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(slide.display_title().to_string(), title_style),
    ])];

    match &slide.content {
        Some(SlideContent::Bullets(items)) => {
            lines.extend(items.iter().map(|item| Line::from(format!("   • {item}"))));
        }
        Some(SlideContent::Text(text)) => {
            lines.extend(text.lines().map(|line| Line::from(format!("   {line}"))));
        }
        Some(SlideContent::Other(_)) | None => {}
    }

    if slide.image().is_some() {
        lines.push(Line::from(Span::styled(
            format!("   [image: {}]", slide.position()),
            Style::default().fg(Color::Magenta),
        )));
    }

    lines.push(Line::from(""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckchat_common::ImagePosition;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn bullets_are_listed() {
        let slide = Slide::new("Intro", SlideContent::bullets(["one", "two"]));
        let text = plain(&slide_card_lines(0, &slide, false));
        assert_eq!(text, vec![" 1 Intro", "   • one", "   • two", ""]);
    }

    #[test]
    fn image_indicator_and_fallback_title() {
        let mut slide = Slide::default().with_image("/static/uploads/a.jpg", ImagePosition::Left);
        slide.content = Some(SlideContent::Text("body".into()));
        let text = plain(&slide_card_lines(2, &slide, true));
        assert_eq!(text[0], " 3 Untitled Slide");
        assert_eq!(text[1], "   body");
        assert_eq!(text[2], "   [image: left]");
    }
}
