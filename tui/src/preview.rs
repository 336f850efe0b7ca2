use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deckchat_common::Slide;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;

use crate::slide_card::slide_card_lines;

/// Full-screen pager over a saved deck.
pub struct SlidePreview {
    slides: Vec<Slide>,
    current_slide: usize,
    running: bool,
}

impl SlidePreview {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            current_slide: 0,
            running: true,
        }
    }

    pub fn current(&self) -> usize {
        self.current_slide
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        while self.running {
            terminal.draw(|f| self.draw(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left | KeyCode::Char('h') => self.previous_slide(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.next_slide(),
            _ => {}
        }
    }

    fn draw(&self, f: &mut Frame) {
        let size = f.area();

        let lines = match self.slides.get(self.current_slide) {
            Some(slide) => slide_card_lines(self.current_slide, slide, false),
            None => vec![Line::from("No slide content")],
        };

        let title = format!(
            "Slide Preview ({}/{})",
            (self.current_slide + 1).min(self.slides.len()),
            self.slides.len()
        );

        let block = Block::default().title(title).borders(Borders::ALL);

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });

        f.render_widget(paragraph, size);
    }

    fn next_slide(&mut self) {
        if self.current_slide < self.slides.len().saturating_sub(1) {
            self.current_slide += 1;
        }
    }

    fn previous_slide(&mut self) {
        if self.current_slide > 0 {
            self.current_slide -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        let mut preview = SlidePreview::new(vec![Slide::default(), Slide::default()]);
        preview.handle_key(KeyCode::Left);
        assert_eq!(preview.current(), 0);
        preview.handle_key(KeyCode::Right);
        preview.handle_key(KeyCode::Right);
        assert_eq!(preview.current(), 1);
        preview.handle_key(KeyCode::Char('q'));
        assert!(!preview.running);
    }
}
