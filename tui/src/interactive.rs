use anyhow::Result;
use crossterm::{
    event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deckchat_common::Slide;
use deckchat_core::ConversationManager;
use deckchat_protocol::{Event, Op};
use futures_util::StreamExt;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;

use crate::slide_card::slide_card_lines;

const WELCOME: [&str; 6] = [
    "Welcome! I can create and edit presentations through simple conversation.",
    "Try:",
    "  \"Create 5 slides about Artificial Intelligence in Education\"",
    "  \"Edit slide 2: change the title to 'AI in Modern Learning'\"",
    "  \"Update slide 3 - add a point about 'Ethical Concerns'\"",
    "",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    ClearSlides,
    ClearChat,
}

/// Everything the interactive screen shows. Mirrors worker events; the deck
/// here is a copy, the worker's session stays authoritative.
pub struct ChatView {
    pub running: bool,
    input: String,
    messages: Vec<(Role, String)>,
    slides: Vec<Slide>,
    selected: Option<usize>,
    waiting: bool,
    confirm: Option<Confirm>,
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            running: true,
            input: String::new(),
            messages: Vec::new(),
            slides: Vec::new(),
            selected: None,
            waiting: false,
            confirm: None,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::TaskStarted { .. } => self.waiting = true,
            Event::TaskComplete => self.waiting = false,
            Event::DeckReplaced { slides } => {
                self.selected = None;
                self.slides = slides;
            }
            Event::DeckCleared => {
                self.selected = None;
                self.slides.clear();
            }
            Event::ChatCleared => self.messages.clear(),
            Event::AgentMessage { message } => self.messages.push((Role::Assistant, message)),
            Event::Error { message } => self.messages.push((Role::Error, message)),
            Event::ShutdownComplete => self.running = false,
            Event::SessionConfigured {} | Event::ExportComplete { .. } => {}
        }
    }

    /// Apply a key press; returns what to submit to the worker, if anything.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Op> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let confirm = self.confirm.take();

        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.running = false;
                None
            }
            KeyCode::Char('k') if ctrl => self.confirmed(confirm, Confirm::ClearSlides),
            KeyCode::Char('l') if ctrl => self.confirmed(confirm, Confirm::ClearChat),
            KeyCode::Char('e') if ctrl => Some(Op::Export { dir: None }),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.input.push('\n');
                None
            }
            KeyCode::Enter => {
                let text = self.input.trim().to_string();
                self.input.clear();
                if text.is_empty() {
                    return None;
                }
                self.messages.push((Role::User, text.clone()));
                Some(Op::UserInput { text })
            }
            KeyCode::Up => {
                self.select(-1);
                None
            }
            KeyCode::Down => {
                self.select(1);
                None
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }

    pub fn submission_rejected(&mut self, reason: &str) {
        self.messages
            .push((Role::Error, format!("Request not sent ({reason}). Try again shortly.")));
    }

    /// Destructive actions need the same key twice in a row.
    fn confirmed(&mut self, pending: Option<Confirm>, wanted: Confirm) -> Option<Op> {
        if pending == Some(wanted) {
            return Some(match wanted {
                Confirm::ClearSlides => Op::ClearSlides,
                Confirm::ClearChat => Op::ClearChat,
            });
        }
        self.confirm = Some(wanted);
        None
    }

    fn select(&mut self, step: isize) {
        if self.slides.is_empty() {
            self.selected = None;
            return;
        }
        let last = self.slides.len() - 1;
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) if step < 0 => i.saturating_sub(1),
            Some(i) => (i + 1).min(last),
        });
    }

    fn status_line(&self) -> String {
        match self.confirm {
            Some(Confirm::ClearSlides) => "Press Ctrl+K again to clear all slides".to_string(),
            Some(Confirm::ClearChat) => "Press Ctrl+L again to clear the chat history".to_string(),
            None if self.waiting => "Waiting for the slide service...".to_string(),
            None => "Enter send | Ctrl+E export | Ctrl+K clear slides | Ctrl+L clear chat | Ctrl+Q quit"
                .to_string(),
        }
    }

    fn chat_lines(&self) -> Vec<Line<'_>> {
        let mut lines: Vec<Line> = Vec::new();
        if self.messages.is_empty() {
            lines.extend(WELCOME.iter().map(|l| Line::from(*l)));
        }
        for (role, text) in &self.messages {
            let (label, style) = match role {
                Role::User => ("You", Style::default().fg(Color::Yellow)),
                Role::Assistant => ("Assistant", Style::default().fg(Color::Green)),
                Role::Error => ("Assistant", Style::default().fg(Color::Red)),
            };
            let mut body = text.lines();
            lines.push(Line::from(vec![
                Span::styled(label, style.add_modifier(Modifier::BOLD)),
                Span::raw(": "),
                Span::raw(body.next().unwrap_or_default()),
            ]));
            lines.extend(body.map(Line::from));
        }
        lines
    }

    pub fn draw(&self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        let chat = self.chat_lines();
        let visible = columns[0].height.saturating_sub(2) as usize;
        let chat_scroll = chat.len().saturating_sub(visible) as u16;
        let chat_widget = Paragraph::new(chat)
            .block(Block::default().title("Chat").borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((chat_scroll, 0));
        f.render_widget(chat_widget, columns[0]);

        let mut deck = Vec::new();
        let mut selected_offset = 0;
        for (i, slide) in self.slides.iter().enumerate() {
            if Some(i) == self.selected {
                selected_offset = deck.len();
            }
            deck.extend(slide_card_lines(i, slide, Some(i) == self.selected));
        }
        if deck.is_empty() {
            deck.push(Line::from("No slides yet. Start chatting to create your presentation."));
        }
        let deck_title = format!("Slides ({})", self.slides.len());
        let deck_widget = Paragraph::new(deck)
            .block(Block::default().title(deck_title).borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((selected_offset as u16, 0));
        f.render_widget(deck_widget, columns[1]);

        let input = Paragraph::new(self.input.as_str())
            .block(Block::default().title("Message").borders(Borders::ALL));
        f.render_widget(input, rows[1]);

        let status = Paragraph::new(self.status_line()).style(Style::default().fg(Color::DarkGray));
        f.render_widget(status, rows[2]);
    }
}

pub struct InteractiveApp {
    view: ChatView,
    manager: ConversationManager,
}

impl InteractiveApp {
    pub fn new(manager: ConversationManager) -> Self {
        Self {
            view: ChatView::new(),
            manager,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let manager = self.manager.clone();
        let mut input = EventStream::new();

        while self.view.running {
            terminal.draw(|f| self.view.draw(f))?;

            tokio::select! {
                maybe_ev = manager.next_event() => {
                    match maybe_ev {
                        Some(ev) => self.view.handle_event(ev),
                        None => self.view.running = false,
                    }
                }
                maybe_term = input.next() => {
                    match maybe_term {
                        Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            if let Some(op) = self.view.handle_key(key) {
                                // Never wait for queue room here; that would stop event draining.
                                if let Err(e) = manager.try_submit(op) {
                                    self.view.submission_rejected(&e.to_string());
                                }
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => self.view.running = false,
                    }
                }
            }
        }

        // The worker may already be gone.
        manager.shutdown().await.ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckchat_common::{Intent, SlideContent};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(view: &mut ChatView, text: &str) {
        for c in text.chars() {
            assert!(view.handle_key(key(KeyCode::Char(c))).is_none());
        }
    }

    #[test]
    fn enter_submits_trimmed_input() {
        let mut view = ChatView::new();
        type_text(&mut view, "  Create 5 slides about X ");

        let op = view.handle_key(key(KeyCode::Enter));

        assert!(matches!(op, Some(Op::UserInput { text }) if text == "Create 5 slides about X"));
        assert_eq!(view.messages.last().map(|m| m.0), Some(Role::User));
        assert!(view.handle_key(key(KeyCode::Enter)).is_none());
    }

    #[test]
    fn waiting_follows_task_events() {
        let mut view = ChatView::new();
        view.handle_event(Event::TaskStarted {
            intent: Intent::Create,
        });
        assert!(view.is_waiting());

        view.handle_event(Event::DeckReplaced {
            slides: vec![Slide::new("A", SlideContent::bullets(["x"]))],
        });
        view.handle_event(Event::TaskComplete);
        assert!(!view.is_waiting());
        assert_eq!(view.slides().len(), 1);
    }

    #[test]
    fn clearing_needs_confirmation() {
        let mut view = ChatView::new();
        assert!(view.handle_key(ctrl('k')).is_none());
        assert!(matches!(view.handle_key(ctrl('k')), Some(Op::ClearSlides)));

        assert!(view.handle_key(ctrl('l')).is_none());
        type_text(&mut view, "x");
        // Another key in between cancels the pending confirmation.
        assert!(view.handle_key(ctrl('l')).is_none());
        assert!(matches!(view.handle_key(ctrl('l')), Some(Op::ClearChat)));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut view = ChatView::new();
        view.handle_key(key(KeyCode::Down));
        assert_eq!(view.selected, None);

        view.handle_event(Event::DeckReplaced {
            slides: vec![Slide::default(), Slide::default()],
        });
        for _ in 0..5 {
            view.handle_key(key(KeyCode::Down));
        }
        assert_eq!(view.selected, Some(1));
        for _ in 0..5 {
            view.handle_key(key(KeyCode::Up));
        }
        assert_eq!(view.selected, Some(0));

        view.handle_event(Event::DeckCleared);
        assert_eq!(view.selected, None);
    }

    #[test]
    fn rejected_submission_is_shown() {
        let mut view = ChatView::new();
        view.submission_rejected("submission queue is full");
        assert_eq!(
            view.messages,
            vec![(
                Role::Error,
                "Request not sent (submission queue is full). Try again shortly.".into()
            )]
        );
    }

    #[test]
    fn errors_are_shown() {
        let mut view = ChatView::new();
        view.handle_event(Event::Error {
            message: "Sorry, an error occurred: boom".into(),
        });
        assert_eq!(view.messages, vec![(Role::Error, "Sorry, an error occurred: boom".into())]);

        view.handle_event(Event::ChatCleared);
        assert!(view.messages.is_empty());
    }

    #[test]
    fn draws_without_panicking() {
        let mut view = ChatView::new();
        view.handle_event(Event::DeckReplaced {
            slides: vec![Slide::new("A", SlideContent::Text("b".into()))],
        });
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| view.draw(f)).unwrap();
        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(rendered.contains("Slides (1)"));
    }
}
