use anyhow::Result;
use deckchat_protocol::{Event, Op, Submission};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info_span, Instrument};

use crate::error::SessionError;
use crate::export::PresentationWriter;
use crate::message_history::{ChatEntry, ChatHistory};
use crate::pptx::PptxWriter;
use crate::session::SlideSession;

pub const SLIDES_CLEARED_MESSAGE: &str =
    "All slides cleared. You can start creating a new presentation.";

pub struct WorkerOptions {
    pub history_limit: usize,
    pub export_dir: PathBuf,
    pub writer: Box<dyn PresentationWriter + Send + Sync>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            history_limit: 200,
            export_dir: PathBuf::from("."),
            writer: Box::new(PptxWriter),
        }
    }
}

/// Handle to the task that owns the session.
///
/// Submissions are queued and handled one at a time, so a second utterance
/// waits until the first one has been reconciled.
#[derive(Clone)]
pub struct ConversationManager {
    inner: Arc<Inner>,
}

struct Inner {
    tx_submit: mpsc::Sender<Submission>,
    rx_event: Mutex<mpsc::Receiver<Event>>,
    history: Arc<Mutex<ChatHistory>>,
}

impl ConversationManager {
    pub async fn spawn(session: SlideSession, options: WorkerOptions) -> Result<Self> {
        let (tx_submit, rx_submit) = mpsc::channel::<Submission>(64);
        let (tx_event, rx_event) = mpsc::channel::<Event>(256);
        let history = Arc::new(Mutex::new(ChatHistory::new(options.history_limit)));

        tx_event
            .send(Event::SessionConfigured {})
            .await
            .map_err(|e| anyhow::anyhow!(e))?;

        let worker = Worker {
            session,
            history: Arc::clone(&history),
            tx_event,
            export_dir: options.export_dir,
            writer: options.writer,
        };
        tokio::spawn(worker.run(rx_submit));

        let inner = Arc::new(Inner {
            tx_submit,
            rx_event: Mutex::new(rx_event),
            history,
        });
        Ok(Self { inner })
    }

    /// Queue `op`; returns the submission id.
    pub async fn submit(&self, op: Op) -> Result<String> {
        let submission = Submission::new(op);
        let id = submission.id.clone();
        self.inner
            .tx_submit
            .send(submission)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(id)
    }

    /// Queue `op` without waiting for room; fails when the queue is full.
    pub fn try_submit(&self, op: Op) -> Result<String> {
        let submission = Submission::new(op);
        let id = submission.id.clone();
        self.inner
            .tx_submit
            .try_send(submission)
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => anyhow::anyhow!("submission queue is full"),
                mpsc::error::TrySendError::Closed(_) => anyhow::anyhow!("session worker is gone"),
            })?;
        Ok(id)
    }

    pub async fn next_event(&self) -> Option<Event> {
        let mut rx = self.inner.rx_event.lock().await;
        rx.recv().await
    }

    pub async fn history(&self) -> Vec<ChatEntry> {
        self.inner.history.lock().await.entries()
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.submit(Op::Shutdown).await.map(|_| ())
    }
}

struct Worker {
    session: SlideSession,
    history: Arc<Mutex<ChatHistory>>,
    tx_event: mpsc::Sender<Event>,
    export_dir: PathBuf,
    writer: Box<dyn PresentationWriter + Send + Sync>,
}

impl Worker {
    async fn run(mut self, mut rx_submit: mpsc::Receiver<Submission>) {
        while let Some(submission) = rx_submit.recv().await {
            let span = info_span!("submission", id = %submission.id);
            let keep_going = self.handle(submission.op).instrument(span).await;
            if !keep_going {
                break;
            }
        }
        debug!("session worker stopped");
    }

    async fn handle(&mut self, op: Op) -> bool {
        match op {
            Op::UserInput { text } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return true;
                }
                self.history.lock().await.add_user(text.clone());
                let intent = self.session.classify(&text);
                self.emit(Event::TaskStarted { intent }).await;
                let result = self.session.send(&text).await;
                self.finish(result).await;
            }
            Op::LoadPresentation { id } => {
                self.emit(Event::TaskStarted {
                    intent: deckchat_common::Intent::Create,
                })
                .await;
                let result = self.session.load_presentation(id).await;
                self.finish(result).await;
            }
            Op::ClearSlides => {
                self.session.clear_deck();
                self.history.lock().await.add_assistant(SLIDES_CLEARED_MESSAGE);
                self.emit(Event::DeckCleared).await;
                self.emit(Event::AgentMessage {
                    message: SLIDES_CLEARED_MESSAGE.to_string(),
                })
                .await;
            }
            Op::ClearChat => {
                self.history.lock().await.clear();
                self.emit(Event::ChatCleared).await;
            }
            Op::Export { dir } => {
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                let exported = self.session.export(&dir, self.writer.as_ref());
                let label = self.writer.label().to_string();
                match exported {
                    Ok(path) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let message = format!("{label} generated successfully! File: {name}");
                        self.history.lock().await.add_assistant(message.clone());
                        self.emit(Event::ExportComplete { path }).await;
                        self.emit(Event::AgentMessage { message }).await;
                    }
                    Err(e) => {
                        let message = format!("Error generating {label}: {e}");
                        self.history.lock().await.add_failure_note(message.clone());
                        self.emit(Event::Error { message }).await;
                    }
                }
            }
            Op::Shutdown => {
                self.emit(Event::ShutdownComplete).await;
                return false;
            }
        }
        true
    }

    async fn finish(&mut self, result: crate::error::Result<crate::session::Outcome>) {
        match result {
            Ok(outcome) => {
                self.history.lock().await.add_assistant(outcome.message.clone());
                self.emit(Event::DeckReplaced {
                    slides: outcome.deck.to_vec(),
                })
                .await;
                self.emit(Event::AgentMessage {
                    message: outcome.message,
                })
                .await;
            }
            Err(SessionError::EmptyPrompt) => {}
            Err(e) => {
                let message = self.history.lock().await.add_error(&e.failure_message());
                self.emit(Event::Error { message }).await;
            }
        }
        self.emit(Event::TaskComplete).await;
    }

    async fn emit(&self, event: Event) {
        // The front end may already be gone; nothing left to report to.
        let _ = self.tx_event.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{deck_of, slides_reply, Call, RecordingService};
    use anyhow::anyhow;
    use deckchat_common::Intent;

    async fn spawn(service: Arc<RecordingService>) -> ConversationManager {
        let manager = ConversationManager::spawn(SlideSession::new(service), WorkerOptions::default())
            .await
            .unwrap();
        assert!(matches!(
            manager.next_event().await,
            Some(Event::SessionConfigured {})
        ));
        manager
    }

    async fn events_until_complete(manager: &ConversationManager) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = manager.next_event().await {
            let done = matches!(event, Event::TaskComplete | Event::ShutdownComplete);
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn queued_inputs_are_handled_in_order() {
        let service = RecordingService::replying(vec![
            slides_reply(3, Some("created")),
            slides_reply(3, Some("edited")),
        ]);
        let manager = spawn(service.clone()).await;

        manager
            .submit(Op::UserInput {
                text: "Create 3 slides about X".into(),
            })
            .await
            .unwrap();
        manager
            .submit(Op::UserInput {
                text: "Edit slide 2: change title".into(),
            })
            .await
            .unwrap();

        let first = events_until_complete(&manager).await;
        let second = events_until_complete(&manager).await;

        assert!(matches!(first[0], Event::TaskStarted { intent: Intent::Create }));
        assert!(matches!(second[0], Event::TaskStarted { intent: Intent::Edit }));
        // The edit saw the deck produced by the create.
        assert!(matches!(&service.calls()[1], Call::Update(req) if req.slides == deck_of(3)));

        let history = manager.history().await;
        let texts: Vec<_> = history.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Create 3 slides about X",
                "created",
                "Edit slide 2: change title",
                "edited"
            ]
        );
    }

    #[tokio::test]
    async fn failure_is_reported_and_recorded() {
        let service = RecordingService::replying(vec![Err(anyhow!("connection refused"))]);
        let manager = spawn(service).await;

        manager
            .submit(Op::UserInput { text: "make slides".into() })
            .await
            .unwrap();
        let events = events_until_complete(&manager).await;

        assert!(events.iter().any(|e| matches!(e, Event::Error { message }
            if message == "Sorry, an error occurred: connection refused")));
        assert!(!events.iter().any(|e| matches!(e, Event::DeckReplaced { .. })));
        assert!(manager.history().await.last().is_some_and(|e| e.is_error));
    }

    #[tokio::test]
    async fn clear_slides_and_chat() {
        let service = RecordingService::replying(vec![slides_reply(2, None)]);
        let manager = spawn(service.clone()).await;
        manager
            .submit(Op::UserInput { text: "slides on bees".into() })
            .await
            .unwrap();
        events_until_complete(&manager).await;

        manager.submit(Op::ClearSlides).await.unwrap();
        assert!(matches!(manager.next_event().await, Some(Event::DeckCleared)));
        assert!(matches!(manager.next_event().await, Some(Event::AgentMessage { message })
            if message == SLIDES_CLEARED_MESSAGE));

        manager.submit(Op::ClearChat).await.unwrap();
        assert!(matches!(manager.next_event().await, Some(Event::ChatCleared)));
        assert!(manager.history().await.is_empty());

        // Deck is empty now, so an edit keyword creates.
        manager
            .submit(Op::UserInput { text: "update the bees deck".into() })
            .await
            .unwrap();
        events_until_complete(&manager).await;
        assert!(matches!(service.calls()[1], Call::Generate(_)));
    }

    #[tokio::test]
    async fn export_of_empty_deck_reports_error() {
        let manager = spawn(RecordingService::replying(vec![])).await;

        manager.submit(Op::Export { dir: None }).await.unwrap();

        assert!(matches!(manager.next_event().await, Some(Event::Error { message })
            if message == "Error generating PowerPoint: No slides to generate. Please create slides first."));
        let last = manager.history().await.pop().unwrap();
        assert!(last.is_error);
        assert!(last.text.starts_with("Error generating PowerPoint"));
    }

    #[tokio::test]
    async fn export_writes_pptx_by_default() {
        let service = RecordingService::replying(vec![slides_reply(2, None)]);
        let dir = tempfile::tempdir().unwrap();
        let options = WorkerOptions {
            export_dir: dir.path().to_path_buf(),
            ..WorkerOptions::default()
        };
        let manager = ConversationManager::spawn(SlideSession::new(service), options)
            .await
            .unwrap();
        manager.next_event().await;
        manager
            .submit(Op::UserInput { text: "slides on bees".into() })
            .await
            .unwrap();
        events_until_complete(&manager).await;

        manager.submit(Op::Export { dir: None }).await.unwrap();

        let Some(Event::ExportComplete { path }) = manager.next_event().await else {
            panic!("expected ExportComplete");
        };
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pptx"));
        assert!(path.exists());
        assert!(matches!(manager.next_event().await, Some(Event::AgentMessage { message })
            if message.starts_with("PowerPoint generated successfully! File: AI_Presentation_")));
    }

    #[tokio::test]
    async fn load_presentation_replaces_deck() {
        let service = RecordingService::replying(vec![slides_reply(4, Some("Loaded"))]);
        let manager = spawn(service.clone()).await;

        manager.submit(Op::LoadPresentation { id: 12 }).await.unwrap();
        let events = events_until_complete(&manager).await;

        assert_eq!(service.calls(), vec![Call::Load(12)]);
        assert!(events.iter().any(|e| matches!(e, Event::DeckReplaced { slides }
            if slides.len() == 4)));
        assert!(events.iter().any(|e| matches!(e, Event::AgentMessage { message }
            if message == "Loaded")));
    }

    #[tokio::test]
    async fn try_submit_fails_fast_when_queue_is_full() {
        let service = Arc::new(RecordingService {
            hang: true,
            ..RecordingService::default()
        });
        let manager = spawn(service).await;
        manager.submit(Op::UserInput { text: "first".into() }).await.unwrap();
        // The worker has taken the first submission once it reports it.
        assert!(matches!(
            manager.next_event().await,
            Some(Event::TaskStarted { .. })
        ));

        for _ in 0..64 {
            manager.try_submit(Op::ClearChat).unwrap();
        }
        let err = manager.try_submit(Op::ClearChat).unwrap_err();
        assert_eq!(err.to_string(), "submission queue is full");
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let service = RecordingService::replying(vec![]);
        let manager = spawn(service.clone()).await;

        manager.submit(Op::UserInput { text: "  ".into() }).await.unwrap();
        manager.shutdown().await.unwrap();

        let events = events_until_complete(&manager).await;
        assert!(matches!(events.as_slice(), [Event::ShutdownComplete]));
        assert!(service.calls().is_empty());
    }
}
