use anyhow::Result as AnyResult;
use deckchat_common::{GenerateRequest, Intent, ServiceResponse, Slide, UpdateRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::SlideService;
use crate::error::{ExportError, Result, SessionError};
use crate::export::{self, PresentationWriter};
use crate::intent::classify_intent;

pub const DEFAULT_ACKNOWLEDGEMENT: &str = "Slides generated successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// Result of a successful round trip.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub intent: Intent,
    pub message: String,
    pub deck: Arc<Vec<Slide>>,
}

/// Owns the deck and is the only thing that talks to the service.
///
/// The deck is always the last one the service returned, or empty. It is
/// replaced wholesale, never patched. Every dispatch takes `&mut self`, so a
/// session has at most one request in flight.
pub struct SlideSession {
    service: Arc<dyn SlideService>,
    deck: Arc<Vec<Slide>>,
    state: SessionState,
}

impl SlideSession {
    pub fn new(service: Arc<dyn SlideService>) -> Self {
        Self::with_deck(service, Vec::new())
    }

    /// Resume from a deck the service returned earlier (e.g. a saved file).
    pub fn with_deck(service: Arc<dyn SlideService>, slides: Vec<Slide>) -> Self {
        Self {
            service,
            deck: Arc::new(slides),
            state: SessionState::Idle,
        }
    }

    pub fn deck(&self) -> Arc<Vec<Slide>> {
        Arc::clone(&self.deck)
    }

    pub fn slides(&self) -> &[Slide] {
        &self.deck
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn classify(&self, utterance: &str) -> Intent {
        classify_intent(utterance, self.deck.len())
    }

    /// Route `utterance` to generate or update and reconcile the answer.
    pub async fn send(&mut self, utterance: &str) -> Result<Outcome> {
        let prompt = utterance.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        let intent = self.classify(prompt);
        debug!(%intent, slides = self.deck.len(), "dispatching prompt");

        let Self {
            service,
            deck,
            state,
        } = self;
        let response = {
            let _in_flight = InFlight::enter(state);
            match intent {
                Intent::Create => {
                    service
                        .generate(GenerateRequest {
                            prompt: prompt.to_string(),
                        })
                        .await
                }
                Intent::Edit => {
                    service
                        .update(UpdateRequest {
                            prompt: prompt.to_string(),
                            slides: deck.to_vec(),
                        })
                        .await
                }
            }
        };

        self.reconcile(intent, response)
    }

    /// Replace the deck with a presentation saved on the service.
    pub async fn load_presentation(&mut self, id: u64) -> Result<Outcome> {
        debug!(id, "loading presentation");
        let Self { service, state, .. } = self;
        let response = {
            let _in_flight = InFlight::enter(state);
            service.load_presentation(id).await
        };
        self.reconcile(Intent::Create, response)
    }

    pub fn clear_deck(&mut self) {
        info!(slides = self.deck.len(), "deck cleared");
        self.deck = Arc::new(Vec::new());
    }

    /// Write the current deck through `writer` into `dir`.
    pub fn export(
        &self,
        dir: &Path,
        writer: &dyn PresentationWriter,
    ) -> std::result::Result<PathBuf, ExportError> {
        export::export_deck(&self.deck, self.service.base_url(), dir, writer)
    }

    fn reconcile(&mut self, intent: Intent, response: AnyResult<ServiceResponse>) -> Result<Outcome> {
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(%intent, "request failed: {err:#}");
                return Err(SessionError::Transport {
                    message: err.to_string(),
                });
            }
        };

        if let Some(message) = response.error_message() {
            warn!(%intent, "service reported an error: {message}");
            return Err(SessionError::Application {
                message: message.to_string(),
            });
        }

        let message = response
            .acknowledgement()
            .unwrap_or(DEFAULT_ACKNOWLEDGEMENT)
            .to_string();
        self.deck = Arc::new(response.slides.unwrap_or_default());
        info!(%intent, slides = self.deck.len(), "deck replaced");

        Ok(Outcome {
            intent,
            message,
            deck: self.deck(),
        })
    }
}

/// Marks the session as awaiting a response until dropped, including when
/// the request future is cancelled.
struct InFlight<'a>(&'a mut SessionState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a mut SessionState) -> Self {
        *state = SessionState::AwaitingResponse;
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = SessionState::Idle;
    }
}
