use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::GenerationError,
    gateway::GenerationGateway,
    persistence::ImageStore,
    transcript::{Message, OriginSide, Transcript},
};

pub const DEFAULT_PLACEHOLDER: &str = "Please enter your message here...";
pub const DEFAULT_SAVE_FOLDER: &str = "./SaveImages/";

const GATEWAY_ABORTED_MESSAGE: &str = "image generation stopped unexpectedly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingResult,
}

impl SessionState {
    pub fn input_enabled(self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hint text shown in an untouched input box. Submitting it counts as empty.
    pub placeholder: String,
    pub save_folder: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            save_folder: PathBuf::from(DEFAULT_SAVE_FOLDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("an image is already being generated")]
    Busy,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged {
        state: SessionState,
        input_enabled: bool,
    },
    MessageAppended(Message),
    GenerationFailed(GenerationError),
    ImageSaved(PathBuf),
    ImageSaveFailed(String),
}

struct SessionInner {
    state: SessionState,
    transcript: Transcript,
}

pub struct SessionController {
    gateway: Arc<dyn GenerationGateway>,
    store: Arc<dyn ImageStore>,
    config: SessionConfig,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        store: Arc<dyn ImageStore>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            gateway,
            store,
            config,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                transcript: Transcript::default(),
            }),
            events,
        })
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn input_enabled(&self) -> bool {
        self.state().await.input_enabled()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.inner.lock().await.transcript.messages().to_vec()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn validate_prompt<'a>(&self, prompt_text: &'a str) -> Result<&'a str, SubmitError> {
        let prompt = prompt_text.trim();
        if prompt.is_empty() || prompt == self.config.placeholder.trim() {
            return Err(SubmitError::EmptyPrompt);
        }
        Ok(prompt)
    }

    /// Accepts a prompt only while idle. The returned handle resolves once the
    /// result has been applied to the session and the image save attempted.
    pub async fn submit(
        self: &Arc<Self>,
        prompt_text: &str,
    ) -> Result<JoinHandle<()>, SubmitError> {
        let prompt = self.validate_prompt(prompt_text)?.to_string();
        let submitted_at = Local::now();

        {
            let mut guard = self.inner.lock().await;
            if guard.state != SessionState::Idle {
                debug!("prompt rejected while a generation is in flight");
                return Err(SubmitError::Busy);
            }
            self.append(&mut guard, Message::text(OriginSide::User, prompt.clone()));
            self.transition(&mut guard, SessionState::AwaitingResult);
        }

        info!(prompt_len = prompt.len(), "image generation submitted");
        let controller = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let gateway = Arc::clone(&controller.gateway);
            // A panicking gateway must still release the session.
            let outcome = tokio::spawn(async move { gateway.generate(&prompt).await })
                .await
                .unwrap_or_else(|join_error| {
                    error!(error = %join_error, "image generation task aborted");
                    Err(GenerationError::Fault(GATEWAY_ABORTED_MESSAGE.to_string()))
                });
            controller.complete(outcome, submitted_at).await;
        }))
    }

    async fn complete(
        &self,
        outcome: Result<Vec<u8>, GenerationError>,
        submitted_at: DateTime<Local>,
    ) {
        let saved = {
            let mut guard = self.inner.lock().await;
            let saved = match outcome {
                Ok(bytes) => {
                    let bytes: Arc<[u8]> = bytes.into();
                    self.append(
                        &mut guard,
                        Message::image(OriginSide::Assistant, bytes.clone()),
                    );
                    Some(bytes)
                }
                Err(err) => {
                    warn!(error = %err, fault = err.is_fault(), "image generation failed");
                    let _ = self.events.send(SessionEvent::GenerationFailed(err));
                    None
                }
            };
            self.transition(&mut guard, SessionState::Idle);
            saved
        };

        // Saved only once the session is back to Idle.
        if let Some(bytes) = saved {
            self.persist(&bytes, submitted_at).await;
        }
    }

    async fn persist(&self, bytes: &[u8], submitted_at: DateTime<Local>) {
        let filename = image_file_name(submitted_at);
        match self
            .store
            .save(bytes, &self.config.save_folder, &filename)
            .await
        {
            Ok(path) => {
                info!(path = %path.display(), "generated image saved");
                let _ = self.events.send(SessionEvent::ImageSaved(path));
            }
            Err(err) => {
                warn!(error = %err, %filename, "failed to save generated image");
                let _ = self.events.send(SessionEvent::ImageSaveFailed(err.to_string()));
            }
        }
    }

    fn append(&self, inner: &mut SessionInner, message: Message) {
        inner.transcript.push(message.clone());
        let _ = self.events.send(SessionEvent::MessageAppended(message));
    }

    fn transition(&self, inner: &mut SessionInner, next: SessionState) {
        inner.state = next;
        let _ = self.events.send(SessionEvent::StateChanged {
            state: next,
            input_enabled: next.input_enabled(),
        });
    }
}

pub fn image_file_name(submitted_at: DateTime<Local>) -> String {
    format!("image_{}.png", submitted_at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
