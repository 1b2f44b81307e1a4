use std::sync::Arc;

use anyhow::Result;

pub mod error;
pub mod gateway;
pub mod persistence;
pub mod session;
pub mod transcript;

pub use error::GenerationError;
pub use gateway::{GatewayConfig, GenerationGateway, HttpGenerationGateway};
pub use persistence::{FsImageStore, ImageStore, SaveError};
pub use session::{SessionConfig, SessionController, SessionEvent, SessionState, SubmitError};
pub use transcript::{Message, OriginSide, Presentation, Transcript};

/// Wires a session to the HTTP gateway and the filesystem image store.
pub fn connect_session(
    gateway: GatewayConfig,
    session: SessionConfig,
) -> Result<Arc<SessionController>> {
    let gateway = HttpGenerationGateway::new(gateway)?;
    Ok(SessionController::new(
        Arc::new(gateway),
        Arc::new(FsImageStore),
        session,
    ))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
