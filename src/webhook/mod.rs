//! Forge webhook intake.
//!
//! [`server`] accepts HTTP deliveries and decodes them into
//! [`InboundEvent`]s; [`dispatcher`] routes each event to the freeze engine.

pub mod dispatcher;
pub mod server;

use crate::models::event::{NoteEvent, PullRequestEvent};
use crate::Result;

/// Header carrying the webhook event kind.
pub const EVENT_HEADER: &str = "X-Gitee-Event";
/// Header carrying the webhook secret.
pub const TOKEN_HEADER: &str = "X-Gitee-Token";

const PULL_REQUEST_HOOK: &str = "Merge Request Hook";
const NOTE_HOOK: &str = "Note Hook";

/// A decoded webhook event the bot handles.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Pull request lifecycle event.
    PullRequest(PullRequestEvent),
    /// Comment event.
    Note(NoteEvent),
}

impl InboundEvent {
    /// Decode a delivery of kind `event_kind`.
    ///
    /// Returns `Ok(None)` for event kinds the bot does not handle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Webhook` if the body does not match the kind.
    pub fn decode(event_kind: &str, body: &[u8]) -> Result<Option<Self>> {
        match event_kind {
            PULL_REQUEST_HOOK => Ok(Some(Self::PullRequest(serde_json::from_slice(body)?))),
            NOTE_HOOK => Ok(Some(Self::Note(serde_json::from_slice(body)?))),
            _ => Ok(None),
        }
    }
}
