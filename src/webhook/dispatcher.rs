//! Event routing to the freeze engine.
//!
//! Pull request lifecycle events re-run the freeze check. Comment events on
//! open pull requests are parsed for slash commands: `/check-freeze`
//! re-runs the check, the freeze commands go through the authorization gate.
//! Each call is independent; nothing is shared between events except the
//! read-only configuration.

use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};

use super::InboundEvent;
use crate::config::GlobalConfig;
use crate::forge::{ForgeClient, PrRef};
use crate::freeze::command::CommandMatcher;
use crate::freeze::gate::{self, CommandRequest};
use crate::freeze::resolver;
use crate::models::event::{NoteEvent, PullRequestEvent};
use crate::models::freeze::{Command, LabelState};
use crate::Result;

/// Routes inbound events to the freeze check or the command gate.
pub struct Dispatcher {
    config: Arc<GlobalConfig>,
    forge: Arc<dyn ForgeClient>,
    commands: CommandMatcher,
}

impl Dispatcher {
    /// Build a dispatcher over `forge` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the command patterns fail to compile.
    pub fn new(config: Arc<GlobalConfig>, forge: Arc<dyn ForgeClient>) -> Result<Self> {
        Ok(Self {
            config,
            forge,
            commands: CommandMatcher::new()?,
        })
    }

    /// Route a decoded event.
    ///
    /// # Errors
    ///
    /// Propagates errors from the event's handler.
    pub async fn dispatch(&self, event: &InboundEvent) -> Result<()> {
        match event {
            InboundEvent::PullRequest(e) => self.handle_pull_request(e).await,
            InboundEvent::Note(e) => self.handle_note(e).await,
        }
    }

    /// Handle a pull request lifecycle event.
    ///
    /// Only `open` and `update` actions are acted on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the repository has no configuration,
    /// or the error of a failed policy load or label edit.
    pub async fn handle_pull_request(&self, event: &PullRequestEvent) -> Result<()> {
        let Some(action) = event.lifecycle_action() else {
            debug!(action = %event.action, "ignoring pull request action");
            return Ok(());
        };

        let org = &event.repository.namespace;
        let repo = &event.repository.path;
        let pr = PrRef::new(org.as_str(), repo.as_str(), event.pull_request.number);
        let span = info_span!("pull_request_event", %pr, ?action);

        async {
            let repo_config = self.config.config_for(org, repo)?;
            resolver::check_freeze(
                self.forge.as_ref(),
                &repo_config.freeze_file,
                &self.config.labels,
                &pr,
                &event.pull_request.base.ref_name,
                event.pull_request.label_names(),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Handle a comment event.
    ///
    /// Comments outside open pull requests, and comments carrying no
    /// command, are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the repository has no configuration,
    /// or the error of a failed policy load or label edit.
    pub async fn handle_note(&self, event: &NoteEvent) -> Result<()> {
        let Some(pull_request) = event.open_pull_request() else {
            debug!("ignoring comment outside an open pull request");
            return Ok(());
        };

        let Some(command) = self.commands.parse(&event.comment.body) else {
            return Ok(());
        };

        let org = &event.repository.namespace;
        let repo = &event.repository.path;
        let repo_config = self.config.config_for(org, repo)?;

        let pr = PrRef::new(org.as_str(), repo.as_str(), pull_request.number);
        let commenter = event.comment.user.login.as_str();
        info!(%pr, %command, commenter, "received command");

        let labels = &self.config.labels;
        let file = &repo_config.freeze_file;
        let base_branch = pull_request.base.ref_name.as_str();

        match command {
            Command::CheckFreeze => {
                resolver::check_freeze(
                    self.forge.as_ref(),
                    file,
                    labels,
                    &pr,
                    base_branch,
                    pull_request.label_names(),
                )
                .await
            }
            Command::BranchFreeze | Command::BranchFreezeCancel => {
                let request = CommandRequest {
                    pr: &pr,
                    base_branch,
                    commenter,
                    labels: LabelState::from_labels(pull_request.label_names(), labels),
                };
                gate::run_command(self.forge.as_ref(), file, labels, &request, command).await
            }
        }
    }
}
