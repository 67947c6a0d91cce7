//! Slash command recognition in PR comments.

use regex::RegexSet;

use crate::models::freeze::Command;
use crate::{AppError, Result};

/// Commands in match priority order, parallel to [`PATTERNS`].
const COMMANDS: [Command; 3] = [
    Command::CheckFreeze,
    Command::BranchFreeze,
    Command::BranchFreezeCancel,
];

/// Each command must fill a whole line; trailing whitespace is tolerated.
const PATTERNS: [&str; 3] = [
    r"(?mi)^/check-freeze\s*$",
    r"(?mi)^/branch-freeze\s*$",
    r"(?mi)^/branch-freeze cancel\s*$",
];

/// Pre-compiled command patterns.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    set: RegexSet,
}

impl CommandMatcher {
    /// Compile the command patterns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        let set = RegexSet::new(PATTERNS)
            .map_err(|err| AppError::Config(format!("invalid command pattern: {err}")))?;
        Ok(Self { set })
    }

    /// Find the highest-priority command in a comment body.
    ///
    /// Returns `None` for comments that carry no command.
    #[must_use]
    pub fn parse(&self, body: &str) -> Option<Command> {
        self.set
            .matches(body)
            .iter()
            .next()
            .and_then(|idx| COMMANDS.get(idx).copied())
    }
}
