//! Branch freeze decision engine.
//!
//! Loads the freeze policy document, classifies a pull request against it,
//! resolves the label correction to apply, and gates the slash commands
//! that grant or revoke freeze exemptions.

pub mod classifier;
pub mod command;
pub mod gate;
pub mod loader;
pub mod resolver;
