//! Bounded fixed-interval polling for remote import operations.
//!
//! Fixed sleep between polls, hard wait ceiling overall, expressed as an
//! explicit state machine with a single pure `advance` function so the
//! bounded-wait behavior is testable without real delays.

use crate::protocol::RemoteOperation;
use std::time::Duration;

/// Fixed sleep between polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Hard ceiling on any single wait loop.
pub const WAIT_CEILING: Duration = Duration::from_secs(300);

/// Poll timing knobs. Tests use [`PollConfig::immediate`] to run loops
/// without sleeping.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            ceiling: WAIT_CEILING,
        }
    }
}

impl PollConfig {
    /// Zero-delay config with a single-poll budget. Lets wait loops run
    /// in tests without sleeping.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            ceiling: Duration::ZERO,
        }
    }

    /// Number of polls the ceiling allows. At least one, so even a
    /// zero-ceiling config observes the operation once.
    pub fn max_polls(&self) -> u32 {
        if self.interval.is_zero() {
            1
        } else {
            (self.ceiling.as_secs_f64() / self.interval.as_secs_f64()).floor() as u32
        }
    }
}

/// Lifecycle of one import wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    /// Import requested, no poll observed yet.
    Submitted,
    /// Operation observed and still running.
    Processing,
    /// Operation confirmed complete without error.
    Imported,
    /// Operation reported an explicit error.
    Failed(String),
    /// Wait ceiling reached without confirmation. Terminal but
    /// deliberately distinct from `Imported`: completion was never
    /// confirmed, and callers must not claim success.
    TimedOut,
}

impl ImportState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportState::Imported | ImportState::Failed(_) | ImportState::TimedOut
        )
    }
}

/// Advance the wait state from one observed poll of the operation.
/// `polls_used` counts polls already taken, compared against the budget in
/// `config`; the budget running out turns an unconfirmed wait into
/// [`ImportState::TimedOut`].
pub fn advance(
    state: ImportState,
    observed: &RemoteOperation,
    polls_used: u32,
    config: &PollConfig,
) -> ImportState {
    if state.is_terminal() {
        return state;
    }
    if let Some(status) = &observed.error {
        return ImportState::Failed(if status.message.is_empty() {
            format!("operation {} failed (code {})", observed.name, status.code)
        } else {
            status.message.clone()
        });
    }
    if observed.done {
        return ImportState::Imported;
    }
    if polls_used >= config.max_polls() {
        return ImportState::TimedOut;
    }
    ImportState::Processing
}
