//! Confirmation capability injected into destructive operations.
//!
//! The reorganizer, the deployment planner, the cleanup scanner and rollback
//! never prompt on their own; they ask a [`Confirm`] implementation. The
//! binary supplies a terminal prompt, tests supply [`Unattended`] or
//! [`Decline`].

/// Answers yes/no questions before a destructive step.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Always answers yes. Used for `--yes` and unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl Confirm for Unattended {
    fn confirm(&self, prompt: &str) -> bool {
        log::debug!("Auto-confirmed: {}", prompt);
        true
    }
}

/// Always answers no.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&self, prompt: &str) -> bool {
        log::debug!("Declined: {}", prompt);
        false
    }
}

impl<C: Confirm + ?Sized> Confirm for &C {
    fn confirm(&self, prompt: &str) -> bool {
        (**self).confirm(prompt)
    }
}
