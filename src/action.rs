//! Lifecycle of a single user action: `idle → pending → success | failed`.
//!
//! Actions never retry. A failed action stays failed; the user starts a new
//! one.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::api::{ClientError, Result};

#[derive(Debug)]
pub enum ActionState<T> {
    Idle,
    Pending,
    Success(T),
    Failed(ClientError),
}

impl<T> ActionState<T> {
    fn label(&self) -> Phase {
        match self {
            ActionState::Idle => Phase::Idle,
            ActionState::Pending => Phase::Pending,
            ActionState::Success(_) => Phase::Success,
            ActionState::Failed(_) => Phase::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Success,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Pending => "pending",
            Phase::Success => "success",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("action '{action}' cannot move from {from} to {to}")]
pub struct TransitionError {
    pub action: &'static str,
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug)]
pub struct Action<T> {
    name: &'static str,
    state: ActionState<T>,
}

impl<T> Action<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ActionState::Idle,
        }
    }

    pub fn state(&self) -> &ActionState<T> {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.label()
    }

    pub fn begin(&mut self) -> std::result::Result<(), TransitionError> {
        if self.phase() != Phase::Idle {
            return Err(self.invalid(Phase::Pending));
        }
        tracing::debug!(action = self.name, "idle -> pending");
        self.state = ActionState::Pending;
        Ok(())
    }

    pub fn resolve(&mut self, outcome: Result<T>) -> std::result::Result<(), TransitionError> {
        let to = if outcome.is_ok() {
            Phase::Success
        } else {
            Phase::Failed
        };
        if self.phase() != Phase::Pending {
            return Err(self.invalid(to));
        }
        tracing::debug!(action = self.name, "pending -> {}", to);
        self.state = match outcome {
            Ok(value) => ActionState::Success(value),
            Err(err) => ActionState::Failed(err),
        };
        Ok(())
    }

    pub fn into_result(self) -> Result<T> {
        let from = self.phase();
        match self.state {
            ActionState::Success(value) => Ok(value),
            ActionState::Failed(err) => Err(err),
            ActionState::Idle | ActionState::Pending => Err(TransitionError {
                action: self.name,
                from,
                to: Phase::Success,
            }
            .into()),
        }
    }

    fn invalid(&self, to: Phase) -> TransitionError {
        TransitionError {
            action: self.name,
            from: self.phase(),
            to,
        }
    }
}

/// Run `work` as one action and hand back its outcome.
pub async fn perform<T, F>(name: &'static str, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let mut action = Action::new(name);
    action.begin()?;
    let outcome = work.await;
    action.resolve(outcome)?;
    action.into_result()
}
