// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-request state machine.
//!
//! ```text
//! Idle → Validating → Embedding  → Done
//!                   → Extracting → Done
//! (any non-terminal state) → Failed(kind)
//! ```
//!
//! A [`RequestTracker`] lives for exactly one embed or extract call and is
//! dropped with it. Nothing here is shared between requests.

use core::fmt;

use super::error::{ErrorKind, WatermarkError};

/// The two request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Embed,
    Extract,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embed => "embed",
            Self::Extract => "extract",
        })
    }
}

/// Lifecycle state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Validating,
    Embedding,
    Extracting,
    Done,
    Failed(ErrorKind),
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (Idle, Validating) => true,
            (Validating, Embedding | Extracting) => true,
            (Embedding | Extracting, Done) => true,
            (from, Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Tracks one request through [`RequestState`].
#[derive(Debug)]
pub struct RequestTracker {
    operation: Operation,
    state: RequestState,
}

impl RequestTracker {
    pub fn new(operation: Operation) -> Self {
        Self { operation, state: RequestState::Idle }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal {} transition {:?} -> {:?}",
            self.operation,
            self.state,
            next
        );
        log::debug!("{}: {:?} -> {:?}", self.operation, self.state, next);
        self.state = next;
    }

    /// `Idle → Validating`.
    pub fn validate(&mut self) {
        self.advance(RequestState::Validating);
    }

    /// `Validating → Embedding` or `Validating → Extracting`.
    pub fn transform(&mut self) {
        let next = match self.operation {
            Operation::Embed => RequestState::Embedding,
            Operation::Extract => RequestState::Extracting,
        };
        self.advance(next);
    }

    pub fn done(&mut self) {
        self.advance(RequestState::Done);
    }

    /// Move to `Failed` with the error's kind.
    pub fn fail(&mut self, err: &WatermarkError) {
        log::warn!("{} failed ({} error): {}", self.operation, err.kind(), err);
        self.advance(RequestState::Failed(err.kind()));
    }

    /// Pass `result` through, failing the request on `Err`.
    pub fn check<T>(&mut self, result: Result<T, WatermarkError>) -> Result<T, WatermarkError> {
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_happy_path() {
        let mut t = RequestTracker::new(Operation::Embed);
        assert_eq!(t.state(), RequestState::Idle);
        t.validate();
        t.transform();
        assert_eq!(t.state(), RequestState::Embedding);
        t.done();
        assert_eq!(t.state(), RequestState::Done);
        assert!(t.state().is_terminal());
    }

    #[test]
    fn extract_goes_through_extracting() {
        let mut t = RequestTracker::new(Operation::Extract);
        t.validate();
        t.transform();
        assert_eq!(t.state(), RequestState::Extracting);
    }

    #[test]
    fn check_records_failure_kind() {
        let mut t = RequestTracker::new(Operation::Embed);
        t.validate();
        let result: Result<(), _> = t.check(Err(WatermarkError::MessageTooLong { bytes: 70, max: 64 }));
        assert!(result.is_err());
        assert_eq!(t.state(), RequestState::Failed(ErrorKind::Validation));

        let mut ok = RequestTracker::new(Operation::Extract);
        assert_eq!(ok.check(Ok::<_, WatermarkError>(3)).unwrap(), 3);
        assert_eq!(ok.state(), RequestState::Idle);
    }

    #[test]
    fn transitions() {
        use RequestState::*;
        assert!(Idle.can_advance_to(Validating));
        assert!(!Idle.can_advance_to(Embedding));
        assert!(!Validating.can_advance_to(Done));
        assert!(Extracting.can_advance_to(Failed(ErrorKind::Capacity)));
        assert!(!Done.can_advance_to(Failed(ErrorKind::Codec)));
        assert!(!Failed(ErrorKind::Input).can_advance_to(Validating));
    }
}
