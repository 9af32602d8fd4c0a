use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle for one in-flight generation.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    seq: u64,
    token: CancellationToken,
}

impl GenerationTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Token cancelled when this generation is superseded or cancelled.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct GateState {
    seq: u64,
    current: Option<CancellationToken>,
}

/// Guards against stale completions: only the most recent generation may apply its result.
#[derive(Debug, Default)]
pub struct GenerationGate {
    state: Mutex<GateState>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a generation, cancelling the one in flight.
    pub fn begin(&self) -> GenerationTicket {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.current.take() {
            debug!(seq = state.seq, "Superseding in-flight generation");
            previous.cancel();
        }
        state.seq += 1;
        let token = CancellationToken::new();
        state.current = Some(token.clone());
        GenerationTicket {
            seq: state.seq,
            token,
        }
    }

    /// Whether `ticket` belongs to the latest generation and was not cancelled.
    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.seq == ticket.seq && !ticket.is_cancelled()
    }

    /// Cancel the in-flight generation. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.current.take() {
            Some(token) => {
                token.cancel();
                state.seq += 1;
                debug!("In-flight generation cancelled");
                true
            }
            None => false,
        }
    }

    /// Mark `ticket`'s generation as done. Ignored for stale tickets.
    pub fn finish(&self, ticket: &GenerationTicket) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.seq == ticket.seq {
            state.current = None;
        }
    }

    /// Whether a generation is in flight.
    pub fn in_flight(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_generation_supersedes() {
        let gate = GenerationGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert!(first.is_cancelled());
        assert!(!gate.is_current(&first));
        assert!(gate.is_current(&second));
    }

    #[test]
    fn test_cancel() {
        let gate = GenerationGate::new();
        assert!(!gate.cancel());

        let ticket = gate.begin();
        assert!(gate.in_flight());
        assert!(gate.cancel());
        assert!(ticket.is_cancelled());
        assert!(!gate.is_current(&ticket));
        assert!(!gate.in_flight());
    }

    #[test]
    fn test_finish_only_clears_current() {
        let gate = GenerationGate::new();
        let stale = gate.begin();
        let current = gate.begin();
        gate.finish(&stale);
        assert!(gate.in_flight());
        gate.finish(&current);
        assert!(!gate.in_flight());
        // A finished ticket is still the latest one
        assert!(gate.is_current(&current));
    }

    #[tokio::test]
    async fn test_token_wakes_waiters() {
        let gate = GenerationGate::new();
        let ticket = gate.begin();
        let token = ticket.token().clone();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        gate.begin();
        waiter.await.unwrap();
    }
}
