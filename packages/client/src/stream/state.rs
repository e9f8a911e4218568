//! Stream lifecycle states.

/// The lifecycle state of a stream.
///
/// Caller operations move the send side forward (`Created` → `Started` →
/// `HeadersSent` → `DataInFlight` → `HalfClosedLocal`); engine-originated
/// events move the receive side (`HeadersReceived`, `DataReceiving`) and
/// produce the single terminal transition (`Complete`, `Reset`, `Errored`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Allocated but not yet started; no callbacks are bound.
    Created,
    /// Started with a callback context; nothing sent yet.
    Started,
    /// Request headers sent, send side still open.
    HeadersSent,
    /// At least one request data chunk sent, send side still open.
    DataInFlight,
    /// The caller's send side is closed; awaiting the rest of the response.
    HalfClosedLocal,
    /// Response headers observed while the send side is still open.
    HeadersReceived,
    /// Response data observed while the send side is still open.
    DataReceiving,
    /// Terminal: the exchange finished successfully.
    Complete,
    /// Terminal: cancelled by the caller or the engine.
    Reset,
    /// Terminal: failed with a transport error.
    Errored,
}

impl StreamState {
    /// Terminal states accept no further operations and emit no further
    /// callbacks.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StreamState::Complete | StreamState::Reset | StreamState::Errored
        )
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamState::Created => "created",
            StreamState::Started => "started",
            StreamState::HeadersSent => "headers_sent",
            StreamState::DataInFlight => "data_in_flight",
            StreamState::HalfClosedLocal => "half_closed_local",
            StreamState::HeadersReceived => "headers_received",
            StreamState::DataReceiving => "data_receiving",
            StreamState::Complete => "complete",
            StreamState::Reset => "reset",
            StreamState::Errored => "errored",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_three_terminal_states_are_terminal() {
        let terminal = [StreamState::Complete, StreamState::Reset, StreamState::Errored];
        let live = [
            StreamState::Created,
            StreamState::Started,
            StreamState::HeadersSent,
            StreamState::DataInFlight,
            StreamState::HalfClosedLocal,
            StreamState::HeadersReceived,
            StreamState::DataReceiving,
        ];
        for s in terminal {
            assert!(s.is_terminal(), "{s} should be terminal");
        }
        for s in live {
            assert!(!s.is_terminal(), "{s} should not be terminal");
        }
    }
}
