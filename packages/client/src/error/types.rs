use std::error::Error as StdError;
use std::fmt;

/// A Result alias where the Err case is `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Represents errors that can occur while driving the engine or one of its
/// streams.
#[derive(Clone)]
pub struct EngineError {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub stream_id: Option<u64>,
}

impl Clone for Inner {
    fn clone(&self) -> Self {
        Inner {
            kind: self.kind.clone(),
            source: None, // Cannot clone trait objects, so we lose the source
            stream_id: self.stream_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    /// Native engine support failed to load. Fatal to the `load()` attempt,
    /// non-fatal to the process; a later call may retry.
    Initialization,
    /// Operation issued against an engine or stream not in an accepting state.
    LifecycleOrder,
    /// Operation issued against a stream that already reached a terminal
    /// state; the underlying resources are no longer guaranteed to exist.
    StaleHandle,
    /// Transport-level failure, surfaced only via the terminal `on_error`
    /// callback, never synchronously from a send/read call.
    Transport {
        code: TransportCode,
        attempt_count: Option<u32>,
    },
    /// Registry registration conflict.
    DuplicateName,
}

/// Error codes carried by terminal transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    StreamReset,
    ConnectionFailure,
    Timeout,
    Internal,
}

impl EngineError {
    pub fn new(kind: Kind) -> EngineError {
        EngineError {
            inner: Box::new(Inner {
                kind,
                source: None,
                stream_id: None,
            }),
        }
    }

    #[must_use = "EngineError builder methods return a new EngineError and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> EngineError {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream_id: u64) -> Self {
        self.inner.stream_id = Some(stream_id);
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the stream associated with this error, if any.
    #[must_use]
    pub fn stream_id(&self) -> Option<u64> {
        self.inner.stream_id
    }

    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(self.inner.kind, Kind::Initialization)
    }

    #[must_use]
    pub fn is_lifecycle_order(&self) -> bool {
        matches!(self.inner.kind, Kind::LifecycleOrder)
    }

    #[must_use]
    pub fn is_stale_handle(&self) -> bool {
        matches!(self.inner.kind, Kind::StaleHandle)
    }

    #[must_use]
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self.inner.kind, Kind::DuplicateName)
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport { .. })
    }

    /// The transport code, when this is a transport error.
    #[must_use]
    pub fn transport_code(&self) -> Option<TransportCode> {
        match self.inner.kind {
            Kind::Transport { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl fmt::Debug for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("aqueduct::EngineError");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(stream_id) = self.inner.stream_id {
            f.field("stream_id", &stream_id);
        }

        f.finish()
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Initialization => f.write_str("engine support failed to initialize")?,
            Kind::LifecycleOrder => f.write_str("operation issued out of lifecycle order")?,
            Kind::StaleHandle => f.write_str("stream handle is stale")?,
            Kind::Transport {
                code,
                attempt_count,
            } => {
                write!(f, "transport error: {code:?}")?;
                if let Some(attempts) = attempt_count {
                    write!(f, " (after {attempts} attempts)")?;
                }
            }
            Kind::DuplicateName => f.write_str("name is already registered")?,
        }

        if let Some(stream_id) = self.inner.stream_id {
            write!(f, " (stream {stream_id})")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for EngineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}
