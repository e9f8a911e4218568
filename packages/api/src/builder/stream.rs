//! Fluent stream construction.

use std::sync::Arc;

use aqueduct_client::{
    EngineError, EngineSession, EventExecutor, HeaderMap, InlineExecutor, Method, RequestHeaders,
    StatusCode, StreamCallbacks, StreamHandle,
};
use bytes::Bytes;
use url::Url;

/// An unopened stream: accumulates callbacks and delivery options, then
/// [`start`](Self::start) allocates the handle and opens it on the engine.
///
/// ```rust,no_run
/// use aqueduct::{Aqueduct, Method, request_headers};
///
/// let engine = Aqueduct::builder().build().expect("engine starts");
/// let stream = engine
///     .new_stream()
///     .on_headers(|status, _headers, _end| println!("status {status}"))
///     .on_complete(|| println!("done"))
///     .start()
///     .expect("stream opens");
///
/// let url = "https://example.com/thing".parse().expect("valid url");
/// let headers = request_headers(Method::GET, &url).expect("absolute url");
/// stream.send_headers(headers, true).expect("headers sent");
/// ```
pub struct StreamPrototype {
    session: Arc<EngineSession>,
    callbacks: StreamCallbacks,
    executor: Arc<dyn EventExecutor>,
    explicit_flow_control: bool,
}

impl StreamPrototype {
    pub(crate) fn new(session: Arc<EngineSession>) -> Self {
        Self {
            session,
            callbacks: StreamCallbacks::new(),
            executor: Arc::new(InlineExecutor),
            explicit_flow_control: false,
        }
    }

    pub fn on_headers(
        mut self,
        f: impl Fn(StatusCode, HeaderMap, bool) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_headers = Some(Box::new(f));
        self
    }

    pub fn on_data(mut self, f: impl Fn(Bytes, bool) + Send + Sync + 'static) -> Self {
        self.callbacks.on_data = Some(Box::new(f));
        self
    }

    pub fn on_trailers(mut self, f: impl Fn(HeaderMap) + Send + Sync + 'static) -> Self {
        self.callbacks.on_trailers = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(EngineError) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Some(Box::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_cancel = Some(Box::new(f));
        self
    }

    /// Withhold response data until the caller grants read budgets with
    /// `StreamHandle::read_data`.
    #[must_use]
    pub fn explicit_flow_control(mut self, enabled: bool) -> Self {
        self.explicit_flow_control = enabled;
        self
    }

    /// Executor the stream's callbacks run on. Defaults to inline delivery
    /// on the engine thread.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn EventExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Allocates the stream handle and opens it on the engine.
    pub fn start(self) -> Result<StreamHandle, EngineError> {
        let handle = self.session.init_stream()?;
        handle.start(self.callbacks, self.executor, self.explicit_flow_control)?;
        Ok(handle)
    }
}

/// Builds the request header block for `url`, splitting out the scheme,
/// authority, and path-with-query the engine needs.
///
/// Fails with `None` for URLs without a host (for example `data:` URLs).
pub fn request_headers(method: Method, url: &Url) -> Option<RequestHeaders> {
    let authority = match (url.host_str()?, url.port()) {
        (host, Some(port)) => format!("{host}:{port}"),
        (host, None) => host.to_string(),
    };
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    Some(RequestHeaders::new(method, url.scheme(), authority, path))
}
