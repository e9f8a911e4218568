//! Stream handles: one HTTP request/response exchange multiplexed through a
//! running engine, driven through a finite-state machine.

mod buffer;
mod handle;
mod headers;
mod state;

pub use buffer::DataBuffer;
pub use handle::StreamHandle;
pub(crate) use handle::StreamInner;
pub use headers::RequestHeaders;
pub use state::StreamState;
