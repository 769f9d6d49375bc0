//! Dynamic HTTP invocation
//!
//! Turns a schema-described operation plus an argument map into a concrete
//! request ([`request`]), executes it under a bounded timeout, and classifies
//! the outcome ([`http`]).

pub mod http;
pub mod request;

pub use http::{DEFAULT_TIMEOUT_MS, HttpInvoker, InvocationResult};
pub use request::{Arguments, BuiltRequest, build_request};
