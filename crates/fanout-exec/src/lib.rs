//! Process execution for fanout.
//!
//! This is the only crate that spawns child processes. Everything it returns is data
//! ([`fanout_types::InvocationResult`]); failures to start a tool are folded into the
//! result rather than surfaced as errors, so one broken root never aborts a run.

#![forbid(unsafe_code)]

mod cancel;
mod error;
mod invoke;

pub use cancel::CancelToken;
pub use error::InvokeError;
pub use invoke::Invoker;
