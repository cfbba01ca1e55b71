//! Reconciliation engine.
//!
//! Holds the reconciled game state, the per-kind handlers that fold events
//! into it, and the task that keeps it in step with the live journal.

mod dispatcher;
pub mod handlers;
mod runner;
mod state;

pub use dispatcher::{Dispatch, EventDispatcher};
pub use handlers::{format_credits, HandlerOutcome};
pub use runner::{Engine, EngineError};
pub use state::{ReconciledState, StateSnapshot};
