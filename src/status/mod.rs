//! HTTP status endpoint exposing the reconciled counters.

mod error;
mod server;

pub use error::StatusError;
pub use server::{get_status, AppState, StatusResponse, StatusServer};
