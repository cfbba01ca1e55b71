//! Elite Dangerous journal access.
//!
//! Locating the active journal, decoding its events, rebuilding state from
//! it and following it as the game writes.

mod discovery;
mod error;
mod event;
mod reconstructor;
mod rotation;
mod tailer;

pub use discovery::{
    default_journal_dir, find_latest_journal, is_journal_file_name, JOURNAL_PREFIX,
    JOURNAL_SUFFIX,
};
pub use error::JournalError;
pub use event::*;
pub use reconstructor::{Baseline, StateReconstructor};
pub use rotation::{RotationCheck, RotationWatcher};
pub use tailer::{LiveTailer, TailControl, DEFAULT_POLL_INTERVAL};
