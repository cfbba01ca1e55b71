//! Configuration module.

mod loader;
mod reload;
mod types;

pub use loader::*;
pub use reload::*;
pub use types::*;
