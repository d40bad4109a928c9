//! Data models
//!
//! Shared between the showroom server and dashboard clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Record IDs are snowflake `i64`; timestamps are Unix milliseconds.

pub mod event;
pub mod note;
pub mod page;
pub mod timer;
pub mod visit;
pub mod workflow;

// Re-exports
pub use event::*;
pub use note::*;
pub use page::*;
pub use timer::*;
pub use visit::*;
pub use workflow::*;
