//! showroom-server: real-time coordination core for a dealership showroom
//!
//! - Tracks customer visits through the floor workflow
//! - Times sub-activities (wait, test drive, negotiation, ...)
//! - Keeps an append-only audit timeline per visit
//! - Pushes every change to the dashboards subscribed to the dealership

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod services;
pub mod state;
pub mod utils;

pub use config::{Config, LiveConfig};
pub use error::{ServiceError, ServiceResult};
pub use hub::Hub;
pub use state::AppState;
