//! Persistence: repository ports and their adapters.

pub mod infrastructure;
pub mod ports;
pub mod repositories;

pub use repositories::Repositories;
