//! Domain layer types and invariants.

pub mod error;
pub mod jokes;
pub mod users;
