//! Application services layer.

pub mod error;
pub mod jokes;
pub mod repos;
pub mod users;
