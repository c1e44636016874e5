pub mod connection;
pub mod seed;

pub use connection::*;
pub use seed::seed_default_prizes;
