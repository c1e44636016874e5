pub mod admin;
pub mod common;
pub mod pagination;
pub mod prize;
pub mod redemption;
pub mod spin;

pub use admin::*;
pub use common::*;
pub use pagination::*;
pub use prize::*;
pub use redemption::*;
pub use spin::*;
