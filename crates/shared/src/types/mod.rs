//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Grams, Rials, round_grams, round_rials};
pub use pagination::{PageRequest, PageResponse};
