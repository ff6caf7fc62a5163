//! Data models for the storefront backend.
//!
//! Field names serialize as camelCase to match the storefront frontend.

mod catalog;
mod product;
mod session;

pub use catalog::*;
pub use product::*;
pub use session::*;
