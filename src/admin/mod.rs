//! Admin product management workflows.

mod form;
mod listing;
mod reconcile;

pub use form::*;
pub use listing::*;
pub use reconcile::*;
