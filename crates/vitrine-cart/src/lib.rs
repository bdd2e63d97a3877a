//! Vitrine Cart
//!
//! Storefront state for Vitrine: product catalog parsing, the cart command
//! state machine, its view projection, and snapshot persistence.

pub mod catalog;
pub mod error;
pub mod persist;
pub mod state;
pub mod view;

pub use catalog::{Catalog, Product};
pub use error::CartError;
pub use persist::{CartSnapshots, JsonSnapshots};
pub use state::{CartCommand, CartItem, CartState, apply};
pub use view::CartView;
