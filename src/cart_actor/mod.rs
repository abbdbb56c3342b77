//! The cart as an actor: one task owns the cart and the catalog snapshot it
//! is checked against.

pub mod messages;
pub mod service;

pub use messages::*;
pub use service::CartService;
