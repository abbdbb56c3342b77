pub mod order;
pub mod post;
pub mod product;
pub mod user;

pub use order::*;
pub use post::*;
pub use product::*;
pub use user::*;
