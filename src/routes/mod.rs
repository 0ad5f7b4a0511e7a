pub mod api;
pub mod pages;

pub use api::*;
pub use pages::*;
