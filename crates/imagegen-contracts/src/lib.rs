pub mod completions;
pub mod errors;
pub mod events;
pub mod images;
pub mod models;
pub mod requests;
pub mod responses;

pub use errors::{ImageGenError, Result};
