pub mod filter;
pub mod situation;
pub mod types;

pub use filter::FilterState;
pub use situation::{situation, Situation};
pub use types::*;
