// Template and response structures, organized by surface.

mod agenda;
mod api;

pub use agenda::*;
pub use api::*;
