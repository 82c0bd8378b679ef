pub mod agenda_handlers;
pub mod api_v1;
