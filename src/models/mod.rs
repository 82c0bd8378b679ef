pub mod agenda_item;
