pub mod command;
pub mod edits;
pub mod manager;
