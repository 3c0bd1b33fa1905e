pub mod chrome;
pub mod element;
pub mod events;
pub mod node;
pub mod store;
pub mod view;
