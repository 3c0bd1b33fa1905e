pub mod bridge;
pub mod index;
pub mod payload;
