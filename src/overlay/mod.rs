//! Overlay data model: geometry variants, render status, and draw contract.

pub mod draw;
pub mod model;
pub mod status;
