//! Out-of-band resource decode for overlays.

pub mod decode;
pub mod loader;
