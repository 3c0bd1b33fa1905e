pub mod draw_order;
pub mod hit;
