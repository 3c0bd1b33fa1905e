pub mod canvas_pool;
pub mod engine;
