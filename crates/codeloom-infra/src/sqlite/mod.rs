pub mod api_key;
pub mod pool;
pub mod project;
