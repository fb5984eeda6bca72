pub mod error;
pub mod model_cache;
