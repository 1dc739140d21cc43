pub mod access_log;
pub mod models;
pub mod pool;
pub mod store;

pub use models::*;
pub use pool::*;
