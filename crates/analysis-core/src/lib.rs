pub mod cache;
pub mod error;
pub mod statistics;
pub mod traits;
pub mod types;

pub use cache::LruCache;
pub use error::*;
pub use traits::*;
pub use types::*;
