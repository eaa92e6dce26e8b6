pub mod analysis;
pub mod config;
pub mod emit;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod resolve;

pub use analysis::pool::filter_pool;
pub use analysis::sampler::{Strategy, generate};
pub use analysis::{analyze, parse_rounds};
pub use emit::emit;
pub use error::{CoordGenError, Result};
pub use resolve::resolve;
