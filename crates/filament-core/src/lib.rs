pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{CyclePolicy, ErrorPolicy, RunConfig};
pub use error::{FilamentError, Result};
pub use types::*;
