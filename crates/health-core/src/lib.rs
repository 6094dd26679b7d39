pub mod amount;
pub mod error;
pub mod types;

pub use amount::{deserialize_amount, parse_amount};
pub use error::*;
pub use types::*;
