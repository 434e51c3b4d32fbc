pub mod error;
pub mod tail;

pub use error::ReadError;
pub use tail::{read_last_row, RawRow};
