pub mod error;
pub mod mapper;
pub mod record;

pub use error::MapError;
pub use mapper::{map_row, parse_decimal, parse_integer};
pub use record::{IngestedRecord, ProductionRecord, StatusRecord};
