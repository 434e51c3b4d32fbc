pub mod clock;
pub mod resolver;

pub use clock::{Clock, FixedClock, SystemClock};
pub use resolver::{resolve, DatasetKind, FileReference};
