pub mod errors;

pub use errors::{PaxError, PaxErrorCategory, PaxResult};
