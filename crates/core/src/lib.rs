#![forbid(unsafe_code)]

pub mod error;
pub mod games;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
