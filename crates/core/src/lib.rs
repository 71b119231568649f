pub mod assembler;
pub mod classpath;
pub mod error;
pub mod logging;
pub mod pathtree;
pub mod resolve;
pub mod serialize;

pub use error::{BuildError, Result};
