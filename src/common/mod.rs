pub mod checksum;
pub mod digits;
pub mod error;
pub mod metadata;

pub use checksum::*;
pub use digits::*;
pub use error::*;
pub use metadata::*;
