pub use error::{Error, Result};
pub use platform::{Platform, PlatformTag};

pub mod arch;
pub mod dir;
mod error;
pub mod os;
mod platform;
