pub mod atomic_write;
pub mod staged;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use staged::StagedFile;
