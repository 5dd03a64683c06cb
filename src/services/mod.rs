pub mod directory;

pub use directory::{UserDirectory, UNKNOWN_NAME};
