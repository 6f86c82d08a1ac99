pub mod config;
pub mod error;
pub mod key;

pub use config::ConsoleConfig;
pub use error::{Error, Result};
pub use key::Key;
