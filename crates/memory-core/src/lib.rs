pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod io;
pub mod manager;
pub mod paths;
pub mod pattern;
pub mod repository;
pub mod session;
pub mod store;
pub mod techstack;
pub mod time;
pub mod types;
pub mod update;

pub use error::{ErrorKind, MemoryError, Result};
pub use store::MemoryStore;
