pub mod api;
pub mod app;
pub mod contacts;
pub mod error;
pub mod filter;
pub mod guard;
pub mod session;
pub mod storage;
pub mod utils;

pub use app::{Config, Phonebook};
pub use error::{Error, ErrorKind, ValidationError};
