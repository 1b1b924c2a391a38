mod error;

pub mod loader;
pub mod xml;

pub use error::Error;
pub use loader::{location, Loader, MemoryLoader, Transport};
pub use xml::{Element, QName};
