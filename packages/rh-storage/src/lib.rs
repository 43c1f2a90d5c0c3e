pub mod db;
pub mod document;
pub mod gateway;
pub mod memory;
pub mod path;
pub mod schema;

mod error;

pub use document::{Document, FieldFilter, Fields};
pub use error::Error;
pub use gateway::{BoxFuture, DocumentStore};
pub use path::{CollectionPath, DocPath};

pub type Result<T, E = Error> = std::result::Result<T, E>;
