use soapgraph_util::QName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to load document")]
    LoadError(#[from] soapgraph_util::Error),

    #[error("Unsupported root element {element} in {location}")]
    UnsupportedRoot { element: QName, location: String },

    #[error("Missing attribute {attribute} on {element}")]
    MissingAttribute {
        element: QName,
        attribute: &'static str,
    },

    #[error("No entry {key} in {table}")]
    NotFound { table: &'static str, key: String },

    #[error("Unable to resolve {kind} {name}")]
    Unresolved { kind: &'static str, name: QName },

    #[error("Type {0} not found in schema")]
    TypeNotFound(QName),

    #[error("Element {0} not found in schema")]
    ElementNotFound(QName),
}
