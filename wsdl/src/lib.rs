use soapgraph_util::Transport;

mod parser;

pub mod binding;
pub mod definition;
pub mod document;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod schema;
pub mod stitch;
pub mod types;

pub use document::Document;

pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";

/// Loads and resolves the WSDL document at `url`, which may also be a path on
/// the local filesystem.
pub fn parse<S: AsRef<str>>(url: S) -> Result<Document, error::Error> {
    Document::load(url, &Transport::new())
}
