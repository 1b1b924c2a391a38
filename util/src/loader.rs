use bytes::Buf;
use reqwest::blocking::Client;
use std::{
    cell::Cell,
    collections::HashMap,
    io::BufReader,
    path::Path,
    time::Duration,
};
use tracing::debug;
use url::Url;

use crate::{
    xml::{Element, Reader},
    Error,
};

/// Turns a location string into an absolute URL.
///
/// Relative locations are joined onto `base` when one is known, otherwise they
/// are treated as paths on the local filesystem.
pub fn location<S: AsRef<str>>(location: S, base: Option<&Url>) -> Result<Url, Error> {
    let location = location.as_ref();

    if let Some(base) = base {
        return Ok(base.join(location)?);
    }

    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
            Path::new(location)
                .canonicalize()
                .map_err(|err| Error::PathConversionError(Some(err)))?,
        )
        .map_err(|()| Error::PathConversionError(None)),
        Err(err) => Err(err.into()),
    }
}

pub trait Loader {
    fn load(&self, location: &Url) -> Result<Element, Error>;
}

/// Fetches documents from the filesystem or over HTTP.
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for Transport {
    fn load(&self, location: &Url) -> Result<Element, Error> {
        debug!(%location, "loading document");

        match location.scheme() {
            "file" => Element::from_reader(
                Reader::from_file(
                    location
                        .to_file_path()
                        .map_err(|()| Error::PathConversionError(None))?,
                )
                .map_err(Error::FileOpenError)?,
            ),

            "http" | "https" => {
                let response = self
                    .client
                    .get(location.clone())
                    .send()?
                    .error_for_status()?;

                Element::from_reader(Reader::from_reader(BufReader::new(
                    response.bytes()?.reader(),
                )))
            }

            other => Err(Error::UnsupportedScheme(other.into())),
        }
    }
}

/// Serves documents from memory, keyed by URL.
#[derive(Default)]
pub struct MemoryLoader {
    documents: HashMap<Url, String>,
    loads: Cell<usize>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, location: Url, content: S) {
        self.documents.insert(location, content.into());
    }

    pub fn with<S: Into<String>>(mut self, location: &str, content: S) -> Result<Self, Error> {
        self.insert(Url::parse(location)?, content);
        Ok(self)
    }

    /// Number of successful loads served so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl Loader for MemoryLoader {
    fn load(&self, location: &Url) -> Result<Element, Error> {
        debug!(%location, "loading document from memory");

        let content = self
            .documents
            .get(location)
            .ok_or_else(|| Error::MissingContent(location.to_string()))?;

        let element = Element::parse_str(content)?;
        self.loads.set(self.loads.get() + 1);
        Ok(element)
    }
}
