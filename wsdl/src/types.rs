use indexmap::IndexMap;
use soapgraph_util::QName;
use std::{cell::OnceCell, fmt, rc::Rc};

use crate::schema::{XsdElement, XsdType};

/// A forward reference by qualified name.
///
/// Parsing only records the name; the target is filled in once by the
/// resolve pass and never changes afterwards.
#[derive(Clone)]
pub struct Link<T> {
    name: QName,
    target: OnceCell<T>,
}

impl<T> Link<T> {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            target: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn get(&self) -> Option<&T> {
        self.target.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    pub(crate) fn bind(&self, target: T) {
        let _ = self.target.set(target);
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum PartKind {
    Element(Link<Rc<XsdElement>>),
    Type(Link<Rc<XsdType>>),
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: QName,
    pub parts: IndexMap<String, Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<Link<Rc<Message>>>,
    pub output: Option<Link<Rc<Message>>>,
    pub faults: IndexMap<String, Link<Rc<Message>>>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: QName,
    pub operations: IndexMap<String, Operation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Soap11,
    Soap12,
    HttpGet,
    HttpPost,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingKind::Soap11 => "Soap11Binding",
            BindingKind::Soap12 => "Soap12Binding",
            BindingKind::HttpGet => "HttpGetBinding",
            BindingKind::HttpPost => "HttpPostBinding",
        })
    }
}

#[derive(Debug, Clone)]
pub struct SoapBody {
    pub encoding: String,
    pub namespace: Option<String>,
    pub parts: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SoapOperation {
    pub action: Option<String>,
    pub style: String,
    pub input: Option<SoapBody>,
    pub output: Option<SoapBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMessage {
    UrlEncoded,
    UrlReplacement,
    MimeContent {
        content_type: Option<String>,
        part: Option<String>,
    },
    MimeXml {
        part: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct HttpOperation {
    pub location: String,
    pub input: Option<HttpMessage>,
    pub output: Option<HttpMessage>,
}

#[derive(Debug, Clone)]
pub enum OperationProtocol {
    Soap(SoapOperation),
    Http(HttpOperation),
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub protocol: OperationProtocol,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: QName,
    pub kind: BindingKind,
    pub port_type: Link<Rc<PortType>>,
    /// SOAP transport URI; HTTP bindings carry their verb in `kind` instead.
    pub transport: Option<String>,
    pub style: Option<String>,
    pub operations: IndexMap<String, BindingOperation>,
}

impl Binding {
    /// The port type operation a binding operation implements, once resolved.
    pub fn abstract_operation(&self, name: &str) -> Option<&Operation> {
        self.port_type.get()?.operations.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: Link<Rc<Binding>>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub ports: IndexMap<String, Port>,
}
