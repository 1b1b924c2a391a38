use std::{
    collections::BTreeMap,
    fmt,
    io::{BufRead, BufReader, Read},
};

pub use quick_xml::{events, Reader};

use quick_xml::events::{BytesStart, Event};

use crate::Error;

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSD_1999_NAMESPACE: &str = "http://www.w3.org/1999/XMLSchema";

pub fn split_prefixed_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local_name)) => (Some(prefix), local_name),
        None => (None, prefixed_name),
    }
}

/// A namespace + local-name pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local_name: &str) -> Self {
        Self {
            namespace: namespace.map(ToOwned::to_owned),
            local_name: local_name.to_owned(),
        }
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned XML element.
///
/// Every element carries the full set of namespace bindings in scope at its
/// position, so a cloned subtree can still resolve prefixed attribute values
/// after it has been detached from its document.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QName,
    namespaces: BTreeMap<Option<String>, String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespaces: BTreeMap::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn parse_str(content: &str) -> Result<Self, Error> {
        Self::from_reader(Reader::from_str(content))
    }

    pub fn parse_read<R: Read>(read: R) -> Result<Self, Error> {
        Self::from_reader(Reader::from_reader(BufReader::new(read)))
    }

    pub fn from_reader<B: BufRead>(mut reader: Reader<B>) -> Result<Self, Error> {
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) => {
                    let element = Self::open(&reader, &start, stack.last())?;
                    stack.push(element);
                }

                Event::Empty(start) => {
                    let element = Self::open(&reader, &start, stack.last())?;
                    Self::close(&mut stack, &mut root, element);
                }

                Event::End(..) => {
                    if let Some(element) = stack.pop() {
                        Self::close(&mut stack, &mut root, element);
                    }
                }

                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape_and_decode(&reader)?;
                        if !text.is_empty() {
                            parent.children.push(Node::Text(text));
                        }
                    }
                }

                Event::Eof => break,

                _ => (),
            }

            buffer.clear();
        }

        root.ok_or(Error::EmptyDocument)
    }

    fn open<B: BufRead>(
        reader: &Reader<B>,
        start: &BytesStart<'_>,
        parent: Option<&Element>,
    ) -> Result<Self, Error> {
        let mut namespaces = parent
            .map(|parent| parent.namespaces.clone())
            .unwrap_or_default();
        let mut attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let value = attribute.unescape_and_decode_value(reader)?;

            match split_prefixed_name(key) {
                (None, "xmlns") if value.is_empty() => {
                    namespaces.remove(&None::<String>);
                }
                (None, "xmlns") => {
                    namespaces.insert(None, value);
                }
                (Some("xmlns"), prefix) => {
                    namespaces.insert(Some(prefix.to_owned()), value);
                }
                _ => attributes.push((key.to_owned(), value)),
            }
        }

        let (prefix, local_name) = split_prefixed_name(reader.decode(start.name())?);
        let namespace = match prefix {
            Some(prefix) => Some(
                namespaces
                    .get(&Some(prefix.to_owned()))
                    .ok_or_else(|| Error::UnboundPrefix(prefix.to_owned()))?
                    .clone(),
            ),
            None => namespaces.get(&None::<String>).cloned(),
        };

        Ok(Self {
            name: QName {
                namespace,
                local_name: local_name.to_owned(),
            },
            namespaces,
            attributes,
            children: Vec::new(),
        })
    }

    fn close(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => *root = Some(element),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.name.is(namespace, local_name)
    }

    pub fn is_schema(&self) -> bool {
        self.is(XSD_NAMESPACE, "schema") || self.is(XSD_1999_NAMESPACE, "schema")
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.attributes.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn namespace_for(&self, prefix: Option<&str>) -> Option<&str> {
        self.namespaces
            .get(&prefix.map(ToOwned::to_owned))
            .map(String::as_str)
    }

    /// Resolves a prefixed value such as `tns:GetPrice` against the bindings
    /// in scope at this element. Unprefixed values take the default namespace.
    pub fn resolve_qname(&self, prefixed_name: &str) -> Result<QName, Error> {
        let (prefix, local_name) = split_prefixed_name(prefixed_name.trim());

        match prefix {
            Some(prefix) => match self.namespace_for(Some(prefix)) {
                Some(namespace) => Ok(QName::new(Some(namespace), local_name)),
                None => Err(Error::UnboundPrefix(prefix.to_owned())),
            },
            None => Ok(QName::new(self.namespace_for(None), local_name)),
        }
    }

    pub fn qname_attribute(&self, key: &str) -> Result<Option<QName>, Error> {
        self.attribute(key)
            .map(|value| self.resolve_qname(value))
            .transpose()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(..) => None,
        })
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(..) => None,
        })
    }

    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.children()
            .find(|child| child.is(namespace, local_name))
    }

    pub fn find_all<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children()
            .filter(move |child| child.is(namespace, local_name))
    }

    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(..) => None,
            })
            .collect()
    }
}
