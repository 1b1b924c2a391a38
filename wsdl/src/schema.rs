//! A minimal XSD symbol table.
//!
//! Only top-level declarations are tracked: enough to bind message parts to
//! the elements and types they name and to follow `xsd:import` chains.

use indexmap::{IndexMap, IndexSet};
use soapgraph_util::{
    location,
    xml::{XSD_1999_NAMESPACE, XSD_NAMESPACE},
    Element, Loader, QName,
};
use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};
use tracing::trace;
use url::Url;

use crate::{error, parser::required_attribute};

const BUILTIN_TYPES: &[&str] = &[
    "anyType",
    "anySimpleType",
    "anyURI",
    "base64Binary",
    "boolean",
    "byte",
    "date",
    "dateTime",
    "decimal",
    "double",
    "duration",
    "float",
    "hexBinary",
    "ID",
    "IDREF",
    "int",
    "integer",
    "language",
    "long",
    "Name",
    "NCName",
    "negativeInteger",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "normalizedString",
    "positiveInteger",
    "QName",
    "short",
    "string",
    "time",
    "token",
    "unsignedByte",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Builtin,
    Simple,
    Complex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XsdType {
    pub name: QName,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XsdElement {
    pub name: QName,
    pub type_name: Option<QName>,
}

#[derive(Debug, Default, Clone)]
struct SchemaDocument {
    elements: IndexMap<String, Rc<XsdElement>>,
    types: IndexMap<String, Rc<XsdType>>,
    imports: IndexSet<Option<String>>,
}

/// Fragment trees registered under synthetic locations, shared by every schema
/// built for one document.
#[derive(Debug, Default)]
pub struct ParserContext {
    schema_nodes: HashMap<String, (Element, Option<Url>)>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `offset`-th location token not yet used by this context.
    pub fn token(&self, offset: usize) -> String {
        format!("intschema:xsd{}", self.schema_nodes.len() + offset)
    }

    pub fn add(&mut self, token: String, node: Element, location: Option<Url>) {
        self.schema_nodes.insert(token, (node, location));
    }

    pub fn get(&self, token: &str) -> Option<&Element> {
        self.schema_nodes.get(token).map(|(node, _)| node)
    }

    pub fn len(&self) -> usize {
        self.schema_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema_nodes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    location: Option<Url>,
    documents: IndexMap<Option<String>, SchemaDocument>,
}

impl Schema {
    pub fn empty(location: Option<Url>) -> Self {
        Self {
            location,
            documents: IndexMap::new(),
        }
    }

    pub fn from_fragment(
        fragment: Option<&Element>,
        context: &ParserContext,
        loader: &dyn Loader,
        location: Option<&Url>,
    ) -> Result<Self, error::Error> {
        let mut schema = Self::empty(location.cloned());

        if let Some(fragment) = fragment {
            let mut visited = HashSet::new();
            schema.load(fragment, location, context, loader, &mut visited)?;
        }

        Ok(schema)
    }

    fn load(
        &mut self,
        node: &Element,
        base: Option<&Url>,
        context: &ParserContext,
        loader: &dyn Loader,
        visited: &mut HashSet<String>,
    ) -> Result<(), error::Error> {
        let namespace = node.attribute("targetNamespace").map(ToOwned::to_owned);
        self.documents.entry(namespace.clone()).or_default();

        for child in node.children() {
            if !is_xsd(child.name()) {
                continue;
            }

            match child.local_name() {
                "element" => {
                    let name = QName::new(namespace.as_deref(), required_attribute(child, "name")?);
                    let type_name = child.qname_attribute("type")?;

                    self.document(&namespace).elements.insert(
                        name.local_name.clone(),
                        Rc::new(XsdElement { name, type_name }),
                    );
                }

                "complexType" | "simpleType" => {
                    let name = QName::new(namespace.as_deref(), required_attribute(child, "name")?);
                    let kind = if child.local_name() == "complexType" {
                        TypeKind::Complex
                    } else {
                        TypeKind::Simple
                    };

                    self.document(&namespace)
                        .types
                        .insert(name.local_name.clone(), Rc::new(XsdType { name, kind }));
                }

                "import" | "include" => {
                    let schema_location = match child.attribute("schemaLocation") {
                        Some(schema_location) if !schema_location.is_empty() => schema_location,
                        _ => continue,
                    };

                    let imported = if child.local_name() == "include" {
                        namespace.clone()
                    } else {
                        child.attribute("namespace").map(ToOwned::to_owned)
                    };
                    self.document(&namespace).imports.insert(imported);

                    if let Some((fragment, fragment_location)) =
                        context.schema_nodes.get(schema_location)
                    {
                        if visited.insert(schema_location.to_owned()) {
                            trace!(schema_location, "following internal schema import");
                            let fragment_base = fragment_location.as_ref();
                            self.load(fragment, fragment_base, context, loader, visited)?;
                        }
                    } else {
                        let url = location(schema_location, base)?;
                        if visited.insert(url.to_string()) {
                            trace!(%url, "following schema import");
                            let document = loader.load(&url)?;
                            self.load(&document, Some(&url), context, loader, visited)?;
                        }
                    }
                }

                _ => (),
            }
        }

        Ok(())
    }

    fn document(&mut self, namespace: &Option<String>) -> &mut SchemaDocument {
        self.documents.entry(namespace.clone()).or_default()
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.documents
            .values()
            .all(|document| document.elements.is_empty() && document.types.is_empty())
    }

    /// Combines the declarations of both schemas; entries of `self` win on
    /// conflicting names.
    pub fn merge(mut self, other: &Schema) -> Self {
        for (namespace, theirs) in &other.documents {
            let ours = self.document(namespace);

            for (name, element) in &theirs.elements {
                ours.elements
                    .entry(name.clone())
                    .or_insert_with(|| element.clone());
            }
            for (name, ty) in &theirs.types {
                ours.types.entry(name.clone()).or_insert_with(|| ty.clone());
            }
            ours.imports.extend(theirs.imports.iter().cloned());
        }

        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &Rc<XsdElement>> {
        self.documents
            .values()
            .flat_map(|document| document.elements.values())
    }

    pub fn types(&self) -> impl Iterator<Item = &Rc<XsdType>> {
        self.documents
            .values()
            .flat_map(|document| document.types.values())
    }

    pub fn resolve_element(&self, name: &QName) -> Result<Rc<XsdElement>, error::Error> {
        self.documents
            .get(&name.namespace)
            .and_then(|document| document.elements.get(&name.local_name))
            .cloned()
            .ok_or_else(|| error::Error::ElementNotFound(name.clone()))
    }

    pub fn resolve_type_ref(&self, name: &QName) -> Result<Rc<XsdType>, error::Error> {
        if let Some(builtin) = builtin_type(name) {
            return Ok(builtin);
        }

        self.documents
            .get(&name.namespace)
            .and_then(|document| document.types.get(&name.local_name))
            .cloned()
            .ok_or_else(|| error::Error::TypeNotFound(name.clone()))
    }

    /// Resolves a type reference written inside the schema for `namespace`,
    /// which may only see its own declarations and the namespaces it imports.
    pub fn resolve_type_ref_from(
        &self,
        namespace: Option<&str>,
        name: &QName,
    ) -> Result<Rc<XsdType>, error::Error> {
        if builtin_type(name).is_none() && name.namespace() != namespace {
            let visible = self
                .documents
                .get(&namespace.map(ToOwned::to_owned))
                .map_or(false, |document| document.imports.contains(&name.namespace));

            if !visible {
                return Err(error::Error::TypeNotFound(name.clone()));
            }
        }

        self.resolve_type_ref(name)
    }
}

fn is_xsd(name: &QName) -> bool {
    matches!(name.namespace(), Some(XSD_NAMESPACE | XSD_1999_NAMESPACE))
}

fn builtin_type(name: &QName) -> Option<Rc<XsdType>> {
    if is_xsd(name) && BUILTIN_TYPES.contains(&name.local_name.as_str()) {
        Some(Rc::new(XsdType {
            name: name.clone(),
            kind: TypeKind::Builtin,
        }))
    } else {
        None
    }
}
