use indexmap::IndexMap;
use soapgraph_util::{Element, Loader, QName};
use std::{fmt, io::Read, rc::Rc};
use url::Url;

use crate::{
    definition::{Builder, Definition},
    error,
    registry::{DefinitionId, Registry},
    schema::{ParserContext, Schema},
    types::{Binding, Link, Message, PortType, Service},
    WSDL_NAMESPACE,
};

/// A WSDL document: the root definition plus every definition it imports.
///
/// Imports are non-transitive, so only the root definition's own declarations
/// are published here; imported declarations stay reachable through the links
/// of the root's entities and through [`Document::registry`].
#[derive(Debug)]
pub struct Document {
    location: Option<Url>,
    registry: Registry,
    root: DefinitionId,

    schema: Rc<Schema>,
    messages: IndexMap<String, Rc<Message>>,
    port_types: IndexMap<String, Rc<PortType>>,
    bindings: IndexMap<String, Rc<Binding>>,
    services: IndexMap<String, Rc<Service>>,
}

impl Document {
    pub fn load<S: AsRef<str>>(location: S, loader: &dyn Loader) -> Result<Self, error::Error> {
        let location = soapgraph_util::location(location, None)?;
        let root = loader.load(&location)?;
        Self::build(&root, Some(location), loader)
    }

    /// Reads the root definition from a stream. Relative imports are then
    /// resolved against the working directory.
    pub fn from_reader<R: Read>(read: R, loader: &dyn Loader) -> Result<Self, error::Error> {
        let root = Element::parse_read(read)?;
        Self::build(&root, None, loader)
    }

    pub fn parse_str(content: &str, loader: &dyn Loader) -> Result<Self, error::Error> {
        let root = Element::parse_str(content)?;
        Self::build(&root, None, loader)
    }

    fn build(
        root: &Element,
        location: Option<Url>,
        loader: &dyn Loader,
    ) -> Result<Self, error::Error> {
        if !root.is(WSDL_NAMESPACE, "definitions") {
            return Err(error::Error::UnsupportedRoot {
                element: root.name().clone(),
                location: location.as_ref().map_or_else(String::new, Url::to_string),
            });
        }

        let mut builder = Builder {
            loader,
            context: ParserContext::new(),
            registry: Registry::default(),
        };

        let id = Definition::parse(&mut builder, root, location.clone())?;
        let mut registry = builder.registry;
        Definition::resolve_imports(&mut registry, id)?;
        registry.definitions().try_for_each(Definition::check_bindings)?;

        let definition = &registry[id];
        let schema = definition
            .schema()
            .cloned()
            .unwrap_or_else(|| Rc::new(Schema::empty(location.clone())));
        let messages = definition.messages().clone();
        let port_types = definition.port_types().clone();
        let bindings = definition.bindings().clone();
        let services = definition.services().clone();

        Ok(Self {
            location,
            registry,
            root: id,

            schema,
            messages,
            port_types,
            bindings,
            services,
        })
    }

    /// Runs the resolve pass again from the root. Definitions that are already
    /// resolved are left untouched, so this never changes a built document.
    pub fn resolve(&mut self) -> Result<(), error::Error> {
        Definition::resolve_imports(&mut self.registry, self.root)
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn messages(&self) -> &IndexMap<String, Rc<Message>> {
        &self.messages
    }

    pub fn port_types(&self) -> &IndexMap<String, Rc<PortType>> {
        &self.port_types
    }

    pub fn bindings(&self) -> &IndexMap<String, Rc<Binding>> {
        &self.bindings
    }

    pub fn services(&self) -> &IndexMap<String, Rc<Service>> {
        &self.services
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn root(&self) -> &Definition {
        &self.registry[self.root]
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.registry.definitions()
    }

    pub fn skipped_bindings(&self) -> impl Iterator<Item = &QName> {
        self.definitions()
            .flat_map(|definition| definition.skipped_bindings())
    }

    /// References without a target in any definition. Empty for every
    /// successfully built document.
    pub fn unresolved(&self) -> Vec<&QName> {
        self.definitions()
            .flat_map(|definition| definition.unresolved())
            .collect()
    }

    pub fn dump(&self) -> String {
        self.to_string()
    }
}

fn message_name(link: Option<&Link<Rc<Message>>>) -> &str {
    link.map_or("", |link| link.name().local_name.as_str())
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(4);

        writeln!(f)?;
        writeln!(f, "Global elements:")?;
        let mut elements: Vec<_> = self
            .schema
            .elements()
            .map(|element| element.name.to_string())
            .collect();
        elements.sort();
        for element in elements {
            writeln!(f, "{} {}", indent, element)?;
        }

        writeln!(f)?;
        writeln!(f, "Global types:")?;
        let mut types: Vec<_> = self.schema.types().map(|ty| ty.name.to_string()).collect();
        types.sort();
        for ty in types {
            writeln!(f, "{} {}", indent, ty)?;
        }

        writeln!(f)?;
        writeln!(f, "Bindings:")?;
        for binding in self.bindings.values() {
            writeln!(f, "{} {}: {}", indent, binding.kind, binding.name)?;
        }

        writeln!(f)?;
        for service in self.services.values() {
            writeln!(f, "Service: {}", service.name)?;

            for port in service.ports.values() {
                write!(f, "{} Port: {}", indent, port.name)?;

                let binding = match port.binding.get() {
                    Some(binding) => binding,
                    None => {
                        writeln!(f)?;
                        continue;
                    }
                };
                writeln!(f, " ({}: {})", binding.kind, binding.name)?;
                writeln!(f, "{}{} Operations:", indent, indent)?;

                let mut operations: Vec<_> = binding.operations.keys().collect();
                operations.sort();
                for name in operations {
                    let operation = binding.abstract_operation(name);
                    let input =
                        message_name(operation.and_then(|operation| operation.input.as_ref()));
                    let output =
                        message_name(operation.and_then(|operation| operation.output.as_ref()));

                    write!(f, "{}{}{}{}({})", indent, indent, indent, name, input)?;
                    if output.is_empty() {
                        writeln!(f)?;
                    } else {
                        writeln!(f, " -> {}", output)?;
                    }
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
