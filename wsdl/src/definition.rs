use indexmap::IndexMap;
use soapgraph_util::{location, Element, Loader, QName};
use std::rc::Rc;
use tracing::{debug, trace};
use url::Url;

use crate::{
    binding, error,
    lookup::{Bindings, Messages, PortTypes, QualifiedTable},
    parser::{parse_message, parse_port_type, parse_service, required_attribute},
    registry::{DefinitionId, Registry},
    schema::{ParserContext, Schema},
    stitch::stitch,
    types::{Binding, Link, Message, PartKind, PortType, Service},
    WSDL_NAMESPACE,
};

/// State shared by every definition parsed for one document.
pub(crate) struct Builder<'a> {
    pub loader: &'a dyn Loader,
    pub context: ParserContext,
    pub registry: Registry,
}

/// One `wsdl:definitions` element and the symbols it declares.
#[derive(Debug)]
pub struct Definition {
    target_namespace: Option<String>,
    location: Option<Url>,

    pub(crate) schema: Option<Rc<Schema>>,
    pub(crate) messages: IndexMap<String, Rc<Message>>,
    pub(crate) port_types: IndexMap<String, Rc<PortType>>,
    pub(crate) bindings: IndexMap<String, Rc<Binding>>,
    pub(crate) services: IndexMap<String, Rc<Service>>,

    pub(crate) imports: IndexMap<Option<String>, DefinitionId>,
    skipped_bindings: Vec<QName>,
    resolved: bool,
}

impl Definition {
    pub(crate) fn new(target_namespace: Option<String>, location: Option<Url>) -> Self {
        Self {
            target_namespace,
            location,

            schema: None,
            messages: IndexMap::new(),
            port_types: IndexMap::new(),
            bindings: IndexMap::new(),
            services: IndexMap::new(),

            imports: IndexMap::new(),
            skipped_bindings: Vec::new(),
            resolved: false,
        }
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn schema(&self) -> Option<&Rc<Schema>> {
        self.schema.as_ref()
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

    pub fn imports(&self) -> &IndexMap<Option<String>, DefinitionId> {
        &self.imports
    }

    /// Bindings dropped because no binding kind matched them.
    pub fn skipped_bindings(&self) -> &[QName] {
        &self.skipped_bindings
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Names of every reference declared here that has no target yet.
    pub fn unresolved(&self) -> Vec<&QName> {
        let mut names = Vec::new();

        for message in self.messages.values() {
            for part in message.parts.values() {
                match &part.kind {
                    PartKind::Element(link) if !link.is_resolved() => names.push(link.name()),
                    PartKind::Type(link) if !link.is_resolved() => names.push(link.name()),
                    _ => (),
                }
            }
        }

        for port_type in self.port_types.values() {
            for operation in port_type.operations.values() {
                operation
                    .input
                    .iter()
                    .chain(&operation.output)
                    .chain(operation.faults.values())
                    .filter(|link| !link.is_resolved())
                    .for_each(|link| names.push(link.name()));
            }
        }

        for binding in self.bindings.values() {
            if !binding.port_type.is_resolved() {
                names.push(binding.port_type.name());
            }
        }

        for service in self.services.values() {
            for port in service.ports.values() {
                if !port.binding.is_resolved() {
                    names.push(port.binding.name());
                }
            }
        }

        names
    }

    /// Parses `doc` and every definition it imports that is not registered yet.
    ///
    /// A schema reached through a bare `xsd:schema` import is merged with the
    /// schema of `wsdl:types` rather than replaced by it; local declarations win
    /// on conflicting names.
    pub(crate) fn parse(
        builder: &mut Builder<'_>,
        doc: &Element,
        location: Option<Url>,
    ) -> Result<DefinitionId, error::Error> {
        let target_namespace = doc.attribute("targetNamespace").map(ToOwned::to_owned);
        debug!(
            namespace = target_namespace.as_deref().unwrap_or_default(),
            location = location.as_ref().map_or("", Url::as_str),
            "parsing definition"
        );

        // Registered before the imports are followed so cycles find this entry.
        let id = builder
            .registry
            .register(Self::new(target_namespace.clone(), location.clone()));

        let imported_schema = Self::parse_imports(builder, id, doc, location.as_ref())?;
        let types_schema = Self::parse_types(builder, doc, location.as_ref())?;

        let target_namespace = target_namespace.as_deref();
        let mut messages = IndexMap::new();
        let mut port_types = IndexMap::new();
        let mut bindings = IndexMap::new();
        let mut services = IndexMap::new();
        let mut skipped_bindings = Vec::new();

        for node in doc.find_all(WSDL_NAMESPACE, "message") {
            let message = parse_message(node, target_namespace)?;
            messages.insert(message.name.local_name.clone(), Rc::new(message));
        }

        for node in doc.find_all(WSDL_NAMESPACE, "portType") {
            let port_type = parse_port_type(node, target_namespace)?;
            port_types.insert(port_type.name.local_name.clone(), Rc::new(port_type));
        }

        for node in doc.find_all(WSDL_NAMESPACE, "binding") {
            match binding::parse(node, target_namespace)? {
                Some(binding) => {
                    bindings.insert(binding.name.local_name.clone(), Rc::new(binding));
                }
                None => {
                    let name = QName::new(target_namespace, required_attribute(node, "name")?);
                    debug!(binding = %name, "skipping binding of unknown kind");
                    skipped_bindings.push(name);
                }
            }
        }

        for node in doc.find_all(WSDL_NAMESPACE, "service") {
            let service = parse_service(node)?;
            services.insert(service.name.clone(), Rc::new(service));
        }

        let definition = &mut builder.registry[id];
        definition.schema = match (types_schema, imported_schema) {
            (Some(types), Some(imported)) => Some(Rc::new(types.merge(&imported))),
            (types, imported) => types.or(imported).map(Rc::new),
        };
        definition.messages = messages;
        definition.port_types = port_types;
        definition.bindings = bindings;
        definition.services = services;
        definition.skipped_bindings = skipped_bindings;

        Ok(id)
    }

    /// Follows every `wsdl:import`, returning the schema of any bare
    /// `xsd:schema` documents imported this way.
    ///
    /// ```xml
    /// <import namespace="uri" location="uri"/>*
    /// ```
    fn parse_imports(
        builder: &mut Builder<'_>,
        id: DefinitionId,
        doc: &Element,
        base: Option<&Url>,
    ) -> Result<Option<Schema>, error::Error> {
        let mut schema: Option<Schema> = None;

        for import in doc.find_all(WSDL_NAMESPACE, "import") {
            let namespace = import.attribute("namespace").map(ToOwned::to_owned);

            if let Some(existing) = builder.registry.id(namespace.as_deref()) {
                trace!(
                    namespace = namespace.as_deref().unwrap_or_default(),
                    "linking registered definition"
                );
                builder.registry[id].imports.insert(namespace, existing);
                continue;
            }

            let url = location(required_attribute(import, "location")?, base)?;
            let document = builder.loader.load(&url)?;

            if document.is_schema() {
                let imported = Schema::from_fragment(
                    Some(&document),
                    &builder.context,
                    builder.loader,
                    Some(&url),
                )?;
                schema = Some(match schema {
                    Some(existing) => existing.merge(&imported),
                    None => imported,
                });
            } else if document.is(WSDL_NAMESPACE, "definitions") {
                let imported = Self::parse(builder, &document, Some(url))?;
                builder.registry[id].imports.insert(namespace, imported);
            } else {
                return Err(error::Error::UnsupportedRoot {
                    element: document.name().clone(),
                    location: url.to_string(),
                });
            }
        }

        Ok(schema)
    }

    /// ```xml
    /// <types>
    ///     <xsd:schema .... />*
    /// </types>
    /// ```
    fn parse_types(
        builder: &mut Builder<'_>,
        doc: &Element,
        location: Option<&Url>,
    ) -> Result<Option<Schema>, error::Error> {
        let fragments: Vec<&Element> = doc
            .find(WSDL_NAMESPACE, "types")
            .map(|types| types.children().filter(|child| child.is_schema()).collect())
            .unwrap_or_default();

        stitch(&fragments, &mut builder.context, builder.loader, location)
    }

    /// Links every reference declared by the definition `id`, after resolving
    /// the definitions it imports. Each definition is resolved once.
    pub(crate) fn resolve_imports(
        registry: &mut Registry,
        id: DefinitionId,
    ) -> Result<(), error::Error> {
        if registry[id].resolved {
            return Ok(());
        }
        registry[id].resolved = true;

        trace!(
            namespace = registry[id].target_namespace().unwrap_or_default(),
            "resolving definition"
        );

        let schema = match registry[id].schema.clone() {
            Some(schema) => schema,
            None => {
                let adopted = registry[id]
                    .imports
                    .values()
                    .filter_map(|import| registry[*import].schema.as_ref())
                    .find(|schema| !schema.is_empty())
                    .cloned();

                let definition = &mut registry[id];
                let schema = adopted
                    .unwrap_or_else(|| Rc::new(Schema::empty(definition.location.clone())));
                definition.schema = Some(schema.clone());
                schema
            }
        };

        let imports: Vec<DefinitionId> = registry[id].imports.values().copied().collect();
        for import in imports {
            Self::resolve_imports(registry, import)?;
        }

        let registry = &*registry;
        let definition = &registry[id];

        for message in definition.messages.values() {
            for part in message.parts.values() {
                match &part.kind {
                    PartKind::Element(link) => link.bind(schema.resolve_element(link.name())?),
                    PartKind::Type(link) => link.bind(schema.resolve_type_ref(link.name())?),
                }
            }
        }

        for port_type in definition.port_types.values() {
            for operation in port_type.operations.values() {
                for link in operation
                    .input
                    .iter()
                    .chain(&operation.output)
                    .chain(operation.faults.values())
                {
                    link.bind(find::<Messages, _>(registry, id, link)?.clone());
                }
            }
        }

        for binding in definition.bindings.values() {
            let port_type = find::<PortTypes, _>(registry, id, &binding.port_type)?;
            binding.port_type.bind(port_type.clone());
            binding::resolve(binding, port_type)?;
        }

        for service in definition.services.values() {
            for port in service.ports.values() {
                port.binding
                    .bind(find::<Bindings, _>(registry, id, &port.binding)?.clone());
            }
        }

        Ok(())
    }

    /// Checks the parts named by every binding's wire metadata. Only valid
    /// once every definition of the document has been resolved.
    pub(crate) fn check_bindings(&self) -> Result<(), error::Error> {
        self.bindings.values().try_for_each(|binding| binding::check_parts(binding))
    }
}

fn find<'a, T: QualifiedTable, U>(
    registry: &'a Registry,
    id: DefinitionId,
    link: &Link<U>,
) -> Result<&'a Rc<T::Entity>, error::Error> {
    registry
        .lookup_qualified::<T>(id, link.name())
        .map_err(|_| error::Error::Unresolved {
            kind: T::KIND,
            name: link.name().clone(),
        })
}
