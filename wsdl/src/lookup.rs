//! Two-level name lookup: a definition's own table first, then the tables of
//! the definitions it imports directly. Imports of imports are never searched.

use indexmap::IndexMap;
use soapgraph_util::QName;
use std::rc::Rc;

use crate::{
    definition::Definition,
    error,
    registry::{DefinitionId, Registry},
    types::{Binding, Message, PortType, Service},
};

pub trait Table {
    type Entity;

    /// Table name reported by lookup failures.
    const NAME: &'static str;
    /// Symbol kind reported by resolution failures.
    const KIND: &'static str;

    fn entries(definition: &Definition) -> &IndexMap<String, Rc<Self::Entity>>;
}

/// Tables whose entities carry a namespace qualified name.
pub trait QualifiedTable: Table {
    fn qualified_name(entity: &Self::Entity) -> &QName;
}

pub struct Messages;
pub struct PortTypes;
pub struct Bindings;
pub struct Services;

impl Table for Messages {
    type Entity = Message;
    const NAME: &'static str = "messages";
    const KIND: &'static str = "message";

    fn entries(definition: &Definition) -> &IndexMap<String, Rc<Message>> {
        definition.messages()
    }
}

impl Table for PortTypes {
    type Entity = PortType;
    const NAME: &'static str = "port_types";
    const KIND: &'static str = "port type";

    fn entries(definition: &Definition) -> &IndexMap<String, Rc<PortType>> {
        definition.port_types()
    }
}

impl Table for Bindings {
    type Entity = Binding;
    const NAME: &'static str = "bindings";
    const KIND: &'static str = "binding";

    fn entries(definition: &Definition) -> &IndexMap<String, Rc<Binding>> {
        definition.bindings()
    }
}

impl QualifiedTable for Messages {
    fn qualified_name(message: &Message) -> &QName {
        &message.name
    }
}

impl QualifiedTable for PortTypes {
    fn qualified_name(port_type: &PortType) -> &QName {
        &port_type.name
    }
}

impl QualifiedTable for Bindings {
    fn qualified_name(binding: &Binding) -> &QName {
        &binding.name
    }
}

impl Table for Services {
    type Entity = Service;
    const NAME: &'static str = "services";
    const KIND: &'static str = "service";

    fn entries(definition: &Definition) -> &IndexMap<String, Rc<Service>> {
        definition.services()
    }
}

fn scope(registry: &Registry, definition: DefinitionId) -> impl Iterator<Item = &Definition> {
    let definition = &registry[definition];

    std::iter::once(definition)
        .chain(definition.imports().values().map(move |import| &registry[*import]))
}

pub fn lookup<'a, T: Table>(
    registry: &'a Registry,
    definition: DefinitionId,
    key: &str,
) -> Result<&'a Rc<T::Entity>, error::Error> {
    scope(registry, definition)
        .find_map(|definition| T::entries(definition).get(key))
        .ok_or_else(|| error::Error::NotFound {
            table: T::NAME,
            key: key.to_owned(),
        })
}

/// Like [`lookup`], but a hit only counts when the entity's qualified name
/// equals `name`, namespace included.
pub fn lookup_qualified<'a, T: QualifiedTable>(
    registry: &'a Registry,
    definition: DefinitionId,
    name: &QName,
) -> Result<&'a Rc<T::Entity>, error::Error> {
    scope(registry, definition)
        .filter_map(|definition| T::entries(definition).get(&name.local_name))
        .find(|entity| T::qualified_name(entity) == name)
        .ok_or_else(|| error::Error::NotFound {
            table: T::NAME,
            key: name.to_string(),
        })
}
