use indexmap::IndexMap;
use soapgraph_util::QName;
use std::{
    ops::{Index, IndexMut},
    rc::Rc,
};

use crate::{
    definition::Definition,
    error,
    lookup::{lookup, lookup_qualified, QualifiedTable, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionId(usize);

/// Every definition reachable from a document's root, indexed by target
/// namespace.
///
/// Definitions refer to each other through [`DefinitionId`]s into this arena,
/// which keeps cyclic imports free of ownership cycles.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Vec<Definition>,
    namespaces: IndexMap<Option<String>, DefinitionId>,
}

impl Registry {
    pub(crate) fn register(&mut self, definition: Definition) -> DefinitionId {
        let id = DefinitionId(self.definitions.len());
        self.namespaces
            .insert(definition.target_namespace().map(ToOwned::to_owned), id);
        self.definitions.push(definition);
        id
    }

    pub fn id(&self, namespace: Option<&str>) -> Option<DefinitionId> {
        self.namespaces
            .get(&namespace.map(ToOwned::to_owned))
            .copied()
    }

    pub fn get(&self, namespace: Option<&str>) -> Option<&Definition> {
        self.id(namespace).map(|id| &self[id])
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn lookup<T: Table>(
        &self,
        definition: DefinitionId,
        key: &str,
    ) -> Result<&Rc<T::Entity>, error::Error> {
        lookup::<T>(self, definition, key)
    }

    pub fn lookup_qualified<T: QualifiedTable>(
        &self,
        definition: DefinitionId,
        name: &QName,
    ) -> Result<&Rc<T::Entity>, error::Error> {
        lookup_qualified::<T>(self, definition, name)
    }
}

impl Index<DefinitionId> for Registry {
    type Output = Definition;

    fn index(&self, id: DefinitionId) -> &Definition {
        &self.definitions[id.0]
    }
}

impl IndexMut<DefinitionId> for Registry {
    fn index_mut(&mut self, id: DefinitionId) -> &mut Definition {
        &mut self.definitions[id.0]
    }
}
