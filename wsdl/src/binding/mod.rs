//! Binding classification and the per-kind binding parsers.
//!
//! ```xml
//! <binding name="nmtoken" type="qname">
//!     <-- extensibility element -->*
//!     <operation name="nmtoken">
//!         <-- extensibility element -->*
//!         <input>...</input>?
//!         <output>...</output>?
//!         <fault name="nmtoken">...</fault>*
//!     </operation>*
//! </binding>
//! ```

use indexmap::IndexMap;
use soapgraph_util::{Element, QName};
use std::rc::Rc;

use crate::{
    error,
    parser::{required_attribute, required_qname},
    types::{
        Binding, BindingKind, BindingOperation, Link, Message, Operation, OperationProtocol,
        PortType,
    },
    WSDL_NAMESPACE,
};

mod http;
mod soap;

type Matcher = fn(&Element) -> bool;

/// Tried in order; the first match decides the kind.
const CLASSIFIERS: [(BindingKind, Matcher); 4] = [
    (BindingKind::Soap11, soap::matches_soap11),
    (BindingKind::Soap12, soap::matches_soap12),
    (BindingKind::HttpGet, http::matches_get),
    (BindingKind::HttpPost, http::matches_post),
];

pub fn classify(node: &Element) -> Option<BindingKind> {
    CLASSIFIERS
        .iter()
        .find(|(_, matches)| matches(node))
        .map(|(kind, _)| *kind)
}

/// Returns `None` for bindings no classifier recognises.
pub(crate) fn parse(
    node: &Element,
    target_namespace: Option<&str>,
) -> Result<Option<Binding>, error::Error> {
    let kind = match classify(node) {
        Some(kind) => kind,
        None => return Ok(None),
    };

    let name = QName::new(target_namespace, required_attribute(node, "name")?);
    let port_type = Link::new(required_qname(node, "type")?);

    let (transport, style) = match kind {
        BindingKind::Soap11 | BindingKind::Soap12 => soap::binding_options(node, kind),
        BindingKind::HttpGet | BindingKind::HttpPost => (None, None),
    };

    let mut operations = IndexMap::new();
    for operation in node.find_all(WSDL_NAMESPACE, "operation") {
        let name = required_attribute(operation, "name")?.to_owned();

        let protocol = match kind {
            BindingKind::Soap11 | BindingKind::Soap12 => OperationProtocol::Soap(
                soap::parse_operation(operation, kind, style.as_deref()),
            ),
            BindingKind::HttpGet | BindingKind::HttpPost => {
                OperationProtocol::Http(http::parse_operation(operation)?)
            }
        };

        operations.insert(name.clone(), BindingOperation { name, protocol });
    }

    Ok(Some(Binding {
        name,
        kind,
        port_type,
        transport,
        style,
        operations,
    }))
}

/// Checks the binding's operations against its now linked port type.
pub(crate) fn resolve(binding: &Binding, port_type: &Rc<PortType>) -> Result<(), error::Error> {
    for operation in binding.operations.values() {
        find_operation(port_type, &operation.name)?;
    }

    Ok(())
}

/// Checks the `parts` named by the binding's wire metadata against the
/// messages of the abstract operations.
///
/// Message links of a port type further up an import cycle are only bound
/// once the whole graph has been resolved, so this runs after that.
pub(crate) fn check_parts(binding: &Binding) -> Result<(), error::Error> {
    let port_type = binding
        .port_type
        .get()
        .ok_or_else(|| error::Error::Unresolved {
            kind: "port type",
            name: binding.port_type.name().clone(),
        })?;

    for operation in binding.operations.values() {
        let abstract_operation = find_operation(port_type, &operation.name)?;

        match &operation.protocol {
            OperationProtocol::Soap(soap) => soap::check_parts(soap, abstract_operation)?,
            OperationProtocol::Http(http) => http::check_parts(http, abstract_operation)?,
        }
    }

    Ok(())
}

fn find_operation<'a>(
    port_type: &'a PortType,
    name: &str,
) -> Result<&'a Operation, error::Error> {
    port_type
        .operations
        .get(name)
        .ok_or_else(|| error::Error::Unresolved {
            kind: "operation",
            name: QName::new(port_type.name.namespace(), name),
        })
}

/// Fails unless `part` names a part of the message behind `message`.
fn check_part(
    message: Option<&Link<Rc<Message>>>,
    part: &str,
    operation: &Operation,
) -> Result<(), error::Error> {
    match message.and_then(|message| message.get()) {
        Some(message) if message.parts.contains_key(part) => Ok(()),
        _ => Err(error::Error::Unresolved {
            kind: "part",
            name: QName::new(
                message.and_then(|message| message.name().namespace()),
                &format!("{}.{}", operation.name, part),
            ),
        }),
    }
}
