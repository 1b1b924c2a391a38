use indexmap::IndexMap;
use soapgraph_util::{Element, QName};

use super::{
    error,
    types::{Link, Message, Operation, Part, PartKind, Port, PortType, Service},
    WSDL_NAMESPACE,
};

const ADDRESS_NAMESPACES: [&str; 3] = [
    "http://schemas.xmlsoap.org/wsdl/soap/",
    "http://schemas.xmlsoap.org/wsdl/soap12/",
    "http://schemas.xmlsoap.org/wsdl/http/",
];

pub(crate) fn get_attributes<'a, const N: usize>(
    node: &'a Element,
    names: [&'static str; N],
) -> [Option<&'a str>; N] {
    names.map(|name| node.attribute(name))
}

pub(crate) fn required_attribute<'a>(
    node: &'a Element,
    attribute: &'static str,
) -> Result<&'a str, error::Error> {
    node.attribute(attribute)
        .ok_or_else(|| error::Error::MissingAttribute {
            element: node.name().clone(),
            attribute,
        })
}

pub(crate) fn required_qname(
    node: &Element,
    attribute: &'static str,
) -> Result<QName, error::Error> {
    Ok(node.resolve_qname(required_attribute(node, attribute)?)?)
}

/// ```xml
/// <message name="nmtoken">
///     <part name="nmtoken" element="qname"? type="qname"?/> *
/// </message>
/// ```
pub(crate) fn parse_message(
    node: &Element,
    target_namespace: Option<&str>,
) -> Result<Message, error::Error> {
    let name = QName::new(target_namespace, required_attribute(node, "name")?);
    let mut parts = IndexMap::new();

    for part in node.find_all(WSDL_NAMESPACE, "part") {
        let [name, element, ty] = get_attributes(part, ["name", "element", "type"]);

        let name = name.ok_or_else(|| error::Error::MissingAttribute {
            element: part.name().clone(),
            attribute: "name",
        })?;

        let kind = match (element, ty) {
            (Some(element), _) => PartKind::Element(Link::new(part.resolve_qname(element)?)),
            (None, Some(ty)) => PartKind::Type(Link::new(part.resolve_qname(ty)?)),
            (None, None) => {
                return Err(error::Error::MissingAttribute {
                    element: part.name().clone(),
                    attribute: "element",
                })
            }
        };

        parts.insert(
            name.to_owned(),
            Part {
                name: name.to_owned(),
                kind,
            },
        );
    }

    Ok(Message { name, parts })
}

fn message_link(node: &Element) -> Result<Link<std::rc::Rc<Message>>, error::Error> {
    Ok(Link::new(required_qname(node, "message")?))
}

/// ```xml
/// <portType name="nmtoken">
///     <operation name="nmtoken">
///         <documentation/>?
///         <input message="qname"/>?
///         <output message="qname"/>?
///         <fault name="nmtoken" message="qname"/>*
///     </operation>*
/// </portType>
/// ```
pub(crate) fn parse_port_type(
    node: &Element,
    target_namespace: Option<&str>,
) -> Result<PortType, error::Error> {
    let name = QName::new(target_namespace, required_attribute(node, "name")?);
    let mut operations = IndexMap::new();

    for operation in node.find_all(WSDL_NAMESPACE, "operation") {
        let name = required_attribute(operation, "name")?.to_owned();

        let documentation = operation
            .find(WSDL_NAMESPACE, "documentation")
            .map(Element::text);

        let input = operation
            .find(WSDL_NAMESPACE, "input")
            .map(message_link)
            .transpose()?;

        let output = operation
            .find(WSDL_NAMESPACE, "output")
            .map(message_link)
            .transpose()?;

        let mut faults = IndexMap::new();
        for fault in operation.find_all(WSDL_NAMESPACE, "fault") {
            faults.insert(
                required_attribute(fault, "name")?.to_owned(),
                message_link(fault)?,
            );
        }

        operations.insert(
            name.clone(),
            Operation {
                name,
                documentation,
                input,
                output,
                faults,
            },
        );
    }

    Ok(PortType { name, operations })
}

/// ```xml
/// <service name="nmtoken">
///     <port name="nmtoken" binding="qname">
///         <soap:address location="uri"/>
///     </port>*
/// </service>
/// ```
pub(crate) fn parse_service(node: &Element) -> Result<Service, error::Error> {
    let name = required_attribute(node, "name")?.to_owned();
    let mut ports = IndexMap::new();

    for port in node.find_all(WSDL_NAMESPACE, "port") {
        let name = required_attribute(port, "name")?.to_owned();
        let binding = Link::new(required_qname(port, "binding")?);

        let address = ADDRESS_NAMESPACES
            .iter()
            .find_map(|namespace| port.find(namespace, "address"))
            .and_then(|address| address.attribute("location"))
            .map(ToOwned::to_owned);

        ports.insert(
            name.clone(),
            Port {
                name,
                binding,
                address,
            },
        );
    }

    Ok(Service { name, ports })
}
