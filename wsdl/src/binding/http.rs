use soapgraph_util::Element;

use super::check_part;
use crate::{
    error,
    parser::required_attribute,
    types::{HttpMessage, HttpOperation, Operation},
    WSDL_NAMESPACE,
};

pub(crate) const HTTP_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/http/";
pub(crate) const MIME_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/mime/";

fn matches_verb(node: &Element, verb: &str) -> bool {
    node.find(HTTP_NAMESPACE, "binding")
        .map_or(false, |binding| binding.attribute("verb") == Some(verb))
}

pub(super) fn matches_get(node: &Element) -> bool {
    matches_verb(node, "GET")
}

pub(super) fn matches_post(node: &Element) -> bool {
    matches_verb(node, "POST")
}

fn parse_message(node: Option<&Element>) -> Option<HttpMessage> {
    node?.children().find_map(|child| {
        let part = || child.attribute("part").map(ToOwned::to_owned);

        if child.is(HTTP_NAMESPACE, "urlEncoded") {
            Some(HttpMessage::UrlEncoded)
        } else if child.is(HTTP_NAMESPACE, "urlReplacement") {
            Some(HttpMessage::UrlReplacement)
        } else if child.is(MIME_NAMESPACE, "content") {
            Some(HttpMessage::MimeContent {
                content_type: child.attribute("type").map(ToOwned::to_owned),
                part: part(),
            })
        } else if child.is(MIME_NAMESPACE, "mimeXml") {
            Some(HttpMessage::MimeXml { part: part() })
        } else {
            None
        }
    })
}

pub(super) fn parse_operation(node: &Element) -> Result<HttpOperation, error::Error> {
    let operation = node
        .find(HTTP_NAMESPACE, "operation")
        .ok_or_else(|| error::Error::MissingAttribute {
            element: node.name().clone(),
            attribute: "http:operation",
        })?;

    Ok(HttpOperation {
        location: required_attribute(operation, "location")?.to_owned(),
        input: parse_message(node.find(WSDL_NAMESPACE, "input")),
        output: parse_message(node.find(WSDL_NAMESPACE, "output")),
    })
}

pub(super) fn check_parts(
    operation: &HttpOperation,
    abstract_operation: &Operation,
) -> Result<(), error::Error> {
    let messages = [
        (&operation.input, abstract_operation.input.as_ref()),
        (&operation.output, abstract_operation.output.as_ref()),
    ];

    for (encoding, message) in messages {
        let part = match encoding {
            Some(HttpMessage::MimeContent { part: Some(part), .. })
            | Some(HttpMessage::MimeXml { part: Some(part) }) => part,
            _ => continue,
        };

        check_part(message, part, abstract_operation)?;
    }

    Ok(())
}
