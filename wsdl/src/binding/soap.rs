use soapgraph_util::Element;

use super::check_part;
use crate::{
    error,
    types::{BindingKind, Operation, SoapBody, SoapOperation},
    WSDL_NAMESPACE,
};

pub(crate) const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub(crate) const SOAP12_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

fn namespace(kind: BindingKind) -> &'static str {
    match kind {
        BindingKind::Soap12 => SOAP12_NAMESPACE,
        _ => SOAP11_NAMESPACE,
    }
}

pub(super) fn matches_soap11(node: &Element) -> bool {
    node.find(SOAP11_NAMESPACE, "binding").is_some()
}

pub(super) fn matches_soap12(node: &Element) -> bool {
    node.find(SOAP12_NAMESPACE, "binding").is_some()
}

/// Transport and default style from `soap:binding`.
pub(super) fn binding_options(
    node: &Element,
    kind: BindingKind,
) -> (Option<String>, Option<String>) {
    match node.find(namespace(kind), "binding") {
        Some(binding) => (
            binding.attribute("transport").map(ToOwned::to_owned),
            binding.attribute("style").map(ToOwned::to_owned),
        ),
        None => (None, None),
    }
}

fn parse_body(node: Option<&Element>, kind: BindingKind) -> Option<SoapBody> {
    let body = node?.find(namespace(kind), "body")?;

    Some(SoapBody {
        encoding: body.attribute("use").unwrap_or("literal").to_owned(),
        namespace: body.attribute("namespace").map(ToOwned::to_owned),
        parts: body
            .attribute("parts")
            .map(|parts| parts.split_whitespace().map(ToOwned::to_owned).collect()),
    })
}

pub(super) fn parse_operation(
    node: &Element,
    kind: BindingKind,
    binding_style: Option<&str>,
) -> SoapOperation {
    let operation = node.find(namespace(kind), "operation");

    let action = operation
        .and_then(|operation| operation.attribute("soapAction"))
        .map(ToOwned::to_owned);

    let style = operation
        .and_then(|operation| operation.attribute("style"))
        .or(binding_style)
        .unwrap_or("document")
        .to_owned();

    SoapOperation {
        action,
        style,
        input: parse_body(node.find(WSDL_NAMESPACE, "input"), kind),
        output: parse_body(node.find(WSDL_NAMESPACE, "output"), kind),
    }
}

pub(super) fn check_parts(
    operation: &SoapOperation,
    abstract_operation: &Operation,
) -> Result<(), error::Error> {
    let bodies = [
        (&operation.input, abstract_operation.input.as_ref()),
        (&operation.output, abstract_operation.output.as_ref()),
    ];

    for (body, message) in bodies {
        let parts = match body.as_ref().and_then(|body| body.parts.as_ref()) {
            Some(parts) => parts,
            None => continue,
        };

        for part in parts {
            check_part(message, part, abstract_operation)?;
        }
    }

    Ok(())
}
