//! Composition of the `xsd:schema` fragments embedded in one `wsdl:types`.
//!
//! Fragments may import each other by namespace alone, which only makes sense
//! inside the WSDL document that holds them. Each fragment is therefore
//! registered in the parser context under a synthetic location, and a
//! container schema imports all of them by that location.

use soapgraph_util::{xml::XSD_NAMESPACE, Element, Loader, QName};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::{
    error,
    schema::{ParserContext, Schema},
};

pub fn stitch(
    fragments: &[&Element],
    context: &mut ParserContext,
    loader: &dyn Loader,
    location: Option<&Url>,
) -> Result<Option<Schema>, error::Error> {
    match fragments {
        [] => Ok(None),
        [fragment] => Schema::from_fragment(Some(*fragment), context, loader, location).map(Some),
        fragments => {
            let container = compose(fragments, context, location);
            Schema::from_fragment(Some(&container), context, loader, location).map(Some)
        }
    }
}

/// Registers every fragment in `context` and returns the container schema
/// importing them.
fn compose(fragments: &[&Element], context: &mut ParserContext, location: Option<&Url>) -> Element {
    let tokens: Vec<String> = (0..fragments.len()).map(|index| context.token(index)).collect();
    let namespace_tokens: HashMap<Option<String>, String> = fragments
        .iter()
        .zip(&tokens)
        .map(|(fragment, token)| {
            (
                fragment.attribute("targetNamespace").map(ToOwned::to_owned),
                token.clone(),
            )
        })
        .collect();

    debug!(fragments = fragments.len(), "stitching schema fragments");

    let mut container = Element::new(QName::new(Some(XSD_NAMESPACE), "schema"));

    for (fragment, token) in fragments.iter().zip(tokens) {
        let mut directive = Element::new(QName::new(Some(XSD_NAMESPACE), "import"));
        directive.set_attribute("schemaLocation", &token);
        if let Some(namespace) = fragment.attribute("targetNamespace") {
            directive.set_attribute("namespace", namespace);
        }
        container.push(directive);

        let mut copy = (*fragment).clone();

        for import in copy
            .children_mut()
            .filter(|child| child.is(XSD_NAMESPACE, "import"))
        {
            let has_location = import
                .attribute("schemaLocation")
                .map_or(false, |location| !location.is_empty());

            if !has_location {
                let namespace = import.attribute("namespace").map(ToOwned::to_owned);
                if let Some(target) = namespace_tokens.get(&namespace) {
                    import.set_attribute("schemaLocation", target);
                }
            }

            container.push(import.clone());
        }

        context.add(token, copy, location.cloned());
    }

    container
}
