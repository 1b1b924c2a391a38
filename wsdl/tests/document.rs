mod common;

use common::{definitions, import, loader, message, port_type, url, STOCK_QUOTE};
use rstest::rstest;
use soapgraph_util::{MemoryLoader, QName};
use soapgraph_wsdl::{
    error::Error,
    lookup::Messages,
    types::{BindingKind, OperationProtocol, PartKind},
    Document,
};
use std::rc::Rc;

const STOCK_NS: &str = "http://example.com/stockquote.wsdl";

#[test]
fn test_stock_quote() {
    let loader = loader(&[("stockquote.wsdl", STOCK_QUOTE.to_owned())]);
    let document = Document::load(url("stockquote.wsdl"), &loader).unwrap();

    assert_eq!(loader.loads(), 1);
    assert_eq!(document.registry().len(), 1);
    assert!(document.unresolved().is_empty());

    let service = &document.services()["StockQuoteService"];
    let port = &service.ports["StockQuotePort"];
    assert_eq!(port.address.as_deref(), Some("http://example.com/stockquote"));

    let binding = port.binding.get().unwrap();
    assert!(Rc::ptr_eq(binding, &document.bindings()["StockQuoteSoapBinding"]));
    assert_eq!(binding.kind, BindingKind::Soap11);
    assert_eq!(binding.transport.as_deref(), Some("http://schemas.xmlsoap.org/soap/http"));

    let port_type = binding.port_type.get().unwrap();
    assert!(Rc::ptr_eq(port_type, &document.port_types()["StockQuotePortType"]));

    let operation = &port_type.operations["GetLastTradePrice"];
    let input = operation.input.as_ref().unwrap().get().unwrap();
    assert!(Rc::ptr_eq(input, &document.messages()["GetLastTradePriceInput"]));

    match &input.parts["body"].kind {
        PartKind::Element(element) => {
            let element = element.get().unwrap();
            assert_eq!(
                element.name,
                QName::new(Some("http://example.com/stockquote.xsd"), "TradePriceRequest")
            );
        }
        other => panic!("unexpected part {:?}", other),
    }

    match &binding.operations["GetLastTradePrice"].protocol {
        OperationProtocol::Soap(soap) => {
            assert_eq!(soap.action.as_deref(), Some("http://example.com/GetLastTradePrice"));
            assert_eq!(soap.style, "document");
        }
        other => panic!("unexpected protocol {:?}", other),
    }
}

#[test]
fn test_dump() {
    let loader = loader(&[("stockquote.wsdl", STOCK_QUOTE.to_owned())]);
    let document = Document::load(url("stockquote.wsdl"), &loader).unwrap();
    let dump = document.dump();

    assert!(dump.contains("{http://example.com/stockquote.xsd}TradePrice\n"));
    assert!(dump.contains(&format!("Soap11Binding: {{{}}}StockQuoteSoapBinding", STOCK_NS)));
    assert!(dump.contains("Service: StockQuoteService"));
    assert!(dump.contains("GetLastTradePrice(GetLastTradePriceInput) -> GetLastTradePriceOutput"));
}

#[test]
fn test_resolve_is_idempotent() {
    let loader = loader(&[("stockquote.wsdl", STOCK_QUOTE.to_owned())]);
    let mut document = Document::load(url("stockquote.wsdl"), &loader).unwrap();

    let before = document.dump();
    let binding = document.bindings()["StockQuoteSoapBinding"].clone();

    document.resolve().unwrap();
    document.resolve().unwrap();

    assert_eq!(document.dump(), before);
    assert!(Rc::ptr_eq(
        document.services()["StockQuoteService"].ports["StockQuotePort"]
            .binding
            .get()
            .unwrap(),
        &binding
    ));
    assert!(document.definitions().all(|definition| definition.is_resolved()));
    assert_eq!(loader.loads(), 1);
}

#[test]
fn test_from_reader() {
    let document = Document::from_reader(STOCK_QUOTE.as_bytes(), &MemoryLoader::new()).unwrap();

    assert!(document.location().is_none());
    assert_eq!(document.root().target_namespace(), Some(STOCK_NS));
    assert!(document.services().contains_key("StockQuoteService"));
}

/// Definition `i` imports definition `i + 1`, wrapping around at `length`.
/// Each port type takes the message declared by the next definition.
fn cycle(length: usize) -> MemoryLoader {
    let documents: Vec<(String, String)> = (0..length)
        .map(|index| {
            let next = (index + 1) % length;
            let namespace = format!("urn:d{}", index);
            let next_namespace = format!("urn:d{}", next);

            let body = [
                import(&next_namespace, &format!("d{}.wsdl", next)),
                message(&format!("Message{}", index)),
                port_type(&format!("PortType{}", index), &format!("next:Message{}", next)),
            ]
            .concat();

            (
                format!("d{}.wsdl", index),
                definitions(&namespace, &[("next", next_namespace.as_str())], &body),
            )
        })
        .collect();

    let documents: Vec<(&str, String)> = documents
        .iter()
        .map(|(name, content)| (name.as_str(), content.clone()))
        .collect();
    loader(&documents)
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn test_cyclic_imports(#[case] length: usize) {
    let loader = cycle(length);
    let document = Document::load(url("d0.wsdl"), &loader).unwrap();

    assert_eq!(loader.loads(), length);
    assert_eq!(document.registry().len(), length);
    assert!(document.definitions().all(|definition| definition.is_resolved()));
    assert!(document.unresolved().is_empty());

    for index in 0..length {
        let next = (index + 1) % length;
        let namespace = format!("urn:d{}", index);
        let next_namespace = format!("urn:d{}", next);
        let definition = document.registry().get(Some(namespace.as_str())).unwrap();
        let next_definition = document.registry().get(Some(next_namespace.as_str())).unwrap();

        let operation = &definition.port_types()[&format!("PortType{}", index)].operations["Call"];
        let input = operation.input.as_ref().unwrap().get().unwrap();

        assert!(Rc::ptr_eq(input, &next_definition.messages()[&format!("Message{}", next)]));
    }
}

#[test]
fn test_imports_are_reused() {
    let loader = loader(&[
        (
            "a.wsdl",
            definitions(
                "urn:a",
                &[],
                &[import("urn:b", "b.wsdl"), import("urn:c", "c.wsdl")].concat(),
            ),
        ),
        ("b.wsdl", definitions("urn:b", &[], &import("urn:d", "d.wsdl"))),
        ("c.wsdl", definitions("urn:c", &[], &import("urn:d", "d.wsdl"))),
        ("d.wsdl", definitions("urn:d", &[], &message("Shared"))),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    assert_eq!(loader.loads(), 4);
    assert_eq!(document.registry().len(), 4);

    let registry = document.registry();
    let d = registry.id(Some("urn:d")).unwrap();
    let b = registry.get(Some("urn:b")).unwrap();
    let c = registry.get(Some("urn:c")).unwrap();
    assert_eq!(b.imports()[&Some("urn:d".to_owned())], d);
    assert_eq!(c.imports()[&Some("urn:d".to_owned())], d);
}

#[test]
fn test_imports_are_not_transitive() {
    let documents = |reference: &str| {
        loader(&[
            (
                "a.wsdl",
                definitions(
                    "urn:a",
                    &[("c", "urn:c")],
                    &[import("urn:b", "b.wsdl"), port_type("PortTypeA", reference)].concat(),
                ),
            ),
            ("b.wsdl", definitions("urn:b", &[], &import("urn:c", "c.wsdl"))),
            ("c.wsdl", definitions("urn:c", &[], &message("OnlyC"))),
        ])
    };

    let error = Document::load(url("a.wsdl"), &documents("c:OnlyC")).unwrap_err();
    assert!(matches!(
        error,
        Error::Unresolved { kind: "message", name } if name == QName::new(Some("urn:c"), "OnlyC")
    ));

    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[], &import("urn:b", "b.wsdl"))),
        ("b.wsdl", definitions("urn:b", &[], &import("urn:c", "c.wsdl"))),
        ("c.wsdl", definitions("urn:c", &[], &message("OnlyC"))),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();
    let registry = document.registry();
    let a = registry.id(Some("urn:a")).unwrap();
    let b = registry.id(Some("urn:b")).unwrap();

    assert!(registry.lookup::<Messages>(b, "OnlyC").is_ok());
    assert!(matches!(
        registry.lookup::<Messages>(a, "OnlyC"),
        Err(Error::NotFound { table: "messages", .. })
    ));
}

#[test]
fn test_local_declarations_shadow_imports() {
    let loader = loader(&[
        (
            "a.wsdl",
            definitions(
                "urn:a",
                &[],
                &[
                    import("urn:b", "b.wsdl"),
                    message("Shared"),
                    port_type("PortTypeA", "tns:Shared"),
                ]
                .concat(),
            ),
        ),
        ("b.wsdl", definitions("urn:b", &[], &message("Shared"))),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    let input = document.port_types()["PortTypeA"].operations["Call"]
        .input
        .as_ref()
        .unwrap()
        .get()
        .unwrap();
    assert!(Rc::ptr_eq(input, &document.messages()["Shared"]));
    assert_eq!(input.name.namespace(), Some("urn:a"));
}

#[test]
fn test_unresolved_reference() {
    let loader = loader(&[(
        "a.wsdl",
        definitions("urn:a", &[], &port_type("PortTypeA", "tns:Missing")),
    )]);

    assert!(matches!(
        Document::load(url("a.wsdl"), &loader),
        Err(Error::Unresolved { kind: "message", name }) if name.local_name == "Missing"
    ));
}

#[test]
fn test_unknown_binding_is_skipped() {
    let body = [
        message("Request"),
        port_type("PortTypeA", "tns:Request"),
        r#"<binding name="Custom" type="tns:PortTypeA">
               <operation name="Call"/>
           </binding>
           <binding name="Get" type="tns:PortTypeA">
               <http:binding verb="GET"/>
               <operation name="Call">
                   <http:operation location="/call"/>
                   <input><http:urlEncoded/></input>
               </operation>
           </binding>"#
            .to_owned(),
    ]
    .concat();
    let loader = loader(&[("a.wsdl", definitions("urn:a", &[], &body))]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    assert_eq!(
        document.skipped_bindings().collect::<Vec<_>>(),
        vec![&QName::new(Some("urn:a"), "Custom")]
    );
    assert!(!document.bindings().contains_key("Custom"));
    assert_eq!(document.bindings()["Get"].kind, BindingKind::HttpGet);
}

#[test]
fn test_binding_operation_must_exist() {
    let body = [
        port_type("PortTypeA", "tns:Request"),
        message("Request"),
        r#"<binding name="Soap" type="tns:PortTypeA">
               <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
               <operation name="Other"/>
           </binding>"#
            .to_owned(),
    ]
    .concat();
    let loader = loader(&[("a.wsdl", definitions("urn:a", &[], &body))]);

    assert!(matches!(
        Document::load(url("a.wsdl"), &loader),
        Err(Error::Unresolved { kind: "operation", name }) if name.local_name == "Other"
    ));
}

#[test]
fn test_unsupported_root() {
    let loader = loader(&[
        ("root.xml", "<root/>".to_owned()),
        ("a.wsdl", definitions("urn:a", &[], &import("urn:other", "root.xml"))),
    ]);

    assert!(matches!(
        Document::load(url("root.xml"), &loader),
        Err(Error::UnsupportedRoot { element, .. }) if element.local_name == "root"
    ));
    assert!(matches!(
        Document::load(url("a.wsdl"), &loader),
        Err(Error::UnsupportedRoot { location, .. }) if location == url("root.xml")
    ));
}

#[test]
fn test_missing_import() {
    let loader = loader(&[("a.wsdl", definitions("urn:a", &[], &import("urn:b", "b.wsdl")))]);

    assert!(matches!(
        Document::load(url("a.wsdl"), &loader),
        Err(Error::LoadError(..))
    ));
}

#[test]
fn test_bare_schema_import() {
    let schema = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                    targetNamespace="urn:types">
            <xsd:element name="Item" type="xsd:string"/>
        </xsd:schema>"#;
    let body = [
        import("urn:types", "types.xsd"),
        r#"<message name="Request"><part name="item" element="t:Item"/></message>"#.to_owned(),
    ]
    .concat();
    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[("t", "urn:types")], &body)),
        ("types.xsd", schema.to_owned()),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    assert_eq!(document.registry().len(), 1);
    assert!(document
        .schema()
        .resolve_element(&QName::new(Some("urn:types"), "Item"))
        .is_ok());

    match &document.messages()["Request"].parts["item"].kind {
        PartKind::Element(element) => assert!(element.is_resolved()),
        other => panic!("unexpected part {:?}", other),
    }
}

#[test]
fn test_schema_is_adopted_from_import() {
    let body = [
        import("urn:b", "b.wsdl"),
        r#"<message name="Request"><part name="body" element="b:Payload"/></message>"#.to_owned(),
    ]
    .concat();
    let types = r#"
        <types>
            <xsd:schema targetNamespace="urn:b">
                <xsd:element name="Payload" type="xsd:int"/>
            </xsd:schema>
        </types>"#;
    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[("b", "urn:b")], &body)),
        ("b.wsdl", definitions("urn:b", &[], types)),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    let b = document.registry().get(Some("urn:b")).unwrap();
    assert!(Rc::ptr_eq(document.schema(), b.schema().unwrap()));
    assert!(document.unresolved().is_empty());
}

#[test]
fn test_qualified_reference_selects_namespace() {
    let body = [
        import("urn:b", "b.wsdl"),
        message("Shared"),
        port_type("Imported", "b:Shared"),
        port_type("Local", "tns:Shared"),
    ]
    .concat();
    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[("b", "urn:b")], &body)),
        ("b.wsdl", definitions("urn:b", &[], &message("Shared"))),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();
    let b = document.registry().get(Some("urn:b")).unwrap();

    let input = |port_type: &str| {
        document.port_types()[port_type].operations["Call"]
            .input
            .as_ref()
            .unwrap()
            .get()
            .unwrap()
            .clone()
    };

    let imported = input("Imported");
    assert_eq!(imported.name, QName::new(Some("urn:b"), "Shared"));
    assert!(Rc::ptr_eq(&imported, &b.messages()["Shared"]));

    let local = input("Local");
    assert!(Rc::ptr_eq(&local, &document.messages()["Shared"]));
}

#[test]
fn test_reference_into_unknown_namespace() {
    let body = [message("Request"), port_type("PortTypeA", "x:Request")].concat();
    let loader = loader(&[(
        "a.wsdl",
        definitions("urn:a", &[("x", "urn:nowhere")], &body),
    )]);

    assert!(matches!(
        Document::load(url("a.wsdl"), &loader),
        Err(Error::Unresolved { kind: "message", name })
            if name == QName::new(Some("urn:nowhere"), "Request")
    ));
}

#[test]
fn test_first_non_empty_schema_is_adopted() {
    let types = |namespace: &str, element: &str| {
        format!(
            r#"<types>
                   <xsd:schema targetNamespace="{}">
                       <xsd:element name="{}" type="xsd:string"/>
                   </xsd:schema>
               </types>"#,
            namespace, element
        )
    };
    let body = [
        import("urn:b", "b.wsdl"),
        import("urn:c", "c.wsdl"),
        import("urn:d", "d.wsdl"),
    ]
    .concat();
    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[], &body)),
        (
            "b.wsdl",
            definitions("urn:b", &[], r#"<types><xsd:schema targetNamespace="urn:b"/></types>"#),
        ),
        ("c.wsdl", definitions("urn:c", &[], &types("urn:c", "FromC"))),
        ("d.wsdl", definitions("urn:d", &[], &types("urn:d", "FromD"))),
    ]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();
    let registry = document.registry();

    let b = registry.get(Some("urn:b")).unwrap();
    assert!(b.schema().unwrap().is_empty());

    let c = registry.get(Some("urn:c")).unwrap();
    let d = registry.get(Some("urn:d")).unwrap();
    assert!(Rc::ptr_eq(document.schema(), c.schema().unwrap()));
    assert!(!Rc::ptr_eq(document.schema(), d.schema().unwrap()));
    assert!(Rc::ptr_eq(document.root().schema().unwrap(), c.schema().unwrap()));
}

#[test]
fn test_empty_schema_without_imports() {
    let loader = loader(&[("a.wsdl", definitions("urn:a", &[], &message("Request")))]);
    let document = Document::load(url("a.wsdl"), &loader).unwrap();

    let root = document.root();
    let schema = root.schema().unwrap();
    assert!(schema.is_empty());
    assert_eq!(schema.location(), root.location());
    assert_eq!(schema.location().map(|location| location.as_str()), Some(url("a.wsdl").as_str()));
    assert!(Rc::ptr_eq(document.schema(), schema));
}

/// A imports B and B imports A back; B binds A's port type, whose message
/// links are only bound after B has been resolved.
#[rstest]
#[case("value", true)]
#[case("missing", false)]
fn test_binding_parts_checked_across_cycle(#[case] part: &str, #[case] valid: bool) {
    let a = [
        import("urn:b", "b.wsdl"),
        message("Request"),
        port_type("PortTypeA", "tns:Request"),
    ]
    .concat();
    let b = format!(
        r#"{}
           <binding name="CycleBinding" type="a:PortTypeA">
               <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
               <operation name="Call">
                   <input><soap:body use="literal" parts="{}"/></input>
               </operation>
           </binding>"#,
        import("urn:a", "a.wsdl"),
        part
    );
    let loader = loader(&[
        ("a.wsdl", definitions("urn:a", &[], &a)),
        ("b.wsdl", definitions("urn:b", &[("a", "urn:a")], &b)),
    ]);

    match Document::load(url("a.wsdl"), &loader) {
        Ok(document) => {
            assert!(valid);
            assert!(document.unresolved().is_empty());
        }
        Err(Error::Unresolved { kind: "part", name }) => {
            assert!(!valid);
            assert_eq!(name, QName::new(Some("urn:a"), "Call.missing"));
        }
        Err(other) => panic!("unexpected error {:?}", other),
    }
}
