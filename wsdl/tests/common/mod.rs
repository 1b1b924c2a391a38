#![allow(dead_code)]

use soapgraph_util::MemoryLoader;

pub const BASE: &str = "http://example.com/";

pub const STOCK_QUOTE: &str = r#"
<definitions name="StockQuote"
             targetNamespace="http://example.com/stockquote.wsdl"
             xmlns:tns="http://example.com/stockquote.wsdl"
             xmlns:xsd1="http://example.com/stockquote.xsd"
             xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
             xmlns="http://schemas.xmlsoap.org/wsdl/">
    <types>
        <schema targetNamespace="http://example.com/stockquote.xsd"
                xmlns="http://www.w3.org/2001/XMLSchema">
            <element name="TradePriceRequest">
                <complexType>
                    <all>
                        <element name="tickerSymbol" type="string"/>
                    </all>
                </complexType>
            </element>
            <element name="TradePrice">
                <complexType>
                    <all>
                        <element name="price" type="float"/>
                    </all>
                </complexType>
            </element>
        </schema>
    </types>

    <message name="GetLastTradePriceInput">
        <part name="body" element="xsd1:TradePriceRequest"/>
    </message>
    <message name="GetLastTradePriceOutput">
        <part name="body" element="xsd1:TradePrice"/>
    </message>

    <portType name="StockQuotePortType">
        <operation name="GetLastTradePrice">
            <input message="tns:GetLastTradePriceInput"/>
            <output message="tns:GetLastTradePriceOutput"/>
        </operation>
    </portType>

    <binding name="StockQuoteSoapBinding" type="tns:StockQuotePortType">
        <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <operation name="GetLastTradePrice">
            <soap:operation soapAction="http://example.com/GetLastTradePrice"/>
            <input><soap:body use="literal"/></input>
            <output><soap:body use="literal"/></output>
        </operation>
    </binding>

    <service name="StockQuoteService">
        <documentation>My first service</documentation>
        <port name="StockQuotePort" binding="tns:StockQuoteSoapBinding">
            <soap:address location="http://example.com/stockquote"/>
        </port>
    </service>
</definitions>
"#;

/// Absolute URL of a fixture file.
pub fn url(name: &str) -> String {
    format!("{}{}", BASE, name)
}

/// A `wsdl:definitions` document for `namespace`. Every `(prefix, namespace)`
/// pair in `prefixes` is declared on the root element.
pub fn definitions(namespace: &str, prefixes: &[(&str, &str)], body: &str) -> String {
    let declarations: String = prefixes
        .iter()
        .map(|(prefix, namespace)| format!(r#" xmlns:{}="{}""#, prefix, namespace))
        .collect();

    format!(
        r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
                        xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                        xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"
                        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                        xmlns:tns="{0}"{1}
                        targetNamespace="{0}">{2}</definitions>"#,
        namespace, declarations, body
    )
}

pub fn import(namespace: &str, location: &str) -> String {
    format!(
        r#"<import namespace="{}" location="{}"/>"#,
        namespace, location
    )
}

pub fn message(name: &str) -> String {
    format!(
        r#"<message name="{}"><part name="value" type="xsd:string"/></message>"#,
        name
    )
}

/// A port type with one operation taking `input` as its input message.
pub fn port_type(name: &str, input: &str) -> String {
    format!(
        r#"<portType name="{}">
               <operation name="Call"><input message="{}"/></operation>
           </portType>"#,
        name, input
    )
}

pub fn loader(documents: &[(&str, String)]) -> MemoryLoader {
    documents
        .iter()
        .fold(MemoryLoader::new(), |loader, (name, content)| {
            loader.with(&url(name), content.as_str()).unwrap()
        })
}
