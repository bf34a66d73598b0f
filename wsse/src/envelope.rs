use crate::username_token::UsernameToken;
use log::trace;

pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const DEVICE_WSDL_NS: &str = "http://www.onvif.org/ver10/device/wsdl";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
pub const PASSWORD_DIGEST_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
pub const BASE64_BINARY_ENCODING: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Renders the `wsse:Security` block for a token, for embedding into an
/// envelope that binds the `SOAP-ENV` prefix.
pub fn security_header(token: &UsernameToken) -> String {
    format!(
        r#"<wsse:Security SOAP-ENV:mustUnderstand="true" xmlns:wsse="{wsse}" xmlns:wsu="{wsu}">
            <wsse:UsernameToken wsu:Id="UsernameToken-1">
                <wsse:Username>{username}</wsse:Username>
                <wsse:Password Type="{digest_type}">{digest}</wsse:Password>
                <wsse:Nonce EncodingType="{nonce_encoding}">{nonce}</wsse:Nonce>
                <wsu:Created>{created}</wsu:Created>
            </wsse:UsernameToken>
        </wsse:Security>"#,
        wsse = WSSE_NS,
        wsu = WSU_NS,
        username = xml_escape(&token.username),
        digest_type = PASSWORD_DIGEST_TYPE,
        digest = xml_escape(&token.digest),
        nonce_encoding = BASE64_BINARY_ENCODING,
        nonce = xml_escape(&token.nonce),
        created = xml_escape(&token.created),
    )
}

/// Renders a complete SOAP 1.2 envelope invoking `operation` in the device
/// service namespace, authenticated with the given token. Arguments become
/// child elements of the operation in the order supplied, so rendering is
/// deterministic for identical inputs.
pub fn build_envelope(token: &UsernameToken, operation: &str, args: &[(&str, &str)]) -> String {
    trace!(
        "build_envelope - rendering {} for user {}",
        operation,
        token.username
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="{soap}" xmlns:tds="{tds}">
    <SOAP-ENV:Header>
        {security}
    </SOAP-ENV:Header>
    <SOAP-ENV:Body>
        {body}
    </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
        soap = SOAP_ENVELOPE_NS,
        tds = DEVICE_WSDL_NS,
        security = security_header(token),
        body = operation_element(operation, args),
    )
}

fn operation_element(operation: &str, args: &[(&str, &str)]) -> String {
    if args.is_empty() {
        return format!("<tds:{}/>", operation);
    }
    let children = args
        .iter()
        .map(|(name, value)| format!("            <tds:{0}>{1}</tds:{0}>", name, xml_escape(value)))
        .collect::<Vec<String>>()
        .join("\n");
    format!("<tds:{0}>\n{1}\n        </tds:{0}>", operation, children)
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
