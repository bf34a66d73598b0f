use crate::username_token::UsernameToken;

pub const DIGEST_PLACEHOLDER: &str = "DIGEST_PLACEHOLDER";
pub const NONCE_PLACEHOLDER: &str = "NONCE_PLACEHOLDER";
pub const TIMESTAMP_PLACEHOLDER: &str = "TIMESTAMP_PLACEHOLDER";

/// Substitutes a token's computed values into a pre-authored envelope
/// template. Plain literal replacement: every occurrence of each
/// placeholder is replaced, and the template is not parsed or validated
/// as XML.
pub fn fill_template(template: &str, token: &UsernameToken) -> String {
    template
        .replace(DIGEST_PLACEHOLDER, &token.digest)
        .replace(NONCE_PLACEHOLDER, &token.nonce)
        .replace(TIMESTAMP_PLACEHOLDER, &token.created)
}
