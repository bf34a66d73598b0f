//! WS-Security UsernameToken authentication for exercising an ONVIF
//! device service: digest computation, SOAP envelope rendering, and
//! placeholder substitution for pre-authored envelope templates.

pub mod envelope;
pub mod template;
pub mod username_token;

pub use username_token::UsernameToken;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsseError {
    /// A field expected to carry base64 text failed to decode.
    #[error("invalid base64 encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
}
