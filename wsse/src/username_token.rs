use crate::WsseError;
use rand::RngCore;

/// This implements the Username token profile described in ONVIF Core Spec 5.9.4
/// which is based on [WS-UsernameToken]: https://docs.oasis-open.org/wss/v1.1/wss-v1.1-spec-pr-UsernameTokenProfile-01.htm
///
/// `nonce` carries the base64 text sent on the wire; the digest is computed
/// over the decoded nonce bytes. `created` holds the exact string that was
/// hashed, so placing it verbatim into the outgoing envelope keeps the
/// digest verifiable by the device.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    pub username: String,
    pub nonce: String,
    pub digest: String,
    pub created: String,
}

impl UsernameToken {
    /// Builds a token with a fresh random nonce and the current UTC instant.
    pub fn new(username: &str, password: &str) -> UsernameToken {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self::from_raw_nonce(username, password, &nonce, &Self::generate_created())
    }

    /// Builds a token from explicit nonce and creation time, for callers that
    /// need reproducible output. The nonce must be base64 text; `created` is
    /// used as-is for both hashing and the resulting token.
    pub fn generate_token(
        username: &str,
        password: &str,
        nonce: &str,
        created: &str,
    ) -> Result<UsernameToken, WsseError> {
        let nonce_bytes = base64::decode(nonce)?;
        Ok(Self::from_raw_nonce(
            username, password, &nonce_bytes, created,
        ))
    }

    /// A fresh 16-byte random nonce, base64 encoded.
    pub fn generate_nonce() -> String {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        base64::encode(nonce)
    }

    /// The current UTC instant in the second-precision form devices accept
    /// (`YYYY-MM-DDTHH:MM:SSZ`).
    pub fn generate_created() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    // PasswordDigest = Base64(SHA1(nonce bytes + created + password)),
    // in that byte order.
    fn from_raw_nonce(
        username: &str,
        password: &str,
        nonce: &[u8],
        created: &str,
    ) -> UsernameToken {
        let digest = {
            let mut hasher = sha1::Sha1::new();
            hasher.update(nonce);
            hasher.update(created.as_bytes());
            hasher.update(password.as_bytes());
            hasher.digest().bytes()
        };

        UsernameToken {
            username: username.to_string(),
            nonce: base64::encode(nonce),
            digest: base64::encode(digest),
            created: created.to_string(),
        }
    }
}
