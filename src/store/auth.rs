//! Master-key request signing for the Cosmos DB REST API

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::ConnectionError;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_TYPE: &str = "master";
pub const TOKEN_VERSION: &str = "1.0";

/// Decoded account key, ready to sign requests
#[derive(Clone)]
pub struct MasterKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

impl MasterKey {
    pub fn parse(encoded: &str) -> Result<Self, ConnectionError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(ConnectionError::InvalidCredential("key is empty".to_string()));
        }

        let key = STANDARD
            .decode(encoded)
            .map_err(|e| ConnectionError::InvalidCredential(format!("key is not base64: {}", e)))?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| ConnectionError::InvalidCredential(e.to_string()))?;

        Ok(Self { mac })
    }

    /// Base64 HMAC over `verb\nresource_type\nresource_link\ndate\n\n`
    pub fn signature(&self, verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// URL-encoded value for the `authorization` header
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        let token = format!(
            "type={}&ver={}&sig={}",
            TOKEN_TYPE,
            TOKEN_VERSION,
            self.signature(verb, resource_type, resource_link, date)
        );
        urlencoding::encode(&token).into_owned()
    }
}

/// Current time in the RFC 1123 form the `x-ms-date` header expects
pub fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
