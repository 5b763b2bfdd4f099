//! Base64 data URIs (RFC 2397) for attachment content
//!
//! An attachment's MIME type and bytes are packed into one string,
//! `data:<mime>;base64,<payload>`, which is what the Field Cipher encrypts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

const DEFAULT_MIME: &str = "application/octet-stream";

/// A decoded data URI. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataUri")
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.trim().is_empty() {
        DEFAULT_MIME
    } else {
        mime.trim()
    };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Parse a base64 data URI. Anything else (plain-text URIs, bad base64)
/// is `None`.
pub fn decode_data_uri(uri: &str) -> Option<DataUri> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;

    // Drop parameters such as ";charset=utf-8"
    let mime = media_type.split(';').next().unwrap_or_default().trim();
    let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some(DataUri {
        mime: mime.to_string(),
        bytes,
    })
}
