//! Share links: `https://<host>/s/<uuid>[#<key>]`
//!
//! The fragment carries the generated key verbatim. Browsers never send the
//! fragment to the server, so it is the only place the key may travel.
//! Password-protected secrets have no fragment at all.

use crate::error::{GvError, GvResult};
use crate::types::StoredSecretHandle;

const SECRET_PATH: &str = "/s/";

#[derive(Clone, PartialEq, Eq)]
pub struct Locator {
    pub uuid: String,
    /// The literal key, present only for fragment-transport secrets
    pub fragment: Option<String>,
}

impl Locator {
    /// Build the locator for a freshly stored secret.
    ///
    /// `key` is dropped when the handle says the secret is password
    /// protected; that key must be communicated out-of-band.
    pub fn for_handle(handle: &StoredSecretHandle, key: &str) -> Self {
        let fragment = if handle.requires_password || key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        Self {
            uuid: handle.uuid.clone(),
            fragment,
        }
    }

    /// Render the share URL under `public_base` (e.g. `https://ghostvault.app`).
    pub fn to_url(&self, public_base: &str) -> String {
        let base = public_base.trim_end_matches('/');
        match &self.fragment {
            Some(key) => format!("{base}{SECRET_PATH}{}#{key}", self.uuid),
            None => format!("{base}{SECRET_PATH}{}", self.uuid),
        }
    }

    /// Shorthand for `for_handle(handle, key).to_url(public_base)`.
    pub fn share_url(public_base: &str, handle: &StoredSecretHandle, key: &str) -> String {
        Self::for_handle(handle, key).to_url(public_base)
    }

    /// Parse a share URL. The fragment is taken as-is, without percent-decoding.
    pub fn parse(url: &str) -> GvResult<Self> {
        let (address, fragment) = match url.split_once('#') {
            Some((address, fragment)) => (address, Some(fragment)),
            None => (url, None),
        };

        let start = address
            .rfind(SECRET_PATH)
            .ok_or_else(|| GvError::MalformedLink(format!("no {SECRET_PATH} segment")))?;
        let uuid = address[start + SECRET_PATH.len()..]
            .split(['/', '?'])
            .next()
            .unwrap_or_default();

        if uuid.is_empty() {
            return Err(GvError::MalformedLink("missing secret id".into()));
        }

        Ok(Self {
            uuid: uuid.to_string(),
            fragment: fragment.filter(|f| !f.is_empty()).map(str::to_string),
        })
    }
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("uuid", &self.uuid)
            .field("fragment", &self.fragment.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn handle(requires_password: bool) -> StoredSecretHandle {
        StoredSecretHandle {
            uuid: "abc-123".into(),
            requires_password,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_fragment_only_without_password() {
        let open = Locator::for_handle(&handle(false), "K3y!@$^&*");
        assert_eq!(
            open.to_url("https://ghostvault.app/"),
            "https://ghostvault.app/s/abc-123#K3y!@$^&*"
        );

        let locked = Locator::for_handle(&handle(true), "hunter22");
        assert_eq!(
            locked.to_url("https://ghostvault.app"),
            "https://ghostvault.app/s/abc-123"
        );
    }

    #[test]
    fn test_share_url_trims_base() {
        assert_eq!(
            Locator::share_url("https://ghostvault.app/", &handle(false), "k"),
            Locator::for_handle(&handle(false), "k").to_url("https://ghostvault.app")
        );
        assert!(!Locator::share_url("https://x", &handle(true), "pw").contains('#'));
    }

    #[test]
    fn test_parse_keeps_fragment_verbatim() {
        let loc = Locator::parse("https://ghostvault.app/s/abc-123#a%20b^&*").unwrap();
        assert_eq!(loc.uuid, "abc-123");
        assert_eq!(loc.fragment.as_deref(), Some("a%20b^&*"));
    }

    #[test]
    fn test_parse_empty_fragment_is_absent() {
        let loc = Locator::parse("https://ghostvault.app/s/abc-123#").unwrap();
        assert_eq!(loc.fragment, None);

        let loc = Locator::parse("https://ghostvault.app/s/abc-123").unwrap();
        assert_eq!(loc.fragment, None);
    }

    #[test]
    fn test_parse_ignores_query_and_trailing_slash() {
        let loc = Locator::parse("https://h/s/abc-123/?ref=mail#k").unwrap();
        assert_eq!(loc.uuid, "abc-123");
        assert_eq!(loc.fragment.as_deref(), Some("k"));
    }

    #[test]
    fn test_parse_rejects_missing_uuid() {
        assert!(Locator::parse("https://ghostvault.app/").is_err());
        assert!(Locator::parse("https://ghostvault.app/s/#key").is_err());
    }

    #[test]
    fn test_roundtrip_through_url() {
        let loc = Locator::for_handle(&handle(false), "Zx9!Zx9!Zx9!Zx9!");
        let parsed = Locator::parse(&loc.to_url("https://ghostvault.app")).unwrap();
        assert_eq!(parsed, loc);
    }

    #[test]
    fn test_debug_redacts_key() {
        let loc = Locator::for_handle(&handle(false), "supersecretkey");
        assert!(!format!("{loc:?}").contains("supersecretkey"));
    }
}
