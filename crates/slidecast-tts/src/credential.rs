//! API credentials.

use std::fmt;
use std::path::Path;

use crate::error::TtsResult;

/// An opaque API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret. Surrounding whitespace is trimmed; blank input yields `None`.
    pub fn new(secret: impl AsRef<str>) -> Option<Self> {
        let secret = secret.as_ref().trim();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret.to_string()))
        }
    }

    /// The raw secret, for request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short identifier safe for logs: the last four characters.
    pub fn fingerprint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("…{}", tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.fingerprint()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// One credential per non-empty line, in file order.
pub fn parse_credentials(text: &str) -> Vec<Credential> {
    text.lines().filter_map(Credential::new).collect()
}

/// Read a credential file.
pub async fn load_credentials(path: impl AsRef<Path>) -> TtsResult<Vec<Credential>> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    Ok(parse_credentials(&text))
}
