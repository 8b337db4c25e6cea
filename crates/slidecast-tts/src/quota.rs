//! Remaining-character estimate across all credentials.
//!
//! Informational only: a run never consults it.

use serde::Serialize;
use tracing::warn;

use crate::client::ElevenLabsClient;
use crate::credential::Credential;

/// Characters of narration per minute of audio, as a rough average.
pub const CHARS_PER_MINUTE: u64 = 10_000;

/// Remaining quota of one credential.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialQuota {
    pub position: usize,
    pub fingerprint: String,
    /// `None` when the query for this credential failed
    pub remaining: Option<u64>,
}

/// Aggregate quota over a credential list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuotaEstimate {
    pub credentials: Vec<CredentialQuota>,
}

impl QuotaEstimate {
    /// Sum of remaining characters over credentials that answered.
    pub fn total_remaining(&self) -> u64 {
        self.credentials.iter().filter_map(|c| c.remaining).sum()
    }

    /// Estimated minutes of narration left.
    pub fn estimated_minutes(&self) -> f64 {
        self.total_remaining() as f64 / CHARS_PER_MINUTE as f64
    }

    pub fn failed_count(&self) -> usize {
        self.credentials.iter().filter(|c| c.remaining.is_none()).count()
    }
}

/// Query each credential in order; failures are logged and skipped.
pub async fn estimate_quota(client: &ElevenLabsClient, credentials: &[Credential]) -> QuotaEstimate {
    let mut estimate = QuotaEstimate::default();

    for (position, credential) in credentials.iter().enumerate() {
        let remaining = match client.subscription(credential).await {
            Ok(sub) => Some(sub.remaining()),
            Err(e) => {
                warn!(position, credential = %credential, error = %e, "Quota query failed");
                None
            }
        };

        estimate.credentials.push(CredentialQuota {
            position,
            fingerprint: credential.fingerprint(),
            remaining,
        });
    }

    estimate
}
