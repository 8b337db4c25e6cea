//! Shared-cursor credential rotation.
//!
//! All row jobs of a run share one ordered credential list and a single
//! cursor. A job uses the credential under the cursor; when that call
//! fails it reports the position back and the cursor moves past it. A
//! credential that has been passed is never used again in the run.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

use slidecast_models::VoiceSettings;

use crate::client::SpeechSynthesizer;
use crate::credential::Credential;
use crate::error::{TtsError, TtsResult};

/// A credential handed out at a given cursor position.
#[derive(Debug, Clone, Copy)]
pub struct Lease<'a> {
    position: usize,
    credential: &'a Credential,
}

impl<'a> Lease<'a> {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn credential(&self) -> &'a Credential {
        self.credential
    }
}

/// Ordered credentials plus the shared cursor.
#[derive(Debug)]
pub struct CredentialRotator {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialRotator {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Credential under the cursor, or `None` once every credential is spent.
    pub fn acquire(&self) -> Option<Lease<'_>> {
        let position = self.cursor.load(Ordering::Acquire);
        self.credentials.get(position).map(|credential| Lease {
            position,
            credential,
        })
    }

    /// Report that the credential at `position` failed.
    ///
    /// Advances the cursor by one only if it still points at `position`,
    /// so concurrent failures of the same credential advance it once.
    /// Returns whether this call moved the cursor.
    pub fn report_failure(&self, position: usize) -> bool {
        let advanced = self
            .cursor
            .compare_exchange(position, position + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if advanced {
            metrics::counter!("slidecast_credential_rotations_total").increment(1);
            match self.credentials.get(position + 1) {
                Some(next) => info!(
                    from = position,
                    to = position + 1,
                    credential = %next,
                    "Rotated to next credential"
                ),
                None => warn!(
                    spent = self.credentials.len(),
                    "All credentials exhausted"
                ),
            }
        }

        advanced
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor() >= self.credentials.len()
    }
}

/// Audio produced by a rotated synthesis call.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub audio: Vec<u8>,
    /// Cursor position of the credential that succeeded
    pub credential_index: usize,
    /// Backend calls made, including the successful one
    pub attempts: usize,
}

/// Synthesize `text`, moving through credentials until one succeeds.
///
/// Returns [`TtsError::Exhausted`] once the cursor has passed the last
/// credential; in that state no request is sent at all.
pub async fn synthesize_with_rotation(
    synthesizer: &dyn SpeechSynthesizer,
    rotator: &CredentialRotator,
    text: &str,
    settings: &VoiceSettings,
) -> TtsResult<Synthesis> {
    let mut attempts = 0;
    let mut last_error: Option<String> = None;

    loop {
        let Some(lease) = rotator.acquire() else {
            return Err(TtsError::Exhausted {
                attempts,
                last_error,
            });
        };

        attempts += 1;
        match synthesizer
            .synthesize(text, lease.credential(), settings)
            .await
        {
            Ok(audio) => {
                return Ok(Synthesis {
                    audio,
                    credential_index: lease.position(),
                    attempts,
                })
            }
            Err(e) if !e.is_credential_failure() => return Err(e),
            Err(e) => {
                warn!(
                    position = lease.position(),
                    credential = %lease.credential(),
                    error = %e,
                    "Synthesis failed"
                );
                rotator.report_failure(lease.position());
                last_error = Some(e.to_string());
            }
        }
    }
}
