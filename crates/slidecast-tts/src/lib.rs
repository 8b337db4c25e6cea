//! Speech synthesis for SlideCast.
//!
//! This crate provides:
//! - An ElevenLabs-compatible HTTP client behind the [`SpeechSynthesizer`] trait
//! - Shared-cursor credential rotation across concurrent jobs
//! - A remaining-quota estimate over a credential list

pub mod client;
pub mod credential;
pub mod error;
pub mod quota;
pub mod rotator;

pub use client::{ElevenLabsClient, SpeechSynthesizer, Subscription, TtsConfig};
pub use credential::{load_credentials, parse_credentials, Credential};
pub use error::{TtsError, TtsResult};
pub use quota::{estimate_quota, QuotaEstimate, CHARS_PER_MINUTE};
pub use rotator::{synthesize_with_rotation, CredentialRotator, Lease, Synthesis};
