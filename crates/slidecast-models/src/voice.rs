//! Voice settings shared by every synthesis call of a run.

use serde::Serialize;
use validator::Validate;

use crate::error::{ModelError, ModelResult};

/// Default stability (matches the backend's recommended middle value).
pub const DEFAULT_STABILITY: f32 = 0.5;
/// Default similarity boost.
pub const DEFAULT_SIMILARITY: f32 = 0.5;
/// Default speaking speed (1.0 = natural).
pub const DEFAULT_SPEED: f32 = 1.0;

/// Voice parameters applied identically to every row of a run.
///
/// Construct through [`VoiceSettings::new`] so out-of-range values are
/// rejected before any job is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Validate)]
pub struct VoiceSettings {
    /// Stability in [0, 1]
    #[validate(range(min = 0.0, max = 1.0))]
    stability: f32,

    /// Similarity boost in [0, 1]
    #[validate(range(min = 0.0, max = 1.0))]
    similarity: f32,

    /// Speaking speed in [0.5, 2.0]
    #[validate(range(min = 0.5, max = 2.0))]
    speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: DEFAULT_STABILITY,
            similarity: DEFAULT_SIMILARITY,
            speed: DEFAULT_SPEED,
        }
    }
}

impl VoiceSettings {
    /// Create validated voice settings.
    pub fn new(stability: f32, similarity: f32, speed: f32) -> ModelResult<Self> {
        let settings = Self {
            stability,
            similarity,
            speed,
        };
        // Range checks compare false for NaN, so reject non-finite values first
        if ![stability, similarity, speed].iter().all(|v| v.is_finite()) {
            return Err(ModelError::InvalidVoiceSettings(format!(
                "values must be finite: stability={}, similarity={}, speed={}",
                stability, similarity, speed
            )));
        }
        settings
            .validate()
            .map_err(|e| ModelError::InvalidVoiceSettings(e.to_string()))?;
        Ok(settings)
    }

    pub fn stability(&self) -> f32 {
        self.stability
    }

    pub fn similarity(&self) -> f32 {
        self.similarity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}
