// Verification code generation

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_CODE_TTL_SECS: u64 = 3600;
pub const MIN_CODE_TTL_SECS: u64 = 60;
pub const MAX_CODE_TTL_SECS: u64 = 7 * 24 * 3600;

/// A freshly issued verification code and the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues fixed-length numeric codes with a fixed validity window
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    ttl: Duration,
}

impl CodeGenerator {
    /// Windows beyond `MAX_CODE_TTL_SECS` are clamped to it
    pub fn new(length: usize, ttl_secs: u64) -> Self {
        let secs = ttl_secs.min(MAX_CODE_TTL_SECS) as i64;
        Self {
            length,
            ttl: Duration::seconds(secs),
        }
    }

    /// Draw a new code valid from `now` until `now + ttl`
    pub fn generate(&self, now: DateTime<Utc>) -> IssuedCode {
        let mut rng = rand::thread_rng();
        let code = (0..self.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();

        IssuedCode {
            code,
            expires_at: now + self.ttl,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL_SECS)
    }
}
