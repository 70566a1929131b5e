//! Hash-based ID generation for dependency records.
//!
//! IDs have the form `dep-{hash}` where the hash is SHA-256 over the edge's
//! endpoints, type, a timestamp and a nonce, base36-encoded. The hash length
//! grows with the number of stored records so collisions stay rare.
//!
//! # Example
//!
//! ```
//! use skein::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "dep".to_string(),
//!     database_size: 0,
//! });
//!
//! let id = generator.generate("proj-a", "proj-b", "blocks").unwrap();
//! assert!(id.starts_with("dep-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of every generated dependency ID.
pub const DEPENDENCY_ID_PREFIX: &str = "dep";

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_LENGTH: usize = 8;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce collided, even after widening the hash
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Requested hash length was zero
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all IDs (normally [`DEPENDENCY_ID_PREFIX`])
    pub prefix: String,

    /// Number of records already stored (drives adaptive length)
    pub database_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// Keeps every ID it has produced or been told about, so a generator should
/// live as long as the store it serves.
#[derive(Debug)]
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    #[must_use]
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// Forget an ID, e.g. after its record was deleted
    pub fn unregister_id(&mut self, id: &str) {
        self.existing_ids.remove(id);
    }

    /// Current record count used for length selection
    #[must_use]
    pub fn database_size(&self) -> usize {
        self.config.database_size
    }

    /// Update the record count used for length selection
    pub fn set_database_size(&mut self, size: usize) {
        self.config.database_size = size;
    }

    /// Generate a new unique ID for an edge.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no unique ID could
    /// be produced at the adaptive length or one character longer.
    pub fn generate(
        &mut self,
        source: &str,
        target: &str,
        dep_type: &str,
    ) -> Result<String, IdGenerationError> {
        let id_length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(source, target, dep_type, nonce, id_length)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, id_length, "Generated unique ID after collision retries");
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        if id_length < MAX_LENGTH {
            warn!(
                id_length,
                max_nonce = MAX_NONCE,
                "All nonces exhausted, increasing ID length"
            );
            for nonce in 0..MAX_NONCE {
                let id = self.generate_hash_id(source, target, dep_type, nonce, id_length + 1)?;
                if !self.existing_ids.contains(&id) {
                    self.existing_ids.insert(id.clone());
                    return Ok(id);
                }
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn generate_hash_id(
        &self,
        source: &str,
        target: &str,
        dep_type: &str,
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{source}|{target}|{dep_type}|{timestamp}|{nonce}");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], length)?;
        Ok(format!("{}-{}", self.config.prefix, hash_str))
    }

    /// - 0-500 records: 6 chars
    /// - 501-1,500: 7 chars
    /// - 1,500+: 8 chars
    fn adaptive_length(&self) -> usize {
        match self.config.database_size {
            0..=500 => 6,
            501..=1500 => 7,
            _ => 8,
        }
    }
}

/// Encode up to 8 bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n: u64 = 0;
    for &byte in bytes {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        // Remainder is always < 36.
        #[allow(clippy::cast_possible_truncation)]
        let remainder = (n % 36) as usize;
        result.push(char::from(BASE36_CHARS[remainder]));
        n /= 36;
    }

    Ok(result.into_iter().rev().collect())
}

/// Whether `id` looks like `{prefix}-{hash}` with a 6-8 char base36 hash.
#[must_use]
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    (6..=MAX_LENGTH).contains(&hash.len())
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
