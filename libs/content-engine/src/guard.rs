use tracing::debug;

use crate::history::{GenerationHistory, SEEN_HASH_WINDOW};

/// Deterministic fingerprint of an exact rendered body.
pub fn fingerprint(body: &str) -> String {
    blake3::hash(body.as_bytes()).to_hex().to_string()
}

/// Rejects bodies whose fingerprint is already in the retained window.
///
/// This only prevents exact-text repeats; it says nothing about
/// near-duplicates or anything evicted from the window.
#[derive(Debug, Clone, Copy)]
pub struct UniquenessGuard {
    window: usize,
}

impl Default for UniquenessGuard {
    fn default() -> Self {
        Self::new(SEEN_HASH_WINDOW)
    }
}

impl UniquenessGuard {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns `false` and leaves the history untouched for a repeat;
    /// otherwise records the fingerprint and returns `true`.
    pub fn check_and_record(&self, history: &mut GenerationHistory, body: &str) -> bool {
        let fp = fingerprint(body);
        if history.contains_fingerprint(&fp) {
            debug!(fingerprint = %fp, "Duplicate content rejected");
            return false;
        }
        history.push_fingerprint(fp, self.window);
        true
    }
}
