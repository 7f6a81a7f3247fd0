use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;

/// Opaque 64-bit value used to initialize one sampling stream.
pub type Seed = u64;

/// Source of secure random bytes mixed into every seed.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error>;
}

/// The operating system CSPRNG.
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(buf)
    }
}

/// Mixes a nanosecond timestamp with 8 bytes of secure entropy.
///
/// Layout: `timestamp_ns XOR u64::from_le_bytes(entropy[0..8])`.
///
/// If the entropy source fails the timestamp is returned on its own. Seed
/// quality degrades but the caller never sees an error.
pub struct SeedGenerator {
    entropy: Box<dyn EntropySource>,
}

impl SeedGenerator {
    pub fn new(entropy: Box<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    pub fn generate(&self) -> Seed {
        let now_ns = current_ns();

        let mut bytes = [0u8; 8];
        match self.entropy.fill(&mut bytes) {
            Ok(()) => now_ns ^ u64::from_le_bytes(bytes),
            Err(err) => {
                tracing::warn!(%err, "secure entropy unavailable, seeding from clock only");
                now_ns
            }
        }
    }
}

impl Default for SeedGenerator {
    fn default() -> Self {
        Self::new(Box::new(OsEntropy))
    }
}

/// Generate a seed from the system clock and the OS CSPRNG.
pub fn generate_seed() -> Seed {
    SeedGenerator::default().generate()
}

fn current_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
