pub mod sampler;
pub mod seed;

pub use sampler::{draw, sample, ValueSet};
pub use seed::{generate_seed, Seed, SeedGenerator};
