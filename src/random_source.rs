
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Builds the crate's default random source
///
/// `Pcg64` is a fast non-cryptographic generator, which is all the samplers need.  With a
/// seed the stream is repeatable; without one the generator is seeded from the wall clock.
/// The samplers accept any [rand::Rng], so this is only a convenience.
pub fn random_source(seed: Option<u64>) -> Pcg64 {
    let seed = seed.unwrap_or_else(wall_clock_seed);
    debug!("random_source: seed = {}", seed);
    Pcg64::seed_from_u64(seed)
}

fn wall_clock_seed() -> u64 {
    //A clock set before 1970 still yields a usable seed
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_nanos() as u64,
        Err(err) => err.duration().as_nanos() as u64,
    }
}
