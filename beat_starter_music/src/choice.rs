// Seeded randomness helpers shared by every engine.
//
// Each generator owns its own `StdRng`, built from an optional seed. With a
// seed the stream is reproducible; without one it is drawn from the OS. No
// engine touches a process-wide generator.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Build a generator from an optional seed.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Pick a value from a `(value, weight)` table with probability proportional
/// to its weight.
///
/// Panics if `table` is empty. All callers pass fixed, non-empty tables.
pub(crate) fn pick_weighted<T: Copy>(table: &[(T, f64)], rng: &mut impl Rng) -> T {
    let total: f64 = table.iter().map(|&(_, w)| w).sum();
    let r = rng.random::<f64>() * total;
    let mut cum = 0.0;
    for &(value, weight) in table {
        cum += weight;
        if cum > r {
            return value;
        }
    }
    table[table.len() - 1].0
}
