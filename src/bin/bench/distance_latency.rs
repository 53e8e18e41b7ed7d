use super::options::BenchOptions;
use super::stats::{self, LatencySummary};
use matchmill::distance;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

const PAIR_COUNT: usize = 16;

#[derive(Clone, Debug, Serialize)]
pub(super) struct DistanceBenchResult {
    pub(super) string_len: usize,
    pub(super) pairs: usize,
    pub(super) latency: LatencySummary,
}

pub(super) fn run(options: &BenchOptions) -> Result<DistanceBenchResult, String> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let pairs = seed_pairs(&mut rng, options.distance_string_len);
    let mut next = 0usize;
    let latency = stats::measure_latency(options.warmup_iters, options.measure_iters, || {
        let (first, second) = &pairs[next % pairs.len()];
        next += 1;
        let result = distance::edit_distance(first, second);
        let max_len = first.chars().count().max(second.chars().count());
        if result.distance > max_len {
            return Err(format!(
                "Edit distance {} exceeds longest input length {max_len}",
                result.distance
            ));
        }
        Ok(())
    })?;
    Ok(DistanceBenchResult {
        string_len: options.distance_string_len,
        pairs: pairs.len(),
        latency,
    })
}

fn seed_pairs(rng: &mut StdRng, string_len: usize) -> Vec<(String, String)> {
    (0..PAIR_COUNT)
        .map(|_| (random_word(rng, string_len), random_word(rng, string_len)))
        .collect()
}

fn random_word(rng: &mut StdRng, len: usize) -> String {
    (0..len.max(1))
        .map(|_| {
            let offset: u8 = rng.random_range(0..26);
            (b'a' + offset) as char
        })
        .collect()
}
