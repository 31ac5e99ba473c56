use super::rates::DirectionRates;
use rand::Rng;

/// The outcome of classifying one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Pass,
    Drop,
    Delay,
    Corrupt,
}

/// Classify one packet for a direction whose rates have already been
/// snapshotted. Draws a single `r` in `[0, 99]` and evaluates the thresholds
/// in a fixed order: drop, then delay, then corruption, then pass. Overlap
/// (the three rates summing past 100) is resolved implicitly — later
/// branches simply become unreachable once the running total exceeds 100,
/// never by clamping the inputs.
pub fn classify(rates: DirectionRates, rng: &mut impl Rng) -> Classification {
    let r: u32 = rng.random_range(0..100);
    let drop = rates.drop as u32;
    let delay = rates.delay as u32;
    let corruption = rates.corruption as u32;

    if r < drop {
        Classification::Drop
    } else if r < drop + delay {
        Classification::Delay
    } else if r < drop + delay + corruption {
        Classification::Corrupt
    } else {
        Classification::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rates(drop: u8, delay: u8, corruption: u8) -> DirectionRates {
        DirectionRates { drop, delay, corruption }
    }

    #[test]
    fn all_zero_always_passes() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert_eq!(classify(rates(0, 0, 0), &mut rng), Classification::Pass);
        }
    }

    #[test]
    fn full_drop_always_drops() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..1000 {
            assert_eq!(classify(rates(100, 0, 0), &mut rng), Classification::Drop);
        }
    }

    #[test]
    fn drop_rate_converges_over_many_draws() {
        let mut rng = SmallRng::seed_from_u64(42);
        for p in [0u8, 10, 50, 90, 100] {
            let mut drops = 0u32;
            const N: u32 = 10_000;
            for _ in 0..N {
                if classify(rates(p, 0, 0), &mut rng) == Classification::Drop {
                    drops += 1;
                }
            }
            let observed = drops as f64 / N as f64;
            let expected = p as f64 / 100.0;
            assert!(
                (observed - expected).abs() <= 0.02,
                "p={p}: observed={observed}, expected={expected}"
            );
        }
    }

    #[test]
    fn overlap_past_100_clamps_pass_to_unreachable() {
        // drop=60, delay=60 sums past 100: pass should never occur.
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_ne!(classify(rates(60, 60, 0), &mut rng), Classification::Pass);
        }
    }

    #[test]
    fn ordering_prefers_drop_over_delay_over_corrupt() {
        // With drop=100 nothing else can ever be selected regardless of the
        // other rates, by construction of the threshold order.
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            assert_eq!(classify(rates(100, 100, 100), &mut rng), Classification::Drop);
        }
    }
}
