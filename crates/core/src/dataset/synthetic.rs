//! Synthetic customers spread evenly over five frequency bands.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::rfm::CustomerMetrics;

pub const BAND_COUNT: u32 = 5;
pub const CUSTOMERS_PER_BAND: u32 = 30;
/// Width of each frequency band: band `b` covers `10(b-1)+1 ..= 10b`.
pub const BAND_WIDTH: u32 = 10;
pub const MONETARY_RANGE: std::ops::RangeInclusive<u32> = 1_000..=9_999;
pub const RECENCY_RANGE: std::ops::RangeInclusive<u32> = 1..=350;

pub fn generate_seeded(seed: u64) -> Vec<CustomerMetrics> {
    generate(&mut StdRng::seed_from_u64(seed))
}

pub fn generate<R: Rng>(rng: &mut R) -> Vec<CustomerMetrics> {
    let mut records = Vec::with_capacity((BAND_COUNT * CUSTOMERS_PER_BAND) as usize);

    for band in 1..=BAND_COUNT {
        let low = BAND_WIDTH * (band - 1) + 1;
        let high = BAND_WIDTH * band;
        for _ in 0..CUSTOMERS_PER_BAND {
            let id = format!("customer_{:03}", records.len() + 1);
            records.push(CustomerMetrics::new(
                id,
                f64::from(rng.gen_range(RECENCY_RANGE)),
                f64::from(rng.gen_range(low..=high)),
                f64::from(rng.gen_range(MONETARY_RANGE)),
            ));
        }
    }

    records.shuffle(rng);
    records
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{generate_seeded, BAND_WIDTH, CUSTOMERS_PER_BAND};

    #[test]
    fn generates_thirty_customers_per_frequency_band() {
        let records = generate_seeded(1);
        assert_eq!(records.len(), 150);

        for band in 1..=5u32 {
            let low = f64::from(BAND_WIDTH * (band - 1) + 1);
            let high = f64::from(BAND_WIDTH * band);
            let in_band =
                records.iter().filter(|r| r.frequency >= low && r.frequency <= high).count();
            assert_eq!(in_band as u32, CUSTOMERS_PER_BAND, "band {band}");
        }
    }

    #[test]
    fn values_stay_within_configured_ranges() {
        for record in generate_seeded(2) {
            assert!((1.0..=350.0).contains(&record.recency));
            assert!((1_000.0..=9_999.0).contains(&record.monetary));
            assert!(record.validate().is_ok());
        }
    }

    #[test]
    fn ids_are_unique_and_output_is_shuffled() {
        let records = generate_seeded(3);
        let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 150);
        assert!(ids.contains("customer_001"));
        assert!(ids.contains("customer_150"));

        let in_generation_order =
            records.iter().enumerate().all(|(i, r)| r.id == format!("customer_{:03}", i + 1));
        assert!(!in_generation_order);
    }

    #[test]
    fn same_seed_same_data() {
        assert_eq!(generate_seeded(11), generate_seeded(11));
        assert_ne!(generate_seeded(11), generate_seeded(12));
    }
}
