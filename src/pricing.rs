use rand::Rng;

/// Prices a delivery at creation time. The engine stores the quote as-is.
pub trait FareQuoter: Send + Sync {
    fn quote(&self, pickup_address: &str, drop_address: &str) -> f64;
}

/// Placeholder pricing: a whole amount drawn uniformly from 5..=24.
pub struct RandomFare;

impl FareQuoter for RandomFare {
    fn quote(&self, _pickup_address: &str, _drop_address: &str) -> f64 {
        rand::thread_rng().gen_range(5..25) as f64
    }
}

pub struct FixedFare(pub f64);

impl FareQuoter for FixedFare {
    fn quote(&self, _pickup_address: &str, _drop_address: &str) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{FareQuoter, FixedFare, RandomFare};

    #[test]
    fn random_fare_stays_in_range() {
        for _ in 0..500 {
            let fare = RandomFare.quote("A", "B");
            assert!((5.0..=24.0).contains(&fare));
            assert_eq!(fare.fract(), 0.0);
        }
    }

    #[test]
    fn fixed_fare_is_constant() {
        assert_eq!(FixedFare(12.75).quote("A", "B"), 12.75);
    }
}
