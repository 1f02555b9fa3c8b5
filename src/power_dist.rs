//! Describing distributions of mining power

/// Numeric type used to represent mining power.
pub type PowerValue = u64;

/// Mining power of the peer at registration index `index` under an
/// exponential curve: `floor(scaling^index)`. A scaling of `1.0` gives
/// every peer unit power.
#[inline]
pub fn scaled_power(scaling: f64, index: usize) -> PowerValue {
    scaling.powi(index as i32).floor() as PowerValue
}

/// Sum of [`scaled_power`] over the first `count` peers.
pub fn total_power(scaling: f64, count: usize) -> PowerValue {
    (0..count).map(|index| scaled_power(scaling, index)).sum()
}

#[cfg(test)]
mod tests {
    use super::{scaled_power, total_power};

    #[test]
    fn unit_scaling_is_flat() {
        for index in 0..20 {
            assert_eq!(scaled_power(1.0, index), 1);
        }
        assert_eq!(total_power(1.0, 20), 20);
    }

    #[test]
    fn powers_floor_the_exponential() {
        assert_eq!(scaled_power(1.2, 0), 1);
        assert_eq!(scaled_power(1.2, 1), 1);
        assert_eq!(scaled_power(1.2, 4), 2);
        assert_eq!(scaled_power(1.2, 10), 6);
        assert_eq!(scaled_power(2.0, 10), 1024);
    }
}
