use super::error::FixedPointOverflow;
use serde::{Deserialize, Serialize};

/// Beyond this many digits `10^p` no longer scales an `f64` meaningfully.
pub const MAX_DECIMAL_PRECISION: u32 = 15;

/// Scale used to carry rounded reals as integers over the planner link.
///
/// A value `v` travels as `round(v, decimal_precision) * multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPoint {
    pub decimal_precision: u32,
    pub multiplier: i32,
}

impl FixedPoint {
    pub fn new(decimal_precision: u32, multiplier: i32) -> Self {
        Self {
            decimal_precision,
            multiplier,
        }
    }

    /// Round half-to-even at `decimal_precision` digits, matching the planner side.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimal_precision as i32);
        (value * scale).round_ties_even() / scale
    }

    /// The product is rounded, not truncated, so `0.1 * 1000` cannot land on 99.
    /// Non-finite results and results outside the `i32` range are rejected.
    pub fn encode(&self, value: f64) -> Result<i32, FixedPointOverflow> {
        let scaled = (self.round(value) * self.multiplier as f64).round();
        if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
            return Err(FixedPointOverflow {
                value,
                decimal_precision: self.decimal_precision,
                multiplier: self.multiplier,
            });
        }
        Ok(scaled as i32)
    }

    pub fn decode(&self, raw: i32) -> f64 {
        raw as f64 / self.multiplier as f64
    }

    pub fn tolerance(&self) -> f64 {
        10f64.powi(-(self.decimal_precision as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_of_encode_stays_within_precision() {
        let fp = FixedPoint::new(3, 1000);
        for v in [0.0, 0.1, -0.1, 12.3456, -987.6543, 1234.5678, 0.0005, 3.14159] {
            let back = fp.decode(fp.encode(v).unwrap());
            assert!(
                (back - v).abs() <= fp.tolerance(),
                "{} decoded to {}",
                v,
                back
            );
        }
    }

    #[test]
    fn coarse_multiplier_still_honours_precision() {
        let fp = FixedPoint::new(1, 10);
        assert_eq!(fp.encode(5.04), Ok(50));
        assert_eq!(fp.encode(12.0), Ok(120));
        assert_eq!(fp.decode(120), 12.0);
    }

    #[test]
    fn ties_round_to_even() {
        let fp = FixedPoint::new(0, 1);
        assert_eq!(fp.encode(2.5), Ok(2));
        assert_eq!(fp.encode(3.5), Ok(4));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let fp = FixedPoint::new(3, 1000);
        assert_eq!(
            fp.encode(3_000_000.0),
            Err(FixedPointOverflow {
                value: 3_000_000.0,
                decimal_precision: 3,
                multiplier: 1000,
            })
        );
        assert!(fp.encode(-3_000_000.0).is_err());
        assert!(fp.encode(f64::NAN).is_err());
        assert!(fp.encode(f64::INFINITY).is_err());
        assert_eq!(fp.encode(2_147_483.0), Ok(2_147_483_000));
    }

    #[test]
    fn oversized_precision_cannot_encode() {
        assert!(FixedPoint::new(400, 1000).encode(12.345).is_err());
        assert_eq!(
            FixedPoint::new(MAX_DECIMAL_PRECISION, 1).encode(12.0),
            Ok(12)
        );
    }
}
