//! Remainder-safe proportional splitting of integer amounts.
//!
//! [`allocate`] never leaks a minor unit: the parts always add up to the input
//! total. Every part is the truncated proportional share, and the units lost to
//! truncation go one at a time to the parts with the largest fractional
//! remainder (input order breaks ties).
//!
//! ```rust
//! use engine::allocate;
//!
//! assert_eq!(allocate(100, &[60, 40]).unwrap(), vec![60, 40]);
//! assert_eq!(allocate(10, &[1, 1, 1]).unwrap(), vec![4, 3, 3]);
//! assert_eq!(allocate(-50, &[60, 40]).unwrap(), vec![-30, -20]);
//! ```

use std::cmp::Reverse;

use crate::{EngineError, ResultEngine};

/// Highest processing cut a project can configure, in percent.
pub const MAX_PERCENT: i64 = 100;

/// Split `total` into `weights.len()` parts proportional to `weights`.
///
/// Negative totals are split by magnitude and the sign is applied to every
/// part, so `-50` over `[60, 40]` yields `[-30, -20]`.
///
/// Fails with [`EngineError::InvalidWeights`] when the list is empty, a weight
/// is negative or all weights are zero.
pub fn allocate(total: i64, weights: &[i64]) -> ResultEngine<Vec<i64>> {
    if weights.is_empty() {
        return Err(EngineError::InvalidWeights("no weights given".to_string()));
    }
    if let Some(weight) = weights.iter().find(|w| **w < 0) {
        return Err(EngineError::InvalidWeights(format!(
            "weight {weight} is negative"
        )));
    }
    let weight_sum: i128 = weights.iter().map(|w| i128::from(*w)).sum();
    if weight_sum == 0 {
        return Err(EngineError::InvalidWeights(
            "weights must not all be zero".to_string(),
        ));
    }

    let magnitude = i128::from(total).abs();
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for weight in weights {
        let product = magnitude * i128::from(*weight);
        shares.push(product / weight_sum);
        remainders.push(product % weight_sum);
    }

    let mut leftover = magnitude - shares.iter().sum::<i128>();
    let mut order: Vec<usize> = (0..weights.len()).collect();
    // Stable sort: equal remainders keep input order.
    order.sort_by_key(|index| Reverse(remainders[*index]));
    for index in order {
        if leftover == 0 {
            break;
        }
        shares[index] += 1;
        leftover -= 1;
    }

    let sign: i128 = if total < 0 { -1 } else { 1 };
    let parts = shares
        .into_iter()
        .map(|share| {
            i64::try_from(share * sign)
                .map_err(|_| EngineError::InvalidAmount("amount out of range".to_string()))
        })
        .collect::<ResultEngine<Vec<i64>>>()?;

    let allocated: i128 = parts.iter().map(|p| i128::from(*p)).sum();
    if allocated != i128::from(total) {
        return Err(EngineError::AllocationInvariantViolation(format!(
            "allocated {allocated} out of {total}"
        )));
    }

    Ok(parts)
}

/// Split an allocated share into `(processing_cut, net)`.
///
/// Reversals (negative shares) are never charged: the cut is `0` and the whole
/// share is returned as net.
pub fn split_processing_cut(share: i64, cut_percent: i64) -> ResultEngine<(i64, i64)> {
    if !(0..=MAX_PERCENT).contains(&cut_percent) {
        return Err(EngineError::InvalidRatio(format!(
            "processing cut {cut_percent} is outside 0..=100"
        )));
    }
    if share < 0 {
        return Ok((0, share));
    }

    let parts = allocate(share, &[cut_percent, MAX_PERCENT - cut_percent])?;
    Ok((parts[0], parts[1]))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn splits_exact_ratios() {
        assert_eq!(allocate(100, &[60, 40]).unwrap(), vec![60, 40]);
        assert_eq!(allocate(0, &[60, 40]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn leftover_goes_to_largest_remainder() {
        // 7 * 1/3 = 2.33, 7 * 2/3 = 4.66 -> second part gets the unit.
        assert_eq!(allocate(7, &[1, 2]).unwrap(), vec![2, 5]);
    }

    #[test]
    fn ties_follow_input_order() {
        assert_eq!(allocate(10, &[1, 1, 1]).unwrap(), vec![4, 3, 3]);
        assert_eq!(allocate(2, &[1, 1, 1]).unwrap(), vec![1, 1, 0]);
    }

    #[test]
    fn zero_weights_get_nothing() {
        assert_eq!(allocate(99, &[0, 1, 0, 2]).unwrap(), vec![0, 33, 0, 66]);
    }

    #[test]
    fn negative_total_keeps_sign() {
        assert_eq!(allocate(-50, &[60, 40]).unwrap(), vec![-30, -20]);
        assert_eq!(allocate(-7, &[1, 2]).unwrap(), vec![-2, -5]);
    }

    #[test]
    fn rejects_invalid_weights() {
        assert!(matches!(
            allocate(10, &[]),
            Err(EngineError::InvalidWeights(_))
        ));
        assert!(matches!(
            allocate(10, &[0, 0]),
            Err(EngineError::InvalidWeights(_))
        ));
        assert!(matches!(
            allocate(10, &[5, -1]),
            Err(EngineError::InvalidWeights(_))
        ));
    }

    #[test]
    fn handles_extreme_totals() {
        assert_eq!(allocate(i64::MAX, &[1]).unwrap(), vec![i64::MAX]);
        assert_eq!(allocate(i64::MIN, &[1]).unwrap(), vec![i64::MIN]);
        let parts = allocate(i64::MAX, &[i64::MAX, i64::MAX]).unwrap();
        assert_eq!(parts.iter().map(|p| i128::from(*p)).sum::<i128>(), i128::from(i64::MAX));
    }

    #[test]
    fn processing_cut_split() {
        assert_eq!(split_processing_cut(60, 10).unwrap(), (6, 54));
        assert_eq!(split_processing_cut(40, 10).unwrap(), (4, 36));
        assert_eq!(split_processing_cut(5, 0).unwrap(), (0, 5));
        assert_eq!(split_processing_cut(5, 100).unwrap(), (5, 0));
        assert_eq!(split_processing_cut(0, 10).unwrap(), (0, 0));
    }

    #[test]
    fn reversals_are_never_charged() {
        assert_eq!(split_processing_cut(-30, 10).unwrap(), (0, -30));
    }

    #[test]
    fn processing_cut_out_of_range() {
        assert!(matches!(
            split_processing_cut(10, 101),
            Err(EngineError::InvalidRatio(_))
        ));
        assert!(matches!(
            split_processing_cut(10, -1),
            Err(EngineError::InvalidRatio(_))
        ));
    }

    proptest! {
        #[test]
        fn parts_sum_to_total(
            total in 0i64..10_000_000,
            weights in prop::collection::vec(0i64..1_000, 1..12),
        ) {
            prop_assume!(weights.iter().any(|w| *w > 0));
            let parts = allocate(total, &weights).unwrap();
            prop_assert_eq!(parts.len(), weights.len());
            prop_assert_eq!(parts.iter().sum::<i64>(), total);
        }

        #[test]
        fn parts_stay_within_one_unit(
            total in 0i64..10_000_000,
            weights in prop::collection::vec(0i64..1_000, 1..12),
        ) {
            prop_assume!(weights.iter().any(|w| *w > 0));
            let parts = allocate(total, &weights).unwrap();
            let weight_sum: i128 = weights.iter().map(|w| i128::from(*w)).sum();
            for (part, weight) in parts.iter().zip(&weights) {
                // |part - total * w / sum| < 1  <=>  |part * sum - total * w| < sum
                let scaled = i128::from(*part) * weight_sum - i128::from(total) * i128::from(*weight);
                prop_assert!(scaled.abs() < weight_sum);
            }
        }

        #[test]
        fn cut_and_net_rebuild_share(share in -1_000_000i64..1_000_000, cut in 0i64..=100) {
            let (processing_cut, net) = split_processing_cut(share, cut).unwrap();
            prop_assert_eq!(processing_cut + net, share);
            if share < 0 {
                prop_assert_eq!(processing_cut, 0);
            }
        }
    }
}
