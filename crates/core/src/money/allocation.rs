//! Allocation using the Largest Remainder Method.
//!
//! The total is shared out in whole subunits so the parts sum exactly to it:
//! 1. Compute each exact share of the total
//! 2. Truncate each share to whole subunits
//! 3. Count the subunits left over (total - sum of truncated)
//! 4. Hand them out one each to the shares with the largest fractional parts

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use moneta_shared::{MoneyError, MoneyResult};

/// Shares `total_units` (whole subunits) in proportion to `ratios`.
///
/// A negative total is allocated by magnitude and every share keeps the sign.
/// Ties on the fractional part favour the earlier share.
pub(super) fn allocate_units(total_units: Decimal, ratios: &[Decimal]) -> MoneyResult<Vec<Decimal>> {
    let ratio_sum = validate(ratios)?;
    let magnitude = total_units.abs();

    let exact = ratios
        .iter()
        .map(|ratio| share(magnitude, *ratio, ratio_sum))
        .collect::<MoneyResult<Vec<_>>>()?;
    let mut rounded: Vec<Decimal> = exact.iter().map(Decimal::trunc).collect();

    let allocated: Decimal = rounded.iter().copied().sum();
    let leftover = (magnitude - allocated).trunc().to_usize().unwrap_or(0);

    if leftover > 0 {
        let mut remainders: Vec<(usize, Decimal)> = exact
            .iter()
            .zip(&rounded)
            .map(|(e, r)| *e - *r)
            .enumerate()
            .collect();
        remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        for (idx, _) in remainders.iter().take(leftover) {
            rounded[*idx] += Decimal::ONE;
        }
    }

    if total_units.is_sign_negative() {
        rounded.iter_mut().for_each(|part| *part = -*part);
    }
    Ok(rounded)
}

/// Exact proportional shares; the last share absorbs any rounding residue.
pub(super) fn allocate_exact(total: Decimal, ratios: &[Decimal]) -> MoneyResult<Vec<Decimal>> {
    let ratio_sum = validate(ratios)?;
    let mut parts = Vec::with_capacity(ratios.len());
    let mut allocated = Decimal::ZERO;

    for ratio in &ratios[..ratios.len() - 1] {
        let part = share(total, *ratio, ratio_sum)?;
        allocated = allocated.checked_add(part).ok_or(MoneyError::Overflow)?;
        parts.push(part);
    }
    parts.push(total.checked_sub(allocated).ok_or(MoneyError::Overflow)?);
    Ok(parts)
}

fn share(total: Decimal, ratio: Decimal, ratio_sum: Decimal) -> MoneyResult<Decimal> {
    total
        .checked_mul(ratio)
        .and_then(|scaled| scaled.checked_div(ratio_sum))
        .or_else(|| {
            total
                .checked_div(ratio_sum)
                .and_then(|unit| unit.checked_mul(ratio))
        })
        .ok_or(MoneyError::Overflow)
}

fn validate(ratios: &[Decimal]) -> MoneyResult<Decimal> {
    if ratios.is_empty() {
        return Err(MoneyError::InvalidArgument(
            "allocation needs at least one ratio".to_string(),
        ));
    }
    if let Some(ratio) = ratios.iter().find(|r| r.is_sign_negative() && !r.is_zero()) {
        return Err(MoneyError::InvalidArgument(format!(
            "allocation ratios must not be negative, got {ratio}"
        )));
    }
    let sum = ratios
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r))
        .ok_or(MoneyError::Overflow)?;
    if sum.is_zero() {
        return Err(MoneyError::InvalidArgument(
            "allocation ratios sum to zero".to_string(),
        ));
    }
    Ok(sum)
}
