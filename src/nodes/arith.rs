use anyhow::{anyhow, ensure, Result};

use crate::node_sub;

#[node_sub(tag = "!add", outputs(total))]
pub fn add(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b)
        .ok_or_else(|| anyhow!("{} + {} overflows", a, b))
}

/// Euclidean division, so the remainder is never negative.
#[node_sub(tag = "!divmod", outputs(quotient, remainder))]
pub fn divmod(dividend: i64, divisor: i64) -> Result<(i64, i64)> {
    ensure!(divisor != 0, "division of {} by zero", dividend);
    Ok((dividend.div_euclid(divisor), dividend.rem_euclid(divisor)))
}

#[node_sub(tag = "!negate", outputs(out))]
pub fn negate(value: i64) -> Result<i64> {
    value
        .checked_neg()
        .ok_or_else(|| anyhow!("cannot negate {}", value))
}
