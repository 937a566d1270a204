//! Cohen's d between two association distributions.

use crate::error::{BiasError, BiasResult};

use super::association::GroupDistribution;

/// Standardized mean difference of X over Y.
///
/// `d = (mean(X) - mean(Y)) / s_pooled` with
/// `s_pooled = sqrt((M2_X + M2_Y) / (|X| + |Y| - 2))`, which equals the
/// Bessel-corrected pooled sample standard deviation. Always computed from
/// the true group assignment.
///
/// # Errors
///
/// - [`BiasError::InsufficientData`] if either distribution is empty.
/// - [`BiasError::DegenerateVariance`] if `|X| + |Y| < 3` or the pooled
///   standard deviation is zero or not finite. No infinity or NaN is returned.
pub fn cohens_d(x: &GroupDistribution, y: &GroupDistribution) -> BiasResult<f64> {
    if x.is_empty() || y.is_empty() {
        return Err(BiasError::InsufficientData(format!(
            "Cohen's d needs non-empty groups (|X|={}, |Y|={})",
            x.len(),
            y.len()
        )));
    }

    let degenerate = || BiasError::DegenerateVariance {
        n_x: x.len(),
        n_y: y.len(),
    };

    let dof = x.len() + y.len() - 2;
    if dof == 0 {
        return Err(degenerate());
    }

    let mx = x.moments();
    let my = y.moments();
    let pooled_std = ((mx.m2() + my.m2()) / dof as f64).sqrt();
    if pooled_std == 0.0 || !pooled_std.is_finite() {
        return Err(degenerate());
    }

    Ok((mx.mean() - my.mean()) / pooled_std)
}
