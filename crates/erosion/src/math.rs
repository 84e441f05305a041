//! Shared numeric helpers.
//!
//! The solver maps unbounded accumulated discharge through a saturating
//! error-function response. The grid itself is f32, but the response is
//! evaluated in f64 so the approximation error stays far below anything
//! the stored state can resolve.

/// Numerator coefficients for the `|x| <= 0.46875` rational approximation.
const ERF_P_LOW: [f64; 5] = [
    3.16112374387056560e0,
    1.13864154151050156e2,
    3.77485237685302021e2,
    3.20937758913846947e3,
    1.85777706184603153e-1,
];

/// Denominator coefficients for the `|x| <= 0.46875` rational approximation.
const ERF_Q_LOW: [f64; 4] = [
    2.36012909523441209e1,
    2.44024637934444173e2,
    1.28261652607737228e3,
    2.84423683343917062e3,
];

/// Numerator coefficients for the `0.46875 < |x| <= 4.0` branch.
const ERF_P_MID: [f64; 9] = [
    5.64188496988670089e-1,
    8.88314979438837594e0,
    6.61191906371416295e1,
    2.98635138197400131e2,
    8.81952221241769090e2,
    1.71204761263407058e3,
    2.05107837782607147e3,
    1.23033935479799725e3,
    2.15311535474403846e-8,
];

/// Denominator coefficients for the `0.46875 < |x| <= 4.0` branch.
const ERF_Q_MID: [f64; 8] = [
    1.57449261107098347e1,
    1.17693950891312499e2,
    5.37181101862009858e2,
    1.62138957456669019e3,
    3.29079923573345963e3,
    4.36261909014324716e3,
    3.43936767414372164e3,
    1.23033935480374942e3,
];

/// Inputs beyond this magnitude saturate to exactly +/-1.
const ERF_CUTOFF: f64 = 9.3;

/// Error function, W. J. Cody's rational approximation (the SPECFUN
/// coefficient tables).
///
/// Odd, monotonic non-decreasing, bounded in [-1, 1], with relative error
/// below 1e-15 over the fitted domain. Beyond `|x| = 4` the true value is
/// within 2e-8 of 1, so the tail returns the asymptote exactly rather than
/// evaluating a polynomial outside its fitted range.
pub fn erf(x: f64) -> f64 {
    let abs_x = x.abs();
    if abs_x > ERF_CUTOFF {
        return if x > 0.0 { 1.0 } else { -1.0 };
    }

    if abs_x <= 0.46875 {
        let x_sq = x * x;
        let num = (((ERF_P_LOW[4] * x_sq + ERF_P_LOW[0]) * x_sq + ERF_P_LOW[1]) * x_sq
            + ERF_P_LOW[2])
            * x_sq
            + ERF_P_LOW[3];
        let den = (((x_sq + ERF_Q_LOW[0]) * x_sq + ERF_Q_LOW[1]) * x_sq + ERF_Q_LOW[2]) * x_sq
            + ERF_Q_LOW[3];
        x * (num / den)
    } else if abs_x <= 4.0 {
        let num = (((((((ERF_P_MID[8] * abs_x + ERF_P_MID[0]) * abs_x + ERF_P_MID[1]) * abs_x
            + ERF_P_MID[2])
            * abs_x
            + ERF_P_MID[3])
            * abs_x
            + ERF_P_MID[4])
            * abs_x
            + ERF_P_MID[5])
            * abs_x
            + ERF_P_MID[6])
            * abs_x
            + ERF_P_MID[7];
        let den = (((((((abs_x + ERF_Q_MID[0]) * abs_x + ERF_Q_MID[1]) * abs_x + ERF_Q_MID[2])
            * abs_x
            + ERF_Q_MID[3])
            * abs_x
            + ERF_Q_MID[4])
            * abs_x
            + ERF_Q_MID[5])
            * abs_x
            + ERF_Q_MID[6])
            * abs_x
            + ERF_Q_MID[7];

        let result = 1.0 - (-x * x).exp() * (num / den);
        if x < 0.0 {
            -result
        } else {
            result
        }
    } else if x > 0.0 {
        1.0
    } else {
        -1.0
    }
}
