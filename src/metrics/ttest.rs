//! Welch's two-sample t-test.

use super::error::{TTestError, TTestResult};

/// Outcome of a two-sided Welch t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t: f64,
    pub dof: f64,
    pub p_value: f64,
}

impl TTest {
    /// Whether the null hypothesis of equal means is rejected at `alpha`.
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Two-sided Welch t-test for unequal variances.
pub fn welch_t_test(left: &[f64], right: &[f64]) -> TTestResult<TTest> {
    if left.len() < 2 || right.len() < 2 {
        return Err(TTestError::TooFewSamples {
            left: left.len(),
            right: right.len(),
        });
    }

    let (m1, v1) = mean_variance(left);
    let (m2, v2) = mean_variance(right);
    if v1 == 0.0 && v2 == 0.0 {
        return Err(TTestError::ZeroVariance);
    }

    let (n1, n2) = (left.len() as f64, right.len() as f64);
    let (s1, s2) = (v1 / n1, v2 / n2);
    let t = (m1 - m2) / (s1 + s2).sqrt();
    let dof = (s1 + s2).powi(2) / (s1.powi(2) / (n1 - 1.0) + s2.powi(2) / (n2 - 1.0));

    // Two-sided tail of Student's t: I_{dof/(dof+t^2)}(dof/2, 1/2).
    let p_value = incomplete_beta(dof / (dof + t * t), 0.5 * dof, 0.5).clamp(0.0, 1.0);

    Ok(TTest { t, dof, p_value })
}

/// Sample mean and unbiased variance.
fn mean_variance(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fast only below the mean.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Modified Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln(Gamma(x)) for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection formula.
        let pi = std::f64::consts::PI;
        return pi.ln() - (pi * x).sin().abs().ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let mut sum = COEFFS[0];
    for (i, c) in COEFFS[1..].iter().enumerate() {
        sum += c / (z + i as f64 + 1.0);
    }
    let t = z + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-12);
        assert!(ln_gamma(2.0).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_incomplete_beta_symmetry() {
        assert!((incomplete_beta(0.5, 2.0, 2.0) - 0.5).abs() < 1e-12);
        // I_x(1, 1) is the identity.
        assert!((incomplete_beta(0.3, 1.0, 1.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_identical_samples_do_not_reject() {
        let a = [10.0, 11.0, 12.0, 10.5, 11.5];
        let test = welch_t_test(&a, &a).unwrap();
        assert_eq!(test.t, 0.0);
        assert!((test.p_value - 1.0).abs() < 1e-9);
        assert!(!test.rejects(0.05));
    }

    #[test]
    fn test_separated_samples_reject() {
        let fast = [5.0, 5.2, 4.9, 5.1, 5.0];
        let slow = [10.0, 10.3, 9.8, 10.1, 10.2];
        let test = welch_t_test(&fast, &slow).unwrap();
        assert!(test.t < 0.0);
        assert!(test.p_value < 1e-6);
        assert!(test.rejects(0.05));
    }

    #[test]
    fn test_reference_p_value() {
        // t = -1.0, dof = 8: two-sided p = 0.34659...
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 3.0, 4.0, 5.0, 6.0];
        let test = welch_t_test(&a, &b).unwrap();
        assert!((test.t + 1.0).abs() < 1e-12);
        assert!((test.dof - 8.0).abs() < 1e-12);
        assert!((test.p_value - 0.346_594).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(
            welch_t_test(&[1.0], &[1.0, 2.0]),
            Err(TTestError::TooFewSamples { left: 1, right: 2 })
        );
        assert_eq!(
            welch_t_test(&[1.0, 1.0], &[2.0, 2.0]),
            Err(TTestError::ZeroVariance)
        );
    }
}
