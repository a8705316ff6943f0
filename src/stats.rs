//! Descriptive statistics over a metric series.
//!
//! Mean and max need at least one value; the sample standard deviation
//! divides by `n - 1` and needs at least two. Sums are accumulated exactly
//! and rounded once, so a mean is the nearest f64 to the true mean of the
//! stored values.

/// Statistic names used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    StdDev,
    Max,
}

impl Statistic {
    /// Minimum number of data points the statistic is defined for.
    pub fn min_points(&self) -> usize {
        match self {
            Statistic::Mean | Statistic::Max => 1,
            Statistic::StdDev => 2,
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Statistic::Mean => "mean",
            Statistic::StdDev => "standard deviation",
            Statistic::Max => "max",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// Fewer data points than the statistic requires.
    InsufficientData {
        statistic: Statistic,
        required: usize,
        found: usize,
    },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::InsufficientData {
                statistic,
                required,
                found,
            } => write!(
                f,
                "{statistic} requires at least {required} data point{}, found {found}",
                if *required == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::error::Error for StatsError {}

fn require(statistic: Statistic, values: &[f64]) -> Result<(), StatsError> {
    let required = statistic.min_points();
    if values.len() < required {
        return Err(StatsError::InsufficientData {
            statistic,
            required,
            found: values.len(),
        });
    }
    Ok(())
}

/// Exact running sum held as non-overlapping partials (Shewchuk).
///
/// Inputs must be finite; parsed report values always are.
#[derive(Debug, Default)]
struct ExactSum {
    partials: Vec<f64>,
}

impl ExactSum {
    fn add(&mut self, mut x: f64) {
        let mut kept = 0;
        for j in 0..self.partials.len() {
            let mut y = self.partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                self.partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        self.partials.truncate(kept);
        self.partials.push(x);
    }

    /// The sum rounded once to the nearest f64, ties to even.
    fn total(&self) -> f64 {
        let p = &self.partials;
        let Some(&top) = p.last() else {
            return 0.0;
        };
        let mut n = p.len() - 1;
        let mut hi = top;
        let mut lo = 0.0;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = p[n];
            hi = x + y;
            lo = y - (hi - x);
            if lo != 0.0 {
                break;
            }
        }
        // Half-way case: the remaining partials decide the direction.
        if n > 0 && ((lo < 0.0 && p[n - 1] < 0.0) || (lo > 0.0 && p[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            if y == x - hi {
                hi = x;
            }
        }
        hi
    }
}

/// Arithmetic mean of the exact sum, rounded once.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    require(Statistic::Mean, values)?;
    let n = values.len() as f64;
    let mut sum = ExactSum::default();
    for &v in values {
        sum.add(v);
    }
    let q = sum.total() / n;

    // Fold the division error back in: residual = sum - q * n, exactly.
    let p = q * n;
    sum.add(-p);
    sum.add(-q.mul_add(n, -p));
    Ok(q + sum.total() / n)
}

/// Sample standard deviation (Bessel-corrected, divisor `n - 1`).
pub fn stdev(values: &[f64]) -> Result<f64, StatsError> {
    require(Statistic::StdDev, values)?;
    let n = values.len() as f64;
    let m = mean(values)?;

    let mut sum_sq = ExactSum::default();
    let mut sum_dev = ExactSum::default();
    for &v in values {
        let d = v - m;
        let sq = d * d;
        sum_sq.add(sq);
        sum_sq.add(d.mul_add(d, -sq));
        sum_dev.add(d);
    }
    // Compensates for the rounding left in `m`.
    let c = sum_dev.total();
    sum_sq.add(-(c * c) / n);

    let variance = sum_sq.total() / (n - 1.0);
    Ok(variance.max(0.0).sqrt())
}

/// Largest value.
pub fn max(values: &[f64]) -> Result<f64, StatsError> {
    require(Statistic::Max, values)?;
    Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Round to `digits` decimal places.
///
/// Rounds the exact binary value through decimal formatting, so `0.8005`
/// (stored as 0.80049999...) rounds down to `0.8`.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let rounded = format!("{:.*}", digits as usize, value)
        .parse::<f64>()
        .unwrap_or(value);
    // Keep `0.0` rather than `-0.0` for tiny negative inputs.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
