fn valid(times: &[f64]) -> impl Iterator<Item = f64> + '_ {
    times.iter().copied().filter(|t| t.is_finite() && *t > 0.0)
}

/// Fastest positive time, ignoring empty (zero) entries.
pub fn fastest(times: &[f64]) -> Option<f64> {
    valid(times).reduce(f64::min)
}

pub fn average(times: &[f64]) -> Option<f64> {
    let (total, count) = valid(times).fold((0.0, 0usize), |(sum, n), t| (sum + t, n + 1));
    (count > 0).then(|| total / count as f64)
}

pub fn sum(times: &[f64]) -> f64 {
    valid(times).sum()
}

/// Time per 100 m for a swim of `distance` metres.
pub fn pace_per_100(total: f64, distance: f64) -> f64 {
    if distance <= 0.0 {
        return 0.0;
    }
    total / distance * 100.0
}
