//! Plain-text summary of the accepted storms.

use track_parser::QualifiedStorm;

/// Count and mean lifetime of the accepted storms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub lifetime_sum: u64,
}

impl Summary {
    pub fn from_storms(storms: &[QualifiedStorm]) -> Self {
        storms.iter().fold(Self::default(), |mut acc, storm| {
            acc.add(storm);
            acc
        })
    }

    pub fn add(&mut self, storm: &QualifiedStorm) {
        self.total += 1;
        self.lifetime_sum += u64::from(storm.lifetime);
    }

    /// Mean lifetime in steps; `None` without storms.
    pub fn mean_lifetime(&self) -> Option<f64> {
        (self.total > 0).then(|| self.lifetime_sum as f64 / self.total as f64)
    }

    /// The two-line `TC.txt` report.
    pub fn render(&self) -> String {
        let mean = self
            .mean_lifetime()
            .map(decimal)
            .unwrap_or_else(|| "undefined".to_string());
        format!("Total TCs = {}\nLife-Time average = {}\n", self.total, mean)
    }
}

/// Shortest round-tripping decimal that always shows a fractional part
/// (`40.0`, `1.25`, `-90.0`).
pub fn decimal(x: f64) -> String {
    let s = x.to_string();
    if x.is_finite() && !s.contains(['.', 'e']) {
        format!("{}.0", s)
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storm(id: u32, lifetime: u32) -> QualifiedStorm {
        QualifiedStorm { id, lifetime }
    }

    #[test]
    fn test_single_storm() {
        let summary = Summary::from_storms(&[storm(5, 40)]);
        assert_eq!(summary.render(), "Total TCs = 1\nLife-Time average = 40.0\n");
    }

    #[test]
    fn test_fractional_mean() {
        let summary = Summary::from_storms(&[storm(1, 36), storm(2, 41), storm(3, 40)]);
        assert_eq!(summary.mean_lifetime(), Some(39.0));
        let summary = Summary::from_storms(&[storm(1, 36), storm(2, 41)]);
        assert_eq!(summary.render(), "Total TCs = 2\nLife-Time average = 38.5\n");
    }

    #[test]
    fn test_no_storms_is_undefined() {
        let summary = Summary::default();
        assert_eq!(summary.mean_lifetime(), None);
        assert_eq!(summary.render(), "Total TCs = 0\nLife-Time average = undefined\n");
    }

    #[test]
    fn test_decimal() {
        assert_eq!(decimal(0.0), "0.0");
        assert_eq!(decimal(-90.0), "-90.0");
        assert_eq!(decimal(1.25), "1.25");
        assert_eq!(decimal(0.1 + 0.2), "0.30000000000000004");
    }
}
