//! Time axis of a model history series.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{TcError, TcResult};

/// Ordered time stamps of a field's time dimension.
///
/// Model output uses a 365-day calendar; stamps are stored as naive
/// date-times and never shifted across a leap day here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub times: Vec<NaiveDateTime>,
}

impl TimeAxis {
    pub fn new(times: Vec<NaiveDateTime>) -> TcResult<Self> {
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TcError::InvalidTime("time stamps are not increasing".to_string()));
        }
        Ok(Self { times })
    }

    /// Build `count` stamps starting at `start`, spaced by `step`.
    pub fn regular(start: NaiveDateTime, step: Duration, count: usize) -> Self {
        let times = (0..count).map(|n| start + step * n as i32).collect();
        Self { times }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDateTime> {
        self.times.first().copied()
    }

    /// Spacing between the first two stamps.
    pub fn step(&self) -> Option<Duration> {
        match self.times.as_slice() {
            [a, b, ..] => Some(*b - *a),
            _ => None,
        }
    }

    /// The first `n` stamps. Fails if the axis is shorter than `n`.
    pub fn truncated(&self, n: usize) -> TcResult<TimeAxis> {
        if n > self.len() {
            return Err(TcError::InvalidTime(format!(
                "requested {} time steps but axis has {}",
                n,
                self.len()
            )));
        }
        Ok(Self {
            times: self.times[..n].to_vec(),
        })
    }

    /// Start stamp in GrADS `TDEF` form, e.g. `00:00Z01Jan2000`.
    pub fn grads_start(&self) -> Option<String> {
        self.first().map(|t| t.format("%H:%MZ%d%b%Y").to_string())
    }

    /// Step in GrADS `TDEF` increment form (`30mn`, `6hr`, `1dy`).
    ///
    /// A single-step axis reports `1hr`.
    pub fn grads_increment(&self) -> String {
        let Some(step) = self.step() else {
            return "1hr".to_string();
        };
        let minutes = step.num_minutes();
        if minutes > 0 && minutes % (24 * 60) == 0 {
            format!("{}dy", minutes / (24 * 60))
        } else if minutes > 0 && minutes % 60 == 0 {
            format!("{}hr", minutes / 60)
        } else {
            format!("{}mn", minutes.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_grads_start_format() {
        let axis = TimeAxis::regular(t0(), Duration::hours(1), 3);
        assert_eq!(axis.grads_start().as_deref(), Some("00:00Z01Jan2000"));
    }

    #[test]
    fn test_grads_increment() {
        assert_eq!(TimeAxis::regular(t0(), Duration::hours(1), 2).grads_increment(), "1hr");
        assert_eq!(TimeAxis::regular(t0(), Duration::hours(6), 2).grads_increment(), "6hr");
        assert_eq!(TimeAxis::regular(t0(), Duration::days(1), 2).grads_increment(), "1dy");
        assert_eq!(TimeAxis::regular(t0(), Duration::minutes(30), 2).grads_increment(), "30mn");
        assert_eq!(TimeAxis::regular(t0(), Duration::hours(3), 1).grads_increment(), "1hr");
    }

    #[test]
    fn test_truncated() {
        let axis = TimeAxis::regular(t0(), Duration::hours(1), 5);
        assert_eq!(axis.truncated(2).unwrap().len(), 2);
        assert!(axis.truncated(6).is_err());
    }

    #[test]
    fn test_rejects_unordered_stamps() {
        assert!(TimeAxis::new(vec![t0(), t0()]).is_err());
    }
}
