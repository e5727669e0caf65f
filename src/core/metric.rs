// src/core/metric.rs

use std::fmt;
use std::sync::Mutex;

use crate::core::fmt::format_grouped;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    min_value: i64,
    max_value: i64,
    samples: u64,
    total: i64,
    sum_of_squares: i64,
}

/// A basic named metric: min, max, total, sample count and a sum-of-squares
/// standard deviation.
///
/// All mutation and min/max reads go through one dedicated lock; the metric
/// name plays no part in synchronization.
#[derive(Debug, Default)]
pub struct Metric {
    name: String,
    units: String,
    counters: Mutex<Counters>,
}

impl Metric {
    pub fn new(name: &str) -> Self {
        Self::with_units(name, "ms")
    }

    pub fn with_units(name: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// Record one observation.
    pub fn sample(&self, value: i64) {
        let mut c = self.counters.lock().expect("metric lock poisoned");
        c.samples += 1;
        if value < c.min_value {
            c.min_value = value;
        }
        if value > c.max_value {
            c.max_value = value;
        }
        c.total += value;
        c.sum_of_squares += value * value;
    }

    pub fn samples(&self) -> u64 {
        self.counters.lock().expect("metric lock poisoned").samples
    }

    pub fn min_value(&self) -> i64 {
        self.counters.lock().expect("metric lock poisoned").min_value
    }

    pub fn max_value(&self) -> i64 {
        self.counters.lock().expect("metric lock poisoned").max_value
    }

    pub fn total(&self) -> i64 {
        self.counters.lock().expect("metric lock poisoned").total
    }

    pub fn average(&self) -> i64 {
        let c = self.counters.lock().expect("metric lock poisoned");
        if c.samples == 0 {
            0
        } else {
            c.total / c.samples as i64
        }
    }

    /// One standard deviation over all samples, via the sum-of-squares
    /// identity.
    pub fn standard_deviation(&self) -> i64 {
        let c = self.counters.lock().expect("metric lock poisoned");
        if c.samples == 0 {
            return 0;
        }
        let n = c.samples as i64;
        let n_minus_1 = if n <= 1 { 1 } else { n - 1 };
        let numerator = c.sum_of_squares - ((c.total * c.total) / n);
        ((numerator / n_minus_1) as f64).sqrt() as i64
    }

    /// Zero the counters and return a snapshot of the state prior to the
    /// reset; successive calls produce delta values.
    pub fn reset(&self) -> Self {
        let mut c = self.counters.lock().expect("metric lock poisoned");
        let snapshot = Self {
            name: self.name.clone(),
            units: self.units.clone(),
            counters: Mutex::new(*c),
        };
        *c = Counters::default();
        snapshot
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = *self.counters.lock().expect("metric lock poisoned");
        write!(f, "{}: Samples={}  ", self.name, format_grouped(c.samples as i64))?;
        if c.samples > 0 {
            write!(
                f,
                "Avg={avg} {u}  Total={total} {u}  Std Dev={dev} {u}  Min Value={min} {u}  Max Value={max} {u}",
                avg = format_grouped(self.average()),
                total = format_grouped(c.total),
                dev = format_grouped(self.standard_deviation()),
                min = format_grouped(c.min_value),
                max = format_grouped(c.max_value),
                u = self.units,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_accumulates() {
        let metric = Metric::new("elapsed");
        metric.sample(10);
        metric.sample(30);
        metric.sample(20);
        assert_eq!(metric.samples(), 3);
        assert_eq!(metric.total(), 60);
        assert_eq!(metric.average(), 20);
        assert_eq!(metric.max_value(), 30);
        assert_eq!(metric.min_value(), 0); // counters start at zero
    }

    #[test]
    fn test_reset_returns_snapshot() {
        let metric = Metric::new("elapsed");
        metric.sample(100);
        let before = metric.reset();
        assert_eq!(before.samples(), 1);
        assert_eq!(before.total(), 100);
        assert_eq!(metric.samples(), 0);
        assert_eq!(metric.total(), 0);
    }

    #[test]
    fn test_standard_deviation() {
        let metric = Metric::new("elapsed");
        for v in [2, 4, 4, 4, 5, 5, 7, 9] {
            metric.sample(v);
        }
        // classic example set: population sigma is 2; sample flavor rounds to 2
        assert_eq!(metric.standard_deviation(), 2);
    }

    #[test]
    fn test_display() {
        let metric = Metric::new("timing");
        assert_eq!(metric.to_string(), "timing: Samples=0  ");
        metric.sample(1500);
        let text = metric.to_string();
        assert!(text.contains("Samples=1"));
        assert!(text.contains("Total=1,500 ms"));
    }
}
