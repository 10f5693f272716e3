use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Complete,
    High,
    Medium,
    Low,
    None,
}

impl ProgressLevel {
    /// Bucket a percentage for progress-bar coloring.
    ///
    /// 99.9 and above counts as complete so float results just under 100
    /// still read as done. Exactly 70 and exactly 30 are both medium.
    /// Values outside 0..=100 land in the end buckets and NaN is treated as
    /// no progress.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 99.9 {
            ProgressLevel::Complete
        } else if percentage > 70.0 {
            ProgressLevel::High
        } else if percentage >= 30.0 {
            ProgressLevel::Medium
        } else if percentage > 0.0 {
            ProgressLevel::Low
        } else {
            ProgressLevel::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProgressLevel::Complete => "complete",
            ProgressLevel::High => "high",
            ProgressLevel::Medium => "medium",
            ProgressLevel::Low => "low",
            ProgressLevel::None => "none",
        }
    }
}

impl fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn percentage(achieved: u32, target: u32) -> f64 {
    if target == 0 {
        return 0.0;
    }
    achieved as f64 / target as f64 * 100.0
}

/// Fixed-width text bar such as `[#####-----]`.
pub fn render_bar(percentage: f64, width: usize) -> String {
    let ratio = if percentage.is_nan() {
        0.0
    } else {
        (percentage / 100.0).clamp(0.0, 1.0)
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(percentage: f64) -> &'static str {
        ProgressLevel::from_percentage(percentage).label()
    }

    #[test]
    fn thresholds_follow_expected_table() {
        assert_eq!(label(100.0), "complete");
        assert_eq!(label(99.9), "complete");
        assert_eq!(label(99.89), "high");
        assert_eq!(label(70.01), "high");
        assert_eq!(label(70.0), "medium");
        assert_eq!(label(30.0), "medium");
        assert_eq!(label(30.01), "medium");
        assert_eq!(label(29.99), "low");
        assert_eq!(label(0.5), "low");
        assert_eq!(label(0.0), "none");
    }

    #[test]
    fn out_of_range_values_clamp_to_end_buckets() {
        assert_eq!(label(150.0), "complete");
        assert_eq!(label(f64::INFINITY), "complete");
        assert_eq!(label(-5.0), "none");
        assert_eq!(label(f64::NEG_INFINITY), "none");
        assert_eq!(label(f64::NAN), "none");
    }

    #[test]
    fn percentage_handles_zero_target() {
        assert_eq!(percentage(10, 0), 0.0);
        assert!((percentage(1, 3) - 33.333).abs() < 0.001);
        assert_eq!(percentage(45, 30), 150.0);
    }

    #[test]
    fn near_complete_fraction_reads_as_complete() {
        let value = percentage(1999, 2000);
        assert!(value < 100.0);
        assert_eq!(ProgressLevel::from_percentage(value), ProgressLevel::Complete);
    }

    #[test]
    fn bar_fills_proportionally_and_clamps() {
        assert_eq!(render_bar(50.0, 10), "[#####-----]");
        assert_eq!(render_bar(0.0, 4), "[----]");
        assert_eq!(render_bar(180.0, 4), "[####]");
        assert_eq!(render_bar(-20.0, 4), "[----]");
        assert_eq!(render_bar(f64::NAN, 4), "[----]");
    }
}
