//! Seasonal demand heatmap

use console::style;
use thiserror::Error;

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Factors at or above this are high demand
pub const HIGH_THRESHOLD: f64 = 1.2;

/// Factors at or above this (and below high) are medium demand
pub const MEDIUM_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    High,
    Medium,
    Low,
}

impl Intensity {
    pub fn classify(factor: f64) -> Self {
        if factor >= HIGH_THRESHOLD {
            Intensity::High
        } else if factor >= MEDIUM_THRESHOLD {
            Intensity::Medium
        } else {
            Intensity::Low
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intensity::High => write!(f, "high"),
            Intensity::Medium => write!(f, "medium"),
            Intensity::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum HeatmapError {
    #[error("expected 12 monthly factors, got {0}")]
    WrongLength(usize),

    #[error("factor for {month} is not a finite number")]
    NotFinite { month: &'static str },
}

/// Twelve monthly demand factors, January first
#[derive(Debug, Clone)]
pub struct SeasonalHeatmap {
    factors: [f64; 12],
}

impl SeasonalHeatmap {
    pub fn new(factors: &[f64]) -> Result<Self, HeatmapError> {
        let factors: [f64; 12] = factors
            .try_into()
            .map_err(|_| HeatmapError::WrongLength(factors.len()))?;
        if let Some(i) = factors.iter().position(|f| !f.is_finite()) {
            return Err(HeatmapError::NotFinite { month: MONTHS[i] });
        }
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[f64; 12] {
        &self.factors
    }

    pub fn cells(&self) -> impl Iterator<Item = (&'static str, f64, Intensity)> + '_ {
        MONTHS
            .iter()
            .zip(self.factors.iter())
            .map(|(m, f)| (*m, *f, Intensity::classify(*f)))
    }

    /// Months classified high, in calendar order
    pub fn peak_months(&self) -> Vec<&'static str> {
        self.cells()
            .filter(|(_, _, i)| *i == Intensity::High)
            .map(|(m, _, _)| m)
            .collect()
    }

    /// Two lines: month headers, then one colored cell per month
    pub fn render(&self) -> String {
        let header: Vec<String> = MONTHS.iter().map(|m| format!("{:>5}", m)).collect();
        let cells: Vec<String> = self
            .cells()
            .map(|(_, f, intensity)| {
                let text = format!("{:>5.2}", f);
                match intensity {
                    Intensity::High => style(text).red().bold().to_string(),
                    Intensity::Medium => style(text).yellow().to_string(),
                    Intensity::Low => style(text).dim().to_string(),
                }
            })
            .collect();
        format!("{}\n{}", header.join(" "), cells.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(Intensity::classify(1.2), Intensity::High);
        assert_eq!(Intensity::classify(0.8), Intensity::Medium);
        assert_eq!(Intensity::classify(0.79999), Intensity::Low);
        assert_eq!(Intensity::classify(1.19999), Intensity::Medium);
        assert_eq!(Intensity::classify(0.0), Intensity::Low);
    }

    #[test]
    fn test_requires_twelve_factors() {
        assert_eq!(
            SeasonalHeatmap::new(&[1.0; 11]).unwrap_err(),
            HeatmapError::WrongLength(11)
        );
        let mut factors = [1.0; 12];
        factors[3] = f64::NAN;
        assert_eq!(
            SeasonalHeatmap::new(&factors).unwrap_err(),
            HeatmapError::NotFinite { month: "Apr" }
        );
    }

    #[test]
    fn test_peak_months_and_render() {
        let mut factors = [1.0; 12];
        factors[4] = 1.5;
        factors[5] = 1.2;
        let map = SeasonalHeatmap::new(&factors).unwrap();

        assert_eq!(map.peak_months(), vec!["May", "Jun"]);
        let rendered = map.render();
        assert!(rendered.starts_with("  Jan"));
        assert!(rendered.contains("1.50"));
        assert_eq!(rendered.lines().count(), 2);
    }
}
