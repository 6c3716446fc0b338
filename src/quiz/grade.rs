//! Percentage to letter-grade banding.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradeBand {
    /// Lowest percentage (inclusive) that earns `label`.
    pub min_percent: f64,
    pub label: String,
}

/// Ascending threshold table; the highest band whose threshold is reached
/// wins.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradeTable {
    bands: Vec<GradeBand>,
}

#[derive(Debug, Error, PartialEq)]
pub enum GradeTableError {
    #[error("grade table is empty")]
    Empty,
    #[error("malformed band {0:?}, expected `min:label`")]
    Malformed(String),
    #[error("thresholds must be strictly ascending (at {0:?})")]
    NotAscending(String),
}

impl Default for GradeTable {
    fn default() -> Self {
        let bands = [
            (0.0, "F"),
            (55.0, "C"),
            (60.0, "C+"),
            (70.0, "B"),
            (75.0, "B+"),
            (85.0, "A"),
            (90.0, "A+"),
        ];
        Self {
            bands: bands
                .into_iter()
                .map(|(min_percent, label)| GradeBand {
                    min_percent,
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

impl GradeTable {
    pub fn new(bands: Vec<GradeBand>) -> Result<Self, GradeTableError> {
        if bands.is_empty() {
            return Err(GradeTableError::Empty);
        }
        for pair in bands.windows(2) {
            if pair[1].min_percent <= pair[0].min_percent {
                return Err(GradeTableError::NotAscending(pair[1].label.clone()));
            }
        }
        Ok(Self { bands })
    }

    /// Label for `percent`; anything under the first threshold gets the
    /// lowest band.
    pub fn grade(&self, percent: f64) -> &str {
        self.bands
            .iter()
            .rev()
            .find(|band| percent >= band.min_percent)
            .or_else(|| self.bands.first())
            .map(|band| band.label.as_str())
            .unwrap_or("—")
    }

    /// Position of `percent`'s band, lowest first.
    pub fn rank(&self, percent: f64) -> usize {
        self.bands
            .iter()
            .rposition(|band| percent >= band.min_percent)
            .unwrap_or(0)
    }
}

impl FromStr for GradeTable {
    type Err = GradeTableError;

    /// Parses `0:F,55:C,60:C+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bands = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (min, label) = part
                    .split_once(':')
                    .ok_or_else(|| GradeTableError::Malformed(part.to_string()))?;
                let min_percent = min
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| GradeTableError::Malformed(part.to_string()))?;
                let label = label.trim();
                if label.is_empty() {
                    return Err(GradeTableError::Malformed(part.to_string()));
                }
                Ok(GradeBand {
                    min_percent,
                    label: label.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(bands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_boundaries() {
        let table = GradeTable::default();
        assert_eq!(table.grade(0.0), "F");
        assert_eq!(table.grade(54.99), "F");
        assert_eq!(table.grade(55.0), "C");
        assert_eq!(table.grade(69.9), "C+");
        assert_eq!(table.grade(74.0), "B");
        assert_eq!(table.grade(84.0), "B+");
        assert_eq!(table.grade(89.99), "A");
        assert_eq!(table.grade(90.0), "A+");
        assert_eq!(table.grade(130.0), "A+");
        assert_eq!(table.grade(-5.0), "F");
    }

    #[test]
    fn higher_percent_never_ranks_lower() {
        let table = GradeTable::default();
        let mut previous = 0;
        for tenth in 0..=1100 {
            let rank = table.rank(f64::from(tenth) / 10.0);
            assert!(rank >= previous);
            previous = rank;
        }
    }

    #[test]
    fn parses_custom_table() {
        let table: GradeTable = "0:2, 50:3, 70:4, 86:5".parse().unwrap();
        assert_eq!(table.grade(49.0), "2");
        assert_eq!(table.grade(86.0), "5");
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!("".parse::<GradeTable>(), Err(GradeTableError::Empty));
        assert!(matches!("0:F,x:A".parse::<GradeTable>(), Err(GradeTableError::Malformed(_))));
        assert!(matches!(
            "0:F,50:C,40:B".parse::<GradeTable>(),
            Err(GradeTableError::NotAscending(_))
        ));
    }
}
