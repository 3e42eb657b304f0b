//! Metric extraction from raw kernel console output.
//!
//! Each expected label must split the output into exactly two meaningful
//! segments, and the segment after the label must start with a `: <number>`
//! token. Anything else is a hard failure: a misread value would silently
//! skew every comparison built on the result file.

use crate::error::{BenchError, RunSpec};
use regex::Regex;
use thiserror::Error;

/// The number must end at whitespace, `,`, `;` or end of text; `1.5e-05` is not cut to `1.5`.
const VALUE_PATTERN: &str = r"^\s*:\s*([0-9]+(?:\.[0-9]+)?)(?:[\s,;]|$)";

#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("could not find stat '{label}'")]
    StatNotFound { label: String },
    #[error("stat '{label}' split output into {segments} segments")]
    AmbiguousStat { label: String, segments: usize },
    #[error("stat '{label}' is not followed by a numeric value")]
    MalformedStat { label: String },
}

impl ExtractError {
    pub fn at(self, point: RunSpec) -> BenchError {
        match self {
            ExtractError::StatNotFound { label } => BenchError::StatNotFound { point, label },
            ExtractError::AmbiguousStat { label, segments } => BenchError::AmbiguousStat {
                point,
                label,
                segments,
            },
            ExtractError::MalformedStat { label } => BenchError::MalformedStat { point, label },
        }
    }
}

pub struct MetricExtractor {
    value_pattern: Regex,
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricExtractor {
    pub fn new() -> Self {
        Self {
            // VALUE_PATTERN is a constant literal.
            value_pattern: Regex::new(VALUE_PATTERN).unwrap_or_else(|_| unreachable!()),
        }
    }

    /// Extract every label in order. An empty label set yields no stats.
    pub fn extract(&self, raw: &str, labels: &[String]) -> Result<Vec<Stat>, ExtractError> {
        labels
            .iter()
            .map(|label| {
                self.extract_one(raw, label).map(|value| Stat {
                    label: label.clone(),
                    value,
                })
            })
            .collect()
    }

    pub fn extract_one(&self, raw: &str, label: &str) -> Result<f64, ExtractError> {
        if label.is_empty() || !raw.contains(label) {
            return Err(ExtractError::StatNotFound {
                label: label.to_string(),
            });
        }

        let segments: Vec<&str> = raw
            .split(label)
            .filter(|segment| !segment.trim().is_empty())
            .collect();
        match segments.len() {
            2 => {}
            n if n > 2 => {
                return Err(ExtractError::AmbiguousStat {
                    label: label.to_string(),
                    segments: n,
                })
            }
            _ => {
                return Err(ExtractError::StatNotFound {
                    label: label.to_string(),
                })
            }
        }

        let malformed = || ExtractError::MalformedStat {
            label: label.to_string(),
        };
        let captures = self.value_pattern.captures(segments[1]).ok_or_else(malformed)?;
        captures[1].parse::<f64>().map_err(|_| malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDUCE_OUTPUT: &str = "Parallel Research Kernels version 2.17\n\
        MPI Vector Reduction\n\
        Number of ranks          = 4\n\
        Solution validates\n\
        Rate (MFlops/s): 1532.417000  Avg time (s): 0.020875\n";

    fn labels(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_labels_in_order() {
        let extractor = MetricExtractor::new();
        let stats = extractor
            .extract(REDUCE_OUTPUT, &labels(&["Rate (MFlops/s)", "Avg time (s)"]))
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "Rate (MFlops/s)");
        assert!((stats[0].value - 1532.417).abs() < 1e-9);
        assert!((stats[1].value - 0.020875).abs() < 1e-12);
    }

    #[test]
    fn test_label_twice_with_blank_between() {
        let extractor = MetricExtractor::new();
        let raw = "summary Avg time (s) \nAvg time (s): 123.45\n";
        assert_eq!(extractor.extract_one(raw, "Avg time (s)").unwrap(), 123.45);
    }

    #[test]
    fn test_integer_value() {
        let extractor = MetricExtractor::new();
        assert_eq!(extractor.extract_one("done. Rate (MB/s): 42 ok", "Rate (MB/s)").unwrap(), 42.0);
    }

    #[test]
    fn test_missing_label() {
        let extractor = MetricExtractor::new();
        let err = extractor
            .extract(REDUCE_OUTPUT, &labels(&["Rate (MFlops/s)", "Rate (GUPS/s)"]))
            .unwrap_err();
        assert_eq!(
            err,
            ExtractError::StatNotFound {
                label: "Rate (GUPS/s)".into()
            }
        );
    }

    #[test]
    fn test_label_without_leading_text_not_found() {
        let extractor = MetricExtractor::new();
        let err = extractor.extract_one("Time (s): 1.0", "Time (s)").unwrap_err();
        assert!(matches!(err, ExtractError::StatNotFound { .. }));
    }

    #[test]
    fn test_repeated_label_is_ambiguous() {
        let extractor = MetricExtractor::new();
        let raw = "run 1 Time (s): 1.0\nrun 2 Time (s): 2.0\nrun 3 Time (s): 3.0\n";
        let err = extractor.extract_one(raw, "Time (s)").unwrap_err();
        assert_eq!(
            err,
            ExtractError::AmbiguousStat {
                label: "Time (s)".into(),
                segments: 4
            }
        );
    }

    #[test]
    fn test_non_numeric_value_is_malformed() {
        let extractor = MetricExtractor::new();
        let err = extractor
            .extract_one("ERROR: Rate (MB/s): nan\n", "Rate (MB/s)")
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedStat { .. }));
    }

    #[test]
    fn test_partially_numeric_value_is_malformed() {
        let extractor = MetricExtractor::new();
        for raw in [
            "PRK\nAvg time (s): 1.5e-05\n",
            "PRK\nAvg time (s): 1500.0.3\n",
            "PRK\nAvg time (s): 12ms\n",
        ] {
            let err = extractor.extract_one(raw, "Avg time (s)").unwrap_err();
            assert!(matches!(err, ExtractError::MalformedStat { .. }), "raw={raw:?}");
        }
        assert_eq!(
            extractor.extract_one("PRK Avg time (s): 0.25, done", "Avg time (s)").unwrap(),
            0.25
        );
        assert_eq!(extractor.extract_one("PRK Avg time (s): 7", "Avg time (s)").unwrap(), 7.0);
    }

    #[test]
    fn test_no_labels_is_noop() {
        let extractor = MetricExtractor::new();
        assert!(extractor.extract("anything at all", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_error_attaches_point() {
        let point = RunSpec {
            kernel: "reduce".into(),
            world_size: 2,
            run: 1,
        };
        let err = ExtractError::StatNotFound {
            label: "Avg time (s)".into(),
        }
        .at(point.clone());
        assert!(matches!(err, BenchError::StatNotFound { .. }));
        assert_eq!(err.point(), Some(&point));
    }
}
