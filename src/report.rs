//! Structured parsing of the optimizer's report text.
//!
//! The report interleaves progress output with two line shapes that matter:
//! a marker naming the font file being processed (`font path: <path>`) and
//! a result comparing total cost against the served baseline
//! (`total cost vs Google Fonts :  <after> down from  <before>
//! (<pct>% reduction)`). Results are associated with the nearest preceding
//! marker; a result with no marker before it is a malformed report.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{EvalError, Result};

/// Before/after sizes and reduction for one font file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchmarkResult {
    /// Total size before optimization, in bytes.
    pub size_before: f64,
    /// Total size after optimization, in bytes.
    pub size_after: f64,
    /// Reduction percentage exactly as reported, never recomputed from the
    /// byte values.
    pub reduction_percent: f64,
}

fn result_regex() -> &'static Regex {
    static RESULT_RE: OnceLock<Regex> = OnceLock::new();
    RESULT_RE.get_or_init(|| {
        Regex::new(
            r"total cost vs Google Fonts :\s+(?P<after>\d+\.\d+ [KMG]?B)\s+down from\s+(?P<before>\d+\.\d+ [KMG]?B) \((?P<reduction>\d+\.\d+)% reduction\)",
        )
        .expect("result line regex compiles")
    })
}

fn marker_regex() -> &'static Regex {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    MARKER_RE.get_or_init(|| {
        Regex::new(r"font path: ([\w\-./\\]+)").expect("marker line regex compiles")
    })
}

/// Converts a `<float> <unit>` size string to bytes (binary multipliers).
pub fn parse_size(size: &str) -> Result<f64> {
    let (value, unit) = size.trim().split_once(' ').ok_or_else(|| {
        EvalError::MalformedReport(format!("size without unit: {size:?}"))
    })?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| EvalError::MalformedReport(format!("unparsable size value: {size:?}")))?;
    let multiplier = match unit.trim() {
        "B" => 1.0,
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        other => {
            return Err(EvalError::MalformedReport(format!(
                "unknown size unit: {other:?}"
            )))
        }
    };
    Ok(value * multiplier)
}

/// Extracts per-font results from a captured report.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultParser;

impl ResultParser {
    /// Parser for the documented report line shapes.
    pub fn new() -> Self {
        Self
    }

    /// Parses the report, keyed by the marker path's base name.
    ///
    /// Result lines are scanned in order; each associates with the last
    /// marker between the previous result and itself. Markers without a
    /// following result are skipped (the optimizer logs a marker for every
    /// font it touches, results only for compared fonts).
    pub fn parse(&self, report: &str) -> Result<BTreeMap<String, BenchmarkResult>> {
        let mut results = BTreeMap::new();
        let mut window_start = 0;
        for captures in result_regex().captures_iter(report) {
            let whole = captures.get(0).ok_or_else(|| {
                EvalError::MalformedReport("result match without text".to_string())
            })?;
            let window = &report[window_start..whole.start()];
            let font_path = marker_regex()
                .captures_iter(window)
                .last()
                .and_then(|marker| marker.get(1))
                .map(|group| group.as_str())
                .ok_or_else(|| {
                    EvalError::MalformedReport(
                        "result line with no preceding font marker".to_string(),
                    )
                })?;
            let font_name = Path::new(font_path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| font_path.to_string());

            let reduction_percent: f64 = captures["reduction"].parse().map_err(|_| {
                EvalError::MalformedReport(format!(
                    "unparsable reduction percentage for {font_name}"
                ))
            })?;
            results.insert(
                font_name,
                BenchmarkResult {
                    size_before: parse_size(&captures["before"])?,
                    size_after: parse_size(&captures["after"])?,
                    reduction_percent,
                },
            );
            window_start = whole.start();
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < EPSILON
    }

    #[test]
    fn size_strings_use_binary_multipliers() {
        assert!(close(parse_size("381.22 KB").expect("parse"), 390_369.28));
        assert!(close(parse_size("825.11 KB").expect("parse"), 844_912.64));
        assert!(close(parse_size("1.00 MB").expect("parse"), 1_048_576.0));
        assert!(close(parse_size("512.00 B").expect("parse"), 512.0));
        assert!(close(parse_size("2.00 GB").expect("parse"), 2.0 * 1024.0 * 1024.0 * 1024.0));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(matches!(
            parse_size("1.00 TB"),
            Err(EvalError::MalformedReport(_))
        ));
        assert!(matches!(parse_size("1.00"), Err(EvalError::MalformedReport(_))));
    }

    #[test]
    fn result_associates_with_nearest_preceding_marker() {
        let report = "\
[info] font path: fonts/a.ttf (120 codepoints used)
[info] partitioning done
[info] total cost vs Google Fonts :  381.22 KB down from  825.11 KB (53.80% reduction)
[info] font path: fonts/b.ttf (80 codepoints used)
[info] total cost vs Google Fonts :  100.00 KB down from  400.00 KB (75.00% reduction)
";
        let results = ResultParser::new().parse(report).expect("parse report");
        assert_eq!(results.len(), 2);
        assert!(close(results["a.ttf"].reduction_percent, 53.80));
        assert!(close(results["a.ttf"].size_after, 381.22 * 1024.0));
        assert!(close(results["a.ttf"].size_before, 825.11 * 1024.0));
        assert!(close(results["b.ttf"].reduction_percent, 75.00));
    }

    #[test]
    fn marker_without_result_is_skipped() {
        let report = "\
font path: skipped.ttf (0 codepoints used)
font path: kept.ttf (10 codepoints used)
total cost vs Google Fonts :  1.00 MB down from  2.00 MB (50.00% reduction)
";
        let results = ResultParser::new().parse(report).expect("parse report");
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("kept.ttf"));
    }

    #[test]
    fn result_without_marker_is_fatal() {
        let report =
            "total cost vs Google Fonts :  1.00 MB down from  2.00 MB (50.00% reduction)\n";
        let err = ResultParser::new().parse(report).expect_err("no marker");
        assert!(matches!(err, EvalError::MalformedReport(_)));
    }

    #[test]
    fn reduction_is_taken_verbatim_not_recomputed() {
        // 53.80% does not exactly equal 1 - 381.22/825.11; the report's own
        // figure wins.
        let report = "\
font path: a.ttf
total cost vs Google Fonts :  381.22 KB down from  825.11 KB (53.80% reduction)
";
        let results = ResultParser::new().parse(report).expect("parse report");
        assert!(close(results["a.ttf"].reduction_percent, 53.80));
    }

    #[test]
    fn progress_noise_between_lines_is_ignored() {
        let report = "\
loading manifest
font path: out/NotoSansSC-Regular.ttf (2913 codepoints used)
[00:00:01] partition 1/10
[00:00:02] partition 10/10
total cost vs Google Fonts :  381.22 KB down from  825.11 KB (53.80% reduction)
";
        let results = ResultParser::new().parse(report).expect("parse report");
        assert!(results.contains_key("NotoSansSC-Regular.ttf"));
    }
}
