//! Partition-count sweeps and chart-ready aggregation.
//!
//! A sweep invokes the optimizer once per (manifest, partition count) pair
//! and folds the parsed results into one bar-chart specification: one
//! baseline series (total size before optimization) plus one series per
//! swept partition count, with font families as categories. The first
//! failed invocation aborts the remaining sweep.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde_json::json;

use crate::error::{EvalError, Result};
use crate::manifest::FontFamily;
use crate::report::{BenchmarkResult, ResultParser};
use crate::runner::BenchmarkRunner;

/// Partition counts swept by default.
pub const DEFAULT_PARTITION_COUNTS: &[u32] = &[1, 10, 15, 20, 25];

const BASELINE_COLOR: &str = "rgb(66, 133, 244)";
const SERIES_COLORS: &[&str] = &[
    "rgb(244, 180, 0)",
    "rgb(52, 211, 153)",
    "rgb(16, 185, 129)",
    "rgb(5, 150, 105)",
    "rgb(4, 136, 87)",
];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Everything needed to drive one sweep.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// Path to the optimizer binary.
    pub optimizer: PathBuf,
    /// Directory the optimizer writes partitioned fonts into.
    pub output_dir: PathBuf,
    /// Partition counts to sweep, in chart series order.
    pub partition_counts: Vec<u32>,
    /// Pass `--compare-baseline` to the optimizer.
    pub compare_baseline: bool,
    /// Pass `--compare-google` to the optimizer.
    pub compare_google: bool,
}

impl SweepConfig {
    /// Config with the default partition counts and both comparisons on.
    pub fn new(optimizer: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            optimizer: optimizer.into(),
            output_dir: output_dir.into(),
            partition_counts: DEFAULT_PARTITION_COUNTS.to_vec(),
            compare_baseline: true,
            compare_google: true,
        }
    }

    /// Replaces the swept partition counts.
    #[must_use]
    pub fn partition_counts(mut self, counts: Vec<u32>) -> Self {
        self.partition_counts = counts;
        self
    }
}

/// Sums per-font results into chart series, one point per family.
#[derive(Clone, Debug)]
pub struct Aggregator {
    partition_counts: Vec<u32>,
    labels: Vec<String>,
    baseline_mb: Vec<f64>,
    per_count_mb: Vec<Vec<f64>>,
}

impl Aggregator {
    /// Aggregator for the given partition counts, in sweep order.
    pub fn new(partition_counts: &[u32]) -> Self {
        Self {
            partition_counts: partition_counts.to_vec(),
            labels: Vec::new(),
            baseline_mb: Vec::new(),
            per_count_mb: vec![Vec::new(); partition_counts.len()],
        }
    }

    /// Folds one family's per-partition-count results into the series.
    ///
    /// The baseline point sums every font's before-size from the first
    /// partition count processed; every count (including the first)
    /// contributes an after-size point.
    pub fn record_family(
        &mut self,
        label: impl Into<String>,
        per_partition: &[BTreeMap<String, BenchmarkResult>],
    ) -> Result<()> {
        if per_partition.len() != self.partition_counts.len() {
            return Err(EvalError::Aggregation(format!(
                "expected {} result sets for a family, got {}",
                self.partition_counts.len(),
                per_partition.len()
            )));
        }
        for (index, results) in per_partition.iter().enumerate() {
            if index == 0 {
                let before: f64 = results.values().map(|r| r.size_before).sum();
                self.baseline_mb.push(before / BYTES_PER_MB);
            }
            let after: f64 = results.values().map(|r| r.size_after).sum();
            self.per_count_mb[index].push(after / BYTES_PER_MB);
        }
        self.labels.push(label.into());
        Ok(())
    }

    /// Category labels recorded so far, in sweep order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Baseline series points (MB), one per family.
    pub fn baseline_mb(&self) -> &[f64] {
        &self.baseline_mb
    }

    /// Series points (MB) for the partition count at `index`.
    pub fn series_mb(&self, index: usize) -> Option<&[f64]> {
        self.per_count_mb.get(index).map(Vec::as_slice)
    }

    /// Bar-chart specification: categories are families, one series per
    /// configuration, declared in sweep order.
    pub fn chart_config(&self) -> serde_json::Value {
        let mut datasets = vec![json!({
            "label": "Google Fonts",
            "data": self.baseline_mb,
            "backgroundColor": BASELINE_COLOR,
        })];
        for (index, data) in self.per_count_mb.iter().enumerate() {
            datasets.push(json!({
                "label": series_label(self.partition_counts[index]),
                "data": data,
                "backgroundColor": SERIES_COLORS[index % SERIES_COLORS.len()],
            }));
        }
        json!({
            "type": "bar",
            "options": {
                "plugins": { "title": { "display": true, "text": "Font size reduction" } },
                "scales": {
                    "xAxes": [{
                        "ticks": { "autoSkip": false, "maxRotation": 0, "minRotation": 0 },
                        "scaleLabel": { "display": true, "labelString": "Font family" },
                    }],
                    "yAxes": [{
                        "ticks": { "beginAtZero": true },
                        "scaleLabel": {
                            "display": true,
                            "labelString": "Avg bytes loaded on uncached page visit (MB)",
                        },
                    }],
                },
            },
            "data": { "labels": self.labels, "datasets": datasets },
        })
    }

    /// Chart-service request URL for [`Self::chart_config`].
    pub fn chart_url(&self) -> String {
        chart_url(&self.chart_config())
    }
}

fn series_label(partitions: u32) -> String {
    if partitions > 1 {
        format!("OptIFT {partitions} partitions")
    } else {
        "OptIFT no partitioning".to_string()
    }
}

/// `encodeURIComponent` set: everything except alphanumerics and
/// `- _ . ! ~ * ' ( )`.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Serializes a chart config with unquoted object keys and URL-encodes it
/// into a chart-service request.
pub fn chart_url(config: &serde_json::Value) -> String {
    static UNQUOTE_RE: OnceLock<Regex> = OnceLock::new();
    let unquote =
        UNQUOTE_RE.get_or_init(|| Regex::new(r#""(\w+)"\s*:"#).expect("key regex compiles"));
    let serialized = config.to_string();
    let unquoted = unquote.replace_all(&serialized, "${1}:");
    format!(
        "https://quickchart.io/chart?height=400&c={}",
        utf8_percent_encode(&unquoted, URL_COMPONENT)
    )
}

/// Prettified chart category for a family prefix: the first `-…` suffix
/// and a trailing `sc` are stripped, then the camel-case runs are split
/// into capitalized words (`NotoSansSC` → `Noto Sans`).
pub fn family_label(prefix: &str) -> String {
    let base = prefix.split('-').next().unwrap_or(prefix);
    let base = if base.len() >= 2 && base[base.len() - 2..].eq_ignore_ascii_case("sc") {
        &base[..base.len() - 2]
    } else {
        base
    };
    capital_case(base)
}

fn capital_case(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (index, &c) in chars.iter().enumerate() {
        let after_lower = index > 0 && chars[index - 1].is_lowercase();
        let upper_run_end = index > 0
            && chars[index - 1].is_uppercase()
            && chars.get(index + 1).is_some_and(|next| next.is_lowercase());
        if c.is_uppercase() && (after_lower || upper_run_end) && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|word| {
            let mut cased = String::with_capacity(word.len());
            for (index, c) in word.chars().enumerate() {
                if index == 0 {
                    cased.extend(c.to_uppercase());
                } else {
                    cased.extend(c.to_lowercase());
                }
            }
            cased
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drives the optimizer across manifests and partition counts.
#[derive(Clone, Debug)]
pub struct BenchmarkSweep {
    runner: BenchmarkRunner,
    parser: ResultParser,
    partition_counts: Vec<u32>,
    output_dir: PathBuf,
}

impl BenchmarkSweep {
    /// Sweep driver for the given configuration.
    pub fn new(config: SweepConfig) -> Self {
        let runner = BenchmarkRunner::new(config.optimizer)
            .compare_baseline(config.compare_baseline)
            .compare_google(config.compare_google);
        Self {
            runner,
            parser: ResultParser::new(),
            partition_counts: config.partition_counts,
            output_dir: config.output_dir,
        }
    }

    /// The swept partition counts, in series order.
    pub fn partition_counts(&self) -> &[u32] {
        &self.partition_counts
    }

    /// One optimizer invocation, parsed.
    pub async fn run_once(
        &self,
        manifest: &Path,
        partitions: u32,
    ) -> Result<BTreeMap<String, BenchmarkResult>> {
        let output = self.runner.run(manifest, &self.output_dir, partitions).await?;
        self.parser.parse(&output.stdout)
    }

    /// Runs every partition count against one manifest, in order.
    pub async fn run_family(
        &self,
        manifest: &Path,
    ) -> Result<Vec<BTreeMap<String, BenchmarkResult>>> {
        let mut per_partition = Vec::with_capacity(self.partition_counts.len());
        for &count in &self.partition_counts {
            per_partition.push(self.run_once(manifest, count).await?);
        }
        Ok(per_partition)
    }

    /// Full sweep across families; any failure aborts the remainder.
    pub async fn sweep(&self, manifests: &[(FontFamily, PathBuf)]) -> Result<Aggregator> {
        let mut aggregator = Aggregator::new(&self.partition_counts);
        for (family, manifest) in manifests {
            let per_partition = self.run_family(manifest).await?;
            aggregator.record_family(family_label(&family.prefix), &per_partition)?;
        }
        Ok(aggregator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(before: f64, after: f64) -> BenchmarkResult {
        BenchmarkResult {
            size_before: before,
            size_after: after,
            reduction_percent: 0.0,
        }
    }

    fn family_results(sets: &[&[(&str, f64, f64)]]) -> Vec<BTreeMap<String, BenchmarkResult>> {
        sets.iter()
            .map(|fonts| {
                fonts
                    .iter()
                    .map(|&(name, before, after)| (name.to_string(), result(before, after)))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn baseline_sums_before_sizes_from_the_first_count_only() {
        let mut aggregator = Aggregator::new(&[1, 10]);
        let per_partition = family_results(&[
            &[
                ("Demo-Regular.ttf", 2.0 * BYTES_PER_MB, 1.0 * BYTES_PER_MB),
                ("Demo-Bold.ttf", 1.0 * BYTES_PER_MB, 0.5 * BYTES_PER_MB),
            ],
            &[
                ("Demo-Regular.ttf", 99.0 * BYTES_PER_MB, 0.75 * BYTES_PER_MB),
                ("Demo-Bold.ttf", 99.0 * BYTES_PER_MB, 0.25 * BYTES_PER_MB),
            ],
        ]);
        aggregator
            .record_family("Demo", &per_partition)
            .expect("record family");

        assert_eq!(aggregator.baseline_mb(), &[3.0]);
        assert_eq!(aggregator.series_mb(0).expect("series 0"), &[1.5]);
        assert_eq!(aggregator.series_mb(1).expect("series 1"), &[1.0]);
    }

    #[test]
    fn mismatched_result_set_count_is_rejected() {
        let mut aggregator = Aggregator::new(&[1, 10]);
        let per_partition = family_results(&[&[("Demo.ttf", 1.0, 1.0)]]);
        assert!(aggregator.record_family("Demo", &per_partition).is_err());
    }

    #[test]
    fn chart_declares_baseline_then_one_series_per_count() {
        let mut aggregator = Aggregator::new(&[1, 10, 15]);
        let per_partition = family_results(&[
            &[("A.ttf", BYTES_PER_MB, BYTES_PER_MB)],
            &[("A.ttf", BYTES_PER_MB, BYTES_PER_MB)],
            &[("A.ttf", BYTES_PER_MB, BYTES_PER_MB)],
        ]);
        aggregator
            .record_family("Noto Sans", &per_partition)
            .expect("record family");

        let config = aggregator.chart_config();
        let datasets = config["data"]["datasets"].as_array().expect("datasets");
        assert_eq!(datasets.len(), 4);
        assert_eq!(datasets[0]["label"], "Google Fonts");
        assert_eq!(datasets[1]["label"], "OptIFT no partitioning");
        assert_eq!(datasets[2]["label"], "OptIFT 10 partitions");
        assert_eq!(datasets[3]["label"], "OptIFT 15 partitions");
        assert_eq!(config["data"]["labels"][0], "Noto Sans");
        assert_eq!(config["type"], "bar");
    }

    #[test]
    fn chart_url_unquotes_keys_and_encodes_the_payload() {
        let url = chart_url(&json!({ "type": "bar", "data": { "labels": ["A"] } }));
        assert!(url.starts_with("https://quickchart.io/chart?height=400&c=%7B"));
        // `"type":` became `type:` before encoding.
        assert!(url.contains("type%3A%22bar%22"));
        assert!(!url.contains("%22type%22"));
    }

    #[test]
    fn family_labels_match_chart_categories() {
        assert_eq!(family_label("NotoSansSC"), "Noto Sans");
        assert_eq!(family_label("NotoSerifSC"), "Noto Serif");
        assert_eq!(family_label("SourceHanSansSC"), "Source Han Sans");
        assert_eq!(family_label("SmileySans-Oblique"), "Smiley Sans");
        assert_eq!(family_label("LXGWWenKai-Regular"), "Lxgw Wen Kai");
    }
}
