//! Evaluation corpus builder and benchmark harness for the `optift`
//! font-subsetting optimizer.
//!
//! The pipeline turns translated documentation archives into
//! style-partitioned CJK codepoint corpora, hands them to the optimizer as
//! JSON manifests, sweeps it across partition counts, and aggregates its
//! report output into chart-ready series:
//!
//! archive → markdown → HTML → [`StyleAwareExtractor`] → corpus →
//! [`Manifest`] → [`BenchmarkRunner`] → [`ResultParser`] → [`Aggregator`]
//!
//! # Example
//!
//! ```rust,no_run
//! use optift_eval::{
//!     attach_fonts, BenchmarkSweep, CorpusAssembler, FontFamily, SweepConfig,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), optift_eval::EvalError> {
//! let archive = optift_eval::fetch_archive("https://example.com/docs.zip").await?;
//! let corpus = CorpusAssembler::new()
//!     .assemble_from_zip(&archive, "docs-main/src/")
//!     .await?;
//!
//! let family = FontFamily::new("NotoSansSC", "ttf", "noto_sans_sc");
//! let manifest = attach_fonts(Path::new("fonts"), &family, corpus)?;
//! optift_eval::write_manifest(Path::new("fonts_docs_noto_sans_sc.json"), &manifest)?;
//!
//! let sweep = BenchmarkSweep::new(SweepConfig::new("build/optift", "output"));
//! let results = sweep
//!     .run_once(Path::new("fonts_docs_noto_sans_sc.json"), 10)
//!     .await?;
//! println!("{results:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod baseline;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod report;
pub mod runner;
pub mod style;
pub mod sweep;

pub use crate::{
    baseline::{
        fetch_stylesheet, parse_unicode_ranges, render_partition_table, write_baseline_table,
        BaselinePartition, DEFAULT_STYLESHEET_URL, DESKTOP_CHROME_UA,
    },
    corpus::{
        default_sources, fetch_archive, markdown_documents_from_zip, render_markdown,
        CorpusAssembler, CorpusEntry, CorpusSource, WeightedDocument,
    },
    error::{EvalError, Result},
    extract::{is_cjk, StyleAwareExtractor, StyleCodepoints, StyleTransitions},
    manifest::{
        attach_fonts, default_families, manifest_file_name, manifest_paths, remove_manifest,
        write_manifest, FontCss, FontFamily, FontManifest, FontVariantRef, Manifest,
    },
    report::{parse_size, BenchmarkResult, ResultParser},
    runner::{BenchmarkRunner, RunOutput},
    style::Style,
    sweep::{
        chart_url, family_label, Aggregator, BenchmarkSweep, SweepConfig,
        DEFAULT_PARTITION_COUNTS,
    },
};
