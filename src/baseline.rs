//! Baseline codepoint partitions from a served stylesheet.
//!
//! Production font CDNs split CJK families into many `unicode-range`
//! groups; those groups are the comparison baseline for the optimizer's
//! partitioning. The stylesheet must be fetched with a current desktop
//! browser User-Agent: range subsetting is negotiated on client
//! capability, and a generic client gets an unsubsetted response.

use std::path::Path;

use crate::error::{EvalError, Result};

/// User-Agent presented when fetching the stylesheet. Required, not
/// optional: the server only emits range-subsetted CSS for capable clients.
pub const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Stylesheet the default baseline is built from.
pub const DEFAULT_STYLESHEET_URL: &str =
    "https://fonts.googleapis.com/css2?family=Noto+Sans+SC";

/// One baseline partition: explicit codepoints, sorted ascending.
pub type BaselinePartition = Vec<u32>;

/// Fetches the stylesheet text with the required User-Agent header.
pub async fn fetch_stylesheet(url: &str) -> Result<String> {
    log::info!("fetching stylesheet {url}");
    let client = reqwest::Client::builder()
        .user_agent(DESKTOP_CHROME_UA)
        .build()?;
    let css = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(css)
}

/// Parses every `unicode-range` declaration into an explicit partition.
///
/// Partitions keep declaration order; within one partition, ranges are
/// fully expanded (`U+4E00-4E02` yields three codepoints) and codepoints
/// are sorted ascending.
pub fn parse_unicode_ranges(css: &str) -> Result<Vec<BaselinePartition>> {
    let mut partitions = Vec::new();
    for line in css.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("unicode-range") {
            continue;
        }
        let value = trimmed
            .split_once(':')
            .map(|(_, value)| value)
            .ok_or_else(|| {
                EvalError::MalformedStylesheet(format!("declaration without value: {trimmed}"))
            })?;
        let mut partition = BaselinePartition::new();
        for token in value.trim().trim_end_matches(';').split(',') {
            let range = parse_range_token(token)?;
            partition.extend(range);
        }
        partition.sort_unstable();
        partitions.push(partition);
    }
    Ok(partitions)
}

/// Expands one `U+XXXX` or `U+XXXX-YYYY` token to an inclusive range.
fn parse_range_token(token: &str) -> Result<std::ops::RangeInclusive<u32>> {
    let stripped = token.trim().trim_start_matches("U+").trim_start_matches("u+");
    let parse_hex = |part: &str| {
        u32::from_str_radix(part.trim(), 16).map_err(|_| {
            EvalError::MalformedStylesheet(format!("bad codepoint in range token: {token}"))
        })
    };
    match stripped.split_once('-') {
        Some((lo, hi)) => Ok(parse_hex(lo)?..=parse_hex(hi)?),
        None => {
            let single = parse_hex(stripped)?;
            Ok(single..=single)
        }
    }
}

/// Serializes partitions as a static nested-array initializer table, one
/// inner array per declaration, consumed by the optimizer's baseline mode.
pub fn render_partition_table(partitions: &[BaselinePartition]) -> String {
    let rows: Vec<String> = partitions
        .iter()
        .map(|partition| {
            let codepoints: Vec<String> =
                partition.iter().map(|c| format!("0x{c:x}")).collect();
            format!("{{{}}}", codepoints.join(", "))
        })
        .collect();
    format!(
        "const static std::vector<std::vector<UChar32>> GOOGLE_FONTS_PARTITIONS{{\n    {}\n}};",
        rows.join(",\n    ")
    )
}

/// Fetches, parses, and writes the baseline partition table.
pub async fn write_baseline_table(url: &str, target: &Path) -> Result<()> {
    let css = fetch_stylesheet(url).await?;
    let partitions = parse_unicode_ranges(&css)?;
    log::info!(
        "{} baseline partitions parsed from {url}",
        partitions.len()
    );
    tokio::fs::write(target, render_partition_table(&partitions)).await?;
    Ok(())
}
