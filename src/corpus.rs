//! Corpus assembly: weighted documents to per-style codepoint strings.
//!
//! Documentation arrives as a zip archive of markdown files. Each matching
//! entry is rendered to HTML, walked by the [`StyleAwareExtractor`], and
//! collapsed into one weighted corpus entry keyed by its archive path.
//! Per-entry conversion tasks run concurrently and are joined with a barrier
//! before the corpus is considered complete; the entry count is bounded by a
//! real documentation tree, so the fan-out is unbounded.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::extract::{StyleAwareExtractor, StyleTransitions};
use crate::style::Style;

/// A document with a relevance weight.
///
/// The weight defaults to 1.0 and is currently passed through unused,
/// reserved for future relevance weighting.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedDocument {
    /// Relevance weight, ≥ 0.
    pub weight: f64,
    /// Markdown source text.
    pub content: String,
}

impl WeightedDocument {
    /// Document with the default weight of 1.0.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            weight: 1.0,
            content: content.into(),
        }
    }

    /// Document with an explicit weight.
    pub fn with_weight(weight: f64, content: impl Into<String>) -> Self {
        Self {
            weight,
            content: content.into(),
        }
    }
}

/// One assembled corpus entry: the document's weight plus its per-style
/// codepoint strings (first-seen order preserved).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Relevance weight carried over from the source document.
    pub weight: f64,
    /// Style → collapsed codepoint string. Styles with no matches are absent.
    pub codepoints: BTreeMap<Style, String>,
}

/// A remote documentation archive to build a corpus from.
#[derive(Clone, Debug)]
pub struct CorpusSource {
    /// Short name used in manifest file names (e.g. `vue`).
    pub name: String,
    /// URL of the zip archive.
    pub archive_url: String,
    /// Archive path prefix selecting the documentation tree.
    pub entry_prefix: String,
}

impl CorpusSource {
    /// Source with the given name, archive URL, and entry prefix.
    pub fn new(
        name: impl Into<String>,
        archive_url: impl Into<String>,
        entry_prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            archive_url: archive_url.into(),
            entry_prefix: entry_prefix.into(),
        }
    }
}

/// The translated documentation trees used by the default evaluation corpus.
pub fn default_sources() -> Vec<CorpusSource> {
    vec![
        CorpusSource::new(
            "vue",
            "https://github.com/vuejs-translations/docs-zh-cn/archive/refs/heads/main.zip",
            "docs-zh-cn-main/src/",
        ),
        CorpusSource::new(
            "react",
            "https://github.com/reactjs/zh-hans.react.dev/archive/refs/heads/main.zip",
            "zh-hans.react.dev-main/src/content/",
        ),
    ]
}

/// Renders markdown to HTML with tables and strikethrough enabled.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Turns weighted markdown documents into per-style codepoint corpora.
#[derive(Clone, Debug, Default)]
pub struct CorpusAssembler {
    extractor: StyleAwareExtractor,
}

impl CorpusAssembler {
    /// Assembler with the default style transitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler with a custom transition table.
    pub fn with_transitions(transitions: StyleTransitions) -> Self {
        Self {
            extractor: StyleAwareExtractor::with_transitions(transitions),
        }
    }

    /// Renders one document and collapses its extracted codepoints.
    pub fn entry(&self, document: &WeightedDocument) -> Result<CorpusEntry> {
        let rendered = render_markdown(&document.content);
        let styles = self.extractor.extract(&rendered)?;
        let codepoints = styles
            .into_iter()
            .map(|(style, chars)| (style, chars.into_iter().collect::<String>()))
            .collect();
        Ok(CorpusEntry {
            weight: document.weight,
            codepoints,
        })
    }

    /// Assembles a full corpus, preserving document identifiers.
    pub fn assemble(
        &self,
        documents: BTreeMap<String, WeightedDocument>,
    ) -> Result<BTreeMap<String, CorpusEntry>> {
        documents
            .into_iter()
            .map(|(id, document)| Ok((id, self.entry(&document)?)))
            .collect()
    }

    /// Assembles a corpus from an in-memory zip archive.
    ///
    /// Entries under `entry_prefix` with a `.md` suffix are extracted and
    /// converted concurrently; the call returns once every task has joined.
    pub async fn assemble_from_zip(
        &self,
        archive_bytes: &[u8],
        entry_prefix: &str,
    ) -> Result<BTreeMap<String, CorpusEntry>> {
        let documents = markdown_documents_from_zip(archive_bytes, entry_prefix)?;
        log::debug!("{} markdown entries under {entry_prefix}", documents.len());

        let mut tasks = JoinSet::new();
        for (id, document) in documents {
            let assembler = self.clone();
            tasks.spawn(async move { (id, assembler.entry(&document)) });
        }

        let mut corpus = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, entry) = joined?;
            corpus.insert(id, entry?);
        }
        Ok(corpus)
    }
}

/// Fetches a documentation archive into memory.
pub async fn fetch_archive(url: &str) -> Result<Vec<u8>> {
    log::info!("fetching archive {url}");
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Enumerates markdown files in a zip archive, keyed by archive path.
///
/// Directories, entries outside `entry_prefix`, and non-`.md` files are
/// skipped. Every document gets the default weight of 1.0.
pub fn markdown_documents_from_zip(
    archive_bytes: &[u8],
    entry_prefix: &str,
) -> Result<BTreeMap<String, WeightedDocument>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut documents = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        if !name.starts_with(entry_prefix) || !name.ends_with(".md") {
            continue;
        }
        let mut markdown = String::with_capacity(file.size() as usize);
        file.read_to_string(&mut markdown)?;
        documents.insert(name, WeightedDocument::new(markdown));
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn entry_partitions_markdown_emphasis() {
        let assembler = CorpusAssembler::new();
        let entry = assembler
            .entry(&WeightedDocument::new("你好 *世界* **测试** ***合体***"))
            .expect("assemble entry");
        assert_eq!(entry.weight, 1.0);
        assert_eq!(entry.codepoints[&Style::Regular], "你好");
        assert_eq!(entry.codepoints[&Style::Italic], "世界");
        assert_eq!(entry.codepoints[&Style::Bold], "测试");
        assert_eq!(entry.codepoints[&Style::BoldItalic], "合体");
    }

    #[test]
    fn entry_without_cjk_has_no_styles() {
        let assembler = CorpusAssembler::new();
        let entry = assembler
            .entry(&WeightedDocument::new("plain *ascii* text"))
            .expect("assemble entry");
        assert!(entry.codepoints.is_empty());
    }

    #[test]
    fn weight_is_preserved() {
        let assembler = CorpusAssembler::new();
        let entry = assembler
            .entry(&WeightedDocument::with_weight(2.5, "你"))
            .expect("assemble entry");
        assert_eq!(entry.weight, 2.5);
    }

    fn sample_archive() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (path, body) in [
            ("docs-main/src/guide.md", "你好 **世界**"),
            ("docs-main/src/nested/api.md", "接口"),
            ("docs-main/src/image.png", "not markdown"),
            ("docs-main/README.md", "outside the prefix"),
        ] {
            writer.start_file(path, options).expect("start zip entry");
            writer.write_all(body.as_bytes()).expect("write zip entry");
        }
        writer
            .finish()
            .expect("finish zip archive")
            .into_inner()
    }

    #[test]
    fn zip_enumeration_filters_by_prefix_and_suffix() {
        let documents = markdown_documents_from_zip(&sample_archive(), "docs-main/src/")
            .expect("enumerate archive");
        let ids: Vec<&str> = documents.keys().map(String::as_str).collect();
        assert_eq!(ids, ["docs-main/src/guide.md", "docs-main/src/nested/api.md"]);
        assert!(documents.values().all(|d| d.weight == 1.0));
    }

    #[tokio::test]
    async fn assemble_from_zip_joins_every_entry() {
        let assembler = CorpusAssembler::new();
        let corpus = assembler
            .assemble_from_zip(&sample_archive(), "docs-main/src/")
            .await
            .expect("assemble corpus");
        assert_eq!(corpus.len(), 2);
        assert_eq!(
            corpus["docs-main/src/guide.md"].codepoints[&Style::Bold],
            "世界"
        );
        assert_eq!(
            corpus["docs-main/src/nested/api.md"].codepoints[&Style::Regular],
            "接口"
        );
    }
}
