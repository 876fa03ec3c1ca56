//! Style-aware codepoint extraction from rendered HTML.
//!
//! The extractor walks the markup event stream with an explicit element
//! stack, the streaming equivalent of a depth-first tree walk that threads
//! the active [`Style`] by value: entering an element computes the child
//! style via the join lattice, leaving it restores the parent style exactly.
//! Text nodes are scanned for CJK-range characters, which are recorded under
//! the active style in first-seen document order.

use std::collections::{BTreeMap, HashSet};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{EvalError, Result};
use crate::style::Style;

/// Codepoints required per style, deduplicated, in first-seen order.
///
/// A codepoint recorded under `bold-italic` is not re-added under `bold` or
/// `italic`; consumers needing the union must compute it themselves. Styles
/// with no matches are absent rather than mapped to an empty sequence.
pub type StyleCodepoints = BTreeMap<Style, Vec<char>>;

/// Tag-to-style-axis transition table.
///
/// Only emphasis-like and strong-like tags are mapped; any other element
/// passes the parent style through unchanged. The default table covers the
/// two tags the markdown renderer emits (`em`, `strong`).
#[derive(Clone, Debug)]
pub struct StyleTransitions {
    axes: BTreeMap<String, Style>,
}

impl Default for StyleTransitions {
    fn default() -> Self {
        let mut axes = BTreeMap::new();
        axes.insert("em".to_string(), Style::Italic);
        axes.insert("strong".to_string(), Style::Bold);
        Self { axes }
    }
}

impl StyleTransitions {
    /// Table with the default `em`/`strong` mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a tag mapping (e.g. `i` → italic for raw HTML input).
    #[must_use]
    pub fn with_axis(mut self, tag: impl Into<String>, axis: Style) -> Self {
        self.axes.insert(tag.into(), axis);
        self
    }

    /// Style for children of `tag` given the parent style.
    pub fn child_style(&self, parent: Style, tag: &str) -> Style {
        match self.axes.get(tag) {
            Some(&axis) => parent.join(axis),
            None => parent,
        }
    }
}

/// Whether a character falls in the extracted CJK ranges: Unified
/// Ideographs (U+4E00–U+9FFF), punctuation/symbols (U+3000–U+303F), and
/// halfwidth/fullwidth forms (U+FF00–U+FFEF).
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3000}'..='\u{303f}' | '\u{ff00}'..='\u{ffef}')
}

/// Walks rendered HTML and collects required CJK codepoints per style.
#[derive(Clone, Debug, Default)]
pub struct StyleAwareExtractor {
    transitions: StyleTransitions,
}

impl StyleAwareExtractor {
    /// Extractor with the default transition table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with a custom transition table.
    pub fn with_transitions(transitions: StyleTransitions) -> Self {
        Self { transitions }
    }

    /// Collects the CJK codepoints of `html`, partitioned by style.
    ///
    /// Output is deterministic: codepoint order and style assignment depend
    /// only on document order, starting at [`Style::Regular`].
    pub fn extract(&self, html: &str) -> Result<StyleCodepoints> {
        let mut reader = Reader::from_reader(html.as_bytes());
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;

        let mut buf = Vec::with_capacity(256);
        let mut stack: Vec<(String, Style)> = Vec::with_capacity(8);
        let mut collected: StyleCodepoints = BTreeMap::new();
        let mut seen: BTreeMap<Style, HashSet<char>> = BTreeMap::new();
        let mut entity_buf = String::with_capacity(16);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let tag = decode_tag(&reader, e.name().as_ref())?;
                    let parent = current_style(&stack);
                    let child = self.transitions.child_style(parent, &tag);
                    stack.push((tag, child));
                }
                Ok(Event::End(e)) => {
                    let tag = decode_tag(&reader, e.name().as_ref())?;
                    if stack.last().is_some_and(|(open, _)| *open == tag) {
                        stack.pop();
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.decode().map_err(|err| {
                        EvalError::Markup(format!("text node decode error: {err:?}"))
                    })?;
                    collect(current_style(&stack), &text, &mut collected, &mut seen);
                }
                Ok(Event::CData(e)) => {
                    let text = reader.decoder().decode(&e).map_err(|err| {
                        EvalError::Markup(format!("cdata decode error: {err:?}"))
                    })?;
                    collect(current_style(&stack), &text, &mut collected, &mut seen);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e.decode().map_err(|err| {
                        EvalError::Markup(format!("entity decode error: {err:?}"))
                    })?;
                    entity_buf.clear();
                    entity_buf.push('&');
                    entity_buf.push_str(name.as_ref());
                    entity_buf.push(';');
                    let resolved = quick_xml::escape::unescape(&entity_buf).map_err(|err| {
                        EvalError::Markup(format!("entity unescape error: {err:?}"))
                    })?;
                    collect(current_style(&stack), &resolved, &mut collected, &mut seen);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(EvalError::Markup(format!("markup tokenize error: {err:?}")));
                }
            }
            buf.clear();
        }

        Ok(collected)
    }
}

fn current_style(stack: &[(String, Style)]) -> Style {
    stack.last().map_or(Style::Regular, |(_, style)| *style)
}

fn collect(
    style: Style,
    text: &str,
    collected: &mut StyleCodepoints,
    seen: &mut BTreeMap<Style, HashSet<char>>,
) {
    for ch in text.chars() {
        if !is_cjk(ch) {
            continue;
        }
        if seen.entry(style).or_default().insert(ch) {
            collected.entry(style).or_default().push(ch);
        }
    }
}

fn decode_tag(reader: &Reader<&[u8]>, name: &[u8]) -> Result<String> {
    let tag = reader
        .decoder()
        .decode(name)
        .map_err(|err| EvalError::Markup(format!("tag decode error: {err:?}")))?;
    Ok(tag.to_ascii_lowercase())
}
