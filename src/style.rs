//! Visual style tags and their join lattice.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Visual style a codepoint must be covered under.
///
/// The four tags form a join lattice over the bold and italic axes:
/// `Regular` is the bottom, `BoldItalic` is absorbing, and joining two
/// styles keeps every axis set by either one. Nesting an emphasis element
/// inside a strong element (or vice versa) therefore resolves to
/// [`Style::BoldItalic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Style {
    /// Upright, normal weight.
    #[serde(rename = "regular")]
    Regular,
    /// Italic, normal weight.
    #[serde(rename = "italic")]
    Italic,
    /// Upright, bold weight.
    #[serde(rename = "bold")]
    Bold,
    /// Italic, bold weight.
    #[serde(rename = "bold-italic")]
    BoldItalic,
}

impl Style {
    /// All styles, in manifest order.
    pub const ALL: [Self; 4] = [Self::Regular, Self::Italic, Self::Bold, Self::BoldItalic];

    /// Whether the bold axis is set.
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether the italic axis is set.
    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }

    fn from_axes(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (false, true) => Self::Italic,
            (true, false) => Self::Bold,
            (true, true) => Self::BoldItalic,
        }
    }

    /// Lattice join: the least style covering both operands.
    pub fn join(self, other: Self) -> Self {
        Self::from_axes(
            self.is_bold() || other.is_bold(),
            self.is_italic() || other.is_italic(),
        )
    }

    /// Manifest key for this style.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Italic => "italic",
            Self::Bold => "bold",
            Self::BoldItalic => "bold-italic",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
