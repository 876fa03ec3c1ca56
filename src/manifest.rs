//! Font manifests handed to the optimizer.
//!
//! A manifest binds the four visual styles to physical font files and
//! carries the weighted per-style codepoint corpora. Exactly one file backs
//! `{regular, italic}` and one backs `{bold, bold-italic}`; a family with no
//! separate bold face reuses one file for all four styles.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusEntry;
use crate::error::{EvalError, Result};
use crate::style::Style;

/// CSS description of a font variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCss {
    /// `font-family` value, the family prefix.
    #[serde(rename = "font-family")]
    pub family: String,
    /// `font-weight` value, `normal` or `bold`.
    #[serde(rename = "font-weight")]
    pub weight: String,
}

/// A physical font file plus the CSS face it is served as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontVariantRef {
    /// Path to the font file.
    pub path: String,
    /// CSS face description.
    pub css: FontCss,
}

/// Style → font variant binding. Always carries all four style keys.
pub type FontManifest = BTreeMap<Style, FontVariantRef>;

/// The unit handed to the optimizer: fonts plus weighted corpora.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Style bindings for one font family.
    pub fonts: FontManifest,
    /// Corpus entries keyed by document identifier (archive path).
    pub posts: BTreeMap<String, CorpusEntry>,
}

/// One font family under evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFamily {
    /// File name prefix and CSS family name (e.g. `NotoSansSC`).
    pub prefix: String,
    /// File extension without the dot (`ttf`, `otf`).
    pub format: String,
    /// Slug used in generated manifest file names (e.g. `noto_sans_sc`).
    pub slug: String,
}

impl FontFamily {
    /// Family from prefix, format, and slug.
    pub fn new(
        prefix: impl Into<String>,
        format: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            format: format.into(),
            slug: slug.into(),
        }
    }
}

/// The CJK families swept by the default evaluation.
pub fn default_families() -> Vec<FontFamily> {
    vec![
        FontFamily::new("NotoSansSC", "ttf", "noto_sans_sc"),
        FontFamily::new("NotoSerifSC", "otf", "noto_serif_sc"),
        FontFamily::new("SourceHanSansSC", "otf", "source_han_sans_sc"),
        FontFamily::new("SmileySans-Oblique", "ttf", "smiley_sans"),
        FontFamily::new("LXGWWenKai-Regular", "ttf", "lxgw_wenkai"),
    ]
}

/// Resolves a family's font files and attaches them to a corpus.
///
/// Probes `<prefix>-Regular.<ext>` and `<prefix>-Bold.<ext>` under
/// `font_dir`; if both exist, regular/italic bind to the Regular file and
/// bold/bold-italic to the Bold file. Otherwise probes `<prefix>.<ext>` and
/// binds all four styles to it. No other probe patterns exist; failure is
/// fatal since the manifest cannot be produced without a font.
pub fn attach_fonts(
    font_dir: &Path,
    family: &FontFamily,
    posts: BTreeMap<String, CorpusEntry>,
) -> Result<Manifest> {
    let split_regular = font_dir.join(format!("{}-Regular.{}", family.prefix, family.format));
    let split_bold = font_dir.join(format!("{}-Bold.{}", family.prefix, family.format));
    let single = font_dir.join(format!("{}.{}", family.prefix, family.format));

    let (regular_path, bold_path) = if split_regular.exists() && split_bold.exists() {
        (split_regular, split_bold)
    } else if single.exists() {
        (single.clone(), single)
    } else {
        return Err(EvalError::FontNotFound {
            family: family.prefix.clone(),
        });
    };

    let variant = |path: &Path, weight: &str| FontVariantRef {
        path: path.to_string_lossy().into_owned(),
        css: FontCss {
            family: family.prefix.clone(),
            weight: weight.to_string(),
        },
    };
    let regular = variant(&regular_path, "normal");
    let bold = variant(&bold_path, "bold");

    let mut fonts = FontManifest::new();
    fonts.insert(Style::Regular, regular.clone());
    fonts.insert(Style::Italic, regular);
    fonts.insert(Style::Bold, bold.clone());
    fonts.insert(Style::BoldItalic, bold);

    Ok(Manifest { fonts, posts })
}

/// File name for a generated manifest: `fonts_<source>_<slug>.json`.
pub fn manifest_file_name(source_name: &str, family: &FontFamily) -> String {
    format!("fonts_{}_{}.json", source_name, family.slug)
}

/// Writes a manifest as pretty-printed JSON.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    log::info!("wrote manifest {}", path.display());
    Ok(())
}

/// Removes a generated manifest, treating a missing file as already done.
///
/// Any filesystem error other than "not found" is re-raised.
pub fn remove_manifest(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Removes every manifest a generation pass would produce.
pub fn remove_generated_manifests(
    out_dir: &Path,
    source_names: &[&str],
    families: &[FontFamily],
) -> Result<()> {
    for source_name in source_names {
        for family in families {
            remove_manifest(&out_dir.join(manifest_file_name(source_name, family)))?;
        }
    }
    Ok(())
}

/// Paths of the manifests one source × family sweep reads.
pub fn manifest_paths(
    out_dir: &Path,
    source_name: &str,
    families: &[FontFamily],
) -> Vec<(FontFamily, PathBuf)> {
    families
        .iter()
        .map(|family| {
            let path = out_dir.join(manifest_file_name(source_name, family));
            (family.clone(), path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).expect("create probe file");
    }

    #[test]
    fn split_faces_bind_regular_and_bold_separately() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("Demo-Regular.ttf"));
        touch(&dir.path().join("Demo-Bold.ttf"));

        let family = FontFamily::new("Demo", "ttf", "demo");
        let manifest =
            attach_fonts(dir.path(), &family, BTreeMap::new()).expect("attach fonts");

        assert!(manifest.fonts[&Style::Regular].path.ends_with("Demo-Regular.ttf"));
        assert_eq!(
            manifest.fonts[&Style::Regular], manifest.fonts[&Style::Italic],
            "italic reuses the regular file"
        );
        assert!(manifest.fonts[&Style::Bold].path.ends_with("Demo-Bold.ttf"));
        assert_eq!(manifest.fonts[&Style::Bold], manifest.fonts[&Style::BoldItalic]);
        assert_eq!(manifest.fonts[&Style::Regular].css.weight, "normal");
        assert_eq!(manifest.fonts[&Style::Bold].css.weight, "bold");
    }

    #[test]
    fn single_face_backs_all_four_styles() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("Demo.ttf"));

        let family = FontFamily::new("Demo", "ttf", "demo");
        let manifest =
            attach_fonts(dir.path(), &family, BTreeMap::new()).expect("attach fonts");

        let paths: Vec<&str> = Style::ALL
            .iter()
            .map(|style| manifest.fonts[style].path.as_str())
            .collect();
        assert!(paths.iter().all(|p| p.ends_with("Demo.ttf")));
        assert_eq!(manifest.fonts[&Style::BoldItalic].css.weight, "bold");
    }

    #[test]
    fn missing_font_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let family = FontFamily::new("Demo", "ttf", "demo");
        let err = attach_fonts(dir.path(), &family, BTreeMap::new())
            .expect_err("no font files present");
        assert!(matches!(err, EvalError::FontNotFound { family } if family == "Demo"));
    }

    #[test]
    fn manifest_serializes_to_the_optimizer_schema() {
        let mut posts = BTreeMap::new();
        let mut codepoints = BTreeMap::new();
        codepoints.insert(Style::Regular, "你好".to_string());
        posts.insert(
            "src/guide.md".to_string(),
            CorpusEntry {
                weight: 1.0,
                codepoints,
            },
        );
        let mut fonts = FontManifest::new();
        for style in Style::ALL {
            fonts.insert(
                style,
                FontVariantRef {
                    path: "Demo.ttf".to_string(),
                    css: FontCss {
                        family: "Demo".to_string(),
                        weight: if style.is_bold() { "bold" } else { "normal" }.to_string(),
                    },
                },
            );
        }

        let value =
            serde_json::to_value(Manifest { fonts, posts }).expect("serialize manifest");
        assert_eq!(value["fonts"]["regular"]["css"]["font-weight"], "normal");
        assert_eq!(value["fonts"]["bold-italic"]["css"]["font-weight"], "bold");
        assert_eq!(value["posts"]["src/guide.md"]["weight"], 1.0);
        assert_eq!(value["posts"]["src/guide.md"]["codepoints"]["regular"], "你好");
    }

    #[test]
    fn remove_manifest_swallows_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fonts_vue_demo.json");
        remove_manifest(&path).expect("missing file is not an error");

        touch(&path);
        remove_manifest(&path).expect("remove existing file");
        assert!(!path.exists());
    }

    #[test]
    fn manifest_file_names_follow_the_generation_pattern() {
        let family = FontFamily::new("NotoSansSC", "ttf", "noto_sans_sc");
        assert_eq!(manifest_file_name("vue", &family), "fonts_vue_noto_sans_sc.json");
    }
}
