//! Font discovery via fontconfig
//!
//! Lists installed families for the editor and resolves a family name to a file

use anyhow::{Context, Result};
use fontconfig::{Fontconfig, Pattern};
use std::collections::BTreeSet;
use std::ffi::CString;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Style suffixes recognised in "Family Style" names
/// Longer names first so "SemiBold Italic" is not read as "Bold Italic"
const KNOWN_STYLES: &[&str] = &[
    "SemiBold Italic",
    "Bold Italic",
    "Light Italic",
    "ExtraBold",
    "SemiBold",
    "Italic",
    "Oblique",
    "Bold",
    "Light",
    "Medium",
    "Regular",
];

/// Installed font families, sorted and deduplicated
pub fn list_families() -> Result<Vec<String>> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let pattern = Pattern::new(&fc);
    let font_set = fontconfig::list_fonts(&pattern, None);

    let families: BTreeSet<String> = font_set
        .iter()
        .filter_map(|font| font.get_string(fontconfig::FC_FAMILY).map(str::to_string))
        .collect();

    info!(count = families.len(), "Discovered font families via fontconfig");
    Ok(families.into_iter().collect())
}

/// Split "Family Style" into its parts when the suffix is a known style
pub fn split_style(font_name: &str) -> (&str, Option<&'static str>) {
    for style in KNOWN_STYLES {
        if let Some(prefix) = font_name.strip_suffix(style)
            && (prefix.is_empty() || prefix.ends_with(' '))
        {
            return (prefix.trim(), Some(style));
        }
    }
    (font_name, None)
}

/// Find the font file for a family (optionally with a style suffix)
pub fn find_font_path(font_name: &str) -> Result<PathBuf> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let (family_name, style_name) = split_style(font_name.trim());

    let mut pattern = Pattern::new(&fc);
    let family_cstr = CString::new(family_name)
        .with_context(|| format!("Invalid family name: {}", family_name))?;
    pattern.add_string(fontconfig::FC_FAMILY, &family_cstr);

    if let Some(style) = style_name {
        let style_cstr =
            CString::new(style).with_context(|| format!("Invalid style name: {}", style))?;
        pattern.add_string(fontconfig::FC_STYLE, &style_cstr);
    }

    let matched = pattern.font_match();

    // fontconfig substitutes silently; generic aliases like "Sans" are allowed to
    let generic = ["sans", "sans-serif", "serif", "monospace"]
        .iter()
        .any(|g| family_name.eq_ignore_ascii_case(g));
    if !generic
        && let Some(matched_family) = matched.get_string(fontconfig::FC_FAMILY)
        && !matched_family.eq_ignore_ascii_case(family_name)
    {
        warn!(
            requested = font_name,
            matched_family = matched_family,
            "Fontconfig returned a different family"
        );
        anyhow::bail!(
            "Font '{}' not found - fontconfig returned family '{}' instead",
            font_name,
            matched_family
        );
    }

    let file_path = matched
        .filename()
        .with_context(|| format!("No font file found for '{}'", font_name))?;
    let path = PathBuf::from(file_path);

    if !path.exists() {
        anyhow::bail!("Font file path '{}' does not exist", path.display());
    }

    debug!(font = font_name, style = ?style_name, path = %path.display(), "Resolved font path");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_style() {
        assert_eq!(split_style("DejaVu Sans"), ("DejaVu Sans", None));
        assert_eq!(split_style("DejaVu Sans Bold"), ("DejaVu Sans", Some("Bold")));
        assert_eq!(split_style("Noto SemiBold Italic"), ("Noto", Some("SemiBold Italic")));
        assert_eq!(split_style("Fakebold"), ("Fakebold", None));
    }

    #[test]
    fn test_find_common_fonts() {
        for family in ["DejaVu Sans", "Liberation Sans", "Monospace"] {
            if let Ok(path) = find_font_path(family) {
                assert!(path.is_absolute(), "Font path should be absolute");
            }
        }
    }
}
