//! Discovery of front/back document pairs in a folder tree

use crate::types::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents that make up one card group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfGroup {
    pub front: Option<PathBuf>,
    pub back: Option<PathBuf>,
    /// Directory of the documents relative to the searched folder
    pub subdir: PathBuf,
    /// File name prefix for extracted cards
    pub prefix: String,
}

const FRONT_SUFFIX: &str = "front";
const BACK_SUFFIX: &str = "back";
const CARDBACKS_SUFFIX: &str = "_cardbacks";

/// Strip a case-insensitive suffix, requiring a non-empty remainder
fn strip_suffix_ci<'a>(stem: &'a str, suffix: &str) -> Option<&'a str> {
    let split = stem.len().checked_sub(suffix.len())?;
    if split == 0 || !stem.is_char_boundary(split) {
        return None;
    }
    let (base, tail) = stem.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(base)
}

/// Group name with trailing separators removed, e.g. `Deck_` -> `Deck`
fn group_name(base: &str) -> &str {
    let trimmed = base.trim_end_matches(['_', '-', ' ', '.']);
    if trimmed.is_empty() { base } else { trimmed }
}

fn has_cardbacks_sibling(path: &Path, stem: &str) -> bool {
    let wanted = format!("{}{}.pdf", stem, CARDBACKS_SUFFIX).to_lowercase();
    let Some(dir) = path.parent() else {
        return false;
    };
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .any(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
        })
        .unwrap_or(false)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Find card groups under `folder`.
///
/// `XFront.pdf` pairs with `XBack.pdf`, and `X.pdf` with `X_Cardbacks.pdf`
/// (suffixes are case-insensitive). A PDF matching neither convention is a
/// front-only group. Groups are keyed by their relative directory and name.
pub fn find_pdf_pairs(folder: &Path) -> Result<BTreeMap<String, PdfGroup>> {
    let mut groups: BTreeMap<String, PdfGroup> = BTreeMap::new();

    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ExtractError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory loop while scanning")),
            )
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_pdf(path) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("Skipping PDF with a non UTF-8 name: {}", path.display());
            continue;
        };

        let subdir = path
            .parent()
            .and_then(|parent| parent.strip_prefix(folder).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        enum Role {
            Front,
            Back,
            Standalone,
        }

        let (base, role) = if let Some(base) = strip_suffix_ci(stem, FRONT_SUFFIX) {
            (group_name(base), Role::Front)
        } else if let Some(base) = strip_suffix_ci(stem, BACK_SUFFIX) {
            (group_name(base), Role::Back)
        } else if let Some(base) = strip_suffix_ci(stem, CARDBACKS_SUFFIX) {
            (base, Role::Back)
        } else if has_cardbacks_sibling(path, stem) {
            (stem, Role::Front)
        } else {
            (stem, Role::Standalone)
        };

        let key = if subdir.as_os_str().is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", subdir.to_string_lossy().replace('\\', "/"), base)
        };

        let group = groups.entry(key).or_insert_with(|| PdfGroup {
            subdir: subdir.clone(),
            prefix: base.to_string(),
            ..Default::default()
        });

        match role {
            Role::Front => group.front = Some(path.to_path_buf()),
            Role::Back => group.back = Some(path.to_path_buf()),
            Role::Standalone => {
                if group.front.is_none() {
                    group.front = Some(path.to_path_buf());
                }
            }
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_suffix_ci() {
        assert_eq!(strip_suffix_ci("DeckFront", "front"), Some("Deck"));
        assert_eq!(strip_suffix_ci("deck_BACK", "back"), Some("deck_"));
        assert_eq!(strip_suffix_ci("Front", "front"), None);
        assert_eq!(strip_suffix_ci("Deck", "front"), None);
    }

    #[test]
    fn test_group_name() {
        assert_eq!(group_name("Deck_"), "Deck");
        assert_eq!(group_name("Deck - "), "Deck");
        assert_eq!(group_name("Deck"), "Deck");
        assert_eq!(group_name("_"), "_");
    }
}
