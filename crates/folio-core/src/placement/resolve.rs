use crate::config::AppConfig;
use crate::naming::{clean_folder_name, placement_score};
use crate::scanner::walk_folders;
use tracing::debug;

const LOCALITY_BONUS: f64 = 0.1;

/// Result of routing a sanitized suggestion onto the existing tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFolder {
    /// Root-relative folder path to place into.
    pub relative: String,
    /// True when an existing, differently-named folder was chosen.
    pub reused: bool,
    pub score: f64,
}

#[derive(Debug)]
struct Candidate {
    relative: String,
    combined: f64,
    local: bool,
    depth: usize,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        const EPS: f64 = 1e-9;
        if (self.combined - other.combined).abs() > EPS {
            return self.combined > other.combined;
        }
        if self.local != other.local {
            return self.local;
        }
        if self.depth != other.depth {
            return self.depth < other.depth;
        }
        self.relative < other.relative
    }
}

fn split_leaf(relative: &str) -> (&str, &str) {
    relative.rsplit_once('/').unwrap_or(("", relative))
}

/// Route `sanitized` (a `/`-joined folder path) to an existing folder whose
/// cleaned leaf name matches, or keep it as-is when nothing qualifies.
///
/// Folders under the same parent category are accepted at a lower score
/// than folders elsewhere in the tree. Ancestors of the suggested path are
/// never candidates.
pub fn resolve_folder(config: &AppConfig, sanitized: &str) -> ResolvedFolder {
    let root = &config.organize_root;
    if root.join(sanitized).is_dir() {
        return ResolvedFolder {
            relative: sanitized.to_string(),
            reused: false,
            score: 1.0,
        };
    }

    let thresholds = &config.thresholds;
    let (parent, leaf) = split_leaf(sanitized);
    let leaf_clean = clean_folder_name(leaf);

    let mut best: Option<Candidate> = None;
    for folder in walk_folders(config, root) {
        let relative = config.relative(&folder);
        if sanitized.starts_with(&format!("{}/", relative)) {
            continue;
        }
        let (candidate_parent, candidate_leaf) = split_leaf(&relative);
        let name_score = placement_score(&leaf_clean, &clean_folder_name(candidate_leaf), thresholds);
        if name_score <= 0.0 {
            continue;
        }

        let local = candidate_parent == parent;
        let combined = name_score + if local { LOCALITY_BONUS } else { 0.0 };
        let accepted = if local {
            name_score >= thresholds.placement_parent_min
        } else {
            combined >= thresholds.placement_tree_min
        };
        if !accepted {
            continue;
        }

        let candidate = Candidate {
            depth: relative.split('/').count(),
            relative,
            combined,
            local,
        };
        if best.as_ref().map_or(true, |b| candidate.beats(b)) {
            best = Some(candidate);
        }
    }

    match best {
        Some(candidate) => {
            debug!(
                "Routing '{}' to existing folder '{}' (score {:.2})",
                sanitized, candidate.relative, candidate.combined
            );
            ResolvedFolder {
                reused: candidate.relative != sanitized,
                relative: candidate.relative,
                score: candidate.combined,
            }
        }
        None => ResolvedFolder {
            relative: sanitized.to_string(),
            reused: false,
            score: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup(dirs: &[&str]) -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        for d in dirs {
            fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        let config = AppConfig::new(dir.path());
        (dir, config)
    }

    #[test]
    fn test_existing_path_is_kept() {
        let (_dir, config) = setup(&["clients/acme"]);
        let r = resolve_folder(&config, "clients/acme");
        assert_eq!(r.relative, "clients/acme");
        assert!(!r.reused);
    }

    #[test]
    fn test_revision_decoration_routes_to_existing() {
        let (_dir, config) = setup(&["acme"]);
        let r = resolve_folder(&config, "acme_revised");
        assert_eq!(r.relative, "acme");
        assert!(r.reused);
    }

    #[test]
    fn test_local_match_preferred_over_tree_match() {
        let (_dir, config) = setup(&["clients/acme", "archive/acme"]);
        let r = resolve_folder(&config, "clients/Acme (2)");
        assert_eq!(r.relative, "clients/acme");
    }

    #[test]
    fn test_whole_tree_match() {
        let (_dir, config) = setup(&["legal/globex contracts"]);
        let r = resolve_folder(&config, "clients/globex contract");
        assert_eq!(r.relative, "legal/globex contracts");
        assert!(r.reused);
    }

    #[test]
    fn test_unrelated_name_creates_new_folder() {
        let (_dir, config) = setup(&["clients/acme"]);
        let r = resolve_folder(&config, "clients/initech");
        assert_eq!(r.relative, "clients/initech");
        assert!(!r.reused);
    }

    #[test]
    fn test_ancestor_is_not_a_candidate() {
        let (_dir, config) = setup(&["acme"]);
        let r = resolve_folder(&config, "acme/acme_2024");
        assert_eq!(r.relative, "acme/acme_2024");
    }
}
