use super::scan::FolderScan;
use crate::config::MatchThresholds;
use crate::naming::{clean_folder_name, cluster_similar};
use std::collections::BTreeMap;

/// Root-relative folder paths judged to name the same subject.
pub type MergeGroup = Vec<String>;

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Connected components of the "similar name" relation over `names`
/// (already cleaned). Only components with two or more members are
/// returned; members and components are in index order, so the result
/// does not depend on the order pairs are visited.
pub fn cluster_names(names: &[String], thresholds: &MatchThresholds) -> Vec<Vec<usize>> {
    let mut set = DisjointSet::new(names.len());
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            if cluster_similar(&names[i], &names[j], thresholds) {
                set.union(i, j);
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..names.len() {
        let root = set.find(i);
        components.entry(root).or_default().push(i);
    }
    let mut groups: Vec<Vec<usize>> = components
        .into_values()
        .filter(|members| members.len() >= 2)
        .collect();
    groups.sort_by_key(|members| members[0]);
    groups
}

/// Group leaf folders whose cleaned names are similar.
pub fn cluster_folders(folders: &[FolderScan], thresholds: &MatchThresholds) -> Vec<MergeGroup> {
    let mut leaves: Vec<&FolderScan> = folders.iter().filter(|f| f.is_leaf()).collect();
    leaves.sort_by(|a, b| a.relative.cmp(&b.relative));

    let names: Vec<String> = leaves
        .iter()
        .map(|f| clean_folder_name(f.leaf_name()))
        .collect();

    cluster_names(&names, thresholds)
        .into_iter()
        .map(|members| {
            members
                .into_iter()
                .map(|i| leaves[i].relative.clone())
                .collect()
        })
        .collect()
}
