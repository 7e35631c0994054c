use std::collections::BTreeSet;

/// Disjoint sets over the key universe. The representative of every set is
/// its first-seen member, which becomes the record's canonical key.
#[derive(Debug)]
pub(crate) struct KeyAliases {
    parent: Vec<usize>,
    files: Vec<BTreeSet<usize>>,
}

impl KeyAliases {
    /// `files[i]` lists the files that contain key `i`.
    pub fn new(files: Vec<BTreeSet<usize>>) -> Self {
        Self {
            parent: (0..files.len()).collect(),
            files,
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] == x {
            return x;
        }
        let root = self.find(self.parent[x]);
        self.parent[x] = root;
        root
    }

    /// Files covered by the set holding `x`.
    pub fn files_of(&mut self, x: usize) -> &BTreeSet<usize> {
        let root = self.find(x);
        &self.files[root]
    }

    /// Joins the sets of `a` and `b` unless they already share a file, in
    /// which case merging would hide one of that file's rows. Returns
    /// whether the sets are joined afterwards.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return true;
        }
        if !self.files[ra].is_disjoint(&self.files[rb]) {
            return false;
        }

        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        let moved = std::mem::take(&mut self.files[child]);
        self.files[root].extend(moved);
        true
    }
}
