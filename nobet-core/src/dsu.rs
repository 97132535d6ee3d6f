//! Disjoint Set Union (Union-Find), used to merge overlapping `together`
//! rules into cliques. Copied in shape from the teacher's constraint
//! preprocessing (`solver::dsu`), which does the same for
//! must-stay-together constraints.

pub struct Dsu {
    parent: Vec<usize>,
}

impl Dsu {
    pub fn new(n: usize) -> Self {
        Dsu {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, i: usize) -> usize {
        if self.parent[i] == i {
            i
        } else {
            self.parent[i] = self.find(self.parent[i]);
            self.parent[i]
        }
    }

    pub fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i != root_j {
            self.parent[root_i] = root_j;
        }
    }

    /// Groups all elements by their DSU root.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut by_root: std::collections::HashMap<usize, Vec<usize>> =
            std::collections::HashMap::new();
        for i in 0..n {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }
        by_root.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_merge_transitively() {
        let mut dsu = Dsu::new(5);
        dsu.union(0, 1);
        dsu.union(1, 2);
        assert_eq!(dsu.find(0), dsu.find(2));
        assert_ne!(dsu.find(0), dsu.find(3));
    }

    #[test]
    fn groups_partitions_all_elements() {
        let mut dsu = Dsu::new(4);
        dsu.union(0, 1);
        let groups = dsu.groups();
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, 4);
    }
}
