//! The mutual-exclusion graph induced by house ("all-different") handlers.

use crate::error::CoreError;

/// A simple bitset over cell indices, backed by `u64` words.
///
/// Used internally by [`CellExclusions`] for O(1) membership tests and
/// word-at-a-time intersection, per the "word-packed bitset... prefer
/// machine-word strides with popcount intrinsics" design note.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CellBitSet {
    words: Vec<u64>,
}

impl CellBitSet {
    fn new(num_cells: usize) -> Self {
        Self {
            words: vec![0u64; num_cells.div_ceil(64)],
        }
    }

    fn insert(&mut self, cell: usize) {
        self.words[cell / 64] |= 1u64 << (cell % 64);
    }

    fn contains(&self, cell: usize) -> bool {
        self.words[cell / 64] & (1u64 << (cell % 64)) != 0
    }

    fn intersect(&self, other: &Self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    None
                } else {
                    let bit = w.trailing_zeros() as usize;
                    w &= w - 1;
                    Some(wi * 64 + bit)
                }
            })
        })
    }
}

/// Union-find used only during construction to merge "are the same value"
/// aliases before the relation is sealed.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// The symmetric "must hold distinct values" relation between cells,
/// induced by every "all-different" house handler over the grid.
///
/// Construction is append-only: handlers call [`CellExclusions::add_mutual_exclusion`]
/// and [`CellExclusions::are_same_value`] while being built. The first read
/// ([`CellExclusions::is_mutually_exclusive`], [`CellExclusions::get_bit_set`], etc.)
/// **seals** the relation; any further mutation after that point is a
/// programmer error and returns [`CoreError::MutationAfterSeal`].
///
/// # Examples
///
/// ```
/// use variant_sudoku_core::CellExclusions;
///
/// let mut ex = CellExclusions::new(9);
/// ex.add_mutual_exclusion(0, 1).unwrap();
/// ex.add_mutual_exclusion(0, 2).unwrap();
/// assert!(ex.is_mutually_exclusive(0, 1));
/// assert!(!ex.is_mutually_exclusive(1, 2));
/// assert!(ex.add_mutual_exclusion(3, 4).is_err());
/// ```
#[derive(Debug)]
pub struct CellExclusions {
    num_cells: usize,
    sets: Vec<CellBitSet>,
    aliases: UnionFind,
    sealed: bool,
}

impl CellExclusions {
    /// Creates an empty exclusion relation over `num_cells` cells.
    #[must_use]
    pub fn new(num_cells: usize) -> Self {
        Self {
            num_cells,
            sets: vec![CellBitSet::new(num_cells); num_cells],
            aliases: UnionFind::new(num_cells),
            sealed: false,
        }
    }

    /// Adds every pairwise exclusion induced by an "all-different" cell
    /// list (a house or cage).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MutationAfterSeal`] if called after the
    /// relation has been sealed by a read.
    pub fn add_all_different(&mut self, cells: &[usize]) -> Result<(), CoreError> {
        for i in 0..cells.len() {
            for j in (i + 1)..cells.len() {
                self.add_mutual_exclusion(cells[i], cells[j])?;
            }
        }
        Ok(())
    }

    /// Marks `a` and `b` as mutually exclusive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MutationAfterSeal`] if called after sealing.
    pub fn add_mutual_exclusion(&mut self, a: usize, b: usize) -> Result<(), CoreError> {
        self.check_unsealed()?;
        if a != b {
            self.sets[a].insert(b);
            self.sets[b].insert(a);
        }
        Ok(())
    }

    /// Merges `a` and `b` as if they were the same cell for exclusion
    /// purposes: every cell excluded with one becomes excluded with both.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MutationAfterSeal`] if called after sealing.
    pub fn are_same_value(&mut self, a: usize, b: usize) -> Result<(), CoreError> {
        self.check_unsealed()?;
        self.aliases.union(a, b);
        Ok(())
    }

    /// `true` if `a` and `b` must hold distinct values.
    ///
    /// Seals the relation.
    pub fn is_mutually_exclusive(&mut self, a: usize, b: usize) -> bool {
        self.seal();
        self.sets[a].contains(b)
    }

    /// The set of cells mutually exclusive with `c`, as a bitset.
    ///
    /// Seals the relation.
    pub fn get_bit_set(&mut self, c: usize) -> impl Iterator<Item = usize> + '_ {
        self.seal();
        self.sets[c].iter()
    }

    /// The set of cells mutually exclusive with `c`, sorted ascending.
    ///
    /// Seals the relation.
    #[must_use]
    pub fn get_array(&mut self, c: usize) -> Vec<usize> {
        self.seal();
        self.sets[c].iter().collect()
    }

    /// The intersection of `a`'s and `b`'s exclusion sets.
    ///
    /// Seals the relation.
    #[must_use]
    pub fn get_pair_exclusions(&mut self, a: usize, b: usize) -> Vec<usize> {
        self.seal();
        self.sets[a].intersect(&self.sets[b]).iter().collect()
    }

    /// The intersection of every cell's exclusion set in `cells`.
    ///
    /// Seals the relation. Returns an empty `Vec` if `cells` is empty.
    #[must_use]
    pub fn get_list_exclusions(&mut self, cells: &[usize]) -> Vec<usize> {
        self.seal();
        let Some((first, rest)) = cells.split_first() else {
            return vec![];
        };
        let mut acc = self.sets[*first].clone();
        for &c in rest {
            acc = acc.intersect(&self.sets[c]);
        }
        acc.iter().collect()
    }

    /// `true` if every pair in `cells` is mutually exclusive (a clique
    /// test).
    ///
    /// Seals the relation.
    #[must_use]
    pub fn are_mutually_exclusive(&mut self, cells: &[usize]) -> bool {
        self.seal();
        for i in 0..cells.len() {
            for j in (i + 1)..cells.len() {
                if !self.sets[cells[i]].contains(cells[j]) {
                    return false;
                }
            }
        }
        true
    }

    /// Partitions `cells` into maximal mutually-exclusive sublists
    /// ("exclusion groups"), using union-by-alias followed by a greedy
    /// clique cover over the sealed relation.
    ///
    /// Seals the relation.
    #[must_use]
    pub fn partition_into_exclusion_groups(&mut self, cells: &[usize]) -> Vec<Vec<usize>> {
        self.seal();
        let mut groups: Vec<Vec<usize>> = vec![];
        'cells: for &cell in cells {
            for group in &mut groups {
                if group
                    .iter()
                    .all(|&g| self.sets[g].contains(cell) || self.are_aliased(g, cell))
                {
                    group.push(cell);
                    continue 'cells;
                }
            }
            groups.push(vec![cell]);
        }
        groups
    }

    fn are_aliased(&self, a: usize, b: usize) -> bool {
        // Union-find roots are read-only once sealed; `find` still needs
        // `&mut self` for path compression, so clone the tiny parent chain
        // lookup without mutating shared state post-seal.
        let mut pa = a;
        while self.aliases.parent[pa] != pa {
            pa = self.aliases.parent[pa];
        }
        let mut pb = b;
        while self.aliases.parent[pb] != pb {
            pb = self.aliases.parent[pb];
        }
        pa == pb
    }

    /// Number of cells this relation covers.
    #[must_use]
    pub const fn num_cells(&self) -> usize {
        self.num_cells
    }

    fn seal(&mut self) {
        self.sealed = true;
    }

    fn check_unsealed(&self) -> Result<(), CoreError> {
        if self.sealed {
            Err(CoreError::MutationAfterSeal)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_exclusion() {
        let mut ex = CellExclusions::new(9);
        ex.add_mutual_exclusion(0, 1).unwrap();
        assert!(ex.is_mutually_exclusive(0, 1));
        assert!(ex.is_mutually_exclusive(1, 0));
    }

    #[test]
    fn all_different_adds_full_clique() {
        let mut ex = CellExclusions::new(9);
        ex.add_all_different(&[0, 1, 2]).unwrap();
        assert!(ex.are_mutually_exclusive(&[0, 1, 2]));
    }

    #[test]
    fn mutation_after_seal_errors() {
        let mut ex = CellExclusions::new(9);
        ex.add_mutual_exclusion(0, 1).unwrap();
        let _ = ex.is_mutually_exclusive(0, 1); // seals
        assert!(matches!(
            ex.add_mutual_exclusion(2, 3),
            Err(CoreError::MutationAfterSeal)
        ));
        assert!(matches!(
            ex.are_same_value(2, 3),
            Err(CoreError::MutationAfterSeal)
        ));
    }

    #[test]
    fn pair_and_list_exclusions() {
        let mut ex = CellExclusions::new(9);
        ex.add_all_different(&[0, 1, 2]).unwrap();
        ex.add_mutual_exclusion(3, 1).unwrap();
        ex.add_mutual_exclusion(3, 2).unwrap();
        let pair = ex.get_pair_exclusions(1, 2);
        assert!(pair.contains(&0));
        assert!(pair.contains(&3));
        let list = ex.get_list_exclusions(&[0, 1, 2]);
        // 0,1,2 are mutually exclusive with each other only (not with 3).
        assert!(!list.contains(&3));
    }

    #[test]
    fn partitions_into_exclusion_groups() {
        let mut ex = CellExclusions::new(9);
        ex.add_all_different(&[0, 1, 2]).unwrap();
        // cell 3 is unrelated to 0,1,2
        let groups = ex.partition_into_exclusion_groups(&[0, 1, 2, 3]);
        assert_eq!(groups.len(), 2);
    }
}
