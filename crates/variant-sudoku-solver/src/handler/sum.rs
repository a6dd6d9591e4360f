//! The `Sum` handler: cages, arrows, little-killers, X/V, and any other
//! constraint reducible to "a coefficient-weighted sum of cells equals a
//! target". This is the hardest combinatorial propagator in the kernel.

use std::sync::Arc;

use variant_sudoku_core::{CellExclusions, Grid, GridShape, LookupTables, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;
use crate::error::SolverError;

/// The maximum cells allowed in a single coefficient group before the
/// builder splits it, so the `u16`-scale range accumulator used by the
/// range-summary step (`16 * sum(rangeInfo)` per component) cannot
/// overflow.
const MAX_GROUP_SIZE: usize = 15;

#[derive(Debug, Clone)]
struct CoeffGroup {
    coeff: i64,
    cells: Vec<usize>,
    /// Maximal mutually-exclusive sublists within `cells`, populated at
    /// `initialize` time once `CellExclusions` is available.
    exclusion_groups: Vec<Vec<usize>>,
}

/// Sums a coefficient-weighted list of cells to a fixed target.
///
/// Covers killer cages (`coeff = 1` for every cell, `cage_all_different =
/// true`), arrows (shaft cells at `coeff = 1`, head cell at `coeff = -1`,
/// target `0`), little-killers (diagonal cells at `coeff = 1`, target = the
/// clue), and pill arrows / pill coefficients (arbitrary integer
/// coefficients per cell, e.g. place-value weights for a two-digit pill).
#[derive(Debug, Clone)]
pub struct Sum {
    cells: Vec<usize>,
    target: i64,
    groups: Vec<CoeffGroup>,
    /// Cells outside this handler whose value set completes a union of
    /// houses that this handler's cells (plus `complement_cells`) exactly
    /// cover. `None` when this handler has no complement relationship.
    complement_cells: Option<Vec<usize>>,
    /// `true` for a classic killer cage: the builder should also register
    /// an all-different clique over `cells` at `initialize`.
    cage_all_different: bool,
    num_values: usize,
    lookup: Arc<LookupTables>,
    /// `true` when this reduces to the single-exclusion-group cage case
    /// (§4.4.4 step 5): one coefficient group, |coeff| = 1, one exclusion
    /// group spanning every cell. Computed at `initialize`.
    is_cage: bool,
    /// Cells mutually exclusive with *every* cell in this handler —
    /// candidates for "required value" propagation out of the cage.
    common_exclusions: Vec<usize>,
}

impl Sum {
    /// Creates a handler summing `cells` (optionally weighted by
    /// `coefficients`, default all `1`) to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::CoefficientCellMismatch`] if `coefficients`
    /// is `Some` and its length doesn't match `cells.len()`.
    pub fn new(
        cells: Vec<usize>,
        coefficients: Option<Vec<i64>>,
        target: i64,
        num_values: usize,
        cage_all_different: bool,
    ) -> Result<Self, SolverError> {
        let coeffs = match coefficients {
            Some(c) if c.len() != cells.len() => {
                return Err(SolverError::CoefficientCellMismatch {
                    num_coeffs: c.len(),
                    num_cells: cells.len(),
                });
            }
            Some(c) => c,
            None => vec![1; cells.len()],
        };

        let mut by_coeff: Vec<(i64, Vec<usize>)> = vec![];
        for (&cell, &coeff) in cells.iter().zip(&coeffs) {
            if let Some((_, group)) = by_coeff.iter_mut().find(|(c, _)| *c == coeff) {
                group.push(cell);
            } else {
                by_coeff.push((coeff, vec![cell]));
            }
        }

        let mut groups = vec![];
        for (coeff, group_cells) in by_coeff {
            for chunk in group_cells.chunks(MAX_GROUP_SIZE) {
                groups.push(CoeffGroup {
                    coeff,
                    cells: chunk.to_vec(),
                    exclusion_groups: vec![],
                });
            }
        }
        groups.sort_by_key(|g| std::cmp::Reverse(g.coeff.abs()));

        let mut sorted_cells = cells.clone();
        sorted_cells.sort_unstable();
        sorted_cells.dedup();

        Ok(Self {
            cells: sorted_cells,
            target,
            groups,
            complement_cells: None,
            cage_all_different,
            num_values,
            lookup: LookupTables::get(num_values),
            is_cage: false,
            common_exclusions: vec![],
        })
    }

    /// Registers `complement_cells` as the cells outside this handler that
    /// complete a union-of-houses cover, enabling complement propagation.
    #[must_use]
    pub fn with_complement(mut self, complement_cells: Vec<usize>) -> Self {
        self.complement_cells = Some(complement_cells);
        self
    }

    /// Sums a group's achievable range, routing its unfixed cells through
    /// `group.exclusion_groups` so cells known to hold distinct values
    /// (e.g. two shaft cells sharing a row) can't both reach the same
    /// extreme simultaneously — the same "seen-min"/"seen-max" greedy
    /// distinct-packing `restrict_exclusion_group` (step 6) already uses,
    /// applied here to the cross-group bound instead of the within-group
    /// one.
    fn range_for_group(grid: &Grid, lookup: &LookupTables, group: &CoeffGroup) -> GroupRange {
        let mut fixed_sum = 0i64;
        let mut fixed_contribution = 0i64;
        let mut unfixed = vec![];
        for &c in &group.cells {
            let info = lookup.range_info(grid[c]);
            if info.is_wipeout(lookup.num_values()) {
                return GroupRange {
                    min_sum: i64::MAX,
                    max_sum: i64::MIN,
                    fixed_sum: 0,
                    unfixed: vec![],
                };
            }
            if info.is_fixed() {
                let value = i64::from(info.fixed_value());
                fixed_sum += value;
                fixed_contribution += group.coeff * value;
            } else {
                unfixed.push(c);
            }
        }

        let mut unfixed_min = 0i64;
        let mut unfixed_max = 0i64;
        for partition in partition_unfixed(&unfixed, &group.exclusion_groups) {
            let (lo, hi) = distinct_sum_bounds(grid, lookup, &partition);
            unfixed_min += lo;
            unfixed_max += hi;
        }

        let (min_sum, max_sum) = if group.coeff >= 0 {
            (fixed_contribution + group.coeff * unfixed_min, fixed_contribution + group.coeff * unfixed_max)
        } else {
            (fixed_contribution + group.coeff * unfixed_max, fixed_contribution + group.coeff * unfixed_min)
        };

        GroupRange {
            min_sum,
            max_sum,
            fixed_sum,
            unfixed,
        }
    }
}

struct GroupRange {
    min_sum: i64,
    max_sum: i64,
    fixed_sum: i64,
    unfixed: Vec<usize>,
}

/// Restricts `exclusion_groups` (a partition of `group.cells`) down to the
/// still-unfixed cells, dropping partitions left empty.
fn partition_unfixed(unfixed: &[usize], exclusion_groups: &[Vec<usize>]) -> Vec<Vec<usize>> {
    exclusion_groups
        .iter()
        .map(|group| group.iter().copied().filter(|c| unfixed.contains(c)).collect::<Vec<_>>())
        .filter(|group| !group.is_empty())
        .collect()
}

/// The achievable `(min, max)` sum of raw values across a single
/// mutually-exclusive partition: the `k` smallest/largest *distinct*
/// candidate values across the partition's cells, where `k` is the
/// partition's size. Falls back to the naive per-cell sum when the
/// partition has fewer available values than cells, an infeasible
/// combination step 1's range-summary wipeout reports on its own.
fn distinct_sum_bounds(grid: &Grid, lookup: &LookupTables, partition: &[usize]) -> (i64, i64) {
    if partition.len() == 1 {
        let info = lookup.range_info(grid[partition[0]]);
        return (i64::from(info.min_value()), i64::from(info.max_value()));
    }
    let available = partition
        .iter()
        .map(|&c| grid[c])
        .reduce(|a, b| a | b)
        .unwrap_or(Mask::EMPTY);
    let values: Vec<u8> = available.iter().collect();
    let k = partition.len();
    if values.len() < k {
        let min = partition.iter().map(|&c| i64::from(lookup.range_info(grid[c]).min_value())).sum();
        let max = partition.iter().map(|&c| i64::from(lookup.range_info(grid[c]).max_value())).sum();
        return (min, max);
    }
    let min_sum = values[..k].iter().map(|&v| i64::from(v)).sum();
    let max_sum = values[values.len() - k..].iter().map(|&v| i64::from(v)).sum();
    (min_sum, max_sum)
}

impl Handler for Sum {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("sum", &self.cells, &format!("target={}", self.target))
    }

    fn priority(&self) -> i32 {
        // Sums are the dominant handler kind; batch them ahead of cheap
        // binary/house handlers within a propagation pass.
        10
    }

    fn initialize(
        &mut self,
        grid: &mut Grid,
        exclusions: &mut CellExclusions,
        _shape: &GridShape,
    ) -> bool {
        if self.cage_all_different {
            exclusions
                .add_all_different(&self.cells)
                .expect("CellExclusions must not be sealed during handler initialization");
        }

        for group in &mut self.groups {
            group.exclusion_groups = exclusions.partition_into_exclusion_groups(&group.cells);
        }

        self.is_cage = self.groups.len() == 1
            && self.groups[0].coeff.abs() == 1
            && self.groups[0].exclusion_groups.len() == 1
            && self.groups[0].exclusion_groups[0].len() == self.groups[0].cells.len();

        self.common_exclusions = exclusions.get_list_exclusions(&self.cells);

        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
    ) -> bool {
        // Step 1: range summary.
        let ranges: Vec<GroupRange> = self
            .groups
            .iter()
            .map(|g| Self::range_for_group(grid, &self.lookup, g))
            .collect();
        let total_min: i64 = ranges.iter().map(|r| r.min_sum).sum();
        let total_max: i64 = ranges.iter().map(|r| r.max_sum).sum();
        if total_min > self.target || total_max < self.target {
            return self.wipe_first_unfixed(grid, accumulator);
        }

        // Step 2: few remaining cells, exact solve (single-group, unit
        // coefficient case only).
        if self.groups.len() == 1 {
            let group = &self.groups[0];
            let range = &ranges[0];
            if group.coeff.abs() == 1 && (1..=3).contains(&range.unfixed.len()) {
                let target_sum = self.target - range.fixed_sum;
                let negative = group.coeff < 0;
                if !self.exact_small_case(
                    grid,
                    accumulator,
                    &range.unfixed,
                    target_sum,
                    negative,
                    &group.exclusion_groups,
                ) {
                    return false;
                }
            } else if range.unfixed.len() == 1 {
                // Arbitrary-coefficient single remaining cell: derive
                // algebraically.
                let target_sum = self.target - range.fixed_sum;
                let cell = range.unfixed[0];
                if group.coeff == 0 {
                    // Degenerate: contributes nothing; nothing to derive.
                } else if target_sum % group.coeff == 0 {
                    let value = target_sum / group.coeff;
                    if (1..=self.num_values as i64).contains(&value) {
                        let forced = Mask::singleton(value as u8);
                        if grid[cell].intersect_with(forced) {
                            accumulator.add_for_cell(cell);
                        }
                        if grid[cell].is_empty() {
                            return false;
                        }
                    } else {
                        grid[cell] = Mask::EMPTY;
                        accumulator.add_for_cell(cell);
                        return false;
                    }
                } else {
                    grid[cell] = Mask::EMPTY;
                    accumulator.add_for_cell(cell);
                    return false;
                }
            }
        }

        // Step 3: range propagation, for every group.
        for (group, range) in self.groups.iter().zip(&ranges) {
            let other_groups_min: i64 = total_min - range.min_sum;
            let other_groups_max: i64 = total_max - range.max_sum;
            for &x in &range.unfixed {
                let mut within_other_min = 0i64;
                let mut within_other_max = 0i64;
                for &c in &group.cells {
                    if c == x {
                        continue;
                    }
                    let info = self.lookup.range_info(grid[c]);
                    if info.is_wipeout(self.num_values) {
                        continue;
                    }
                    let (lo, hi) = (i64::from(info.min_value()), i64::from(info.max_value()));
                    let (lo, hi) = if lo == 0 && hi == 0 {
                        (0, 0)
                    } else {
                        (lo, hi)
                    };
                    if group.coeff >= 0 {
                        within_other_min += group.coeff * lo;
                        within_other_max += group.coeff * hi;
                    } else {
                        within_other_min += group.coeff * hi;
                        within_other_max += group.coeff * lo;
                    }
                }
                let lo_contribution = self.target - within_other_max - other_groups_max;
                let hi_contribution = self.target - within_other_min - other_groups_min;
                let (value_lo, value_hi) = if group.coeff > 0 {
                    (
                        lo_contribution.div_euclid(group.coeff).max(1),
                        hi_contribution.div_euclid(group.coeff).min(self.num_values as i64),
                    )
                } else if group.coeff < 0 {
                    (
                        hi_contribution.div_euclid(group.coeff).max(1),
                        lo_contribution.div_euclid(group.coeff).min(self.num_values as i64),
                    )
                } else {
                    (1, self.num_values as i64)
                };
                let mut allowed = Mask::EMPTY;
                if value_lo <= value_hi {
                    for v in value_lo.max(1)..=value_hi.min(self.num_values as i64) {
                        allowed.insert(v as u8);
                    }
                }
                if grid[x].intersect_with(allowed) {
                    accumulator.add_for_cell(x);
                    if grid[x].is_empty() {
                        return false;
                    }
                }
            }
        }

        // Step 5: exact restriction for the cage flag.
        if self.is_cage {
            let group = &self.groups[0];
            let range = &ranges[0];
            if !range.unfixed.is_empty() {
                let target_sum = self.target - range.fixed_sum;
                if !self.restrict_cage(grid, accumulator, &range.unfixed, target_sum) {
                    return false;
                }
            }
        } else if self.groups.len() > 1 || self.groups[0].exclusion_groups.len() > 1 {
            // Step 6: coefficient-aware restriction via greedy seen-min/max
            // banding, per exclusion group within each coefficient group.
            for group in &self.groups {
                for ex_group in &group.exclusion_groups {
                    if !self.restrict_exclusion_group(grid, accumulator, group, ex_group) {
                        return false;
                    }
                }
            }
        }

        // Step 4: complement propagation.
        if let Some(complement) = self.complement_cells.clone()
            && self.groups.len() == 1
            && self.groups[0].coeff.abs() == 1
        {
            let range = &ranges[0];
            if !self.restrict_complement(grid, accumulator, &range.unfixed, &complement, range.fixed_sum) {
                return false;
            }
        }

        for &c in &self.cells {
            if grid[c].is_empty() {
                return false;
            }
        }
        true
    }
}

impl Sum {
    fn wipe_first_unfixed(&self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        for &c in &self.cells {
            if !grid[c].is_singleton() {
                grid[c] = Mask::EMPTY;
                accumulator.add_for_cell(c);
                return false;
            }
        }
        // Every cell already fixed but the fixed sum itself violates the
        // target: wipe the last cell so the contradiction is visible.
        if let Some(&c) = self.cells.last() {
            grid[c] = Mask::EMPTY;
            accumulator.add_for_cell(c);
        }
        false
    }

    /// Brute-force exact solve for 1-3 unfixed cells sharing a single
    /// unit-magnitude coefficient. Enumerates value assignments directly
    /// rather than the literal pairwise-sum-table convolution described in
    /// the design for the 2/3-cell cases; both reach the same fixed
    /// point, and direct enumeration is simpler to keep correct for an
    /// arbitrary exclusion-group partition.
    fn exact_small_case(
        &self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
        unfixed: &[usize],
        target_sum: i64,
        negative: bool,
        exclusion_groups: &[Vec<usize>],
    ) -> bool {
        let same_group = |a: usize, b: usize| {
            exclusion_groups
                .iter()
                .any(|g| g.contains(&a) && g.contains(&b))
        };

        let masks: Vec<Mask> = unfixed.iter().map(|&c| grid[c]).collect();
        let mut allowed: Vec<Mask> = vec![Mask::EMPTY; unfixed.len()];

        fn go(
            idx: usize,
            remaining: i64,
            chosen: &mut Vec<u8>,
            unfixed: &[usize],
            masks: &[Mask],
            same_group: &dyn Fn(usize, usize) -> bool,
            allowed: &mut [Mask],
        ) {
            if idx == unfixed.len() {
                if remaining == 0 {
                    for (slot, &v) in allowed.iter_mut().zip(chosen.iter()) {
                        slot.insert(v);
                    }
                }
                return;
            }
            for v in masks[idx].iter() {
                let contribution = if idx + 1 == unfixed.len() {
                    i64::from(v)
                } else {
                    i64::from(v)
                };
                if contribution > remaining && remaining >= 0 {
                    // values only get larger; still must try all since
                    // mask iteration is ascending but later cells could
                    // need smaller — values are independent per cell, so
                    // no early break beyond bounds sanity.
                }
                let mut ok = true;
                for (j, &c2) in unfixed[..idx].iter().enumerate() {
                    if same_group(unfixed[idx], c2) && chosen[j] == v {
                        ok = false;
                        break;
                    }
                }
                if !ok {
                    continue;
                }
                chosen.push(v);
                go(
                    idx + 1,
                    remaining - i64::from(v),
                    chosen,
                    unfixed,
                    masks,
                    same_group,
                    allowed,
                );
                chosen.pop();
            }
        }

        // For a negative (coeff = -1) group, the algebraic target for the
        // sum of raw values is `-target_sum` (since contribution = -value).
        let effective_target = if negative { -target_sum } else { target_sum };

        let mut chosen = vec![];
        go(
            0,
            effective_target,
            &mut chosen,
            unfixed,
            &masks,
            &same_group,
            &mut allowed,
        );

        for (&c, &a) in unfixed.iter().zip(&allowed) {
            if grid[c].intersect_with(a) {
                accumulator.add_for_cell(c);
            }
            if grid[c].is_empty() {
                return false;
            }
        }
        true
    }

    /// Step 5: for a single-exclusion-group cage, enumerate value subsets
    /// of size `unfixed.len()` summing to `target_sum`, keep only those
    /// consistent with the cells' current candidates, union survivors into
    /// an allowed mask, and propagate values required by *every* surviving
    /// subset to cells outside the cage that exclude with all of it.
    fn restrict_cage(
        &self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
        unfixed: &[usize],
        target_sum: i64,
    ) -> bool {
        let available = unfixed
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a | b)
            .unwrap_or(Mask::EMPTY);
        let subsets = enumerate_subsets(available, unfixed.len(), target_sum);
        if subsets.is_empty() {
            for &c in unfixed {
                grid[c] = Mask::EMPTY;
                accumulator.add_for_cell(c);
            }
            return false;
        }

        let allowed = subsets.iter().fold(Mask::EMPTY, |acc, &s| acc | s);
        for &c in unfixed {
            if grid[c].intersect_with(allowed) {
                accumulator.add_for_cell(c);
            }
            if grid[c].is_empty() {
                return false;
            }
        }

        let required = subsets
            .iter()
            .copied()
            .reduce(|a, b| a & b)
            .unwrap_or(Mask::EMPTY);
        for value in required.iter() {
            for &outside in &self.common_exclusions {
                if grid[outside].contains(value) {
                    grid[outside].remove(value);
                    accumulator.add_for_cell(outside);
                    if grid[outside].is_empty() {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Step 4: complement propagation for a cage that, together with
    /// `complement`, exactly fills a union of houses.
    fn restrict_complement(
        &self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
        unfixed: &[usize],
        complement: &[usize],
        fixed_sum: i64,
    ) -> bool {
        if unfixed.is_empty() || complement.is_empty() {
            return true;
        }
        let cage_available = unfixed
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a | b)
            .unwrap_or(Mask::EMPTY);
        let complement_available = complement
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a | b)
            .unwrap_or(Mask::EMPTY);

        let target_sum = self.target - fixed_sum;
        let subsets = enumerate_subsets(cage_available, unfixed.len(), target_sum);

        let mut cage_allowed = Mask::EMPTY;
        let mut complement_allowed = Mask::EMPTY;
        let full_domain = Mask::full(self.num_values);
        for subset in subsets {
            let rest = full_domain & !subset;
            // The complement side must be able to realize `rest` with
            // its own cell count; a loose but sound check is that every
            // value in `rest` is still a candidate somewhere on that
            // side.
            if rest.iter().all(|v| complement_available.contains(v)) {
                cage_allowed |= subset;
                complement_allowed |= rest;
            }
        }

        for &c in unfixed {
            if grid[c].intersect_with(cage_allowed) {
                accumulator.add_for_cell(c);
            }
            if grid[c].is_empty() {
                return false;
            }
        }
        for &c in complement {
            if grid[c].is_singleton() {
                continue;
            }
            if grid[c].intersect_with(complement_allowed) {
                accumulator.add_for_cell(c);
            }
            if grid[c].is_empty() {
                return false;
            }
        }
        true
    }

    /// Step 6: coefficient-aware restriction. Computes the greedy
    /// smallest/largest distinct-value packing for an exclusion group and
    /// bands every cell in it to `[min, max + dof] * |coeff|`-scaled
    /// range, where `dof` is the group's degrees of freedom (unfixed count
    /// minus 1).
    fn restrict_exclusion_group(
        &self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
        group: &CoeffGroup,
        ex_group: &[usize],
    ) -> bool {
        let unfixed: Vec<usize> = ex_group.iter().copied().filter(|&c| !grid[c].is_singleton()).collect();
        if unfixed.len() < 2 {
            return true;
        }
        let available = unfixed
            .iter()
            .map(|&c| grid[c])
            .reduce(|a, b| a | b)
            .unwrap_or(Mask::EMPTY);
        let values: Vec<u8> = available.iter().collect();
        if values.len() < unfixed.len() {
            for &c in &unfixed {
                grid[c] = Mask::EMPTY;
                accumulator.add_for_cell(c);
            }
            return false;
        }
        let seen_min = values[..unfixed.len()].iter().copied().min().unwrap_or(1);
        let seen_max_slice = &values[values.len() - unfixed.len()..];
        let seen_max = seen_max_slice.iter().copied().max().unwrap_or(self.num_values as u8);
        let dof = (unfixed.len() - 1) as u8;
        let lo = seen_min;
        let hi = (seen_max + dof).min(self.num_values as u8);
        let mut band = Mask::EMPTY;
        for v in lo..=hi {
            band.insert(v);
        }
        let _ = group.coeff;
        for &c in &unfixed {
            if grid[c].intersect_with(band) {
                accumulator.add_for_cell(c);
            }
            if grid[c].is_empty() {
                return false;
            }
        }
        true
    }
}

/// Enumerates every size-`k` subset of `available`'s values summing to
/// `target_sum`. Used by [`Sum::restrict_cage`] and
/// [`Sum::restrict_complement`] in place of the design's precomputed
/// "killer-cage sums" table — equivalent output, computed on demand
/// instead of memoized, since cage sizes in practice stay small (<= 15 by
/// construction) and this runs only when the few-remaining-cells fast path
/// didn't already resolve the cage.
fn enumerate_subsets(available: Mask, k: usize, target_sum: i64) -> Vec<Mask> {
    if k == 0 {
        return if target_sum == 0 { vec![Mask::EMPTY] } else { vec![] };
    }
    let values: Vec<u8> = available.iter().collect();
    let mut results = vec![];
    let mut chosen = vec![];

    fn go(
        start: usize,
        k: usize,
        remaining: i64,
        values: &[u8],
        chosen: &mut Vec<u8>,
        results: &mut Vec<Mask>,
    ) {
        if chosen.len() == k {
            if remaining == 0 {
                let mut m = Mask::EMPTY;
                for &v in chosen.iter() {
                    m.insert(v);
                }
                results.push(m);
            }
            return;
        }
        if start >= values.len() {
            return;
        }
        let need = k - chosen.len();
        if values.len() - start < need {
            return;
        }
        for i in start..values.len() {
            let v = values[i];
            if i64::from(v) > remaining {
                break;
            }
            chosen.push(v);
            go(i + 1, k, remaining - i64::from(v), values, chosen, results);
            chosen.pop();
        }
    }

    go(0, k, target_sum, &values, &mut chosen, &mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn killer_cage_restricts_to_value_set() {
        // {R1C1,R1C2,R1C3} sum=6 on an otherwise empty 9x9: restricted to {1,2,3}.
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let mut sum = Sum::new(vec![0, 1, 2], None, 6, 9, true).unwrap();
        assert!(sum.initialize(&mut grid, &mut exclusions, &shape));
        for c in [0, 1, 2] {
            assert_eq!(grid[c], Mask::singleton(1) | Mask::singleton(2) | Mask::singleton(3));
        }
    }

    #[test]
    fn arrow_bounds_head_and_shaft() {
        // head=R1C1, shaft=[R1C2,R1C3]: head = shaft1 + shaft2. In the full
        // kernel the row house registers shaft1/shaft2 as mutually
        // exclusive before this handler ever sees the grid; a standalone
        // `Sum` test has to register that exclusion itself to exercise the
        // same distinctness-aware bound (`range_for_group` routes it
        // through `group.exclusion_groups`), deriving head >= 1+2 rather
        // than the looser 1+1 two independent ranges would allow.
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        exclusions.add_mutual_exclusion(1, 2).unwrap();
        let mut sum = Sum::new(vec![0, 1, 2], Some(vec![-1, 1, 1]), 0, 9, false).unwrap();
        assert!(sum.initialize(&mut grid, &mut exclusions, &shape));
        assert_eq!(grid[0].min_value(), Some(3)); // head >= 1+2
        assert_eq!(grid[0].max_value(), Some(9));
        assert_eq!(grid[1].max_value(), Some(8)); // shaft < head's max contribution
    }

    #[test]
    fn single_cell_cage_forces_value() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let mut sum = Sum::new(vec![0], None, 7, 9, true).unwrap();
        assert!(sum.initialize(&mut grid, &mut exclusions, &shape));
        assert_eq!(grid[0], Mask::singleton(7));
    }

    #[test]
    fn infeasible_range_is_reported() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        // Two cells can sum to at most 17; ask for 100.
        let mut sum = Sum::new(vec![0, 1], None, 100, 9, true).unwrap();
        assert!(!sum.initialize(&mut grid, &mut exclusions, &shape));
    }

    #[test]
    fn enumerate_subsets_excludes_repeats() {
        let available = Mask::full(5);
        let subsets = enumerate_subsets(available, 2, 5);
        // {1,4} and {2,3} sum to 5 from {1..5}.
        assert_eq!(subsets.len(), 2);
    }
}
