//! Grid-shape configuration: dimensions, region enumeration, and the
//! wire-facing cell-id encoding.

use crate::error::CoreError;

/// A house: a region of cells that must all hold distinct values.
///
/// Produced by [`GridShape::rows`], [`GridShape::columns`], and
/// [`GridShape::boxes`]. Callers needing jigsaw or windoku regions build
/// their own `Vec<usize>` cell lists directly; `GridShape` only knows about
/// the canonical row/column/box houses implied by its dimensions.
pub type House = Vec<usize>;

/// Pure configuration describing a (possibly non-square, possibly
/// non-9-valued) grid's dimensions.
///
/// `GridShape` never owns mutable state; it is constructed once per puzzle
/// and shared by every handler and the engine.
///
/// # Examples
///
/// ```
/// use variant_sudoku_core::GridShape;
///
/// let shape = GridShape::new(9, 9, 9, Some((3, 3))).unwrap();
/// assert_eq!(shape.num_cells(), 81);
/// assert_eq!(shape.cell_index(1, 1), 10);
/// assert_eq!(shape.split_cell_index(10), (1, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridShape {
    num_rows: usize,
    num_cols: usize,
    num_values: usize,
    boxes: Option<(usize, usize)>,
}

impl GridShape {
    /// Creates a grid shape.
    ///
    /// `boxes`, when present, is `(box_width, box_height)` and must satisfy
    /// `box_width * box_height == num_values`; when `None`, no box houses
    /// are generated (the "no-default-boxes" flag from the wire format).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InconsistentBoxDimensions`] if `boxes` is
    /// `Some` but the product doesn't equal `num_values`.
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        num_values: usize,
        boxes: Option<(usize, usize)>,
    ) -> Result<Self, CoreError> {
        if let Some((bw, bh)) = boxes
            && bw * bh != num_values
        {
            return Err(CoreError::InconsistentBoxDimensions {
                box_width: bw,
                box_height: bh,
                num_values,
            });
        }
        Ok(Self {
            num_rows,
            num_cols,
            num_values,
            boxes,
        })
    }

    /// Creates a grid shape, automatically deriving box dimensions when
    /// `num_rows * num_cols == num_values * num_values` and a square box
    /// tiling exists; otherwise boxes are disabled.
    ///
    /// This matches the wire-facing rule from the grid-shape tag: box
    /// width/height derive automatically when `rows * cols == numValues^2`.
    #[must_use]
    pub fn with_derived_boxes(num_rows: usize, num_cols: usize, num_values: usize) -> Self {
        let boxes = derive_box_dims(num_rows, num_cols, num_values);
        Self {
            num_rows,
            num_cols,
            num_values,
            boxes,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of distinct values (the size of a house).
    #[must_use]
    pub const fn num_values(&self) -> usize {
        self.num_values
    }

    /// Total number of cells (`num_rows * num_cols`).
    #[must_use]
    pub const fn num_cells(&self) -> usize {
        self.num_rows * self.num_cols
    }

    /// The box dimensions, if this shape has boxes.
    #[must_use]
    pub const fn box_dims(&self) -> Option<(usize, usize)> {
        self.boxes
    }

    /// Converts `(row, col)` (0-indexed) to a cell index.
    #[must_use]
    pub const fn cell_index(&self, row: usize, col: usize) -> usize {
        row * self.num_cols + col
    }

    /// Converts a cell index back to `(row, col)` (0-indexed).
    #[must_use]
    pub const fn split_cell_index(&self, cell: usize) -> (usize, usize) {
        (cell / self.num_cols, cell % self.num_cols)
    }

    /// Parses a wire-facing cell id into a 0-indexed cell.
    ///
    /// Accepts either a canonical `R<row>C<col>` string (1-based row,
    /// 1-based column expressed as a digit `1`-`9` or hex digit `a`-`g` for
    /// columns >= 10) or a plain base-10 cell index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedCellId`] if `id` matches neither
    /// format, and [`CoreError::CellOutOfRange`] if the parsed coordinates
    /// fall outside this shape.
    pub fn parse_cell_id(&self, id: &str) -> Result<usize, CoreError> {
        if let Ok(index) = id.parse::<usize>() {
            if index >= self.num_cells() {
                let (row, col) = (index / self.num_cols.max(1), index % self.num_cols.max(1));
                return Err(CoreError::CellOutOfRange {
                    row,
                    col,
                    rows: self.num_rows,
                    cols: self.num_cols,
                });
            }
            return Ok(index);
        }

        let bytes = id.as_bytes();
        if bytes.len() < 4 || bytes[0] != b'R' {
            return Err(CoreError::MalformedCellId(id.to_string()));
        }
        let c_pos = id[1..]
            .find('C')
            .map(|p| p + 1)
            .ok_or_else(|| CoreError::MalformedCellId(id.to_string()))?;
        let row_str = &id[1..c_pos];
        let col_str = &id[c_pos + 1..];
        let row: usize = row_str
            .parse()
            .map_err(|_| CoreError::MalformedCellId(id.to_string()))?;
        let col = parse_column_digit(col_str).ok_or_else(|| CoreError::MalformedCellId(id.to_string()))?;
        if row == 0 || col == 0 {
            return Err(CoreError::MalformedCellId(id.to_string()));
        }
        let (row, col) = (row - 1, col - 1);
        if row >= self.num_rows || col >= self.num_cols {
            return Err(CoreError::CellOutOfRange {
                row,
                col,
                rows: self.num_rows,
                cols: self.num_cols,
            });
        }
        Ok(self.cell_index(row, col))
    }

    /// Formats a 0-indexed cell as a wire-facing `R<row>C<col>` id.
    #[must_use]
    pub fn make_cell_id(&self, cell: usize) -> String {
        let (row, col) = self.split_cell_index(cell);
        format!("R{}C{}", row + 1, format_column_digit(col + 1))
    }

    /// Enumerates the row houses.
    #[must_use]
    pub fn rows(&self) -> Vec<House> {
        (0..self.num_rows)
            .map(|r| (0..self.num_cols).map(|c| self.cell_index(r, c)).collect())
            .collect()
    }

    /// Enumerates the column houses.
    #[must_use]
    pub fn columns(&self) -> Vec<House> {
        (0..self.num_cols)
            .map(|c| (0..self.num_rows).map(|r| self.cell_index(r, c)).collect())
            .collect()
    }

    /// Enumerates the box houses, or an empty `Vec` if this shape has no
    /// boxes.
    #[must_use]
    pub fn boxes(&self) -> Vec<House> {
        let Some((bw, bh)) = self.boxes else {
            return vec![];
        };
        let boxes_per_row = self.num_cols / bw;
        let boxes_per_col = self.num_rows / bh;
        let mut out = Vec::with_capacity(boxes_per_row * boxes_per_col);
        for box_row in 0..boxes_per_col {
            for box_col in 0..boxes_per_row {
                let mut cells = Vec::with_capacity(bw * bh);
                for dy in 0..bh {
                    for dx in 0..bw {
                        cells.push(self.cell_index(box_row * bh + dy, box_col * bw + dx));
                    }
                }
                out.push(cells);
            }
        }
        out
    }

    /// The two main diagonals, when the grid is square.
    #[must_use]
    pub fn diagonals(&self) -> Vec<House> {
        if self.num_rows != self.num_cols {
            return vec![];
        }
        let n = self.num_rows;
        let main: House = (0..n).map(|i| self.cell_index(i, i)).collect();
        let anti: House = (0..n).map(|i| self.cell_index(i, n - 1 - i)).collect();
        vec![main, anti]
    }

    /// All canonical houses: rows, columns, and (if present) boxes.
    #[must_use]
    pub fn all_houses(&self) -> Vec<House> {
        let mut houses = self.rows();
        houses.extend(self.columns());
        houses.extend(self.boxes());
        houses
    }
}

/// Derives `(box_width, box_height)` when `rows * cols == num_values^2` and
/// a factorization of `num_values` tiles the grid; otherwise `None`.
fn derive_box_dims(num_rows: usize, num_cols: usize, num_values: usize) -> Option<(usize, usize)> {
    if num_rows * num_cols != num_values * num_values {
        return None;
    }
    for box_width in 1..=num_values {
        if num_values % box_width != 0 {
            continue;
        }
        let box_height = num_values / box_width;
        if num_cols % box_width == 0 && num_rows % box_height == 0 {
            return Some((box_width, box_height));
        }
    }
    None
}

fn parse_column_digit(s: &str) -> Option<usize> {
    if s.len() != 1 {
        return None;
    }
    let c = s.as_bytes()[0];
    match c {
        b'1'..=b'9' => Some((c - b'0') as usize),
        b'a'..=b'g' => Some((c - b'a') as usize + 10),
        _ => None,
    }
}

fn format_column_digit(col: usize) -> String {
    if col <= 9 {
        col.to_string()
    } else {
        ((b'a' + (col - 10) as u8) as char).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_round_trip() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        for r in 0..9 {
            for c in 0..9 {
                let idx = shape.cell_index(r, c);
                assert_eq!(shape.split_cell_index(idx), (r, c));
            }
        }
    }

    #[test]
    fn derives_standard_boxes() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        assert_eq!(shape.box_dims(), Some((3, 3)));
        assert_eq!(shape.boxes().len(), 9);
    }

    #[test]
    fn derives_16_wide_boxes() {
        let shape = GridShape::with_derived_boxes(16, 16, 16);
        assert_eq!(shape.box_dims(), Some((4, 4)));
    }

    #[test]
    fn non_square_grid_has_no_boxes() {
        let shape = GridShape::with_derived_boxes(4, 9, 9);
        assert_eq!(shape.box_dims(), None);
        assert!(shape.boxes().is_empty());
    }

    #[test]
    fn parse_and_format_cell_id() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        assert_eq!(shape.parse_cell_id("R1C1").unwrap(), 0);
        assert_eq!(shape.parse_cell_id("R9C9").unwrap(), 80);
        assert_eq!(shape.make_cell_id(0), "R1C1");
        assert_eq!(shape.make_cell_id(80), "R9C9");
    }

    #[test]
    fn parse_hex_column_for_wide_grids() {
        let shape = GridShape::with_derived_boxes(16, 16, 16);
        // Column 16 is hex digit 'g' (10 + 6 = 16).
        let idx = shape.parse_cell_id("R1Cg").unwrap();
        assert_eq!(shape.split_cell_index(idx), (0, 15));
        assert_eq!(shape.make_cell_id(idx), "R1Cg");
    }

    #[test]
    fn malformed_cell_id_errors() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        assert!(matches!(
            shape.parse_cell_id("bogus"),
            Err(CoreError::MalformedCellId(_))
        ));
    }

    #[test]
    fn out_of_range_cell_id_errors() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        assert!(matches!(
            shape.parse_cell_id("R10C1"),
            Err(CoreError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn diagonals_only_for_square_grids() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        assert_eq!(shape.diagonals().len(), 2);
        let non_square = GridShape::new(4, 9, 9, None).unwrap();
        assert!(non_square.diagonals().is_empty());
    }
}
