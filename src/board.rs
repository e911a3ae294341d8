//! Game board representation and collision detection
//!
//! The grid is a flat array indexed `row * BOARD_WIDTH + col` with row 0 at
//! the top. Column 0 is a sentinel that is never written, so a piece can not
//! wrap from one edge of the field to the other. The two top rows are hidden
//! and act as the spawn and overflow area.

use crate::tetromino::PieceKind;

/// Standard Tetris field dimensions
pub const VISIBLE_COLS: usize = 10;
pub const VISIBLE_ROWS: usize = 20;
/// Hidden rows above the visible field for spawning
pub const HIDDEN_ROWS: usize = 2;
/// Stored width, including the sentinel column
pub const BOARD_WIDTH: usize = VISIBLE_COLS + 1;
pub const BOARD_HEIGHT: usize = VISIBLE_ROWS + HIDDEN_ROWS;
pub const BOARD_LEN: usize = BOARD_WIDTH * BOARD_HEIGHT;
pub const SENTINEL_COL: usize = 0;
/// Lowest reserved row; a lock touching this row or above tops out
pub const OVERFLOW_ROW: usize = HIDDEN_ROWS - 1;

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// A settled block or a block of the active piece
    Block(PieceKind),
    /// Landing preview; never collides
    Ghost,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Block(_))
    }
}

/// Index of a (row, col) position
pub fn index_of(row: usize, col: usize) -> usize {
    row * BOARD_WIDTH + col
}

/// Row and column of an index
pub fn position_of(index: usize) -> (usize, usize) {
    (index / BOARD_WIDTH, index % BOARD_WIDTH)
}

/// Resolve a signed (row, col) position to an index if it lies inside the
/// playable area. The sentinel column and anything outside the grid give None.
pub fn checked_index(row: i32, col: i32) -> Option<usize> {
    if row < 0 || row >= BOARD_HEIGHT as i32 {
        return None;
    }
    if col <= SENTINEL_COL as i32 || col > VISIBLE_COLS as i32 {
        return None;
    }
    Some(index_of(row as usize, col as usize))
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board {
    cells: [Cell; BOARD_LEN],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_LEN],
        }
    }

    /// All cells in index order, for renderers
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get the cell at an index
    pub fn cell(&self, index: usize) -> Cell {
        self.cells.get(index).copied().unwrap_or_default()
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 || row >= BOARD_HEIGHT as i32 || col >= BOARD_WIDTH as i32 {
            return None;
        }
        Some(self.cells[index_of(row as usize, col as usize)])
    }

    /// Set a cell at a playable position
    /// Returns false if out of bounds or on the sentinel column
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match checked_index(row, col) {
            Some(index) => {
                self.cells[index] = cell;
                true
            }
            None => false,
        }
    }

    /// True if the cell holds a block. Ghost cells never count.
    pub fn occupied(&self, index: usize) -> bool {
        self.cell(index).is_filled()
    }

    /// True if `index` is occupied by something other than the piece's own
    /// current cells
    pub fn collides(&self, own_cells: &[usize], index: usize) -> bool {
        self.occupied(index) && !own_cells.contains(&index)
    }

    /// Write the same tag to every index. Callers bounds-check first.
    pub fn write(&mut self, indices: &[usize], cell: Cell) {
        for &index in indices {
            self.cells[index] = cell;
        }
    }

    /// Write ghost markers, leaving any non-empty cell untouched
    pub fn write_ghost(&mut self, indices: &[usize]) {
        for &index in indices {
            if self.cells[index].is_empty() {
                self.cells[index] = Cell::Ghost;
            }
        }
    }

    /// Clear cells back to empty
    pub fn clear(&mut self, indices: &[usize]) {
        self.write(indices, Cell::Empty);
    }

    /// Remove ghost markers at the given cells, leaving blocks alone
    pub fn clear_ghost(&mut self, indices: &[usize]) {
        for &index in indices {
            if self.cells[index] == Cell::Ghost {
                self.cells[index] = Cell::Empty;
            }
        }
    }

    /// Check if a row has a block in every playable column
    pub fn is_row_full(&self, row: usize) -> bool {
        (1..=VISIBLE_COLS).all(|col| self.cells[index_of(row, col)].is_filled())
    }

    /// The subset of `rows` that are full, sorted top to bottom
    pub fn full_rows(&self, rows: &[usize]) -> Vec<usize> {
        let mut full: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&row| row < BOARD_HEIGHT && self.is_row_full(row))
            .collect();
        full.sort_unstable();
        full.dedup();
        full
    }

    /// Remove every full row in `rows`, shifting the rows above down and
    /// inserting empty rows at the top. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self, rows: &[usize]) -> usize {
        let full = self.full_rows(rows);
        // Top to bottom: removing a row never moves a lower row
        for &row in &full {
            let end = index_of(row, 0);
            self.cells.copy_within(0..end, BOARD_WIDTH);
            self.cells[..BOARD_WIDTH].fill(Cell::Empty);
        }
        full.len()
    }

    /// Check if the board is completely empty (for perfect clear detection)
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, row: i32) {
        for col in 1..=VISIBLE_COLS as i32 {
            board.set(row, col, Cell::Block(PieceKind::I));
        }
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.cells().len(), BOARD_LEN);
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::new();
        assert!(board.set(5, 5, Cell::Block(PieceKind::T)));
        assert_eq!(board.get(5, 5), Some(Cell::Block(PieceKind::T)));
        assert!(board.occupied(index_of(5, 5)));
    }

    #[test]
    fn test_sentinel_and_out_of_bounds() {
        let mut board = Board::new();
        assert!(!board.set(3, SENTINEL_COL as i32, Cell::Block(PieceKind::O)));
        assert_eq!(checked_index(0, 0), None);
        assert_eq!(checked_index(-1, 3), None);
        assert_eq!(checked_index(BOARD_HEIGHT as i32, 3), None);
        assert_eq!(checked_index(3, VISIBLE_COLS as i32 + 1), None);
        assert_eq!(board.get(-1, 0), None);
        assert_eq!(board.get(0, BOARD_WIDTH as i32), None);
    }

    #[test]
    fn test_ghost_never_collides_or_overwrites() {
        let mut board = Board::new();
        board.set(10, 3, Cell::Block(PieceKind::L));
        let settled = index_of(10, 3);
        let free = index_of(10, 4);
        board.write_ghost(&[settled, free]);
        assert_eq!(board.cell(settled), Cell::Block(PieceKind::L));
        assert_eq!(board.cell(free), Cell::Ghost);
        assert!(!board.occupied(free));
        board.clear_ghost(&[settled, free]);
        assert_eq!(board.cell(settled), Cell::Block(PieceKind::L));
        assert!(board.cell(free).is_empty());
    }

    #[test]
    fn test_collides_ignores_own_cells() {
        let mut board = Board::new();
        let own = [index_of(4, 4), index_of(4, 5)];
        board.write(&own, Cell::Block(PieceKind::O));
        assert!(!board.collides(&own, own[0]));
        board.set(4, 6, Cell::Block(PieceKind::J));
        assert!(board.collides(&own, index_of(4, 6)));
    }

    #[test]
    fn test_clear_single_line() {
        let mut board = Board::new();
        let bottom = BOARD_HEIGHT as i32 - 1;
        fill_row(&mut board, bottom);
        board.set(bottom - 1, 1, Cell::Block(PieceKind::Z));

        let cleared = board.clear_full_rows(&[bottom as usize]);
        assert_eq!(cleared, 1);
        // The block above should now sit on the bottom row
        assert_eq!(board.get(bottom, 1), Some(Cell::Block(PieceKind::Z)));
        assert!(board.get(bottom - 1, 1).unwrap().is_empty());
    }

    #[test]
    fn test_clear_only_listed_full_rows() {
        let mut board = Board::new();
        let bottom = BOARD_HEIGHT as i32 - 1;
        fill_row(&mut board, bottom);
        fill_row(&mut board, bottom - 2);
        board.set(bottom - 1, 2, Cell::Block(PieceKind::S));
        board.set(bottom - 3, 7, Cell::Block(PieceKind::T));

        let before = board.cells().iter().filter(|c| c.is_filled()).count();
        let cleared = board.clear_full_rows(&[bottom as usize, bottom as usize - 2, bottom as usize - 1]);
        assert_eq!(cleared, 2);
        assert_eq!(board.get(bottom, 2), Some(Cell::Block(PieceKind::S)));
        assert_eq!(board.get(bottom - 1, 7), Some(Cell::Block(PieceKind::T)));
        let after = board.cells().iter().filter(|c| c.is_filled()).count();
        assert_eq!(after, before - 2 * VISIBLE_COLS);
        assert_eq!(board.cells().len(), BOARD_LEN);
    }

    #[test]
    fn test_partial_row_is_not_full() {
        let mut board = Board::new();
        for col in 1..VISIBLE_COLS as i32 {
            board.set(21, col, Cell::Block(PieceKind::I));
        }
        board.set(21, VISIBLE_COLS as i32, Cell::Ghost);
        assert!(!board.is_row_full(21));
        assert_eq!(board.clear_full_rows(&[21]), 0);
    }
}
