//! Active falling piece logic
//!
//! The active piece and its ghost are drawn into the board itself. Every
//! move is validated against the board first and applied atomically: either
//! all four cells move or nothing changes.

use crate::board::{checked_index, index_of, position_of, Board, Cell, BOARD_HEIGHT};
use crate::srs::get_wall_kicks;
use crate::tetromino::{PieceKind, Rotation, RotationDirection};

/// Row of the spawn center (the lower hidden row)
pub const SPAWN_ROW: usize = 1;
/// Column of the spawn center
pub const SPAWN_COL: usize = 5;

/// An active falling piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// The kind of tetromino
    pub kind: PieceKind,
    /// Current rotation state
    pub rotation: Rotation,
    /// Board index of the rotation center
    pub center: usize,
    /// Board indices of the 4 blocks
    cells: [usize; 4],
    /// Board indices of the landing preview
    ghost: [usize; 4],
    /// Whether the last successful move was a rotation (for T-spin detection)
    last_move_rotation: bool,
}

/// Resolve the 4 cells of `kind` at `rotation` around a signed center.
/// None if any cell leaves the grid or touches the sentinel column.
fn cells_at(kind: PieceKind, rotation: Rotation, row: i32, col: i32) -> Option<[usize; 4]> {
    let mut cells = [0; 4];
    for (slot, (dr, dc)) in cells.iter_mut().zip(kind.shape(rotation)) {
        *slot = checked_index(row + dr, col + dc)?;
    }
    Some(cells)
}

fn signed_position(index: usize) -> (i32, i32) {
    let (row, col) = position_of(index);
    (row as i32, col as i32)
}

impl Piece {
    /// Place a new piece at the spawn position. Returns None if any spawn
    /// cell is already occupied.
    pub fn spawn(kind: PieceKind, board: &mut Board) -> Option<Self> {
        let center = index_of(SPAWN_ROW, SPAWN_COL);
        let (row, col) = signed_position(center);
        let cells = cells_at(kind, Rotation::North, row, col)?;
        if cells.iter().any(|&index| board.occupied(index)) {
            return None;
        }

        board.write(&cells, Cell::Block(kind));
        let mut piece = Self {
            kind,
            rotation: Rotation::North,
            center,
            cells,
            ghost: cells,
            last_move_rotation: false,
        };
        piece.refresh_ghost(board);
        Some(piece)
    }

    /// Board indices of the 4 blocks
    pub fn cells(&self) -> &[usize; 4] {
        &self.cells
    }

    /// Board indices of the ghost projection
    pub fn ghost(&self) -> &[usize; 4] {
        &self.ghost
    }

    /// Rows the piece occupies, top to bottom, without duplicates
    pub fn rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.cells.iter().map(|&i| position_of(i).0).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    pub fn last_move_was_rotation(&self) -> bool {
        self.last_move_rotation
    }

    /// Move the piece by (d_row, d_col) into `rotation`. Rejected moves
    /// change nothing. The ghost is recomputed when the column or rotation
    /// changes.
    fn translate(
        &mut self,
        board: &mut Board,
        d_row: i32,
        d_col: i32,
        rotation: Rotation,
    ) -> bool {
        let (row, col) = signed_position(self.center);
        let Some(candidate) = cells_at(self.kind, rotation, row + d_row, col + d_col) else {
            return false;
        };
        if candidate.iter().any(|&index| board.collides(&self.cells, index)) {
            return false;
        }

        // Clear first so the old blocks never shadow the new ones
        board.clear(&self.cells);
        board.write(&candidate, Cell::Block(self.kind));
        self.cells = candidate;
        // Every shape contains its own center, so the center is in bounds too
        self.center = index_of((row + d_row) as usize, (col + d_col) as usize);
        let reprojected = d_col != 0 || rotation != self.rotation;
        self.rotation = rotation;
        self.last_move_rotation = false;

        if reprojected {
            self.refresh_ghost(board);
        } else {
            board.write_ghost(&self.ghost);
        }
        true
    }

    /// Try to move one column left or right, returns true if successful
    pub fn shift(&mut self, board: &mut Board, d_col: i32) -> bool {
        self.translate(board, 0, d_col, self.rotation)
    }

    /// Try to move down one row, returns true if successful
    pub fn fall(&mut self, board: &mut Board) -> bool {
        self.translate(board, 1, 0, self.rotation)
    }

    /// Check whether the piece can move down one row
    pub fn can_fall(&self, board: &Board) -> bool {
        let (row, col) = signed_position(self.center);
        match cells_at(self.kind, self.rotation, row + 1, col) {
            Some(candidate) => !candidate.iter().any(|&i| board.collides(&self.cells, i)),
            None => false,
        }
    }

    /// Try to rotate, using SRS wall kicks. The first candidate that fits
    /// wins; candidate 0 is the plain rotation.
    pub fn rotate(&mut self, board: &mut Board, direction: RotationDirection) -> bool {
        if !self.kind.rotates() {
            return false;
        }

        let target = self.rotation.turn(direction);
        for (d_row, d_col) in get_wall_kicks(self.kind, self.rotation, target) {
            if self.translate(board, d_row, d_col, target) {
                if self.kind == PieceKind::T {
                    self.last_move_rotation = true;
                }
                return true;
            }
        }
        false
    }

    /// Rows between the piece and its ghost
    pub fn drop_distance(&self) -> usize {
        position_of(self.ghost[0]).0 - position_of(self.cells[0]).0
    }

    /// Hard drop - move down onto the ghost and return the distance dropped
    pub fn hard_drop(&mut self, board: &mut Board) -> usize {
        let distance = self.drop_distance();
        if distance > 0 {
            // The ghost is a validated resting place, so this always succeeds
            self.translate(board, distance as i32, 0, self.rotation);
        }
        distance
    }

    /// Remove the piece and its ghost from the board (hold)
    pub fn remove(&self, board: &mut Board) {
        board.clear_ghost(&self.ghost);
        board.clear(&self.cells);
    }

    /// Strip the ghost before the blocks settle for good (lock)
    pub fn settle(&self, board: &mut Board) {
        board.clear_ghost(&self.ghost);
    }

    /// Project straight down to the lowest reachable row and redraw the ghost
    fn refresh_ghost(&mut self, board: &mut Board) {
        board.clear_ghost(&self.ghost);

        let (row, col) = signed_position(self.center);
        let mut landing = self.cells;
        for drop in 1..BOARD_HEIGHT as i32 {
            match cells_at(self.kind, self.rotation, row + drop, col) {
                Some(candidate) if !candidate.iter().any(|&i| board.collides(&self.cells, i)) => {
                    landing = candidate;
                }
                _ => break,
            }
        }

        self.ghost = landing;
        board.write_ghost(&self.ghost);
    }

    /// Whether this is a T piece (for T-spin detection)
    pub fn is_t_piece(&self) -> bool {
        matches!(self.kind, PieceKind::T)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_LEN, VISIBLE_COLS};

    fn block_count(board: &Board) -> usize {
        board.cells().iter().filter(|c| c.is_filled()).count()
    }

    #[test]
    fn test_spawn_position() {
        let mut board = Board::new();
        let piece = Piece::spawn(PieceKind::T, &mut board).unwrap();
        assert_eq!(position_of(piece.center), (1, 5));
        assert_eq!(piece.rows(), vec![0, 1]);
        assert_eq!(block_count(&board), 4);
    }

    #[test]
    fn test_spawn_blocked() {
        let mut board = Board::new();
        board.set(1, 5, Cell::Block(PieceKind::O));
        assert!(Piece::spawn(PieceKind::T, &mut board).is_none());
    }

    #[test]
    fn test_ghost_rests_on_floor() {
        let mut board = Board::new();
        let piece = Piece::spawn(PieceKind::I, &mut board).unwrap();
        assert!(piece.ghost().iter().all(|&i| position_of(i).0 == BOARD_HEIGHT - 1));
        assert!(piece.ghost().iter().all(|&i| board.cell(i) == Cell::Ghost));
        assert_eq!(piece.drop_distance(), BOARD_HEIGHT - 2);
    }

    #[test]
    fn test_shift_stops_at_walls() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::O, &mut board).unwrap();
        let mut moves = 0;
        while piece.shift(&mut board, -1) {
            moves += 1;
        }
        // O spans columns 5-6 at spawn
        assert_eq!(moves, 4);
        assert!(piece.cells().iter().all(|&i| position_of(i).1 >= 1));

        let mut moves = 0;
        while piece.shift(&mut board, 1) {
            moves += 1;
        }
        assert_eq!(moves, VISIBLE_COLS - 2);
        assert_eq!(block_count(&board), 4);
    }

    #[test]
    fn test_fall_keeps_ghost_column() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::L, &mut board).unwrap();
        let ghost = *piece.ghost();
        assert!(piece.fall(&mut board));
        assert_eq!(piece.ghost(), &ghost);
    }

    #[test]
    fn test_hard_drop() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::I, &mut board).unwrap();
        let ghost = *piece.ghost();
        let distance = piece.hard_drop(&mut board);
        assert_eq!(distance, BOARD_HEIGHT - 2);
        assert_eq!(piece.cells(), &ghost);
        assert!(!piece.can_fall(&board));
        assert_eq!(block_count(&board), 4);
    }

    #[test]
    fn test_o_does_not_rotate() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::O, &mut board).unwrap();
        let before = piece.clone();
        assert!(!piece.rotate(&mut board, RotationDirection::Clockwise));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_i_rotates_into_guideline_column() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::I, &mut board).unwrap();
        piece.fall(&mut board);
        assert!(piece.rotate(&mut board, RotationDirection::Clockwise));
        let cols: Vec<_> = piece.cells().iter().map(|&i| position_of(i).1).collect();
        assert!(cols.iter().all(|&c| c == SPAWN_COL + 1));
        assert_eq!(block_count(&board), 4);
    }

    #[test]
    fn test_wall_kick_off_left_wall() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::T, &mut board).unwrap();
        for _ in 0..3 {
            piece.fall(&mut board);
        }
        // Point east and push the stem against the wall
        assert!(piece.rotate(&mut board, RotationDirection::Clockwise));
        while piece.shift(&mut board, -1) {}
        assert_eq!(position_of(piece.center).1, 1);
        // South needs column 0 in place, so the second test kicks right
        assert!(piece.rotate(&mut board, RotationDirection::Clockwise));
        assert_eq!(piece.rotation, Rotation::South);
        assert_eq!(position_of(piece.center), (4, 2));
        assert!(piece.cells().iter().all(|&i| position_of(i).1 >= 1));
        assert!(piece.last_move_was_rotation());
        assert_eq!(block_count(&board), 4);
    }

    #[test]
    fn test_rotation_blocked_without_kick_leaves_state() {
        let mut board = Board::new();
        // Fill every cell except the spawn area so no kick can succeed
        for row in 0..BOARD_HEIGHT as i32 {
            for col in 1..=VISIBLE_COLS as i32 {
                if row > 1 || !(3..=7).contains(&col) {
                    board.set(row, col, Cell::Block(PieceKind::Z));
                }
            }
        }
        let mut piece = Piece::spawn(PieceKind::I, &mut board).unwrap();
        let before = piece.clone();
        assert!(!piece.rotate(&mut board, RotationDirection::Clockwise));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_move_clears_rotation_flag() {
        let mut board = Board::new();
        let mut piece = Piece::spawn(PieceKind::T, &mut board).unwrap();
        piece.fall(&mut board);
        assert!(piece.rotate(&mut board, RotationDirection::Clockwise));
        assert!(piece.last_move_was_rotation());
        assert!(piece.fall(&mut board));
        assert!(!piece.last_move_was_rotation());
    }

    #[test]
    fn test_remove_leaves_board_empty() {
        let mut board = Board::new();
        let piece = Piece::spawn(PieceKind::S, &mut board).unwrap();
        piece.remove(&mut board);
        assert!(board.is_empty());
        assert_eq!(board.cells().len(), BOARD_LEN);
    }
}
