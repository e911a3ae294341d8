//! Tetromino definitions and shapes
//!
//! All 7 standard tetrominoes with their four rotation states. Shapes are
//! stored as pure rotations about the piece center; the SRS offset tables in
//! [`crate::srs`] move the center so the result matches guideline positions.

/// The 7 tetromino kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I, // long bar
    O, // square
    T,
    S,
    Z,
    J,
    L,
}

/// A (row, col) offset from the piece center. Rows grow downward.
pub type Offset = (i32, i32);

impl PieceKind {
    /// Get all kinds in bag order
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::O,
            PieceKind::T,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::J,
            PieceKind::L,
        ]
    }

    /// Whether this kind has distinct rotation states
    pub fn rotates(&self) -> bool {
        !matches!(self, PieceKind::O)
    }

    /// Get the 4 block offsets for this kind at a given rotation
    pub fn shape(&self, rotation: Rotation) -> [Offset; 4] {
        match self {
            // True rotations about (0, 0); the I offset table shifts the
            // center so East lands one column right of spawn.
            PieceKind::I => match rotation {
                Rotation::North => [(0, -1), (0, 0), (0, 1), (0, 2)],
                Rotation::East => [(-1, 0), (0, 0), (1, 0), (2, 0)],
                Rotation::South => [(0, -2), (0, -1), (0, 0), (0, 1)],
                Rotation::West => [(-2, 0), (-1, 0), (0, 0), (1, 0)],
            },
            // O piece never rotates
            PieceKind::O => [(-1, 0), (-1, 1), (0, 0), (0, 1)],
            // North: .T.   East: T.   South: TTT   West: .T
            //        TTT         TT          .T.         TT
            //                    T.                      .T
            PieceKind::T => match rotation {
                Rotation::North => [(-1, 0), (0, -1), (0, 0), (0, 1)],
                Rotation::East => [(-1, 0), (0, 0), (0, 1), (1, 0)],
                Rotation::South => [(0, -1), (0, 0), (0, 1), (1, 0)],
                Rotation::West => [(-1, 0), (0, -1), (0, 0), (1, 0)],
            },
            PieceKind::S => match rotation {
                Rotation::North => [(-1, 0), (-1, 1), (0, -1), (0, 0)],
                Rotation::East => [(-1, 0), (0, 0), (0, 1), (1, 1)],
                Rotation::South => [(0, 0), (0, 1), (1, -1), (1, 0)],
                Rotation::West => [(-1, -1), (0, -1), (0, 0), (1, 0)],
            },
            PieceKind::Z => match rotation {
                Rotation::North => [(-1, -1), (-1, 0), (0, 0), (0, 1)],
                Rotation::East => [(-1, 1), (0, 0), (0, 1), (1, 0)],
                Rotation::South => [(0, -1), (0, 0), (1, 0), (1, 1)],
                Rotation::West => [(-1, 0), (0, -1), (0, 0), (1, -1)],
            },
            PieceKind::J => match rotation {
                Rotation::North => [(-1, -1), (0, -1), (0, 0), (0, 1)],
                Rotation::East => [(-1, 0), (-1, 1), (0, 0), (1, 0)],
                Rotation::South => [(0, -1), (0, 0), (0, 1), (1, 1)],
                Rotation::West => [(-1, 0), (0, 0), (1, -1), (1, 0)],
            },
            PieceKind::L => match rotation {
                Rotation::North => [(-1, 1), (0, -1), (0, 0), (0, 1)],
                Rotation::East => [(-1, 0), (0, 0), (1, 0), (1, 1)],
                Rotation::South => [(0, -1), (0, 0), (0, 1), (1, -1)],
                Rotation::West => [(-1, -1), (-1, 0), (0, 0), (1, 0)],
            },
        }
    }
}

/// Rotation states (using SRS naming convention)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    North, // Spawn state
    East,  // Clockwise from North
    South, // 180 from North
    West,  // Counter-clockwise from North
}

impl Rotation {
    /// All four states in clockwise order
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::North,
            Rotation::East,
            Rotation::South,
            Rotation::West,
        ]
    }

    /// Index 0-3, used to address the kick tables
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Rotate clockwise: North → East → South → West → North
    pub fn cw(&self) -> Rotation {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise: North → West → South → East → North
    pub fn ccw(&self) -> Rotation {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    pub fn turn(&self, direction: RotationDirection) -> Rotation {
        match direction {
            RotationDirection::Clockwise => self.cw(),
            RotationDirection::CounterClockwise => self.ccw(),
        }
    }
}

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_shape_has_four_distinct_blocks() {
        for kind in PieceKind::all() {
            for rotation in Rotation::all() {
                let shape = kind.shape(rotation);
                let unique: HashSet<_> = shape.iter().collect();
                assert_eq!(unique.len(), 4, "{:?} {:?}", kind, rotation);
            }
        }
    }

    #[test]
    fn test_shapes_are_true_rotations() {
        // (row, col) -> (col, -row) is a clockwise quarter turn with rows down
        for kind in PieceKind::all().into_iter().filter(|k| k.rotates()) {
            for rotation in Rotation::all() {
                let turned: HashSet<_> = kind
                    .shape(rotation)
                    .iter()
                    .map(|&(r, c)| (c, -r))
                    .collect();
                let expected: HashSet<_> = kind.shape(rotation.cw()).into_iter().collect();
                assert_eq!(turned, expected, "{:?} {:?}", kind, rotation);
            }
        }
    }

    #[test]
    fn test_rotation_cycle() {
        for rotation in Rotation::all() {
            assert_eq!(rotation.cw().ccw(), rotation);
            assert_eq!(rotation.cw().cw().cw().cw(), rotation);
        }
        assert_eq!(Rotation::West.index(), 3);
    }
}
