//! Super Rotation System (SRS) offset data
//!
//! Each rotation state carries 5 offsets. The kick for test `i` when rotating
//! `from -> to` is `offset[from][i] - offset[to][i]`; test 0 is the plain
//! rotation. Legality is never decided here, only by the board collision test
//! after the kick is applied.

use crate::tetromino::{Offset, PieceKind, Rotation};

/// Number of kick candidates tried per rotation
pub const KICK_TESTS: usize = 5;

type OffsetTable = [[Offset; KICK_TESTS]; 4];

/// Offsets for J, L, S, T, Z as (row, col), rows growing downward
const JLSTZ_OFFSETS: OffsetTable = [
    // 0
    [(0, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
    // R
    [(0, 0), (0, 1), (1, 1), (-2, 0), (-2, 1)],
    // 2
    [(0, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
    // L
    [(0, 0), (0, -1), (1, -1), (-2, 0), (-2, -1)],
];

/// Offsets for I as (row, col), rows growing downward
const I_OFFSETS: OffsetTable = [
    // 0
    [(0, 0), (0, -1), (0, 2), (0, -1), (0, 2)],
    // R
    [(0, -1), (0, 0), (0, 0), (-1, 0), (2, 0)],
    // 2
    [(-1, -1), (-1, 1), (-1, -2), (0, 1), (0, -2)],
    // L
    [(-1, 0), (-1, 0), (-1, 0), (1, 0), (-2, 0)],
];

/// Get the kick translations to try, in priority order, for a rotation
/// attempt. Returns identity kicks for O, which never rotates.
pub fn get_wall_kicks(kind: PieceKind, from: Rotation, to: Rotation) -> [Offset; KICK_TESTS] {
    let table = match kind {
        PieceKind::O => return [(0, 0); KICK_TESTS],
        PieceKind::I => &I_OFFSETS,
        _ => &JLSTZ_OFFSETS,
    };
    let source = &table[from.index()];
    let target = &table[to.index()];
    std::array::from_fn(|i| (source[i].0 - target[i].0, source[i].1 - target[i].1))
}
