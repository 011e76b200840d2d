use crate::util::amino::{ALPHABET, SIGMA};

use super::VectorTable;

pub const BLOSUM62: &str = "BLOSUM62";
pub const ONE_HOT: &str = "one-hot";

/// Row/column order of [`BLOSUM62_SCORES`].
const BLOSUM62_ORDER: &[u8; 21] = b"ARNDCQEGHILKMFPSTWYVX";

/// BLOSUM62 restricted to the 20 standard residues, extended with an X
/// row/column that scores 0 against everything except itself.
#[rustfmt::skip]
const BLOSUM62_SCORES: [[i8; 21]; 21] = [
//    A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   X
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0,  0], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3,  0], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  0], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  0], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1,  0], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  0], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3,  0], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3,  0], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1,  0], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1,  0], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1,  0], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2,  0], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0,  0], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3,  0], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1,  0], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4,  0], // V
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  1], // X
];

fn blosum_position(symbol: u8) -> usize {
    BLOSUM62_ORDER
        .iter()
        .position(|&s| s == symbol)
        .unwrap_or(BLOSUM62_ORDER.len() - 1)
}

/// BLOSUM62 rows re-ordered to [`ALPHABET`] on both axes.
pub fn blosum62() -> VectorTable {
    let mut data = Vec::with_capacity(SIGMA * SIGMA);
    for &a in ALPHABET {
        let row = &BLOSUM62_SCORES[blosum_position(a)];
        for &b in ALPHABET {
            data.push(row[blosum_position(b)] as f32);
        }
    }
    VectorTable {
        name: BLOSUM62.to_string(),
        width: SIGMA,
        data,
    }
}

pub fn one_hot() -> VectorTable {
    let mut data = vec![0.0; SIGMA * SIGMA];
    for i in 0..SIGMA {
        data[i * SIGMA + i] = 1.0;
    }
    VectorTable {
        name: ONE_HOT.to_string(),
        width: SIGMA,
        data,
    }
}
