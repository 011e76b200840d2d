/// 20 standard residues + X (unknown / padding), in encoding order.
pub const ALPHABET: &[u8; 21] = b"ACDEFGHIKLMNPQRSTVWYX";

pub const SIGMA: usize = ALPHABET.len();

/// Filler used to right-pad allele sequences to a common length.
pub const PAD: u8 = b'X';

#[inline]
pub fn to_alphabet(b: u8) -> Option<u8> {
    let code = match b.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'D' => 2,
        b'E' => 3,
        b'F' => 4,
        b'G' => 5,
        b'H' => 6,
        b'I' => 7,
        b'K' => 8,
        b'L' => 9,
        b'M' => 10,
        b'N' => 11,
        b'P' => 12,
        b'Q' => 13,
        b'R' => 14,
        b'S' => 15,
        b'T' => 16,
        b'V' => 17,
        b'W' => 18,
        b'Y' => 19,
        b'X' => 20,
        _ => return None,
    };
    Some(code)
}

#[inline]
pub fn from_alphabet(a: u8) -> u8 {
    ALPHABET.get(a as usize).copied().unwrap_or(PAD)
}

/// Uppercase and drop whitespace; other characters are kept so that invalid
/// residues are reported later instead of being silently rewritten.
pub fn normalize_seq(seq: &str) -> String {
    seq.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Right-pad `seq` with `pad` up to `len` characters.
pub fn pad_right(seq: &str, len: usize, pad: u8) -> String {
    let mut out = String::with_capacity(len.max(seq.len()));
    out.push_str(seq);
    while out.len() < len {
        out.push(pad as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_round_trip() {
        for (i, &b) in ALPHABET.iter().enumerate() {
            assert_eq!(to_alphabet(b), Some(i as u8));
            assert_eq!(from_alphabet(i as u8), b);
        }
        assert_eq!(to_alphabet(b'c'), Some(1));
        assert_eq!(to_alphabet(b'B'), None);
        assert_eq!(to_alphabet(b'*'), None);
    }

    #[test]
    fn pad_and_normalize() {
        assert_eq!(pad_right("AC", 4, PAD), "ACXX");
        assert_eq!(pad_right("", 3, PAD), "XXX");
        assert_eq!(pad_right("ACDE", 2, PAD), "ACDE");
        assert_eq!(normalize_seq(" ac d\te\n"), "ACDE");
    }
}
