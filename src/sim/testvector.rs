//! Test vector parsing and representation.

use crate::error::{DruidError, Result};

/// One applied test pattern: primary input values, current state (PPI)
/// values, and — for transition-delay two-frame sequencing — the previous
/// frame's primary input values that launched the transition.
///
/// `None` denotes an unknown/don't-care lane; only meaningful when the
/// simulator was built in 3-valued mode, since 2-valued simulation has no
/// representation for `X`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVector {
    pub pi: Vec<Option<bool>>,
    pub ppi: Vec<Option<bool>>,
    pub prev_pi: Option<Vec<Option<bool>>>,
}

impl TestVector {
    /// A single-frame (stuck-at) test vector.
    pub fn new(pi: Vec<Option<bool>>, ppi: Vec<Option<bool>>) -> Self {
        TestVector {
            pi,
            ppi,
            prev_pi: None,
        }
    }

    /// A two-frame (transition-delay, broadside) test vector: `prev_pi`
    /// launches the transition in frame 1 together with `ppi`, `pi` captures
    /// it in frame 2 together with the state captured from frame 1.
    pub fn with_prev_pi(
        pi: Vec<Option<bool>>,
        ppi: Vec<Option<bool>>,
        prev_pi: Vec<Option<bool>>,
    ) -> Self {
        TestVector {
            pi,
            ppi,
            prev_pi: Some(prev_pi),
        }
    }

    pub fn is_transition_delay(&self) -> bool {
        self.prev_pi.is_some()
    }

    /// A random fully-specified vector, for fill-in-the-unspecified-bits
    /// style pattern generation ahead of DTPG or for randomized fault
    /// coverage sampling.
    pub fn random(rng: &mut impl rand::Rng, input_num: usize, dff_num: usize) -> Self {
        TestVector::new(
            (0..input_num).map(|_| Some(rng.gen::<bool>())).collect(),
            (0..dff_num).map(|_| Some(rng.gen::<bool>())).collect(),
        )
    }

    /// Parse a binary literal (`0`/`1`/`X`/`x`/`?` per lane): the
    /// most-significant (leftmost, first) character is bit 0 of the packed
    /// representation, matching the string convention the test-pattern
    /// format uses throughout.
    pub fn from_bin_str(s: &str, len: usize) -> Result<Vec<Option<bool>>> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != len {
            return Err(DruidError::InvalidArgument(format!(
                "binary literal {:?} has {} characters, expected {}",
                s,
                chars.len(),
                len
            ))
            .logged());
        }
        let mut bits = vec![None; len];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = parse_bin_char(chars[i])?;
        }
        Ok(bits)
    }

    /// Parse a hexadecimal literal (4 lanes per digit, no `X` support): the
    /// leftmost digit's most-significant bit is bit 0, same convention as
    /// [`TestVector::from_bin_str`].
    pub fn from_hex_str(s: &str, len: usize) -> Result<Vec<Option<bool>>> {
        let nibbles: Vec<char> = s.chars().collect();
        let expected_nibbles = len.div_ceil(4);
        if nibbles.len() != expected_nibbles {
            return Err(DruidError::InvalidArgument(format!(
                "hex literal {:?} has {} digits, expected {}",
                s,
                nibbles.len(),
                expected_nibbles
            ))
            .logged());
        }
        let mut bits = Vec::with_capacity(expected_nibbles * 4);
        for c in nibbles {
            let v = c.to_digit(16).ok_or_else(|| {
                DruidError::InvalidArgument(format!("{c:?} is not a hex digit")).logged()
            })?;
            for shift in (0..4).rev() {
                bits.push(Some((v >> shift) & 1 != 0));
            }
        }
        bits.truncate(len);
        Ok(bits)
    }
}

fn parse_bin_char(c: char) -> Result<Option<bool>> {
    match c {
        '0' => Ok(Some(false)),
        '1' => Ok(Some(true)),
        'X' | 'x' | '?' => Ok(None),
        other => Err(DruidError::InvalidArgument(format!(
            "{other:?} is not a valid binary literal character"
        ))
        .logged()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_str_msb_first() {
        let bits = TestVector::from_bin_str("10X", 3).unwrap();
        // leftmost char '1' is bit 0.
        assert_eq!(bits, vec![Some(true), Some(false), None]);
    }

    #[test]
    fn test_bin_str_rejects_bad_char() {
        assert!(TestVector::from_bin_str("1 0", 3).is_err());
    }

    #[test]
    fn test_bin_str_wrong_length_rejected() {
        assert!(TestVector::from_bin_str("10", 3).is_err());
    }

    #[test]
    fn test_hex_str_roundtrip() {
        let bits = TestVector::from_hex_str("A", 4).unwrap();
        // 'A' = 1010, pushed most-significant-bit first.
        assert_eq!(
            bits,
            vec![Some(true), Some(false), Some(true), Some(false)]
        );
    }

    #[test]
    fn test_hex_str_partial_top_nibble() {
        // len=6 needs 2 nibbles (8 bits); the last 2 bits of the second
        // nibble are discarded since bit 0 is the first character.
        let bits = TestVector::from_hex_str("3F", 6).unwrap();
        assert_eq!(bits.len(), 6);
        assert_eq!(
            bits,
            vec![Some(false), Some(false), Some(true), Some(true), Some(true), Some(true)]
        );
    }
}
