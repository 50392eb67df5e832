use super::bits2::Bits64;
use super::PackedValue;

/// 64 independent 3-valued logic lanes packed into a pair of machine words.
///
/// Encoding per lane, as a `(v0, v1)` bit pair: `X` is `(0, 0)`, `0` is
/// `(1, 0)`, `1` is `(0, 1)`. The pair `(1, 1)` is illegal and must never
/// arise; every primitive below is audited to preserve this invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct Packed3 {
    v0: u64,
    v1: u64,
}

impl Packed3 {
    /// Construct directly from the `(v0, v1)` encoding. Panics in debug
    /// builds if the illegal `(1, 1)` pattern appears in any lane.
    pub fn from_raw(v0: u64, v1: u64) -> Self {
        debug_assert_eq!(v0 & v1, 0, "illegal (1,1) lane in Packed3");
        Packed3 { v0, v1 }
    }

    /// Raw `(v0, v1)` words.
    pub fn raw(self) -> (u64, u64) {
        (self.v0, self.v1)
    }

    /// All lanes unknown (`X`).
    pub fn all_x() -> Self {
        Packed3 { v0: 0, v1: 0 }
    }

    /// Broadcast a single trit (`None` = X) to all lanes.
    pub fn broadcast(v: Option<bool>) -> Self {
        match v {
            None => Self::all_x(),
            Some(false) => Packed3 { v0: !0u64, v1: 0 },
            Some(true) => Packed3 { v0: 0, v1: !0u64 },
        }
    }

    /// Lift a fully-determined [`Bits64`] (no lane is `X`).
    pub fn from_bits(b: Bits64) -> Self {
        Packed3 {
            v0: !b.word(),
            v1: b.word(),
        }
    }

    /// Mask of lanes known to be `0`.
    pub fn known_zero(self) -> Bits64 {
        Bits64::from_word(self.v0)
    }

    /// Mask of lanes known to be `1`.
    pub fn known_one(self) -> Bits64 {
        Bits64::from_word(self.v1)
    }

    /// Mask of lanes that are `X`.
    pub fn is_x(self) -> Bits64 {
        Bits64::from_word(!(self.v0 | self.v1))
    }

    /// Collapse to [`Bits64`], treating `X` lanes as `0`. Used only where the
    /// caller has already established the lane cannot be `X` (e.g. 2-valued
    /// mode never constructs a `Packed3`).
    pub fn to_bits_lossy(self) -> Bits64 {
        Bits64::from_word(self.v1)
    }
}

impl PackedValue for Packed3 {
    fn all_zero() -> Self {
        Packed3 { v0: !0u64, v1: 0 }
    }
    fn all_one() -> Self {
        Packed3 { v0: 0, v1: !0u64 }
    }
    fn and(self, other: Self) -> Self {
        // Kleene AND: 0 if either is 0, 1 only if both are 1, else X.
        Packed3 {
            v0: self.v0 | other.v0,
            v1: self.v1 & other.v1,
        }
    }
    fn or(self, other: Self) -> Self {
        // Kleene OR: 1 if either is 1, 0 only if both are 0, else X.
        Packed3 {
            v0: self.v0 & other.v0,
            v1: self.v1 | other.v1,
        }
    }
    fn xor(self, other: Self) -> Self {
        Packed3 {
            v0: (self.v1 & other.v1) | (self.v0 & other.v0),
            v1: (self.v1 & other.v0) | (self.v0 & other.v1),
        }
    }
    fn not(self) -> Self {
        Packed3 {
            v0: self.v1,
            v1: self.v0,
        }
    }
    fn masked_select(self, mask: Bits64, old: Self) -> Self {
        let m = mask.word();
        Packed3 {
            v0: (self.v0 & m) | (old.v0 & !m),
            v1: (self.v1 & m) | (old.v1 & !m),
        }
    }
    fn diff_mask(self, other: Self) -> Bits64 {
        Bits64::from_word((self.v0 ^ other.v0) | (self.v1 ^ other.v1))
    }
    fn known_eq(self, target: bool) -> Bits64 {
        if target {
            self.known_one()
        } else {
            self.known_zero()
        }
    }
    fn flip(self, mask: Bits64) -> Self {
        let m = mask.word();
        Packed3 {
            v0: (self.v0 & !m) | (self.v1 & m),
            v1: (self.v1 & !m) | (self.v0 & m),
        }
    }
}
