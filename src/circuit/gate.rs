use std::fmt;

/// Primitive gate operation. Closed set: every gate a [`super::Circuit`] can
/// hold is one of these, so evaluation dispatches with a single `match`
/// rather than virtual dispatch (there is no open set of gate types to
/// support).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Primary input, or a DFF's pseudo-primary-input (its `Q` output).
    /// Carries no fanin.
    Input,
    /// Constant logic 0. Carries no fanin.
    Const0,
    /// Constant logic 1. Carries no fanin.
    Const1,
    /// Buffer: single fanin, output equals input.
    Buf,
    /// Inverter: single fanin, output is the complement of input.
    Inv,
    /// N-ary AND, N >= 2.
    And,
    /// N-ary NAND, N >= 2.
    Nand,
    /// N-ary OR, N >= 2.
    Or,
    /// N-ary NOR, N >= 2.
    Nor,
    /// N-ary XOR, N >= 2.
    Xor,
    /// N-ary XNOR, N >= 2.
    Xnor,
}

impl GateKind {
    /// Whether this kind is a leaf (no fanin): a primary input, a DFF
    /// pseudo-input, or a constant.
    pub fn is_leaf(self) -> bool {
        matches!(self, GateKind::Input | GateKind::Const0 | GateKind::Const1)
    }

    /// The non-controlling value for a 2-input-style gate of this kind, if
    /// one exists (AND-family: 1, OR-family: 0; XOR-family has none).
    ///
    /// Used by the FFR-local propagator to compute the
    /// propagation condition through a side input.
    pub fn non_controlling_value(self) -> Option<bool> {
        match self {
            GateKind::And | GateKind::Nand => Some(true),
            GateKind::Or | GateKind::Nor => Some(false),
            GateKind::Buf | GateKind::Inv => None,
            GateKind::Xor | GateKind::Xnor => None,
            GateKind::Input | GateKind::Const0 | GateKind::Const1 => None,
        }
    }

    /// Whether the gate's output polarity is inverted relative to the
    /// "positive" form of the same function (NAND vs AND, NOR vs OR, XNOR
    /// vs XOR, INV vs BUF).
    pub fn is_inverting(self) -> bool {
        matches!(
            self,
            GateKind::Inv | GateKind::Nand | GateKind::Nor | GateKind::Xnor
        )
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::Input => "input",
            GateKind::Const0 => "const0",
            GateKind::Const1 => "const1",
            GateKind::Buf => "buf",
            GateKind::Inv => "inv",
            GateKind::And => "and",
            GateKind::Nand => "nand",
            GateKind::Or => "or",
            GateKind::Nor => "nor",
            GateKind::Xor => "xor",
            GateKind::Xnor => "xnor",
        };
        f.write_str(s)
    }
}
