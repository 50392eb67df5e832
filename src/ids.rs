//! Dense index newtypes.
//!
//! The simulator never stores owning pointers between nodes: every
//! cross-reference (fanin, fanout, fault origin, FFR root) is a dense `u32`
//! index into an arena. Separate newtypes keep the index spaces distinct at
//! the type level, in the manner of the `Signal` wrapper this crate was
//! built from.

use std::fmt;

macro_rules! dense_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Build from a raw index.
            pub fn new(i: usize) -> Self {
                $name(i as u32)
            }

            /// Raw index, for use as a `Vec` subscript.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", stringify!($name).to_lowercase(), self.0)
            }
        }
    };
}

dense_id!(NodeId, "Index of a node in a [`crate::circuit::Circuit`].");
dense_id!(DffId, "Index of a flip-flop (PPI/PPO pair).");
dense_id!(SimId, "Index of a node in the simulator's `SimNode` arena.");
dense_id!(FaultId, "Index of a fault in an installed fault list.");
dense_id!(FfrId, "Index of a Fanout-Free Region.");
