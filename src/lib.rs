//! Bit-parallel fault simulation for gate-level ATPG.
//!
//! This crate simulates stuck-at and transition-delay faults over a
//! full-scan netlist, 64 lanes at a time, for the three classic ATPG fault
//! simulation modes: single-pattern/single-fault (SPSFP), single-pattern/
//! all-fault (SPPFP), and pattern-parallel/single-fault (PPSFP). It does not
//! generate test patterns itself — that is a DTPG concern built on top of
//! this engine.
//!
//! The netlist is assembled with [`circuit::CircuitBuilder`], faults are
//! described with [`fault::Fault`], and simulation runs through a
//! [`sim::Simulator`].

pub mod circuit;
pub mod error;
pub mod fault;
pub mod ids;
pub mod packed;
pub mod reference;
pub mod sim;

pub use circuit::{Circuit, CircuitBuilder, GateKind};
pub use error::{DruidError, Result};
pub use fault::{Fault, FaultKind};
pub use sim::{DiffBits, FsimResults, Simulator, TestVector, ValueKind};
