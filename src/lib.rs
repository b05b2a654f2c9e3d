//! Instruction set model and behavioural simulator for idli, a 16-bit
//! predicated CPU with eight general purpose registers, four predicate
//! registers and a nibble-serial memory interface.
//!
//! The crate is split into the static ISA description ([`isa`]), the
//! instruction codec ([`instr`]), immediate parsing ([`imm`]), the
//! instruction-level simulator ([`sim`]) and a disassembler ([`dump`]).
//! The assembler lives in the separate `idli-asm` crate and builds on the
//! codec provided here.
//!
//! [`isa`]: isa/index.html
//! [`instr`]: instr/index.html
//! [`imm`]: imm/index.html
//! [`sim`]: sim/index.html
//! [`dump`]: dump/index.html

pub mod constants;
pub mod dump;
pub mod imm;
pub mod instr;
pub mod isa;
pub mod sim;

/// Byte order of program binaries on disk.
pub type Endian = byteorder::BigEndian;

/// A single 16-bit architectural word.
pub type Word = u16;

/// A signed 16-bit immediate.
pub type Immediate = i16;

pub use crate::instr::{Imm, Instruction, Operands};
pub use crate::isa::{Isa, Op, Variant};
pub use crate::sim::{Callback, Simulator};
