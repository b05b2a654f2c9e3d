//! Instruction-level behavioural simulator. This is not cycle accurate!
//!
//! The simulator owns the register file and memory for its lifetime; the
//! caller owns the [`Callback`] object and passes it into every
//! [`tick`](struct.Simulator.html#method.tick). None of the architectural
//! state is reset by hardware, so every GREG, PREG (except `pt`) and
//! memory word starts out undefined and reading one before it has been
//! written is a fatal error.
//!
//! [`Callback`]: trait.Callback.html

mod exec;

use std::error::Error as StdError;
use std::fmt;

use crate::constants;
use crate::instr::DecodeError;
use crate::isa::{self, Isa};

pub type CallbackResult<T> = Result<T, Box<dyn StdError>>;

/// Observation hooks invoked by the simulator as it executes. This is
/// useful for comparisons with the RTL implementation of the core.
///
/// Every hook has a null default except [`read_uart`], which must be
/// provided as it is the only way data enters the core. Memory hooks see
/// the byte-swapped bus view of each value.
///
/// [`read_uart`]: #tymethod.read_uart
pub trait Callback {
    /// Called when a new value is written to a GREG.
    fn write_greg(&mut self, reg: u8, value: u16) -> CallbackResult<()> {
        let _ = (reg, value);
        Ok(())
    }

    /// Called when a new value is written to a PREG.
    fn write_preg(&mut self, reg: u8, value: bool) -> CallbackResult<()> {
        let _ = (reg, value);
        Ok(())
    }

    /// Called when reading data into the core over UART. Returns the data;
    /// `width` is 1 or 2 bytes.
    fn read_uart(&mut self, width: u32) -> CallbackResult<u16>;

    /// Called when writing to the UART from the core.
    fn write_uart(&mut self, value: u16, width: u32) -> CallbackResult<()> {
        let _ = (value, width);
        Ok(())
    }

    /// Called when storing to memory.
    fn write_mem(&mut self, addr: u16, value: u16) -> CallbackResult<()> {
        let _ = (addr, value);
        Ok(())
    }

    /// Called when loading from memory.
    fn read_mem(&mut self, addr: u16, value: u16) -> CallbackResult<()> {
        let _ = (addr, value);
        Ok(())
    }
}

/// Callback that observes nothing. Reading from the UART fails, so this
/// is only suitable for programs that never execute `urx`/`urxb`.
pub struct NullCallback;

impl Callback for NullCallback {
    fn read_uart(&mut self, _width: u32) -> CallbackResult<u16> {
        Err(Box::new(Error::NoUartInput))
    }
}

#[derive(Debug)]
pub enum Error {
    /// Program image is not a whole number of words, or does not fit the
    /// address space.
    InvalidImage(usize),
    /// Read of a GREG that has never been written.
    UninitializedGreg(u8),
    /// Read of a PREG that has never been written.
    UninitializedPreg(u8),
    /// Read of a memory word that has never been written.
    UninitializedMem(u16),
    /// An immediate slot still holds a label reference.
    UnresolvedImmediate(String),
    /// No UART input is connected.
    NoUartInput,
    Decode(DecodeError),
    Callback(Box<dyn StdError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidImage(len) => {
                write!(f, "bad program image size: {} bytes", len)
            }
            Error::UninitializedGreg(reg) => {
                write!(f, "read of uninitialised register {}", isa::greg_name(*reg))
            }
            Error::UninitializedPreg(reg) => {
                write!(f, "read of uninitialised predicate {}", isa::preg_name(*reg))
            }
            Error::UninitializedMem(addr) => {
                write!(f, "read of uninitialised memory at 0x{:04x}", addr)
            }
            Error::UnresolvedImmediate(reference) => {
                write!(f, "executed instruction with unresolved immediate: {}", reference)
            }
            Error::NoUartInput => f.write_str("no UART input is connected"),
            Error::Decode(err) => fmt::Display::fmt(err, f),
            Error::Callback(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl StdError for Error {}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Error {
        Error::Decode(err)
    }
}

/// The architectural state of one idli core.
pub struct Simulator<'a> {
    isa: &'a Isa,
    trace: bool,
    pc: u16,
    gregs: [Option<u16>; constants::GREG_COUNT],
    pregs: [Option<bool>; constants::PREG_COUNT],
    // Each memory word is stored in the byte order of the medium, which is
    // swapped relative to the architectural value.
    mem: Vec<Option<u16>>,
}

impl<'a> Simulator<'a> {
    /// Create a core in its reset state: PC zero, everything else
    /// undefined apart from `pt`.
    pub fn new(isa: &'a Isa) -> Simulator<'a> {
        let mut pregs = [None; constants::PREG_COUNT];
        pregs[constants::PT as usize] = Some(true);

        Simulator {
            isa,
            trace: false,
            pc: 0,
            gregs: [None; constants::GREG_COUNT],
            pregs,
            mem: vec![None; constants::MEM_WORDS],
        }
    }

    /// Enable or disable printing of the execution trace.
    pub fn trace(&mut self, enable: bool) {
        self.trace = enable;
    }

    /// Load a program binary into memory starting at address zero.
    pub fn load(&mut self, image: &[u8]) -> Result<(), Error> {
        if image.len() % constants::WORD_BYTES != 0
            || image.len() / constants::WORD_BYTES > constants::MEM_WORDS
        {
            return Err(Error::InvalidImage(image.len()));
        }

        for (index, pair) in image.chunks(constants::WORD_BYTES).enumerate() {
            // The medium stores the low byte first, so reading the on-disk
            // big-endian word as little-endian lands it in medium order.
            self.mem[index] = Some(u16::from_le_bytes([pair[0], pair[1]]));
        }

        Ok(())
    }

    pub fn isa(&self) -> &'a Isa {
        self.isa
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn greg(&self, reg: u8) -> Option<u16> {
        self.gregs[reg as usize]
    }

    pub fn preg(&self, reg: u8) -> Option<bool> {
        self.pregs[reg as usize]
    }

    /// The memory word at `addr` as stored on the medium, byte-swapped
    /// relative to the architectural value.
    pub fn mem_raw(&self, addr: u16) -> Option<u16> {
        self.mem[addr as usize]
    }
}
