//! Test driver for [idli](../idli/index.html) binaries.
//!
//! A test program talks to the outside world over the UART. Input data is
//! fed in from a stimulus file and the output stream is collected; the
//! test ends when the program transmits the string `END` followed by a
//! 16-bit exit code, or when the tick budget runs out. The collected
//! output (minus the sentinel) can be compared against an expectation
//! file.
//!
//! Stimulus and expectation files hold one integer per line, each packed
//! as a little-endian 16-bit value.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};

use idli::imm;
use idli::sim::{self, Callback, CallbackResult, Simulator};


/// Marker transmitted by a program just before its exit code.
pub const END_SENTINEL: &[u8] = b"END";

#[derive(Debug)]
pub enum Error {
    Io(PathBuf, io::Error),
    /// A stimulus file line is not a 16-bit integer.
    BadValue(PathBuf, usize, imm::Error),
    /// The program read more UART data than the stimulus provides.
    OutOfInput,
    Sim(sim::Error),
    /// The tick budget ran out before the sentinel appeared.
    Timeout(usize),
    /// The program finished with a nonzero exit code.
    ExitCode(i16),
    /// The UART output differed from the expectation.
    OutputMismatch { expected: Vec<u8>, actual: Vec<u8> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            Error::BadValue(path, line, err) => {
                write!(f, "{}:{}: {}", path.display(), line, err)
            }
            Error::OutOfInput => f.write_str("UART read past the end of the input data"),
            Error::Sim(err) => fmt::Display::fmt(err, f),
            Error::Timeout(ticks) => {
                write!(f, "test exceeded timeout of {} ticks", ticks)
            }
            Error::ExitCode(code) => write!(f, "test exited with code: {}", code),
            Error::OutputMismatch { expected, actual } => write!(
                f,
                "test UART output differed from expected value:\n  expected: {:02x?}\n  actual:   {:02x?}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<sim::Error> for Error {
    fn from(err: sim::Error) -> Error {
        Error::Sim(err)
    }
}

/// Load a UART data file: one integer per line, packed little-endian.
pub fn load_uart_file(path: &Path) -> Result<Vec<u8>, Error> {
    let text = fs::read_to_string(path).map_err(|err| Error::Io(path.to_owned(), err))?;

    let mut data = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value = imm::parse_int(line)
            .map_err(|err| Error::BadValue(path.to_owned(), index + 1, err))?;

        let mut word = [0u8; 2];
        LittleEndian::write_i16(&mut word, value);
        data.extend_from_slice(&word);
    }

    Ok(data)
}

/// Feeds UART reads from a stimulus buffer and collects everything the
/// program transmits.
pub struct Stimulus {
    input: Vec<u8>,
    cursor: usize,
    output: Vec<u8>,
}

impl Stimulus {
    pub fn new(input: Vec<u8>) -> Stimulus {
        Stimulus {
            input,
            cursor: 0,
            output: Vec::new(),
        }
    }

    /// Everything transmitted so far, including any sentinel.
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl Callback for Stimulus {
    fn read_uart(&mut self, width: u32) -> CallbackResult<u16> {
        let width = width as usize;

        if self.cursor + width > self.input.len() {
            return Err(Box::new(Error::OutOfInput));
        }

        let bytes = &self.input[self.cursor..self.cursor + width];
        self.cursor += width;

        let value = if width == 1 {
            u16::from(bytes[0])
        } else {
            LittleEndian::read_u16(bytes)
        };

        Ok(value)
    }

    fn write_uart(&mut self, value: u16, width: u32) -> CallbackResult<()> {
        if width == 1 {
            self.output.push(value as u8);
        } else {
            let mut word = [0u8; 2];
            LittleEndian::write_u16(&mut word, value);
            self.output.extend_from_slice(&word);
        }

        Ok(())
    }
}

// The sentinel and exit code occupy the last five bytes of the stream.
fn find_sentinel(output: &[u8]) -> Option<i16> {
    if output.len() < END_SENTINEL.len() + 2 {
        return None;
    }

    let start = output.len() - END_SENTINEL.len() - 2;
    if &output[start..start + END_SENTINEL.len()] != END_SENTINEL {
        return None;
    }

    Some(LittleEndian::read_i16(&output[output.len() - 2..]))
}

/// Tick the simulator until the program transmits the end-of-test
/// sentinel, checking the exit code and optionally the UART output.
pub fn run_test(
    sim: &mut Simulator,
    stim: &mut Stimulus,
    timeout: usize,
    expected: Option<&[u8]>,
) -> Result<(), Error> {
    let mut finished = None;

    for _ in 0..timeout {
        sim.tick(stim)?;

        finished = find_sentinel(stim.output());
        if finished.is_some() {
            break;
        }
    }

    let code = finished.ok_or(Error::Timeout(timeout))?;
    if code != 0 {
        return Err(Error::ExitCode(code));
    }

    if let Some(expected) = expected {
        let payload = &stim.output()[..stim.output().len() - END_SENTINEL.len() - 2];
        if payload != expected {
            return Err(Error::OutputMismatch {
                expected: expected.to_vec(),
                actual: payload.to_vec(),
            });
        }
    }

    Ok(())
}
