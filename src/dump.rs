//! Disassembler over raw program binaries.
//!
//! The binary is walked in 16-bit words, decoding an instruction at each
//! position and falling back to a raw data word when nothing matches.
//! Runs of three or more identical items collapse to their first and last
//! lines unless verbose output is requested.

use byteorder::ByteOrder;
use std::fmt;

use crate::instr::{self, Instruction};
use crate::isa::{self, Isa};
use crate::Endian;

#[derive(Debug)]
pub enum Error {
    /// Input is not a whole number of words.
    OddLength(usize),
    Encode(instr::EncodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OddLength(len) => {
                write!(f, "input of {} bytes is not a whole number of words", len)
            }
            Error::Encode(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {}

impl From<instr::EncodeError> for Error {
    fn from(err: instr::EncodeError) -> Error {
        Error::Encode(err)
    }
}

/// One disassembled element: an instruction or a bare data word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Instr(Instruction),
    Data(u16),
}

impl Item {
    fn size(&self) -> usize {
        match self {
            Item::Instr(instr) => instr.size() as usize,
            Item::Data(_) => 1,
        }
    }
}

/// Decode a binary into items, counting runs of identical ones.
pub fn parse(isa: &Isa, image: &[u8]) -> Result<Vec<(Item, usize)>, Error> {
    if image.len() % 2 != 0 {
        return Err(Error::OddLength(image.len()));
    }

    let mut words = Vec::with_capacity(image.len() / 2);
    for pair in image.chunks(2) {
        words.push(Endian::read_u16(pair));
    }

    let mut items: Vec<(Item, usize)> = Vec::new();
    let mut index = 0;

    while index < words.len() {
        let next = words.get(index + 1).copied();

        let item = match Instruction::decode(isa, words[index], next) {
            Ok(instr) => Item::Instr(instr),
            // Not an instruction, so treat the word as data.
            Err(_) => Item::Data(words[index]),
        };

        index += item.size();

        match items.last_mut() {
            Some((last, count)) if *last == item => *count += 1,
            _ => items.push((item, 1)),
        }
    }

    Ok(items)
}

/// Render parsed items as listing lines.
pub fn dump(isa: &Isa, items: &[(Item, usize)], verbose: bool) -> Result<Vec<String>, Error> {
    let mut lines = Vec::new();
    let mut pc = 0usize;

    for (item, count) in items {
        let (raw, mut text, size) = match item {
            Item::Instr(instr) => {
                let (word, immediate) = instr.encode_words(isa)?;
                let raw = match immediate {
                    Some(value) => format!("{:04x} {:04x}", word, value as u16),
                    None => format!("{:04x}", word),
                };

                (raw, instr.text(isa), instr.size() as usize)
            }
            Item::Data(word) => {
                // A chunk of data, printed so it reassembles to itself.
                (format!("{:04x}", word), format!(".int 0x{:04x}", word), 1)
            }
        };

        // Annotate the branch or jump target when the entry is not
        // repeated, as the comment would be wrong on all but the first.
        if *count == 1 {
            if let Item::Instr(instr) = item {
                if let Some(target) = target_text(instr, pc) {
                    text = format!("{} # target={}", text, target);
                }
            }
        }

        if verbose || *count < 3 {
            for _ in 0..*count {
                lines.push(format!("{:04x}:  {:<12}  {}", pc, raw, text));
                pc += size;
            }
        } else {
            lines.push(format!("{:04x}:  {:<12}  {}", pc, raw, text));
            pc += size;

            lines.push(" *".to_owned());
            pc += size * (count - 2);

            lines.push(format!("{:04x}:  {:<12}  {}", pc, raw, text));
            pc += size;
        }
    }

    Ok(lines)
}

/// Disassemble a binary into listing lines.
pub fn disassemble(isa: &Isa, image: &[u8], verbose: bool) -> Result<Vec<String>, Error> {
    let items = parse(isa, image)?;
    dump(isa, &items, verbose)
}

// Target comment for control flow: branches are PC relative while jumps
// are absolute. A target held in a register is unknown.
fn target_text(instr: &Instruction, pc: usize) -> Option<String> {
    if !isa::is_branch(instr.op) && !isa::is_jump(instr.op) {
        return None;
    }

    let text = match instr.ops.imm_value() {
        Some(value) if isa::is_branch(instr.op) => {
            format!("0x{:04x}", (pc as i32 + 1 + i32::from(value)) as u16)
        }
        Some(value) => format!("0x{:04x}", value as u16),
        None => "?".to_owned(),
    };

    Some(text)
}
