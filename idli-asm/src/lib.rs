//! Assembler for the [idli](../idli/index.html) 16-bit predicated CPU.
//!
//! The main entry point is [`assemble_file`](fn.assemble_file.html), which
//! reads a source file, expands its `.include` directives, resolves label
//! references and returns the program binary as big-endian 16-bit words,
//! padded with four NOPs to cover the pipeline lookahead. The three passes
//! are also available individually as [`parse_file`], [`resolve_labels`]
//! and [`write_binary`].
//!
//! Parsing is implemented with [pest]; grammar-level errors render with
//! the source position, all other errors carry a `path:line:` prefix.
//!
//! # Source format
//!
//! Each line holds any number of labels followed by at most one
//! instruction or directive. A hash starts a comment running to the end of
//! the line, unless it sits inside a quoted character or string.
//!
//! ```text
//! start:  mov r0, $end        # absolute label reference
//!         addpc r1, 2
//! 1:      sub r0, r0, 1
//!         bnez r0, @1b        # local label, searching backwards
//!         j $start
//! end:
//! ```
//!
//! ## Labels
//!
//! Labels are `[_0-9a-zA-Z]+` followed by a colon. A label whose name is
//! all decimal digits is *local* and may be defined many times; it is
//! referenced with a direction suffix (`@1f` for the next definition,
//! `@1b` for the closest at or before the reference). All other labels
//! are global and must be unique.
//!
//! ## Immediates
//!
//! Operand `c` accepts decimal, `0x`, `0o` and `0b` literals, character
//! literals with the escapes `\\`, `\t`, `\n` and `\0`, and label
//! references: `$label` resolves to the label's address and `@label` to
//! its distance from the instruction. Values must fit in a signed 16-bit
//! word; unsigned literals at or above 2^15 wrap to their two's
//! complement value.
//!
//! ## Directives
//!
//!  Directive | Description | Example
//! -----------|-------------|--------
//! `.include` | Replace the line with the parsed contents of another file, relative to the current one. | `.include "lib.asm"`
//! `.int`     | Emit one 16-bit word with the given value. | `.int 0xbeef`
//! `.zeros`   | Emit the given number of zero words. | `.zeros 16`
//!
//! ## Synonyms
//!
//! A few mnemonics rewrite to an underlying instruction before encoding:
//!
//!  Synonym | Expansion
//! ---------|----------
//! `movz a`   | `xor a, a, a`
//! `b c`      | `bt.pt c`
//! `j c`      | `jt.pt c`
//! `bl c`     | `blt.pt c`
//! `jl c`     | `jlt.pt c`
//! `ret`      | `jt.pt lr`
//! `getp.p a` | `inc.p a`
//!
//! [pest]: https://docs.rs/pest/
//! [`parse_file`]: items/fn.parse_file.html
//! [`resolve_labels`]: labels/fn.resolve_labels.html
//! [`write_binary`]: fn.write_binary.html

pub mod error;
pub mod items;
pub mod labels;
mod parser;


use std::path::Path;

use byteorder::ByteOrder;

use idli::constants;
use idli::{Endian, Isa};

pub use crate::error::Error;
pub use crate::items::{parse_file, parse_source, Item, Label, Loc};
pub use crate::labels::resolve_labels;
pub use crate::parser::Rule;

/// Encode a resolved item stream into the output binary. Labels emit
/// nothing; the stream is followed by four NOP words for the pipeline
/// lookahead.
pub fn write_binary(isa: &Isa, items: &[(Item, Loc)]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();

    for (item, loc) in items {
        match item {
            Item::Label(_) => {}
            Item::Word(value) => {
                let mut word = [0u8; constants::WORD_BYTES];
                Endian::write_i16(&mut word, *value);
                out.extend_from_slice(&word);
            }
            Item::Instr(instr) => {
                let encoded = instr
                    .encode(isa)
                    .map_err(|err| Error::Encode(loc.clone(), err))?;
                out.extend_from_slice(&encoded);
            }
        }
    }

    // Pad with NOPs so the pipeline lookahead never fetches an
    // uninitialised word. A NOP encodes to the all-zero word in both
    // variants.
    for _ in 0..constants::NOP_PADDING {
        out.extend_from_slice(&[0u8; constants::WORD_BYTES]);
    }

    let words = out.len() / constants::WORD_BYTES;
    if words > constants::MEM_WORDS {
        return Err(Error::TooBig(words));
    }

    Ok(out)
}

/// Assemble a source file into a program binary.
pub fn assemble_file(isa: &Isa, path: &Path) -> Result<Vec<u8>, Error> {
    let mut items = parse_file(isa, path)?;
    resolve_labels(&mut items)?;
    write_binary(isa, &items)
}

/// Assemble source text; `path` names the text in errors and anchors any
/// `.include` directives.
pub fn assemble_source(isa: &Isa, source: &str, path: &Path) -> Result<Vec<u8>, Error> {
    let mut items = parse_source(isa, source, path)?;
    resolve_labels(&mut items)?;
    write_binary(isa, &items)
}
