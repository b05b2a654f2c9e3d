//! Instruction construction, rendering and the binary codec.

use byteorder::ByteOrder;
use std::fmt;

use crate::constants;
use crate::imm;
use crate::isa::{self, Isa, MapValue, Op, Slot, Variant};
use crate::Endian;

/// An immediate operand. The reference form carries the textual label
/// reference (including its `$`/`@` prefix) until the assembler rewrites
/// it into a concrete value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Imm {
    Value(i16),
    Ref(String),
}

/// Operand slot values of a single instruction. Only the slots named by
/// the instruction's encoding are populated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    pub p: Option<u8>,
    pub q: Option<u8>,
    pub a: Option<u8>,
    pub b: Option<u8>,
    pub c: Option<u8>,
    pub d: Option<u8>,
    pub imm: Option<Imm>,
}

impl Operands {
    pub fn get(&self, slot: Slot) -> Option<u8> {
        match slot {
            Slot::P => self.p,
            Slot::Q => self.q,
            Slot::A => self.a,
            Slot::B => self.b,
            Slot::C => self.c,
            Slot::D => self.d,
        }
    }

    pub fn set(&mut self, slot: Slot, value: u8) {
        let field = match slot {
            Slot::P => &mut self.p,
            Slot::Q => &mut self.q,
            Slot::A => &mut self.a,
            Slot::B => &mut self.b,
            Slot::C => &mut self.c,
            Slot::D => &mut self.d,
        };
        *field = Some(value);
    }

    /// The immediate value, if one is present and resolved.
    pub fn imm_value(&self) -> Option<i16> {
        match self.imm {
            Some(Imm::Value(value)) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    UnknownInstruction(String),
    MissingOperand(char),
    BadPredicateRegister(char, String),
    BadRegister(char, String),
    BadImmediate(imm::Error),
    /// `r7` written as operand `c`; the encoding reserves it for the
    /// immediate escape.
    StackPointerOperand,
    StackPointerInRange,
    DuplicateInRange(&'static str),
    EmptyRange(&'static str, &'static str),
    /// A predicate suffix on an instruction whose syntax has no `p` slot.
    TrailingPredicate(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnknownInstruction(name) => {
                write!(f, "unknown instruction: {}", name)
            }
            ParseError::MissingOperand(slot) => write!(f, "missing operand: {}", slot),
            ParseError::BadPredicateRegister(slot, value) => {
                write!(f, "bad predicate register for operand {}: {}", slot, value)
            }
            ParseError::BadRegister(slot, value) => write!(
                f,
                "bad general purpose register for operand {}: {}",
                slot, value
            ),
            ParseError::BadImmediate(err) => fmt::Display::fmt(err, f),
            ParseError::StackPointerOperand => {
                f.write_str("cannot have sp as operand c")
            }
            ParseError::StackPointerInRange => {
                f.write_str("cannot push or pop sp")
            }
            ParseError::DuplicateInRange(name) => {
                write!(f, "duplicate register in range: {}", name)
            }
            ParseError::EmptyRange(first, last) => {
                write!(f, "empty register range: {}..{}", first, last)
            }
            ParseError::TrailingPredicate(pred) => {
                write!(f, "instruction does not take a predicate: {}", pred)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<imm::Error> for ParseError {
    fn from(err: imm::Error) -> ParseError {
        ParseError::BadImmediate(err)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The immediate still holds an unresolved label reference.
    UnresolvedImmediate(String),
    /// An operand value does not fit its field.
    OperandTooWide(char, u8),
    /// The encoding names a slot the instruction does not carry.
    MissingOperand(char),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::UnresolvedImmediate(reference) => {
                write!(f, "cannot encode unresolved immediate: {}", reference)
            }
            EncodeError::OperandTooWide(slot, value) => {
                write!(f, "cannot encode operand {}: {}", slot, value)
            }
            EncodeError::MissingOperand(slot) => {
                write!(f, "missing operand for encoding: {}", slot)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// No opcode matches the word.
    NoMatch(u16),
    /// More than one opcode matches the word; indicates a broken table.
    Ambiguous(u16),
    /// The word demands an immediate but none follows.
    TruncatedImmediate,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::NoMatch(word) => write!(f, "no opcode matches 0x{:04x}", word),
            DecodeError::Ambiguous(word) => {
                write!(f, "ambiguous decode of 0x{:04x}", word)
            }
            DecodeError::TruncatedImmediate => f.write_str("truncated immediate"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A single instruction: a mnemonic plus its operand slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub ops: Operands,
}

impl Default for Instruction {
    fn default() -> Instruction {
        Instruction {
            op: Op::Nop,
            ops: Operands::default(),
        }
    }
}

// Pop the next operand token, stepping over `..` range separators.
fn pop_token<'t>(rest: &mut &'t [&'t str]) -> Option<&'t str> {
    loop {
        let slice = *rest;
        let (&first, tail) = slice.split_first()?;
        *rest = tail;

        if first != ".." {
            return Some(first);
        }
    }
}

// Try to read an immediate for operand c. Falls back to `None` when the
// token should be treated as a register name instead.
fn parse_c_operand(token: &str) -> Result<Option<Imm>, ParseError> {
    if token.starts_with('$') || token.starts_with('@') {
        return Ok(Some(Imm::Ref(token.to_owned())));
    }

    if token.starts_with('\'') {
        return Ok(imm::parse_char(token).map(Imm::Value));
    }

    if token.starts_with(|ch: char| ch.is_ascii_digit())
        || token.starts_with('-')
        || token.starts_with('+')
    {
        return Ok(Some(Imm::Value(imm::parse_int(token)?)));
    }

    Ok(None)
}

// Build the 7-bit register mask for operand d from the rest of the line,
// a comma-separated mix of single registers and `lo..hi` ranges.
fn parse_greg_list<'t>(
    first: &'t str,
    rest: &mut &'t [&'t str],
) -> Result<u8, ParseError> {
    let mut mask = 0u8;
    let mut token = Some(first);

    while let Some(name) = token {
        let lo = isa::greg_index(name)
            .ok_or_else(|| ParseError::BadRegister('d', name.to_owned()))?;

        let slice = *rest;
        let hi = if slice.first() == Some(&"..") {
            let end = match slice.get(1) {
                Some(&end) => end,
                None => return Err(ParseError::MissingOperand('d')),
            };
            *rest = &slice[2..];

            isa::greg_index(end)
                .ok_or_else(|| ParseError::BadRegister('d', end.to_owned()))?
        } else {
            lo
        };

        if lo > hi {
            return Err(ParseError::EmptyRange(
                isa::greg_name(lo),
                isa::greg_name(hi),
            ));
        }

        for index in lo..=hi {
            if index == constants::SP {
                return Err(ParseError::StackPointerInRange);
            }
            if mask & (1 << index) != 0 {
                return Err(ParseError::DuplicateInRange(isa::greg_name(index)));
            }
            mask |= 1 << index;
        }

        let slice = *rest;
        token = match slice.split_first() {
            Some((&next, tail)) => {
                *rest = tail;
                Some(next)
            }
            None => None,
        };
    }

    Ok(mask)
}

// Iterate over the `{slot}` placeholders of a syntax template in order.
fn syntax_slots(syntax: &str) -> impl Iterator<Item = Slot> + '_ {
    syntax.char_indices().filter_map(move |(index, ch)| {
        if ch != '{' {
            return None;
        }
        let letter = syntax[index + 1..].chars().next()?;
        Slot::from_letter(letter)
    })
}

impl Instruction {
    /// Build an instruction from the tokens of one source line, the first
    /// being the optionally predicated mnemonic. Returns the instruction
    /// and the tokens left unconsumed.
    pub fn from_tokens<'t>(
        isa: &Isa,
        tokens: &'t [&'t str],
    ) -> Result<(Instruction, &'t [&'t str]), ParseError> {
        let (&first, mut rest) = tokens
            .split_first()
            .ok_or_else(|| ParseError::UnknownInstruction(String::new()))?;

        // Split off the predicate suffix and push it back into the operand
        // stream so the slot walker below sees it like any other token.
        let (name, mut pending) = match first.find('.') {
            Some(index) => (&first[..index], Some(&first[index + 1..])),
            None => (first, None),
        };

        let (syntax, op, map) = match isa::synonym(name) {
            Some(synonym) => (synonym.syntax, synonym.op, synonym.map),
            None => {
                let op = isa
                    .lookup(name)
                    .ok_or_else(|| ParseError::UnknownInstruction(name.to_owned()))?;
                (isa.def(op).syntax, op, &[][..])
            }
        };

        let mut instr = Instruction {
            op,
            ops: Operands::default(),
        };

        for slot in syntax_slots(syntax) {
            // An unpredicated mnemonic gets pt without consuming a token.
            if slot == Slot::P && pending.is_none() {
                instr.ops.p = Some(constants::PT);
                continue;
            }

            let value = match pending.take() {
                Some(pred) => pred,
                None => pop_token(&mut rest)
                    .ok_or_else(|| ParseError::MissingOperand(slot.letter()))?,
            };

            match slot {
                Slot::P | Slot::Q => {
                    let index = isa::preg_index(value).ok_or_else(|| {
                        ParseError::BadPredicateRegister(slot.letter(), value.to_owned())
                    })?;
                    instr.ops.set(slot, index);
                }
                Slot::C => match parse_c_operand(value)? {
                    Some(immediate) => {
                        instr.ops.imm = Some(immediate);
                        instr.ops.c = Some(constants::IMM_ESCAPE);
                    }
                    None => {
                        let index = isa::greg_index(value).ok_or_else(|| {
                            ParseError::BadRegister('c', value.to_owned())
                        })?;
                        instr.ops.c = Some(index);
                    }
                },
                Slot::D => {
                    instr.ops.d = Some(parse_greg_list(value, &mut rest)?);
                }
                _ => {
                    let index = isa::greg_index(value).ok_or_else(|| {
                        ParseError::BadRegister(slot.letter(), value.to_owned())
                    })?;
                    instr.ops.set(slot, index);
                }
            }
        }

        if let Some(pred) = pending {
            return Err(ParseError::TrailingPredicate(pred.to_owned()));
        }

        // r7 in operand c is the immediate escape and cannot be named
        // directly.
        if instr.ops.c == Some(constants::IMM_ESCAPE) && instr.ops.imm.is_none() {
            return Err(ParseError::StackPointerOperand);
        }

        // The classic push/pop range has the same restrictions as the mask
        // form.
        if isa.variant() == Variant::Classic
            && matches!(op, Op::Push | Op::Pop)
        {
            let lo = instr.ops.a.unwrap_or(0);
            let hi = instr.ops.b.unwrap_or(0);
            if lo > hi {
                return Err(ParseError::EmptyRange(
                    isa::greg_name(lo),
                    isa::greg_name(hi),
                ));
            }
            if hi == constants::SP {
                return Err(ParseError::StackPointerInRange);
            }
        }

        // Fill in the operands that come from the synonym mapping.
        for &(slot, value) in map {
            let value = match value {
                MapValue::Slot(source) => instr
                    .ops
                    .get(source)
                    .ok_or_else(|| ParseError::MissingOperand(source.letter()))?,
                MapValue::Greg(index) | MapValue::Preg(index) => index,
            };
            instr.ops.set(slot, value);
        }

        Ok((instr, rest))
    }

    /// Render the instruction through its syntax template. Unresolved
    /// label references print verbatim; resolved immediates print in hex.
    pub fn text(&self, isa: &Isa) -> String {
        let syntax = isa.def(self.op).syntax;
        let mut out = String::new();

        let mut chars = syntax.chars();
        while let Some(ch) = chars.next() {
            if ch != '{' {
                out.push(ch);
                continue;
            }

            let letter = chars.next().unwrap_or('}');
            chars.next(); // closing brace

            let slot = match Slot::from_letter(letter) {
                Some(slot) => slot,
                None => continue,
            };
            let value = self.ops.get(slot).unwrap_or(0);

            match slot {
                Slot::P | Slot::Q => out.push_str(isa::preg_name(value)),
                Slot::A | Slot::B => out.push_str(isa::greg_name(value)),
                Slot::C => match &self.ops.imm {
                    Some(Imm::Ref(reference)) => out.push_str(reference),
                    Some(Imm::Value(value)) => out.push_str(&imm_text(*value)),
                    None => out.push_str(isa::greg_name(value)),
                },
                Slot::D => out.push_str(&mask_text(value)),
            }
        }

        out
    }

    /// Size of the instruction when encoded, in 16-bit words.
    pub fn size(&self) -> u16 {
        1 + self.ops.imm.is_some() as u16
    }

    /// Encode to the on-disk representation: the instruction word and the
    /// optional immediate word.
    pub fn encode_words(&self, isa: &Isa) -> Result<(u16, Option<i16>), EncodeError> {
        let def = isa.def(self.op);

        // Remaining bit count per slot, so values distribute MSB first.
        let mut left = [0u8; 6];
        for ch in def.encoding.chars() {
            if let Some(slot) = Slot::from_letter(ch) {
                left[slot_index(slot)] += 1;
            }
        }

        for slot in &[Slot::P, Slot::Q, Slot::A, Slot::B, Slot::C, Slot::D] {
            let width = left[slot_index(*slot)];
            if width == 0 {
                continue;
            }
            let value = self
                .ops
                .get(*slot)
                .ok_or_else(|| EncodeError::MissingOperand(slot.letter()))?;
            if u16::from(value) >> width != 0 {
                return Err(EncodeError::OperandTooWide(slot.letter(), value));
            }
        }

        let mut word = 0u16;
        for ch in def.encoding.chars() {
            word <<= 1;
            match ch {
                '0' => {}
                '1' => word |= 1,
                _ => {
                    if let Some(slot) = Slot::from_letter(ch) {
                        let index = slot_index(slot);
                        left[index] -= 1;
                        let value = self.ops.get(slot).unwrap_or(0);
                        word |= u16::from(value) >> left[index] & 1;
                    }
                }
            }
        }

        let immediate = match &self.ops.imm {
            None => None,
            Some(Imm::Value(value)) => Some(*value),
            Some(Imm::Ref(reference)) => {
                return Err(EncodeError::UnresolvedImmediate(reference.clone()))
            }
        };

        Ok((isa.pack_word(word), immediate))
    }

    /// Encode to raw big-endian bytes.
    pub fn encode(&self, isa: &Isa) -> Result<Vec<u8>, EncodeError> {
        let (word, immediate) = self.encode_words(isa)?;

        let mut bytes = vec![0u8; constants::WORD_BYTES];
        Endian::write_u16(&mut bytes, word);

        if let Some(value) = immediate {
            let mut tail = [0u8; constants::WORD_BYTES];
            Endian::write_i16(&mut tail, value);
            bytes.extend_from_slice(&tail);
        }

        Ok(bytes)
    }

    /// Decode an instruction from its word and, when the immediate escape
    /// is present, the following word.
    pub fn decode(isa: &Isa, word: u16, next: Option<u16>) -> Result<Instruction, DecodeError> {
        let raw = isa.pack_word(word);

        let mut found = None;
        for op in isa.ops() {
            let def = isa.def(op);
            if raw & def.mask == def.opcode {
                if found.is_some() {
                    return Err(DecodeError::Ambiguous(word));
                }
                found = Some(op);
            }
        }

        let op = found.ok_or(DecodeError::NoMatch(word))?;
        let def = isa.def(op);

        let mut ops = Operands::default();
        let mut bit = 16;
        for ch in def.encoding.chars() {
            bit -= 1;
            if let Some(slot) = Slot::from_letter(ch) {
                let value = ops.get(slot).unwrap_or(0);
                ops.set(slot, value << 1 | (raw >> bit & 1) as u8);
            }
        }

        if ops.c == Some(constants::IMM_ESCAPE) {
            let value = next.ok_or(DecodeError::TruncatedImmediate)?;
            ops.imm = Some(Imm::Value(value as i16));
        }

        Ok(Instruction { op, ops })
    }
}

fn slot_index(slot: Slot) -> usize {
    match slot {
        Slot::P => 0,
        Slot::Q => 1,
        Slot::A => 2,
        Slot::B => 3,
        Slot::C => 4,
        Slot::D => 5,
    }
}

// Immediates print in hex, negative values with a leading sign.
fn imm_text(value: i16) -> String {
    if value < 0 {
        format!("-0x{:x}", -i32::from(value))
    } else {
        format!("0x{:x}", value)
    }
}

// Render a push/pop mask as a register list, folding runs into ranges.
fn mask_text(mask: u8) -> String {
    let mut parts = Vec::new();
    let mut index = 0u8;

    while index < constants::GREG_COUNT as u8 {
        if mask & (1 << index) == 0 {
            index += 1;
            continue;
        }

        let start = index;
        while index + 1 < constants::GREG_COUNT as u8 && mask & (1 << (index + 1)) != 0 {
            index += 1;
        }

        if start == index {
            parts.push(isa::greg_name(start).to_owned());
        } else {
            parts.push(format!(
                "{}..{}",
                isa::greg_name(start),
                isa::greg_name(index)
            ));
        }
        index += 1;
    }

    parts.join(", ")
}
