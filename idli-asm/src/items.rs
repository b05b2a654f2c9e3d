//! First pass: parse source files into a stream of labels, data words and
//! instructions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use matches::debug_assert_matches;
use pest::iterators::Pair;
use pest::Parser;

use idli::imm;
use idli::instr::Instruction;
use idli::Isa;

use crate::error::Error;
use crate::parser::{AsmParser, Rule};

/// A label definition. Labels whose names are all decimal digits are
/// local and may be defined any number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub is_local: bool,
}

impl Label {
    fn new(name: &str) -> Label {
        Label {
            name: name.to_owned(),
            is_local: name.chars().all(|ch| ch.is_ascii_digit()),
        }
    }
}

/// One element of the assembled stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Label(Label),
    /// A raw 16-bit data word.
    Word(i16),
    Instr(Instruction),
}

/// Source position an item came from, for error reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loc {
    pub path: PathBuf,
    pub line: usize,
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Parse a source file, expanding `.include` directives recursively.
pub fn parse_file(isa: &Isa, path: &Path) -> Result<Vec<(Item, Loc)>, Error> {
    let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    parse_source(isa, &source, path)
}

/// Parse source text. `path` names the text in errors and anchors any
/// `.include` directives.
pub fn parse_source(isa: &Isa, source: &str, path: &Path) -> Result<Vec<(Item, Loc)>, Error> {
    let program = AsmParser::parse(Rule::program, source)
        .map_err(|err| Error::pest(path, err))?
        .next()
        .unwrap();

    let mut items = Vec::new();

    for line in program.into_inner() {
        if line.as_rule() == Rule::EOI {
            break;
        }

        parse_line(isa, line, path, &mut items)?;
    }

    Ok(items)
}

fn parse_line(
    isa: &Isa,
    line: Pair<Rule>,
    path: &Path,
    items: &mut Vec<(Item, Loc)>,
) -> Result<(), Error> {
    debug_assert_matches!(line.as_rule(), Rule::line);

    let loc = Loc {
        path: path.to_owned(),
        line: line.as_span().start_pos().line_col().0,
    };

    for part in line.into_inner() {
        match part.as_rule() {
            Rule::label => {
                let name = part.into_inner().next().unwrap().as_str();
                items.push((Item::Label(Label::new(name)), loc.clone()));
            }
            Rule::directive => parse_directive(isa, part, &loc, items)?,
            Rule::instruction => parse_instruction(isa, part, &loc, items)?,
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn parse_instruction(
    isa: &Isa,
    pair: Pair<Rule>,
    loc: &Loc,
    items: &mut Vec<(Item, Loc)>,
) -> Result<(), Error> {
    // Flatten the pairs back into line tokens, keeping `..` so register
    // ranges survive into the operand walker.
    let mut tokens = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::mnemonic => tokens.push(part.as_str()),
            Rule::operands => {
                for op in part.into_inner() {
                    match op.as_rule() {
                        Rule::operand => tokens.push(op.as_str()),
                        Rule::range_op => tokens.push(".."),
                        _ => unreachable!(),
                    }
                }
            }
            _ => unreachable!(),
        }
    }

    let (instr, rest) = Instruction::from_tokens(isa, &tokens)
        .map_err(|err| Error::Syntax(loc.clone(), err))?;

    // Instructions must be the last thing on a line.
    if !rest.is_empty() {
        return Err(Error::Junk(loc.clone()));
    }

    items.push((Item::Instr(instr), loc.clone()));

    Ok(())
}

fn parse_directive(
    isa: &Isa,
    pair: Pair<Rule>,
    loc: &Loc,
    items: &mut Vec<(Item, Loc)>,
) -> Result<(), Error> {
    let mut pairs = pair.into_inner();
    let name = pairs.next().unwrap().as_str();

    match name {
        // .include replaces the current line with the content of the
        // referenced file, relative to the including file.
        ".include" => {
            let arg = pairs
                .next()
                .filter(|pair| pair.as_rule() == Rule::string)
                .ok_or_else(|| {
                    Error::Directive(loc.clone(), "bad include path string format".to_owned())
                })?;

            let quoted = arg.as_str();
            let relative = &quoted[1..quoted.len() - 1];
            let target = match loc.path.parent() {
                Some(dir) => dir.join(relative),
                None => PathBuf::from(relative),
            };

            items.extend(parse_file(isa, &target)?);
        }

        // .int emits a single 16-bit word with the given value.
        ".int" => {
            let arg = directive_int(&mut pairs, loc)?;
            let value = imm::parse_int(arg).map_err(|err| Error::Immediate(loc.clone(), err))?;
            items.push((Item::Word(value), loc.clone()));
        }

        // .zeros emits the given number of zero words.
        ".zeros" => {
            let arg = directive_int(&mut pairs, loc)?;
            let count =
                imm::parse_integer(arg).map_err(|err| Error::Immediate(loc.clone(), err))?;

            if count < 1 {
                return Err(Error::Directive(
                    loc.clone(),
                    format!("bad number of zeros: {}", count),
                ));
            }

            for _ in 0..count {
                items.push((Item::Word(0), loc.clone()));
            }
        }

        _ => {
            return Err(Error::Directive(
                loc.clone(),
                format!("unknown directive: {}", name),
            ))
        }
    }

    if pairs.next().is_some() {
        return Err(Error::Junk(loc.clone()));
    }

    Ok(())
}

fn directive_int<'i>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    loc: &Loc,
) -> Result<&'i str, Error> {
    pairs
        .next()
        .filter(|pair| pair.as_rule() == Rule::operand)
        .map(|pair| pair.as_str())
        .ok_or_else(|| Error::Directive(loc.clone(), "missing directive value".to_owned()))
}
