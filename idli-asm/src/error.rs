use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use idli::imm;
use idli::instr;

use crate::items::Loc;
use crate::parser::Rule;

#[derive(Debug)]
pub enum LinkKind {
    UnknownLabel(String),
    AmbiguousLabel(String),
    DuplicateLabel(String),
    NoForwardMatch(String),
    NoBackwardMatch(String),
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkKind::UnknownLabel(name) => {
                write!(f, "reference to unknown label: {}", name)
            }
            LinkKind::AmbiguousLabel(name) => {
                write!(f, "ambiguous reference to label: {}", name)
            }
            LinkKind::DuplicateLabel(name) => {
                write!(f, "multiple instances of non-local label: {}", name)
            }
            LinkKind::NoForwardMatch(name) => {
                write!(f, "no matching local label after reference: {}", name)
            }
            LinkKind::NoBackwardMatch(name) => {
                write!(f, "no matching local label before reference: {}", name)
            }
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// Grammar-level failure; already rendered with its position.
    Parse(String),
    Syntax(Loc, instr::ParseError),
    Immediate(Loc, imm::Error),
    Directive(Loc, String),
    Junk(Loc),
    Io(PathBuf, io::Error),
    Link(Loc, LinkKind),
    Encode(Loc, instr::EncodeError),
    /// The binary would exceed the 16-bit address space.
    TooBig(usize),
}

impl Error {
    pub fn pest(path: &Path, err: pest::error::Error<Rule>) -> Error {
        Error::Parse(err.with_path(&path.to_string_lossy()).to_string())
    }

    pub fn io(path: &Path, err: io::Error) -> Error {
        Error::Io(path.to_owned(), err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(rendered) => f.write_str(rendered),
            Error::Syntax(loc, err) => write!(f, "{}: {}", loc, err),
            Error::Immediate(loc, err) => write!(f, "{}: {}", loc, err),
            Error::Directive(loc, message) => write!(f, "{}: {}", loc, message),
            Error::Junk(loc) => write!(f, "{}: junk at end of line", loc),
            Error::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            Error::Link(loc, kind) => write!(f, "{}: {}", loc, kind),
            Error::Encode(loc, err) => write!(f, "{}: {}", loc, err),
            Error::TooBig(words) => {
                write!(f, "binary of {} words exceeds the memory size", words)
            }
        }
    }
}

impl std::error::Error for Error {}
