#[macro_use]
extern crate clap;

use clap::Arg;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use idli::Isa;

#[derive(Debug)]
enum Error {
    Asm(idli_asm::Error),
    Io(std::io::Error, PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Asm(err) => fmt::Display::fmt(err, f),
            Error::Io(err, path) => {
                write!(f, "writing output file \"{}\" failed: {}", path.display(), err)
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .required(true)
                .help("Sets the output binary to write"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output").unwrap();

    if let Err(err) = assemble(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn assemble(input: &str, output: &str) -> Result<(), Error> {
    let isa = Isa::default();

    let binary = idli_asm::assemble_file(&isa, Path::new(input)).map_err(Error::Asm)?;

    fs::write(output, &binary).map_err(|err| Error::Io(err, PathBuf::from(output)))?;

    Ok(())
}
