#[macro_use]
extern crate clap;

use clap::Arg;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use idli::dump;
use idli::Isa;

#[derive(Debug)]
enum Error {
    Dump(dump::Error),
    Io(std::io::Error, PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Dump(err) => fmt::Display::fmt(err, f),
            Error::Io(err, path) => {
                write!(f, "reading input file \"{}\" failed: {}", path.display(), err)
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Path to the binary to disassemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Print every repeated line instead of folding runs"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let verbose = matches.is_present("verbose");

    if let Err(err) = run(input, verbose) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(input: &str, verbose: bool) -> Result<(), Error> {
    let path = Path::new(input);
    let image = fs::read(path).map_err(|err| Error::Io(err, path.to_owned()))?;

    let isa = Isa::default();
    let lines = dump::disassemble(&isa, &image, verbose).map_err(Error::Dump)?;

    println!("{}", lines.join("\n"));

    Ok(())
}
