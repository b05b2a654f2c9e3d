#[macro_use]
extern crate clap;

use clap::Arg;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use idli::{Isa, Simulator};
use idli_run::{load_uart_file, run_test, Stimulus};

#[derive(Debug)]
enum Error {
    Run(idli_run::Error),
    Sim(idli::sim::Error),
    Io(std::io::Error, PathBuf),
    BadTimeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Run(err) => fmt::Display::fmt(err, f),
            Error::Sim(err) => fmt::Display::fmt(err, f),
            Error::Io(err, path) => {
                write!(f, "reading input file \"{}\" failed: {}", path.display(), err)
            }
            Error::BadTimeout(value) => write!(f, "bad timeout value: {}", value),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Path to the binary to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .takes_value(true)
                .value_name("TICKS")
                .default_value("5000")
                .help("Maximum ticks to run before ending the test"),
        )
        .arg(
            Arg::with_name("uart_in")
                .short("i")
                .long("uart-in")
                .takes_value(true)
                .value_name("FILE")
                .help("UART input file"),
        )
        .arg(
            Arg::with_name("uart_out")
                .short("o")
                .long("uart-out")
                .takes_value(true)
                .value_name("FILE")
                .help("UART expected output file"),
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .help("Print the execution trace"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let timeout = matches.value_of("timeout").unwrap();
    let uart_in = matches.value_of("uart_in");
    let uart_out = matches.value_of("uart_out");
    let trace = matches.is_present("trace");

    if let Err(err) = run(input, timeout, uart_in, uart_out, trace) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(
    input: &str,
    timeout: &str,
    uart_in: Option<&str>,
    uart_out: Option<&str>,
    trace: bool,
) -> Result<(), Error> {
    let timeout: usize = timeout
        .parse()
        .map_err(|_| Error::BadTimeout(timeout.to_owned()))?;

    let input_path = Path::new(input);
    let image = fs::read(input_path).map_err(|err| Error::Io(err, input_path.to_owned()))?;

    let stimulus = match uart_in {
        Some(path) => load_uart_file(Path::new(path)).map_err(Error::Run)?,
        None => Vec::new(),
    };

    let expected = match uart_out {
        Some(path) => Some(load_uart_file(Path::new(path)).map_err(Error::Run)?),
        None => None,
    };

    let isa = Isa::default();
    let mut sim = Simulator::new(&isa);
    sim.trace(trace);
    sim.load(&image).map_err(Error::Sim)?;

    let mut stim = Stimulus::new(stimulus);
    run_test(&mut sim, &mut stim, timeout, expected.as_deref()).map_err(Error::Run)
}
