use std::fmt;
use std::io::Write;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use dsla::{
    emitter::{emit, EmitOptions},
    error::CompileError,
};

enum Error {
    Compile(CompileError),
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Error {
        Error::Compile(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IO(io) => write!(f, "IO error: {}", io),
            Error::Compile(err) => write!(f, "{}", err),
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("dslac")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles DSL assembly into words for the DSL virtual machine")
        .arg(
            Arg::with_name("source")
                .help("File containing assembly source")
                .value_name("SOURCE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Write the words into FILE instead of the standard output")
                .value_name("FILE")
                .long("output")
                .short("o")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("no-comments")
                .help("Leave out the comment describing each word")
                .long("no-comments"),
        )
        .arg(
            Arg::with_name("verbose")
                .help("Enables verbose logging")
                .long("verbose")
                .short("v"),
        )
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    let logger = if args.is_present("verbose") {
        let decorator = TermDecorator::new().stderr().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Discard, o!())
    };

    if let Err(err) = run(&args, logger) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: &ArgMatches, logger: Logger) -> Result<(), Error> {
    // SOURCE is required, clap exits before this when it is missing.
    let source_path = args.value_of("source").unwrap_or_default();
    let source = std::fs::read_to_string(source_path)?;

    let image = dsla::assemble_with_logger(source.lines(), logger)?;

    let options = EmitOptions {
        comments: !args.is_present("no-comments"),
    };

    let mut text = emit(&image, &options);
    text.push('\n');

    match args.value_of("output") {
        Some(path) => std::fs::write(path, text)?,
        None => std::io::stdout().write_all(text.as_bytes())?,
    }

    Ok(())
}
