use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;

use anyhow::{bail, Context};
use json_array_stream::{ArrayStreamParser, ParserOptions, StreamError};
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: json-array-stream [--field NAME] [--max-depth N] [--buffer-size N] [FILE|-]";

struct Args {
    field: Option<String>,
    input: Option<String>,
    options: ParserOptions,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        field: None,
        input: None,
        options: ParserOptions::default(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--field" => args.field = Some(it.next().context("--field needs a value")?),
            "--max-depth" => {
                let n = it.next().context("--max-depth needs a value")?;
                args.options.max_depth = n.parse().with_context(|| format!("bad depth {n:?}"))?;
            }
            "--buffer-size" => {
                let n = it.next().context("--buffer-size needs a value")?;
                args.options.read_buffer_size =
                    n.parse().with_context(|| format!("bad buffer size {n:?}"))?;
                if args.options.read_buffer_size == 0 {
                    bail!("buffer size must not be 0");
                }
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if args.input.is_none() => args.input = Some(arg),
            _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
        }
    }
    Ok(args)
}

fn open_input(path: Option<&str>) -> anyhow::Result<Box<dyn Read>> {
    Ok(match path {
        None | Some("-") => Box::new(io::stdin().lock()),
        Some(path) => {
            Box::new(File::open(path).with_context(|| format!("could not open {path}"))?)
        }
    })
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = parse_args()?;
    let input = open_input(args.input.as_deref())?;
    let parser = ArrayStreamParser::with_options(args.options);
    debug!(options = ?parser.options(), input = args.input.as_deref().unwrap_or("-"), "streaming");
    let mut state = parser.parse(input).context("could not read the first token")?;

    let mut out = BufWriter::new(io::stdout().lock());
    let mut failure: Option<StreamError> = None;
    let mut count = 0usize;
    {
        let on_error = |err| failure = Some(err);
        let elements = match &args.field {
            Some(field) => state.parse_field_array::<Value, _>(field, on_error),
            None => state.parse_array::<Value, _>(on_error),
        };
        for element in elements {
            serde_json::to_writer(&mut out, &element)?;
            out.write_all(b"\n")?;
            count += 1;
        }
    }
    if args.field.is_some() && failure.is_none() {
        state.parse_rest(|err| failure = Some(err));
        for (name, value) in state.fields() {
            info!(field = %name, %value, "field outside the streamed array");
        }
    }
    out.flush()?;

    info!(count, "streamed array elements");
    match failure {
        Some(err) => {
            error!(error = %err, after = count, "stream failed");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
