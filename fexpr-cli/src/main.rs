#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use fexpr_core::{Applied, Arguments, Value, compile};
use itertools::Itertools;
use tracing::debug;

/// Compile an expression and apply argument values to it.
///
/// The expression's parameters are its free identifiers, in alphabetical
/// order. Supplying fewer values than parameters prints the names still
/// awaited instead of failing.
#[derive(Parser)]
#[command(name = "fexpr")]
struct Args {
    /// Expression to compile, e.g. 'x + y'
    expression: String,

    /// Positional argument values, each a closed expression, e.g. 2 or "s"
    #[arg(allow_hyphen_values = true)]
    values: Vec<String>,

    /// Named argument values
    #[arg(long = "arg", value_name = "NAME=VALUE")]
    named: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let curried = compile(&args.expression)
        .with_context(|| format!("cannot compile `{}`", args.expression))?;
    debug!(params = ?curried.signature().params(), "compiled");

    let mut arguments = Arguments::positional(
        args.values
            .iter()
            .map(|value| closed_value(value))
            .collect::<anyhow::Result<Vec<_>>>()?,
    );
    for entry in &args.named {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("`{entry}` is not of the form NAME=VALUE"))?;
        arguments = arguments.named(name, closed_value(value)?);
    }

    match curried.call_with(arguments)? {
        Applied::Done(value) => println!("{value}"),
        Applied::Waiting(rest) => {
            println!("awaiting: {}", rest.missing().iter().join(", "));
        }
    }
    Ok(())
}

/// Parse an argument value as an expression with no free identifiers.
fn closed_value(text: &str) -> anyhow::Result<Value> {
    let curried = compile(text).with_context(|| format!("cannot parse value `{text}`"))?;
    match curried.call_with(Arguments::new())? {
        Applied::Done(value) => Ok(value),
        Applied::Waiting(rest) => bail!(
            "value `{text}` is not closed; unbound: {}",
            rest.missing().iter().join(", ")
        ),
    }
}
