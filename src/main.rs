use std::env;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::*;
use log::*;
use structopt::*;

use mela2paprika::result::ConvertError;
use mela2paprika::{convert_archive, ConvertOptions};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "mela2paprika",
    about = "Converts a Mela export (.melarecipes) into a Paprika archive (.paprikarecipes)"
)]
struct Opt {
    /// Pass multiple times for additional verbosity (info, debug, trace)
    #[structopt(short, long, parse(from_occurrences))]
    verbosity: usize,

    /// Skip recipes that can't be parsed or converted instead of stopping.
    #[structopt(short, long)]
    keep_going: bool,

    #[structopt(name("Mela export"))]
    input: PathBuf,

    #[structopt(name("Paprika archive"))]
    output: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<ConvertError>() {
            // Say what's missing without the rest of the chain.
            Some(not_found @ ConvertError::InputNotFound(_)) => eprintln!("{}", not_found),
            _ => eprintln!("Error: {:?}", e),
        }
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Opt::from_args();

    let mut errlog = stderrlog::new();
    errlog.verbosity(args.verbosity + 1);
    errlog.init()?;

    let input = resolve(&args.input)?;
    let output = resolve(&args.output)?;
    if !input.exists() {
        return Err(ConvertError::InputNotFound(input).into());
    }
    if !input.is_file() {
        bail!("Input {} is not a file", input.display());
    }

    let options = ConvertOptions {
        keep_going: args.keep_going,
    };
    let summary = convert_archive(&input, &output, &options)
        .with_context(|| format!("Couldn't convert {}", input.display()))?;
    if summary.skipped > 0 {
        warn!("Skipped {} recipes", summary.skipped);
    }
    debug!("{:?}", summary);

    println!("✔ Wrote {}", output.display());
    Ok(())
}

/// Makes a path absolute against the working directory
/// without requiring it to exist (unlike `canonicalize()`).
fn resolve(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let cwd = env::current_dir().context("Couldn't get working directory")?;
    Ok(cwd.join(path))
}
