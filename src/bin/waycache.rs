//! Command-line front end for the cache simulator.
//!
//! Parses geometry and policy options, loads a trace file, and drives a
//! [`CacheEngine`] over it, printing per-access outcomes (with `-v`) and the
//! final summary line.

use std::env;
use std::io::{self, Write};
use std::process;

use getopts::Options;

use waycache::addr::Geometry;
use waycache::engine::{CacheEngine, Policy};
use waycache::trace::{load_trace, run_trace};

fn print_usage(program: &str, opts: &Options) {
    let brief = format!(
        "Usage: {} -b BITS -s BITS -E LINES -t TRACE [options]",
        program
    );
    print!("{}", opts.usage(&brief));
}

fn required_opt(matches: &getopts::Matches, name: &str) -> Result<String, String> {
    matches
        .opt_str(name)
        .ok_or_else(|| format!("missing required option -{}", name))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("-{} expects a number, got `{}`", name, value))
}

fn run(args: &[String]) -> Result<(), String> {
    let program = &args[0];

    let mut opts = Options::new();
    opts.optopt("b", "block-bits", "Number of block offset bits", "BITS");
    opts.optopt("s", "set-bits", "Number of set index bits", "BITS");
    opts.optopt("E", "lines", "Lines per set (associativity)", "LINES");
    opts.optopt("p", "policy", "Replacement policy: lru or lfu (default lru)", "POLICY");
    opts.optopt("t", "trace", "Trace file, one hex address per line", "TRACE");
    opts.optopt("n", "name", "Cache name used in the summary line", "NAME");
    opts.optflag("v", "verbose", "Echo each access and its outcome");
    opts.optflag("h", "help", "Show this help menu");

    let matches = opts.parse(&args[1..]).map_err(|err| err.to_string())?;
    if matches.opt_present("h") {
        print_usage(program, &opts);
        return Ok(());
    }

    let block_bits = parse_number("b", &required_opt(&matches, "b")?)?;
    let set_bits = parse_number("s", &required_opt(&matches, "s")?)?;
    let lines_per_set = parse_number("E", &required_opt(&matches, "E")?)?;
    let trace_path = required_opt(&matches, "t")?;

    let policy: Policy = match matches.opt_str("p") {
        Some(value) => value.parse().map_err(|err: waycache::error::ConfigError| {
            err.to_string()
        })?,
        None => Policy::Lru,
    };
    let name = matches.opt_str("n").unwrap_or_else(|| "Cache".to_string());

    let geometry =
        Geometry::new(block_bits, set_bits, lines_per_set).map_err(|err| err.to_string())?;
    let addresses = load_trace(&trace_path).map_err(|err| err.to_string())?;

    let mut engine = CacheEngine::new(geometry, policy, name);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = if matches.opt_present("v") {
        run_trace(&mut engine, &addresses, Some(&mut out))
    } else {
        run_trace::<io::StdoutLock>(&mut engine, &addresses, None)
    }
    .map_err(|err| err.to_string())?;

    writeln!(out, "{}", summary).map_err(|err| err.to_string())?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if let Err(message) = run(&args) {
        eprintln!("waycache: {}", message);
        process::exit(1);
    }
}
