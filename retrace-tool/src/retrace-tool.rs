#![allow(clippy::uninlined_format_args)]

use log::{LevelFilter, Log, Metadata, Record};
use retrace::{backends, Error, Flags, Match, Regex, RegexBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "retrace-tool")]
struct Opt {
    /// The regular expression.
    pattern: String,

    /// The flags of the regular expression, as letters: imnsxrec.
    #[structopt(long, short, parse(from_str = Flags::from))]
    flags: Option<Flags>,

    /// Do not optimize the IR.
    #[structopt(long)]
    no_opt: bool,

    /// Fail matches which take longer than this many milliseconds.
    #[structopt(long)]
    timeout_ms: Option<u64>,

    /// Log level written to stderr: off, error, warn, info, debug or trace.
    #[structopt(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Dump the unoptimized IR to stdout
    #[structopt(long)]
    dump_unoptimized_ir: bool,

    /// Dump the optimized IR to stdout
    #[structopt(long)]
    dump_optimized_ir: bool,

    /// Dump the bytecode to stdout.
    #[structopt(long)]
    dump_bytecode: bool,

    /// Dump all regular expression compilation phases to stdout.
    #[structopt(long)]
    dump_phases: bool,

    /// The input values to match against.
    #[structopt(conflicts_with_all = &["bench", "file"])]
    inputs: Vec<String>,

    /// Match against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["bench", "inputs"])]
    file: Option<PathBuf>,

    /// Benchmark the matches of the specified file.
    #[structopt(long, conflicts_with_all = &["file", "inputs"])]
    bench: Option<PathBuf>,
}

/// Writes every enabled record to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn format_match(m: &Match) -> String {
    let mut result = format!("\"{}\" ({}..{})", m.as_str(), m.start(), m.end());

    // Show capture groups if any exist
    let groups: Vec<String> = m
        .groups()
        .skip(1)
        .zip(m.regex().group_names().into_iter().skip(1))
        .map(|(group, name)| match group {
            Some(group) => format!("{}: \"{}\" ({}..{})", name, group.as_str(), group.start(), group.end()),
            None => format!("{}: None", name),
        })
        .collect();
    if !groups.is_empty() {
        result.push_str(", captures: [");
        result.push_str(&groups.join(", "));
        result.push(']');
    }
    result
}

fn exec_re_on_string(re: &Regex, input: &str) -> Result<(), Error> {
    let mut matches = re.find_iter(input);
    match matches.next().transpose()? {
        Some(first) => {
            let mut count = 1;
            for m in matches {
                m?;
                count += 1;
            }
            println!("Match: {}, total: {}", format_match(&first), count);
        }
        None => println!("No match"),
    }
    Ok(())
}

fn count_matches(re: &Regex, input: &str) -> Result<usize, Error> {
    let mut count = 0;
    for m in re.find_iter(input) {
        m?;
        count += 1;
    }
    Ok(count)
}

fn bench_re_on_path(re: &Regex, path: &Path) -> Result<(), Error> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("{}: {}", err, path.display());
            return Ok(());
        }
    };
    let input = contents.as_str();
    // Warmup
    count_matches(re, input)?;
    let start = Instant::now();
    for _ in 0..25 {
        count_matches(re, input)?;
    }
    let duration = start.elapsed();
    println!("{} ms", duration.as_millis());
    Ok(())
}

fn main() -> Result<(), Error> {
    let args = Opt::from_args();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(args.log_level);
    }

    let mut flags = args.flags.unwrap_or_default();
    flags.no_opt = args.no_opt;

    let mut ire = backends::try_parse(&args.pattern, flags)?;
    if args.dump_phases || args.dump_unoptimized_ir {
        println!("Unoptimized IR:\n{}", ire);
    }
    if !flags.no_opt {
        backends::optimize(&mut ire);
        if args.dump_phases || args.dump_optimized_ir {
            println!("Optimized IR:\n{}", ire);
        }
    }
    if args.dump_phases || args.dump_bytecode {
        println!("Bytecode:\n{}", backends::emit(&ire));
    }

    let mut builder = RegexBuilder::new(&args.pattern);
    builder.flags(flags);
    if let Some(ms) = args.timeout_ms {
        builder.match_timeout(Duration::from_millis(ms));
    }
    let re = builder.build()?;

    if let Some(ref path) = args.file {
        match fs::read_to_string(path) {
            Ok(contents) => exec_re_on_string(&re, contents.as_str())?,
            Err(err) => println!("{}: {}", err, path.display()),
        };
    } else if let Some(ref path) = args.bench {
        bench_re_on_path(&re, path)?;
    } else {
        for input in args.inputs {
            exec_re_on_string(&re, &input)?;
        }
    }
    Ok(())
}
