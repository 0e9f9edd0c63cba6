//! Trace-driven DRAM simulator CLI.
//!
//! Feeds a memory request trace through the timing core:
//! 1. **Config:** a JSON file selecting standard/org/speed and policies, or
//!    built-in defaults (single-channel DDR3-1600K); `--channels`/`--ranks`
//!    override the system shape.
//! 2. **Trace:** one request per line, `<hex-addr> R|W`.
//! 3. **Drive:** requests are sent as fast as the controllers accept them;
//!    the clock ticks until the trace is exhausted and every request has
//!    drained. Statistics and a read-latency summary print at the end.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dramsim_core::request::Callback;
use dramsim_core::{Config, Memory, ReqKind, Request};

#[derive(Parser, Debug)]
#[command(
    name = "dramsim",
    author,
    version,
    about = "Cycle-accurate DRAM timing simulator",
    long_about = "Replay a memory request trace against a cycle-accurate DRAM model.\n\n\
        Trace format: one request per line, `<hex-addr> R|W`.\n\n\
        Examples:\n  dramsim dram.trace\n  dramsim --config ddr4.json --channels 2 dram.trace"
)]
struct Cli {
    /// Request trace file (`<hex-addr> R|W` per line).
    trace: PathBuf,

    /// JSON configuration file; defaults model DDR3-1600K.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the channel count.
    #[arg(long)]
    channels: Option<u32>,

    /// Override the rank count.
    #[arg(long)]
    ranks: Option<u32>,

    /// Print a read-latency histogram after the run.
    #[arg(long)]
    latency_histogram: bool,
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|err| {
                eprintln!("error: cannot read config {}: {err}", path.display());
                process::exit(1);
            });
            serde_json::from_str(&text).unwrap_or_else(|err| {
                eprintln!("error: bad config {}: {err}", path.display());
                process::exit(1);
            })
        }
        None => Config::default(),
    };
    if let Some(channels) = cli.channels {
        config.channels = channels;
    }
    if let Some(ranks) = cli.ranks {
        config.ranks = ranks;
    }
    config
}

fn parse_trace(path: &PathBuf) -> Vec<(u64, ReqKind)> {
    let text = fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("error: cannot read trace {}: {err}", path.display());
        process::exit(1);
    });
    let mut requests = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(kind)) = (fields.next(), fields.next()) else {
            eprintln!("error: {}:{}: expected `<addr> R|W`", path.display(), lineno + 1);
            process::exit(1);
        };
        let addr = u64::from_str_radix(addr.trim_start_matches("0x"), 16).unwrap_or_else(|_| {
            eprintln!("error: {}:{}: bad address {addr}", path.display(), lineno + 1);
            process::exit(1);
        });
        let kind = match kind {
            "R" | "r" => ReqKind::Read,
            "W" | "w" => ReqKind::Write,
            other => {
                eprintln!("error: {}:{}: bad request kind {other}", path.display(), lineno + 1);
                process::exit(1);
            }
        };
        requests.push((addr, kind));
    }
    requests
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    let mut memory = Memory::build(&config).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        process::exit(1);
    });
    println!(
        "Standard: {}  org: {}  speed: {}  channels: {}  ranks: {}",
        memory.spec.name, config.org, config.speed, config.channels, config.ranks
    );

    let trace = parse_trace(&cli.trace);
    let latencies: Rc<RefCell<BTreeMap<i64, u64>>> = Rc::new(RefCell::new(BTreeMap::new()));
    let on_read: Callback = {
        let latencies = Rc::clone(&latencies);
        Rc::new(move |req: &Request| {
            *latencies.borrow_mut().entry(req.depart - req.arrive).or_insert(0) += 1;
        })
    };

    let mut clks: u64 = 0;
    let mut reads: u64 = 0;
    let mut writes: u64 = 0;
    let mut next = trace.iter();
    let mut stalled: Option<(u64, ReqKind)> = None;

    loop {
        let pending = stalled.take().or_else(|| next.next().copied());
        match pending {
            Some((addr, kind)) => {
                let callback = (kind == ReqKind::Read).then(|| on_read.clone());
                let req = Request::new(addr, kind, callback);
                if memory.send(req) {
                    match kind {
                        ReqKind::Read => reads += 1,
                        ReqKind::Write => writes += 1,
                        _ => {}
                    }
                } else {
                    stalled = Some((addr, kind)); // queue full, retry next cycle
                }
            }
            None => {
                if memory.pending_requests() == 0 {
                    break;
                }
            }
        }
        memory.tick();
        clks += 1;
    }
    memory.finish();

    let t_ns = memory.clk_ns() * clks as f64;
    let tx = memory.spec.transaction_bytes() as f64;
    let gbps = |count: u64| tx * count as f64 / t_ns;
    println!(
        "Simulation done: {clks} clocks [{t_ns:.1} ns], {reads} reads [{:.3} GB/s], {writes} writes [{:.3} GB/s]",
        gbps(reads),
        gbps(writes)
    );

    memory.stats().print();

    if cli.latency_histogram {
        println!("\nREAD LATENCY HISTOGRAM (cycles)");
        for (latency, count) in latencies.borrow().iter() {
            println!("  [{latency:>5}] {count}");
        }
    }
}
