//! # Pool Inspector
//!
//! Builds a pool, drives a synthetic expand/prune workload through it and
//! prints the diagnostics dump. Set `RUST_LOG=gridwalk_memory=debug` to see
//! Block creation as it happens.

use std::process::ExitCode;

use gridwalk_memory::{Pool, PoolConfig, PoolError, SlotAddr};
use tracing_subscriber::EnvFilter;

struct Args {
    config: PoolConfig,
    allocs: usize,
    frees: usize,
    reclaim: bool,
}

fn usage() {
    println!("Usage: pool_inspect [options]");
    println!();
    println!("Options:");
    println!("  --config <pool.toml>   Load pool sizing from a TOML file");
    println!("  --object-size <bytes>  Object size (default 32)");
    println!("  --blocks <n>           Blocks created up front (default 20)");
    println!("  --allocs <n>           Objects to allocate (default 100000)");
    println!("  --frees <n>            Objects to free afterwards (default allocs / 2)");
    println!("  --reclaim              Reclaim the pool at the end");
}

fn parse_number(args: &[String], flag: &str) -> Result<Option<usize>, String> {
    let Some(position) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let value = args
        .get(position + 1)
        .ok_or_else(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .map(Some)
        .map_err(|e| format!("{flag} {value}: {e}"))
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut config = match args.iter().position(|a| a == "--config") {
        Some(position) => {
            let path = args
                .get(position + 1)
                .ok_or_else(|| "--config needs a path".to_string())?;
            PoolConfig::from_toml_file(path).map_err(|e| e.to_string())?
        }
        None => PoolConfig::for_object_size(32),
    };
    if let Some(object_size) = parse_number(args, "--object-size")? {
        config.object_size = object_size;
    }
    if let Some(blocks) = parse_number(args, "--blocks")? {
        config.initial_blocks = blocks;
    }

    let allocs = parse_number(args, "--allocs")?.unwrap_or(100_000);
    let frees = parse_number(args, "--frees")?.unwrap_or(allocs / 2).min(allocs);

    Ok(Args {
        config,
        allocs,
        frees,
        reclaim: args.iter().any(|a| a == "--reclaim"),
    })
}

fn run(args: &Args) -> Result<(), PoolError> {
    let mut pool = Pool::with_config(&args.config)?;
    let initial = pool.memory_footprint();

    let mut live: Vec<SlotAddr> = Vec::with_capacity(args.allocs);
    for _ in 0..args.allocs {
        live.push(pool.allocate()?);
    }
    // prune a spread of nodes rather than the most recent ones
    let mut freed = 0;
    let mut index = 0;
    while freed < args.frees && !live.is_empty() {
        index = (index + 2) % live.len();
        pool.deallocate(live.swap_remove(index))?;
        freed += 1;
    }

    println!("{pool}");
    println!("live objects:      {}", live.len());
    println!("freed objects:     {freed}");
    println!("initial footprint: {initial} bytes");
    println!("current footprint: {} bytes", pool.memory_footprint());
    if let (Some(first), Some(last)) = (pool.blocks().first(), pool.blocks().last()) {
        println!(
            "block ids:         {}..={} ({} byte slots)",
            first.id().get(),
            last.id().get(),
            first.object_size()
        );
    }

    if args.reclaim {
        pool.reclaim();
        println!();
        println!("after reclaim:");
        println!("{pool}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
        return ExitCode::SUCCESS;
    }

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            usage();
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
