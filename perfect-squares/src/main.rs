//! perfect-squares CLI: residue statistics for the primes up to a bound.
//!
//! Usage:
//!   perfect-squares --bound=1000              Compute (or load) and plot
//!   perfect-squares --bound=100 --dump        Also print every residue set
//!   perfect-squares --variant=full --refresh  Recompute with zero included
//!
//! Options:
//!   --bound=<N>             Inclusive prime bound (default: 100)
//!   --data-dir=<path>       Cache directory (default: data)
//!   --plot-dir=<path>       Plot output directory (default: plots)
//!   --variant=<name>        exclude-zero | full | full-nonzero
//!   --threshold=<name>      above-two | at-least-three
//!   --dump                  Print residue sets as text
//!   --no-plots              Skip plot rendering
//!   --refresh               Clear the cache for N first
//!
//! Set RUST_LOG=info (or debug) for progress output.

use std::process::ExitCode;

use perfect_squares::cache::ResultCache;
use perfect_squares::config::Config;
use perfect_squares::present;

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let cache = ResultCache::new(&config.data_dir, config.aggregator);

    if config.refresh {
        cache.clear(config.bound)?;
    }

    let (info, status) = cache.ensure(config.bound)?;
    log::info!(
        "Bound {}: {} primes ({:?}, {} / {})",
        info.bound,
        info.counts.len(),
        status,
        info.config.variant,
        info.config.threshold
    );

    if config.dump {
        print!("{}", present::render_text(&info));
    }

    if config.plots {
        let written = present::render_all(&info, &config.plot_dir)?;
        for path in written {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
