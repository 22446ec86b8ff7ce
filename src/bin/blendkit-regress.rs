use anyhow::Context as _;
use clap::Parser;

use blendkit::regress::{self, RegressOptions, RegressionReport, TestPattern};
use blendkit::{Capabilities, CompositeOp};

/// Check every accelerated compositing kernel against the generic one, byte for byte,
/// and time both.
#[derive(Parser, Debug)]
#[command(name = "blendkit-regress", version)]
struct Args {
    /// Timed runs per kernel and pattern.
    #[arg(short = 'i', long, default_value_t = 10)]
    iterations: usize,

    /// Pixels per row. The default is one past 256*256 so the tail path runs.
    #[arg(short = 'n', long = "n-pixels", default_value_t = 256 * 256 + 1)]
    n_pixels: usize,

    /// Only check this op (e.g. `multiply`, `grain-merge`).
    #[arg(long)]
    op: Option<CompositeOp>,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Log probe results and every case.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    match try_main() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    }
}

/// `Ok(false)` means at least one kernel disagreed with its generic twin.
fn try_main() -> anyhow::Result<bool> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let capabilities = Capabilities::detect();
    let opts = RegressOptions {
        iterations: args.iterations,
        n_pixels: args.n_pixels,
        op: args.op,
        patterns: TestPattern::all(),
        capabilities,
    };
    let report = regress::run(&opts).context("run regression")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{json}");
    } else {
        print_summary(&report, &opts);
    }
    Ok(!report.failed())
}

fn print_summary(report: &RegressionReport, opts: &RegressOptions) {
    let families: Vec<&str> = report.families.iter().map(|f| f.name()).collect();
    println!(
        "capabilities: swar={} sse2={}; families: {}",
        report.capabilities.swar,
        report.capabilities.sse2,
        families.join(", ")
    );
    if report.cases.is_empty() {
        println!("no accelerated kernels to check on this host");
        return;
    }

    for case in &report.cases {
        let status = if case.passed() { "ok" } else { "MISMATCH" };
        let speedup = case
            .speedup
            .map(|s| format!("{s:.2}x"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{status:<8} {kernel:<44} {pattern:<22} speedup {speedup}",
            kernel = case.kernel,
            pattern = case.pattern.to_string(),
        );
        for m in &case.mismatches {
            println!(
                "         {}[{}] pixel {} channel {}: a={:?} b={:?} expected {:#04x} got {:#04x}",
                m.buffer, m.offset, m.pixel, m.channel, m.a, m.b, m.expected, m.actual
            );
        }
        if case.mismatch_count > case.mismatches.len() {
            println!(
                "         ... {} more",
                case.mismatch_count - case.mismatches.len()
            );
        }
    }

    let failed = report.cases.iter().filter(|c| !c.passed()).count();
    println!(
        "{} case(s), {} failed, {} mismatching byte(s); n={} iterations={}",
        report.cases.len(),
        failed,
        report.mismatch_count(),
        opts.n_pixels,
        opts.iterations
    );
}
