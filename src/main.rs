use anyhow::Result;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging(prioarity::cli::wants_json(&args));
    prioarity::cli::run(&args)
}

fn env_filter(default: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

/// Status lines go to PRIOARITY_LOG_PATH when set. On stderr, JSON output
/// keeps only warnings and errors so piped results stay clean.
fn init_logging(json_output: bool) {
    if let Some(path) = std::env::var_os("PRIOARITY_LOG_PATH") {
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter(Level::INFO))
                    .with_ansi(false)
                    .with_writer(file)
                    .init();
                return;
            }
            Err(err) => eprintln!("log file unavailable, using stderr: {err}"),
        }
    }

    let level = if json_output { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
