use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "zombie")]
#[command(about = "Run browser automation scripts built from chained actions")]
#[command(version)]
struct Cli {
    /// Script file to run
    script: PathBuf,

    /// Run in headless mode (overrides script)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Per-step timeout in seconds (overrides script)
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate script without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> zombie_tools::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let params = zombie_tools::Params::from_args(&cli.params)?;
    let mut script = zombie_tools::Script::load_with_params(&cli.script, &params)?;

    if let Some(timeout) = cli.timeout {
        if !(timeout > 0.0 && timeout.is_finite()) {
            return Err(zombie_tools::Error::Config(
                "--timeout must be a positive number".into(),
            ));
        }
        script.session.timeout_in_seconds = timeout;
    }

    if cli.check {
        println!("Script valid: {}", script.name);
        println!("  Session: {}", script.session.name);
        println!("  Timeout: {}s", script.session.timeout_in_seconds);
        println!("  Steps: {}", script.steps.len());
        for (i, step) in script.steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step.name());
        }
        if !script.params.is_empty() {
            println!("  Parameters: {}", script.params.len());
            for (name, def) in &script.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        if let Some(retry) = script.on_failure.as_ref().and_then(|f| f.retry.as_ref()) {
            println!("  Retry attempts: {}", retry.attempts);
        }
        return Ok(());
    }

    if cli.headless {
        script.session.headless = true;
    }

    println!("Running: {}", script.name);

    let runner = zombie_tools::Runner::launch(&script.session).await?;
    let result = runner.run(&script).await?;

    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    println!("  Steps: {}/{}", result.steps_executed, script.steps.len());
    println!("  Duration: {}ms", result.duration_ms);
    if result.retries > 0 {
        println!("  Retries: {}", result.retries);
    }

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
