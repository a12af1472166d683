//! vimode - a vi command interpreter
//!
//! This is the main entry point. It parses CLI arguments and delegates
//! to the appropriate mode runner (script or terminal).

use tracing_subscriber::EnvFilter;
use vimode::{cli, config, run, user_config};

/// Log to stderr. The terminal frontend owns the screen, so it stays quiet
/// unless RUST_LOG asks otherwise.
fn init_logging(mode: run::EditorMode) {
    let default = match mode {
        run::EditorMode::Script => "warn",
        run::EditorMode::Terminal => "off",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let cli = cli::Cli::parse()?;

    // Load configuration
    let mut config = config::Config::default();
    user_config::configure(&mut config);

    // Apply CLI overrides
    cli.apply_to_config(&mut config);

    let mode = run::detect_mode(cli.has_script(), &cli.files)?;
    init_logging(mode);

    match mode {
        run::EditorMode::Script => run::run_script_mode(&cli, &config)?,
        run::EditorMode::Terminal => {
            let path = cli.files.first().ok_or("No file given")?;
            run::run_terminal_mode(path, &config)?;
        }
    }

    Ok(())
}
