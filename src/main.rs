mod cli;
use cli::{CliMode, USAGE, parse_cli_mode, run_agenda_mode};
mod sample;

fn main() -> anyhow::Result<()> {
    setup_logging();

    let options = match parse_cli_mode() {
        Ok(CliMode::Agenda(options)) => options,
        Ok(CliMode::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if let Err(e) = run_agenda_mode(&options) {
        eprintln!("Error: {}", e);
        tracing::error!("Agenda failed: {}", e);
    }

    Ok(())
}

fn setup_logging() {
    let log_dir = dirs::config_dir()
        .map(|d| d.join("zonecal"))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "zonecal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    std::mem::forget(_guard);

    tracing::info!("zonecal started");
}
