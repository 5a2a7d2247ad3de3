mod args;

use anyhow::{Context, Result};
use args::Args;
use mailbox_archiver::archiver;
use mailbox_archiver::events::{Event, Events, LogSubscriber, StatusSubscriber};
use mailbox_archiver::settings::Settings;
use mailbox_archiver::store::FsStore;
use std::fs::File;
use std::process;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse_args();
    let guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let result = do_main(&args);
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
    }
    // Flush the log before exiting.
    drop(guard);
    if result.is_err() {
        process::exit(1);
    }
}

fn init_logging(args: &Args) -> Result<WorkerGuard> {
    let file = File::create(&args.log_file)
        .with_context(|| format!("cannot create log file {}", args.log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer),
        )
        .init();
    Ok(guard)
}

fn do_main(args: &Args) -> Result<()> {
    let mut settings = Settings::load(&args.settings)
        .with_context(|| format!("cannot read settings from {}", args.settings.display()))?;
    if let Some(max_depth) = args.max_depth {
        settings.max_folder_depth = max_depth;
    }
    tracing::info!("Successfully read {}", args.settings.display());
    tracing::info!(
        "Emails sent in the last {} days will be exported, deletion of old emails is {}",
        settings.email_max_age_days,
        if settings.delete_old_emails { "enabled" } else { "disabled" }
    );

    let store = FsStore::open(&args.store)
        .with_context(|| format!("cannot open mail store {}", args.store.display()))?;

    let status = StatusSubscriber::new(args.quiet);
    let progress = status.progress();
    let mut events = Events::new();
    events.subscribe(LogSubscriber);
    events.subscribe(status);

    let result = archiver::run(&store, &settings, &args.output_dir, &events);
    progress.finish_and_clear();
    let summary = result?;

    tracing::info!("--- Summary of email archive activity ---");
    for line in [
        Event::ExportSummary(summary.export).to_string(),
        Event::SweepSummary(summary.sweep).to_string(),
    ]
    .iter()
    {
        tracing::info!("{}", line);
        println!("{}", line);
    }
    Ok(())
}
