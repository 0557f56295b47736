use anyhow::Result;
use clap::Parser;
use rusqlite::Connection;

use solodex::cli::args::{Cli, Commands};
use solodex::cli::context::RunContext;
use solodex::{commands, db};

fn main() -> Result<()> {
    setup_broken_pipe_handling();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = RunContext::from_args(cli.json, cli.no_color);
    let conn = get_connection(cli.db.as_deref())?;

    match &cli.command {
        Commands::Collect {
            seasons,
            no_fallback,
            dry_run,
            force_refresh,
            config,
        } => {
            commands::collect::run(
                &conn,
                seasons,
                *no_fallback,
                *dry_run,
                *force_refresh,
                config.as_deref(),
                ctx.output_mode,
            )?;
        }

        Commands::Videos {
            seasons,
            transcripts,
            main_only,
            limit,
        } => {
            commands::videos::list(
                &conn,
                seasons.as_deref(),
                *transcripts,
                *main_only,
                *limit,
                ctx.output_mode,
            )?;
        }

        Commands::Show {
            video_id,
            transcript,
        } => {
            commands::videos::show(&conn, video_id, *transcript, ctx.output_mode)?;
        }

        Commands::Jobs { limit, status } => {
            commands::jobs::list(&conn, *limit, *status, ctx.output_mode)?;
        }

        Commands::Logs { job_id, limit } => {
            commands::jobs::logs(&conn, job_id, *limit, ctx.output_mode)?;
        }

        Commands::Info => {
            let db_path = cli.db.clone().unwrap_or_else(|| {
                db::connection::default_db_path().expect("Failed to get default db path")
            });
            commands::info::run(&conn, &db_path, ctx.output_mode)?;
        }
    }

    Ok(())
}

/// Initialize logging based on the `--verbose` flag or `SOLODEX_LOG` env var.
///
/// - `SOLODEX_LOG` env var: full filter control (e.g. `SOLODEX_LOG=solodex::api=trace`)
/// - `--verbose`: sets `solodex` crate to `Debug` level
/// - Otherwise: `Warn` level only (effectively silent)
fn init_logging(verbose: bool) {
    let env_var = std::env::var("SOLODEX_LOG").ok();

    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Some(ref filter) = env_var {
        builder.parse_filters(filter);
    } else if verbose {
        builder.filter_module("solodex", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}

/// Handle broken pipe gracefully instead of panicking.
///
/// When output is piped to a process that exits early (e.g., `solodex videos --json | head -1`),
/// Rust's `println!` panics because the runtime sets SIGPIPE to SIG_IGN. This function:
/// - On Unix: resets SIGPIPE to default behavior so the OS terminates the process cleanly
/// - On all platforms: installs a panic hook that exits silently on stdout pipe failures,
///   as a fallback (and the primary handler on Windows where there's no SIGPIPE)
fn setup_broken_pipe_handling() {
    #[cfg(unix)]
    unsafe {
        // SIGPIPE = 13, SIG_DFL = 0 (POSIX constants, stable across all Unix platforms)
        unsafe extern "C" {
            fn signal(sig: i32, handler: usize) -> usize;
        }
        signal(13, 0);
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("");

        if msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

/// Get a database connection, optionally at a specific path
fn get_connection(db_path: Option<&std::path::Path>) -> Result<Connection> {
    match db_path {
        Some(path) => db::connection::open_db_at_path(path),
        None => db::connection::open_or_create_db(),
    }
}
