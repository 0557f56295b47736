use clap::{Parser, Subcommand};

use crate::db::videos::TranscriptFilter;
use crate::models::JobStatus;

fn parse_transcript_filter(s: &str) -> Result<TranscriptFilter, String> {
    TranscriptFilter::parse(s)
        .ok_or_else(|| format!("invalid transcript filter '{}': expected 'only' or 'missing'", s))
}

fn parse_job_status(s: &str) -> Result<JobStatus, String> {
    JobStatus::parse(s).ok_or_else(|| {
        format!(
            "invalid status '{}': expected 'running', 'completed' or 'failed'",
            s
        )
    })
}

#[derive(Parser, Debug)]
#[command(name = "solodex", version = env!("SOLODEX_VERSION"), about = "Collect and query 나는 SOLO episode records")]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use a specific database file instead of the default
    #[arg(long, global = true)]
    pub db: Option<std::path::PathBuf>,

    /// Enable verbose output for debugging upstream calls and store writes
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one collection job: discover, reconcile, store, fetch transcripts
    Collect {
        /// Seasons to collect, comma-separated (e.g. 10,11,12)
        #[arg(long, required = true, value_delimiter = ',')]
        seasons: Vec<u32>,

        /// Do not fall back to general search for seasons without official coverage
        #[arg(long)]
        no_fallback: bool,

        /// Store episode metadata but skip transcript retrieval
        #[arg(long)]
        dry_run: bool,

        /// Re-fetch transcripts even for videos that already have one
        #[arg(long)]
        force_refresh: bool,

        /// Collector configuration file (TOML)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },

    /// List stored episodes
    #[command(visible_alias = "ls")]
    Videos {
        /// Filter by seasons, comma-separated (e.g. 10,11)
        #[arg(long, value_delimiter = ',')]
        seasons: Option<Vec<u32>>,

        /// Filter by transcript state: 'only' (has one) or 'missing'
        #[arg(long, value_parser = parse_transcript_filter)]
        transcripts: Option<TranscriptFilter>,

        /// Only main-series episodes (exclude spin-offs and unclassified)
        #[arg(long)]
        main_only: bool,

        /// Maximum number of rows (0 = no limit)
        #[arg(long, default_value = "0")]
        limit: usize,
    },

    /// Show one episode record
    Show {
        /// Video id
        video_id: String,

        /// Output only the transcript text
        #[arg(long)]
        transcript: bool,
    },

    /// List recent collection jobs
    Jobs {
        /// Maximum number of jobs
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Filter by status: running, completed or failed
        #[arg(long, value_parser = parse_job_status)]
        status: Option<JobStatus>,
    },

    /// Show the log of one collection job
    Logs {
        /// Job id
        job_id: String,

        /// Maximum number of lines
        #[arg(long, default_value = "200")]
        limit: usize,
    },

    /// Show database statistics
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_parses_comma_separated_seasons() {
        let cli = Cli::try_parse_from(["solodex", "collect", "--seasons", "10,11,12"]).unwrap();
        match cli.command {
            Commands::Collect { seasons, .. } => assert_eq!(seasons, vec![10, 11, 12]),
            _ => panic!("expected collect"),
        }
    }

    #[test]
    fn collect_requires_seasons() {
        assert!(Cli::try_parse_from(["solodex", "collect"]).is_err());
        assert!(Cli::try_parse_from(["solodex", "collect", "--seasons", "ten"]).is_err());
    }

    #[test]
    fn transcript_filter_values() {
        assert!(parse_transcript_filter("only").is_ok());
        assert!(parse_transcript_filter("missing").is_ok());
        assert!(parse_transcript_filter("both").is_err());
    }

    #[test]
    fn job_status_values() {
        assert!(parse_job_status("running").is_ok());
        assert!(parse_job_status("done").is_err());
    }
}
