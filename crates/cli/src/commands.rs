use chrono::NaiveDate;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Load every partition from the configured start up to a date
    Backfill {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Dataset name from the config")]
        dataset: String,

        #[arg(long, help = "Last logical date to load (default: today)")]
        until: Option<NaiveDate>,

        #[arg(long, help = "Reload partitions that already completed")]
        force: bool,

        #[arg(long, help = "Overrides schedule.max_concurrency")]
        max_concurrency: Option<usize>,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Load a single source URL into a single table
    Load {
        #[arg(long, help = "Source URL (.csv.gz, .csv or .parquet)")]
        url: String,

        #[arg(long, help = "Destination table, optionally schema-qualified")]
        table: String,

        #[arg(long, help = "Config file path")]
        config: Option<String>,

        #[arg(long, help = "Append to an existing table instead of replacing it")]
        append: bool,

        #[arg(long = "numeric-column", help = "Column coerced to integers; repeatable")]
        numeric_columns: Vec<String>,
    },
    /// Show the source and destination a logical date maps to
    Resolve {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        date: NaiveDate,

        #[arg(long, help = "Config file path")]
        config: Option<String>,
    },
    /// Partition states recorded by earlier runs
    Status {
        #[arg(long)]
        dataset: String,

        #[arg(long, help = "Config file path")]
        config: Option<String>,

        #[arg(
            long,
            help = "If set, prints the status as JSON instead of a table"
        )]
        json: bool,
    },
    /// Check that the sink is reachable
    TestConn {
        #[arg(long, help = "Config file path")]
        config: Option<String>,

        /// Postgres connection string; overrides the config
        #[arg(long)]
        url: Option<String>,
    },
}
