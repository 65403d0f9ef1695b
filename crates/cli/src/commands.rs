use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Sync every configured target once
    Run {
        #[arg(
            long,
            help = "Config file path (defaults to ~/.gsc-sync/config.json)"
        )]
        config: Option<String>,

        #[arg(long, help = "Additional .env file with variables for the config")]
        env_file: Option<String>,

        #[arg(long, help = "Print the run report as JSON instead of a table")]
        json: bool,

        #[arg(
            long,
            help = "If specified, also writes the JSON report to this file"
        )]
        output: Option<String>,
    },
    /// Load and validate the config without touching the API or the sink
    Validate {
        #[arg(long, help = "Config file path")]
        config: Option<String>,

        #[arg(long, help = "Additional .env file with variables for the config")]
        env_file: Option<String>,
    },
}
