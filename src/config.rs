use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Multi-source job search aggregator")]
pub struct Config {
    /// Postgres URL for the result cache (in-memory cache when unset)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// RapidAPI key for the JSearch provider
    #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub rapidapi_key: Option<String>,

    /// Jooble API key
    #[arg(long, env = "JOOBLE_API_KEY", hide_env_values = true)]
    pub jooble_api_key: Option<String>,

    /// Adzuna application id
    #[arg(long, env = "ADZUNA_APP_ID", hide_env_values = true)]
    pub adzuna_app_id: Option<String>,

    /// Adzuna application key
    #[arg(long, env = "ADZUNA_APP_KEY", hide_env_values = true)]
    pub adzuna_app_key: Option<String>,

    /// Delay between scraper requests, in milliseconds
    #[arg(long, env = "SCRAPE_DELAY_MS", default_value = "1000")]
    pub scrape_delay_ms: u64,

    /// Result pages fetched per scraped site
    #[arg(long, env = "PAGES_PER_SITE", default_value = "1")]
    pub pages_per_site: u32,

    /// Probe apply links with a HEAD request before returning them
    #[arg(long, env = "CHECK_APPLY_URLS", default_value = "false")]
    pub check_apply_urls: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run a single aggregation and print the result as JSON
    Search {
        /// Search keywords
        #[arg(long, default_value = crate::pipeline::DEFAULT_QUERY)]
        query: String,

        /// Scrape only this site (see `sources`)
        #[arg(long)]
        site: Option<String>,

        /// Ignore the cached snapshot
        #[arg(long)]
        nocache: bool,
    },
    /// List the configured scraper sites
    Sources,
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }
}
