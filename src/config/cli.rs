use crate::config::toml_config::{DeskConfig, DEFAULT_CONFIG_PATH};
use crate::core::filter::DateRange;
use crate::domain::model::{NewPassenger, NewReservation, Role, Session};
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "flight-desk")]
#[command(about = "View, filter, watch and create flight reservations")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override api.base_url
    #[arg(long)]
    pub base_url: Option<String>,

    /// Use a fixed bearer token instead of the [auth] section
    #[arg(long)]
    pub token: Option<String>,

    /// Signed-in user's email
    #[arg(long)]
    pub email: Option<String>,

    /// Signed-in user's role (admin or staff)
    #[arg(long)]
    pub role: Option<Role>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print one page of reservations
    List {
        #[command(flatten)]
        paging: PageArgs,

        #[command(flatten)]
        dates: DateArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Keep the list fresh and reprint it on every refresh until Ctrl-C
    Watch {
        #[command(flatten)]
        paging: PageArgs,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Dashboard counters
    Stats {
        /// Recompute on every refresh until Ctrl-C
        #[arg(long)]
        watch: bool,
    },

    /// Rule-based advice for one reservation
    Recommend {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Create a reservation
    Create {
        #[arg(long)]
        flight: String,

        /// RFC 3339 instant, e.g. 2025-07-01T09:00:00Z
        #[arg(long)]
        departure: DateTime<Utc>,

        #[arg(long)]
        arrival: DateTime<Utc>,

        /// Repeatable: "Name <email>"
        #[arg(long = "passenger", required = true)]
        passengers: Vec<NewPassenger>,
    },

    /// Generate sample data on the server
    Seed {
        /// Seed test users instead of reservations
        #[arg(long)]
        users: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Override pagination.page_size
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct DateArgs {
    /// First departure day (YYYY-MM-DD), inclusive
    #[arg(long, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last departure day (YYYY-MM-DD), inclusive
    #[arg(long, requires = "start_date")]
    pub end_date: Option<NaiveDate>,
}

impl DateArgs {
    pub fn range(&self) -> Result<Option<DateRange>> {
        DateRange::from_optional(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl CliConfig {
    pub fn is_default_config_path(&self) -> bool {
        self.config == DEFAULT_CONFIG_PATH
    }

    /// Command-line values win over the file.
    pub fn apply_overrides(&self, config: &mut DeskConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }

        if let Some(token) = &self.token {
            config.auth.token = Some(token.clone());
            config.auth.token_url = None;
            config.auth.refresh_token = None;
        }

        if let Some(email) = &self.email {
            let role = self
                .role
                .or_else(|| config.session.as_ref().map(|s| s.role))
                .unwrap_or_default();
            config.session = Some(Session::new(email.clone(), role));
        } else if let (Some(role), Some(session)) = (self.role, config.session.as_mut()) {
            session.role = role;
        }

        if let Command::List { paging, .. } | Command::Watch { paging, .. } = &self.command {
            if let Some(size) = paging.page_size {
                config.pagination.page_size = Some(size);
            }
        }
    }

    pub fn new_reservation(&self) -> Option<NewReservation> {
        match &self.command {
            Command::Create {
                flight,
                departure,
                arrival,
                passengers,
            } => Some(NewReservation {
                flight_number: flight.trim().to_string(),
                departure_date: *departure,
                arrival_date: *arrival,
                passengers: passengers.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_with_dates() {
        let cli = CliConfig::try_parse_from([
            "flight-desk",
            "--role",
            "admin",
            "--email",
            "admin@example.com",
            "list",
            "--page",
            "2",
            "--start-date",
            "2025-03-01",
            "--end-date",
            "2025-03-31",
            "--format",
            "csv",
        ])
        .unwrap();

        match &cli.command {
            Command::List {
                paging,
                dates,
                format,
                ..
            } => {
                assert_eq!(paging.page, 2);
                assert_eq!(*format, OutputFormat::Csv);
                assert!(dates.range().unwrap().is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let mut config = DeskConfig::default();
        cli.apply_overrides(&mut config);
        let session = config.session().unwrap();
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.email, "admin@example.com");
    }

    #[test]
    fn test_half_date_range_is_rejected_by_clap() {
        let result =
            CliConfig::try_parse_from(["flight-desk", "list", "--start-date", "2025-03-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_override_replaces_refresh_flow() {
        let cli = CliConfig::try_parse_from(["flight-desk", "--token", "cli-token", "stats"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { watch: false }));
        let mut config = DeskConfig::from_toml_str(
            "[auth]\ntoken_url = \"https://id.example.com/token\"\nrefresh_token = \"r\"\n",
        )
        .unwrap();

        cli.apply_overrides(&mut config);
        assert_eq!(config.auth.token.as_deref(), Some("cli-token"));
        assert!(config.auth.token_url.is_none());
    }

    #[test]
    fn test_parse_create() {
        let cli = CliConfig::try_parse_from([
            "flight-desk",
            "create",
            "--flight",
            "TK1923",
            "--departure",
            "2025-07-01T09:00:00Z",
            "--arrival",
            "2025-07-01T11:30:00Z",
            "--passenger",
            "Ayse Yilmaz <ayse@example.com>",
            "--passenger",
            "Mehmet Demir <mehmet@example.com>",
        ])
        .unwrap();

        let reservation = cli.new_reservation().unwrap();
        assert_eq!(reservation.flight_number, "TK1923");
        assert_eq!(reservation.passengers.len(), 2);
        assert_eq!(reservation.passengers[1].email, "mehmet@example.com");
    }

    #[test]
    fn test_parse_stats_watch() {
        let cli = CliConfig::try_parse_from(["flight-desk", "stats", "--watch"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { watch: true }));
    }
}
