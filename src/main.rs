use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use flight_desk::adapters::notify::LogNotifier;
use flight_desk::app::ReservationPage;
use flight_desk::config::cli::{Command, OutputFormat};
use flight_desk::core::filter::DateRange;
use flight_desk::core::page_window::{PageItem, PageState};
use flight_desk::core::recommendations::Recommendation;
use flight_desk::core::stats::DashboardStats;
use flight_desk::domain::model::Reservation;
use flight_desk::utils::error::ErrorSeverity;
use flight_desk::utils::logger::{self, LogFormat};
use flight_desk::utils::validation::Field;
use flight_desk::{CliConfig, Desk, DeskConfig, DeskError, ResilientPoller};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, cli.verbose);

    tracing::info!("Starting flight-desk");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli.command);
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<DeskError>() {
            Some(desk_error) => {
                tracing::error!(
                    "❌ {} (Kind: {:?}, Severity: {:?})",
                    desk_error,
                    desk_error.failure_kind(),
                    desk_error.severity()
                );
                eprintln!("❌ {}", desk_error.user_friendly_message());
                eprintln!("💡 Suggestion: {}", desk_error.recovery_suggestion());

                let exit_code = match desk_error.severity() {
                    ErrorSeverity::Low => 4,
                    ErrorSeverity::Medium => 2,
                    ErrorSeverity::High => 1,
                    ErrorSeverity::Critical => 3,
                };
                std::process::exit(exit_code);
            }
            None => {
                tracing::error!("❌ {:#}", e);
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    cli.apply_overrides(&mut config);

    let desk = Desk::from_config(&config, Arc::new(LogNotifier::new(true)))?;
    tracing::info!(
        "Signed in as {} ({:?})",
        desk.session().email,
        desk.session().role
    );

    match &cli.command {
        Command::List {
            paging,
            dates,
            format,
            output,
        } => {
            let page = desk.list(dates.range()?, paging.page).await?;
            let rendered = render_page(&page, *format)?;
            match output {
                Some(path) => {
                    Field::input("--output").not_blank(path)?;
                    std::fs::write(path, rendered).map_err(DeskError::IoError)?;
                    println!("📁 Output saved to: {}", path);
                }
                None => print!("{rendered}"),
            }
        }
        Command::Watch { paging, dates } => watch(&desk, paging.page, dates.range()?).await?,
        Command::Stats { watch: false } => print_stats(&desk.stats().await?),
        Command::Stats { watch: true } => {
            let poller = desk.poller(None);
            follow(&poller, |reservations| {
                println!();
                print_stats(&DashboardStats::from_reservations(reservations, Utc::now()));
                Ok(())
            })
            .await?;
        }
        Command::Recommend { id, json } => {
            let (reservation, advice) = desk.recommend(id).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&advice)?);
            } else {
                print_recommendations(&reservation, &advice);
            }
        }
        Command::Create { .. } => {
            let reservation = cli
                .new_reservation()
                .context("create command without reservation fields")?;
            desk.create(&reservation).await?;
            println!("✅ Reservation for flight {} created", reservation.flight_number);
        }
        Command::Seed { users } => {
            let result = desk.seed(*users).await?;
            tracing::debug!("Seed result: {}", result);
            println!("✅ Seed request completed");
        }
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> anyhow::Result<DeskConfig> {
    if cli.is_default_config_path() && !Path::new(&cli.config).exists() {
        tracing::debug!("No {} found, using defaults and flags", cli.config);
        return Ok(DeskConfig::default());
    }

    tracing::info!("📁 Loading configuration from: {}", cli.config);
    DeskConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config file '{}'", cli.config))
}

async fn watch(desk: &Desk, page: usize, range: Option<DateRange>) -> anyhow::Result<()> {
    let poller = desk.poller(range);
    let mut state = PageState::new(desk.page_size());
    let mut first = true;

    follow(&poller, |reservations| {
        // keep the page the user asked for until the list can't hold it
        state.set_total_items(reservations.len());
        if first {
            state.go_to(page);
            first = false;
        }
        let view = ReservationPage {
            items: state.slice(reservations).to_vec(),
            state: state.clone(),
        };
        print!("{}", render_page(&view, OutputFormat::Table)?);
        Ok(())
    })
    .await?;
    Ok(())
}

/// Starts the poller and renders every fresh snapshot until Ctrl-C.
async fn follow<F>(poller: &ResilientPoller, mut render: F) -> anyhow::Result<()>
where
    F: FnMut(&[Reservation]) -> anyhow::Result<()>,
{
    let mut updates = poller.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    poller.start();
    tracing::info!(
        "🔄 Refreshing every {:?} (Ctrl-C to stop)",
        poller.config().refresh_interval
    );

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(reservations) = snapshot {
                    if let Err(e) = render(&reservations) {
                        break Err(e);
                    }
                    if let Err(e) = std::io::stdout().flush() {
                        break Err(e.into());
                    }
                }
            }
        }
    };

    poller.stop();
    tracing::info!("Stopped watching");
    result
}

fn print_stats(stats: &DashboardStats) {
    println!("Active reservations: {}", stats.active_reservations);
    println!("Total passengers:    {}", stats.total_passengers);
    println!("Pending operations:  {}", stats.pending_operations);
}

fn render_page(page: &ReservationPage, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(page)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&page.items)?)),
        OutputFormat::Csv => render_csv(&page.items),
    }
}

fn render_table(page: &ReservationPage) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:<10} {:<17} {:<17} {:<10} {:>5}\n",
        "ID", "FLIGHT", "DEPARTURE", "ARRIVAL", "STATUS", "PAX"
    ));
    for r in &page.items {
        out.push_str(&format!(
            "{:<24} {:<10} {:<17} {:<17} {:<10} {:>5}\n",
            r.id,
            r.flight_number,
            r.departure_date.format("%d.%m.%Y %H:%M"),
            r.arrival_date.format("%d.%m.%Y %H:%M"),
            r.status,
            r.passenger_count()
        ));
    }

    let controls: Vec<String> = page
        .state
        .window()
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == page.state.current_page() => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Gap => "...".to_string(),
        })
        .collect();
    if !controls.is_empty() {
        out.push_str(&format!("\n  {}\n", controls.join(" ")));
    }
    out.push_str(&format!("  {}\n", page.state.summary()));
    out
}

fn render_csv(reservations: &[Reservation]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id",
            "flightNumber",
            "departureDate",
            "arrivalDate",
            "status",
            "passengers",
        ])
        .map_err(DeskError::CsvError)?;

    for r in reservations {
        let passengers = r
            .passengers
            .iter()
            .map(|p| format!("{} <{}>", p.name, p.email))
            .collect::<Vec<_>>()
            .join("; ");
        writer
            .write_record([
                r.id.clone(),
                r.flight_number.clone(),
                r.departure_date.to_rfc3339(),
                r.arrival_date.to_rfc3339(),
                r.status.to_string(),
                passengers,
            ])
            .map_err(DeskError::CsvError)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DeskError::IoError(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn print_recommendations(reservation: &Reservation, advice: &[Recommendation]) {
    println!("AI recommendations for flight {}", reservation.flight_number);
    for rec in advice {
        println!();
        println!("■ {} [{:?}]", rec.title(), rec.kind.category());
        println!("  {}", rec.content);
    }
}
