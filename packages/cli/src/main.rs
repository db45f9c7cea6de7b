#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal snapshot of the sanitation dashboard.
//!
//! ```text
//! swachh_monitor_cli --base-url http://localhost:8000
//! swachh_monitor_cli --district 4 --range last30_days
//! swachh_monitor_cli --district 4 --block 17 --domain inspections
//! swachh_monitor_cli --start 2025-01-01 --end 2025-01-31
//! ```
//!
//! The scope is derived from the ids given: no ids mean the statewide
//! view, `--district` narrows to one district, `--block` to one block,
//! `--gp` to one GP. A bearer token is read from the
//! `SWACHH_API_TOKEN` environment variable when set.

use chrono::NaiveDate;
use clap::Parser;
use swachh_monitor_analytics::HttpAnalyticsApi;
use swachh_monitor_analytics_models::AnalyticsDomain;
use swachh_monitor_dashboard::{DashboardScreen, SectionState};
use swachh_monitor_dates::{DateRange, PredefinedRange, count_working_days};
use swachh_monitor_geography::{GeoCache, HttpGeographyApi};
use swachh_monitor_geography_models::{GeoId, GeoLevel, GeographyNode};
use swachh_monitor_scope::Scope;

#[derive(Parser)]
#[command(
    name = "swachh_monitor_cli",
    about = "Render a sanitation dashboard snapshot in the terminal"
)]
struct Cli {
    /// Base URL of the monitoring backend
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// District id to narrow the scope to
    #[arg(long)]
    district: Option<GeoId>,

    /// Block id to narrow the scope to (requires --district)
    #[arg(long)]
    block: Option<GeoId>,

    /// GP id to narrow the scope to (requires --district and --block)
    #[arg(long)]
    gp: Option<GeoId>,

    /// Predefined range: today, yesterday, last7_days, last15_days,
    /// last30_days
    #[arg(long, default_value = "today")]
    range: String,

    /// Custom range start (YYYY-MM-DD); overrides --range with --end
    #[arg(long)]
    start: Option<String>,

    /// Custom range end (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Analytics domain: attendance, inspections, complaints
    #[arg(long, default_value = "attendance")]
    domain: String,
}

impl Cli {
    /// Scope implied by the ids given on the command line.
    const fn scope(&self) -> Scope {
        match (self.district, self.block, self.gp) {
            (None, _, _) => Scope::State,
            (Some(_), None, _) => Scope::Districts,
            (Some(_), Some(_), None) => Scope::Blocks,
            (Some(_), Some(_), Some(_)) => Scope::Gps,
        }
    }

    /// Resolves the date range from the flags.
    fn resolve_range(&self, today: NaiveDate) -> Result<DateRange, String> {
        if let (Some(start), Some(end)) = (self.start.as_deref(), self.end.as_deref()) {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            return Ok(DateRange::custom(start, end));
        }

        let predefined: PredefinedRange = self
            .range
            .parse()
            .map_err(|_| format!("unknown range '{}'", self.range))?;

        predefined
            .resolve(today)
            .ok_or_else(|| "custom range needs --start and --end".to_owned())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}': {e}. Expected format: YYYY-MM-DD"))
}

/// Finds a node by id in a fetched list.
fn find_node(list: &[GeographyNode], id: GeoId, what: &str) -> Result<GeographyNode, String> {
    list.iter()
        .find(|node| node.id == id)
        .cloned()
        .ok_or_else(|| format!("{what} {id} not found"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let today = chrono::Local::now().date_naive();
    let token = std::env::var("SWACHH_API_TOKEN").ok();

    let domain: AnalyticsDomain = cli
        .domain
        .parse()
        .map_err(|_| format!("unknown domain '{}'", cli.domain))?;

    let geography = HttpGeographyApi::new(&cli.base_url, token.as_deref())?;
    let analytics = HttpAnalyticsApi::new(&cli.base_url, token.as_deref())?;
    let cache = GeoCache::new(geography);

    let mut screen = DashboardScreen::new(today);
    screen.mount(&cache).await;

    if let SectionState::Error(message) = &screen.districts {
        log::warn!("District list unavailable: {message}");
    }

    // Narrow the scope to the requested unit, committing level by
    // level so the committed path stays consistent.
    screen.change_scope(cli.scope(), today, &cache);

    if let Some(district_id) = cli.district {
        let districts = cache.ensure_districts().await;
        let district = find_node(&districts, district_id, "district")?;
        screen.state.commit(GeoLevel::District, &district);

        if let Some(block_id) = cli.block {
            let blocks = cache.ensure_blocks(Some(district_id)).await;
            let block = find_node(&blocks, block_id, "block")?;
            screen.state.commit(GeoLevel::Block, &block);

            if let Some(gp_id) = cli.gp {
                let gps = cache.ensure_gps(Some(district_id), Some(block_id)).await;
                let gp = find_node(&gps, gp_id, "GP")?;
                screen.state.commit(GeoLevel::Gp, &gp);
            }
        }
    }

    screen.state.set_range(cli.resolve_range(today)?);
    screen.refresh(&analytics, domain, today).await;

    print_snapshot(&screen, domain);
    Ok(())
}

fn print_snapshot(screen: &DashboardScreen, domain: AnalyticsDomain) {
    let range = screen.state.range();
    let working_days = count_working_days(range.start, range.end);

    println!("Swachh Monitor");
    println!();
    println!(
        "Location: {} ({})",
        screen.state.selection().label(),
        screen.state.selection().scope()
    );
    println!(
        "Range:    {} [{} to {}], {working_days} working days",
        range.label,
        range.start_iso(),
        range.end_iso()
    );
    println!("Domain:   {domain}");
    println!();

    match &screen.overview.summary {
        SectionState::Ready(totals) => {
            println!("{:<20} {:>10}", "Present", totals.present);
            println!("{:<20} {:>10}", "Absent", totals.absent);
            println!("{:<20} {:>10}", "Total contractors", totals.total_contractors);
            println!(
                "{:<20} {:>9.1}%",
                "Average rate",
                totals.average_rate * 100.0
            );
        }
        SectionState::Error(message) => println!("Summary unavailable: {message}"),
        SectionState::Loading | SectionState::Empty => println!("No summary data"),
    }
    println!();

    println!("Top performers");
    match &screen.overview.ranking {
        SectionState::Ready(entries) => {
            println!("{:<6} {:<28} {:>6}", "RANK", "NAME", "SCORE");
            for entry in entries {
                println!("{:<6} {:<28} {:>6.0}", entry.rank, entry.name, entry.score);
            }
        }
        SectionState::Error(message) => println!("Ranking unavailable: {message}"),
        SectionState::Loading | SectionState::Empty => println!("No data available"),
    }
    println!();

    println!("Attendance history");
    match &screen.overview.history {
        SectionState::Ready(groups) => {
            println!(
                "{:<28} {:>8} {:>8} {:>8}",
                "NAME", "PRESENT", "ABSENT", "RATE"
            );
            for group in groups {
                println!(
                    "{:<28} {:>8} {:>8} {:>7.1}%",
                    group.name, group.totals.present, group.totals.absent, group.average_rate
                );
            }
        }
        SectionState::Error(message) => println!("History unavailable: {message}"),
        SectionState::Loading | SectionState::Empty => println!("No data available"),
    }
}
