use chrono::{NaiveDate, Utc};
use clap::Parser;
use qibla_numa::config::{Config, LocationMode};
use qibla_numa::ephemeris::{self, EphemerisSource};
use qibla_numa::error::Result;
use qibla_numa::location::LocationResolver;
use qibla_numa::report::{self, Report};
use qibla_numa::schedule::Madhab;
use std::path::PathBuf;

/// Qibla Numa: prayer times, Moon events and sub-points for one place and day
///
/// Location is taken from coordinates, then an address, then IP
/// auto-detection, falling through on failure. Flags override the config
/// file (`<config dir>/qibla-numa/config.json`).
///
/// Examples:
///   qibla-numa Stockholm
///   qibla-numa --city "Medina" --country SA --date 2026-03-20
///   qibla-numa --lat 21.4225 --lon 39.8262 --tz Asia/Riyadh
///   qibla-numa --auto --madhab shafi
///   qibla-numa Delhi --offline --no-ephemeris
#[derive(Parser)]
#[command(name = "qibla-numa", version, about, long_about = None)]
struct Cli {
    /// City name (positional). Example: qibla-numa Stockholm
    #[arg(index = 1)]
    city_positional: Option<String>,

    /// City name (named). Example: --city "New York"
    #[arg(long)]
    city: Option<String>,

    /// State or region, appended to the address.
    #[arg(long)]
    state: Option<String>,

    /// Country name or ISO 3166-1 alpha-2 code (e.g. SA, US, FR).
    #[arg(long)]
    country: Option<String>,

    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// IANA timezone override (e.g. Europe/Oslo).
    #[arg(long)]
    tz: Option<String>,

    /// Allow IP geolocation when nothing else resolves.
    #[arg(long, short = 'a')]
    auto: bool,

    /// Date (YYYY-MM-DD). Defaults to today; snapshots use local noon.
    #[arg(long, short = 'd', value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Juristic method for Asr: "hanafi" or "shafi".
    #[arg(long)]
    madhab: Option<Madhab>,

    /// Sun depression for Fajr, degrees.
    #[arg(long)]
    fajr_angle: Option<f64>,

    /// Sun depression for Isha, degrees.
    #[arg(long)]
    isha_angle: Option<f64>,

    /// Offline mode: only built-in data, no network providers.
    #[arg(long)]
    offline: bool,

    /// Skip the ephemeris; only prayer times are computed.
    #[arg(long)]
    no_ephemeris: bool,

    /// Config file path.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date '{}': {}", s, e))
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        let prayer = &mut config.prayer;
        if let Some(m) = self.madhab {
            prayer.madhab = m;
        }
        if let Some(a) = self.fajr_angle {
            prayer.fajr_angle = a;
        }
        if let Some(a) = self.isha_angle {
            prayer.isha_angle = a;
        }

        let loc = &mut config.location;
        if let Some(city) = self.city.as_ref().or(self.city_positional.as_ref()) {
            // A city on the command line wins over coordinates from the file.
            loc.city = Some(city.clone());
            loc.state = None;
            loc.country = None;
            loc.latitude = None;
            loc.longitude = None;
        }
        if self.state.is_some() {
            loc.state = self.state.clone();
        }
        if self.country.is_some() {
            loc.country = self.country.clone();
        }
        if self.lat.is_some() || self.lon.is_some() {
            loc.latitude = self.lat;
            loc.longitude = self.lon;
        }
        if self.tz.is_some() {
            loc.timezone = self.tz.clone();
        }
        if self.auto {
            loc.mode = LocationMode::Auto;
        }

        config.offline |= self.offline;
        if self.no_ephemeris {
            config.ephemeris = EphemerisSource::Disabled;
        }
    }
}

fn run(cli: &Cli) -> Result<Report> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let mut resolver = LocationResolver::new();
    resolver.set_offline(config.offline);
    let location = resolver.resolve(&config.location)?;
    let observer = location.to_observer()?;
    log::info!("Resolved {} via {}", location.name, location.source);

    let (date, now) = match cli.date {
        Some(date) => (date, observer.local_day(date).noon()),
        None => {
            let now = Utc::now();
            (observer.day_of(now).date, now)
        }
    };

    let oracle = ephemeris::load(config.ephemeris);
    Ok(Report::build(
        &location,
        &observer,
        &config.prayer,
        date,
        now,
        oracle.as_deref(),
    ))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let report = run(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // Human-readable report to stderr
    eprint!("{}", report::render_text(&report));

    // JSON to stdout
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: could not serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
