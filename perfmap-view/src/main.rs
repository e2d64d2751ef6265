//! perfmap-view - command-line front end for perfmap
//!
//! Renders the province map and the artist bubble field to SVG, prints
//! statistics, the province panel, the month calendar and the timeline, and
//! submits or removes events through the REST API.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use perfmap_common::config::{ClientSettings, TomlConfig};
use perfmap_common::PerformanceInput;
use perfmap_view::aggregation;
use perfmap_view::animation::AnimationLoop;
use perfmap_view::calendar;
use perfmap_view::geometry::Projection;
use perfmap_view::index::ProvinceIndex;
use perfmap_view::layout::BubbleField;
use perfmap_view::loader::PosterFile;
use perfmap_view::render;
use perfmap_view::view_model::ViewModel;
use perfmap_view::ApiClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "perfmap-view", version, about = "Browse and edit performance events")]
struct Cli {
    /// TOML config file
    #[arg(long, env = "PERFMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// API root, e.g. http://localhost:3001/api
    #[arg(long, env = "PERFMAP_API_BASE_URL", global = true)]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the province map as SVG
    Map {
        /// Output file
        #[arg(long, short, default_value = "perfmap.svg")]
        out: PathBuf,

        /// Highlight provinces where this artist performed
        #[arg(long)]
        artist: Option<String>,

        /// GeoJSON province boundaries (overrides the configured URL)
        #[arg(long)]
        map_url: Option<String>,
    },

    /// Print event statistics
    Stats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Also list the events dated in this month (1-12) of any year
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },

    /// Province panel: event types and events grouped by artist
    Province {
        name: String,

        /// Only show events of this type
        #[arg(long = "type")]
        kind: Option<String>,

        /// Ask the server for the exact stored name instead of matching
        /// normalized names locally
        #[arg(long)]
        exact: bool,
    },

    /// List every artist with events
    Artists,

    /// Events by date, most recent first
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the month calendar (defaults to the current month)
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },

    /// Print the 120-day timeline around today
    Timeline,

    /// Events grouped by venue
    Venues,

    /// An artist's events in date order
    Artist { name: String },

    /// Animate the artist bubbles for a while and write the final frame as SVG
    Bubbles {
        #[arg(long, short, default_value = "bubbles.svg")]
        out: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        /// How long to run the animation
        #[arg(long, default_value_t = 2000)]
        duration_ms: u64,
    },

    /// Submit a new event
    Add(EventArgs),

    /// Replace an existing event
    Edit {
        id: i64,
        #[command(flatten)]
        event: EventArgs,
    },

    /// Delete an event
    Delete { id: i64 },
}

#[derive(Debug, Args)]
struct EventArgs {
    #[arg(long)]
    artist: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    province: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    venue: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    /// Poster image (.jpg, .jpeg, .png or .gif)
    #[arg(long)]
    poster: Option<PathBuf>,
}

impl EventArgs {
    fn split(self) -> (PerformanceInput, Option<PathBuf>) {
        let input = PerformanceInput {
            artist: self.artist,
            kind: self.kind,
            province: self.province,
            city: self.city,
            venue: self.venue,
            notes: self.notes,
            date: self.date,
        };
        (input, self.poster)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = TomlConfig::load_or_default(cli.config.as_deref());
    let toml_config = loaded.config.clone();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(toml_config.logging.level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    loaded.log();

    let mut settings = ClientSettings::from_toml(&toml_config);
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    info!("Using API at {}", settings.api_base_url);

    let api = ApiClient::new(&settings.api_base_url)?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Map { out, artist, map_url } => {
            let map_url = map_url.unwrap_or(settings.map_url);
            let (events, map) = tokio::try_join!(api.performances(), api.fetch_map(&map_url))?;

            // build() already logs each merge
            let index = ProvinceIndex::build(&events);
            let projection = Projection::for_collection(&map)
                .context("Map data cannot be projected")?;

            let mut view = ViewModel::new(today);
            view.select_artist(artist);
            let svg = render::render_map(&map, &projection, &index, view.selected_artist());
            tokio::fs::write(&out, svg).await?;
            println!(
                "Wrote {} ({} provinces, {} events)",
                out.display(),
                map.features.len(),
                events.len()
            );
            for merge in index.merges() {
                println!("  merged {} under {}", merge.names.join(", "), merge.key);
            }
        }

        Command::Stats { json, month } => {
            let events = api.performances().await?;
            let summary = aggregation::market_summary(&events);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Total events: {}", summary.total);
                println!("\nBy month:");
                for month in &summary.by_month {
                    println!("  {:<6} {}", month.label, month.count);
                }
                println!("\nTop artists:");
                for entry in &summary.top_artists {
                    println!("  {:<20} {}", entry.label, entry.count);
                }
                println!("\nTop provinces:");
                for entry in &summary.top_provinces {
                    println!("  {:<20} {}", entry.label, entry.count);
                }
            }
            if let Some(month) = month {
                println!("\n{}:", aggregation::month_label(month));
                for event in aggregation::in_month(&events, month) {
                    let date = event.date.map(|d| d.to_string()).unwrap_or_default();
                    println!("  {:<10} {} @ {}", date, event.artist, event.province);
                }
            }
        }

        Command::Province { name, kind, exact } => {
            let events = if exact {
                api.performances_in_province(&name).await?
            } else {
                api.performances().await?
            };

            let mut view = ViewModel::new(today);
            view.select_province(Some(name));
            let province = view.selected_province().unwrap_or_default();
            let in_province = aggregation::in_province(&events, province);
            if in_province.is_empty() {
                println!("No events in {}", province);
                return Ok(());
            }

            let detail = aggregation::province_detail(&in_province, kind.as_deref());
            let types: Vec<String> = detail
                .types
                .iter()
                .map(|entry| format!("{} {}", entry.label, entry.count))
                .collect();
            println!("{} ({} events): {}", province, in_province.len(), types.join(" | "));
            if let Some(kind) = &detail.selected_type {
                println!("Showing {} {} events", detail.shown(), kind);
            }
            for group in &detail.artists {
                println!("\n{}", group.artist);
                for event in &group.events {
                    let date = event.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                    let city = event.city.as_deref().unwrap_or_default();
                    let venue = event.venue.as_deref().unwrap_or(aggregation::UNSET_VENUE);
                    println!("  {:<10} {:<8} {} {}", date, event.kind, city, venue);
                }
            }
        }

        Command::Artists => {
            for artist in api.artists().await? {
                println!("{}", artist);
            }
        }

        Command::Recent { limit } => {
            let events = api.performances().await?;
            for event in calendar::recent(&events).into_iter().take(limit) {
                let date = event.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                println!("{:<10} {} @ {}", date, event.artist, event.province);
            }
        }

        Command::Calendar { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let events = api.performances().await?;
            let Some(grid) = calendar::month_grid(&events, year, month, today) else {
                bail!("Invalid month: {}-{}", year, month);
            };

            println!("{} {}", year, aggregation::month_label(month));
            println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");
            for week in grid.chunks(7) {
                let line: Vec<String> = week
                    .iter()
                    .map(|cell| {
                        let day = if cell.in_month {
                            format!("{:>2}", cell.date.day())
                        } else {
                            "  ".to_string()
                        };
                        let mark = match (cell.is_today, cell.events.len()) {
                            (true, _) => '*',
                            (false, 0) => ' ',
                            (false, _) => '•',
                        };
                        format!(" {}{} ", day, mark)
                    })
                    .collect();
                println!("{}", line.concat());
            }
            for cell in grid.iter().filter(|cell| !cell.events.is_empty()) {
                for event in &cell.events {
                    println!("{}  {} @ {}", cell.date, event.artist, event.province);
                }
            }
        }

        Command::Timeline => {
            let events = api.performances().await?;
            let mut view = ViewModel::new(today);
            for day in view.timeline(&events) {
                if let Some(label) = day.month_label {
                    println!("== {} ==", label);
                }
                if day.is_today || !day.events.is_empty() {
                    let artists: Vec<&str> = day.events.iter().map(|e| e.artist.as_str()).collect();
                    let marker = if day.is_today { " (today)" } else { "" };
                    println!("{}{}  {}", day.date, marker, artists.join(", "));
                }
            }
            println!("Today is at offset {}", view.scroll_to_today());
        }

        Command::Venues => {
            let events = api.performances().await?;
            for group in aggregation::by_venue(&events) {
                println!("{} ({})", group.venue, group.events.len());
                for event in group.events {
                    let date = event.date.map(|d| d.to_string()).unwrap_or_default();
                    println!("  {:<10} {}", date, event.artist);
                }
            }
        }

        Command::Artist { name } => {
            let events = api.performances_by_artist(&name).await?;
            for event in aggregation::for_artist(&events, &name) {
                let date = event.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
                let venue = event.venue.as_deref().unwrap_or(aggregation::UNSET_VENUE);
                println!("{:<10} {} {}", date, event.province, venue);
            }
        }

        Command::Bubbles {
            out,
            width,
            height,
            duration_ms,
        } => {
            let events = api.performances().await?;
            let field = BubbleField::new(&events, width, height, &mut rand::thread_rng());

            let mut animation = AnimationLoop::new(field);
            animation.show();
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            animation.hide();

            let bubbles = animation.snapshot();
            info!("Animated {} frames", animation.frame_count());
            tokio::fs::write(&out, render::render_bubbles(&bubbles, width, height)).await?;
            println!("Wrote {} ({} artists)", out.display(), bubbles.len());
        }

        Command::Add(event) => {
            let (input, poster) = event.split();
            let poster = match poster {
                Some(path) => Some(PosterFile::read(&path).await?),
                None => None,
            };
            let created = api.create(&input, poster).await?;
            println!("Created performance {}", created.id);
        }

        Command::Edit { id, event } => {
            let (input, poster) = event.split();
            let poster = match poster {
                Some(path) => Some(PosterFile::read(&path).await?),
                None => None,
            };
            let updated = api.update(id, &input, poster).await?;
            println!("Updated performance {}", updated.id);
        }

        Command::Delete { id } => {
            api.delete(id).await?;
            println!("Deleted performance {}", id);
        }
    }

    Ok(())
}
