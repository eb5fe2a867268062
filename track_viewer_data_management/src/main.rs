use std::path::PathBuf;

use clap::{Parser, Subcommand};
use track_viewer_data_management::{DataManager, queries::{DEFAULT_HEATMAP_PRECISION, TrackFilter}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "TrackCLI")]
#[command(about = "A CLI to inspect the tracks of a GPX folder", long_about = None)]
struct Cli {
    /// Folder containing the GPX files
    folder: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every loaded track
    List,
    /// Show the statistics of a track
    Show { track_id: String },
    /// List the activities present
    Activities,
    /// List the months with tracks, by year
    Months,
    /// Print the heatmap cells for the given filter
    Heatmap {
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        day: Option<u32>,
        #[arg(long, default_value_t = DEFAULT_HEATMAP_PRECISION)]
        precision: u32,
    },
}

// CLI for inspecting a track folder without starting the server
fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_manager = match DataManager::load(&cli.folder) {
        Ok(data_manager) => data_manager,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match &cli.command {
        Commands::List => {
            for (id, track) in data_manager.collection().all() {
                let start = track.start_time.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{:.2} km\t{}", id, start, track.length_2d / 1000., track.activity.as_deref().unwrap_or("-"));
            }
        },
        Commands::Show { track_id } => {
            let track = match data_manager.get_track(track_id) {
                Ok(track) => track,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            };
            println!("{}", track.name);
            println!("Activity:\t{}", track.activity.as_deref().unwrap_or("-"));
            println!("Points:\t\t{}", track.points.len());
            println!("Start:\t\t{}", track.start_time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()));
            println!("End:\t\t{}", track.end_time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()));
            println!("Length:\t\t{:.0} m (3D {:.0} m)", track.length_2d, track.length_3d);
            println!("Climb:\t\t+{:.0} m / -{:.0} m", track.uphill, track.downhill);
            println!("Moving:\t\t{:.0} s over {:.0} m", track.moving_time, track.moving_distance);
            println!("Stopped:\t{:.0} s over {:.0} m", track.stopped_time, track.stopped_distance);
            println!("Max speed:\t{:.2} m/s", track.max_speed);
        },
        Commands::Activities => {
            for activity in data_manager.activities() {
                println!("{activity}");
            }
        },
        Commands::Months => {
            for (year, months) in data_manager.monthly_buckets() {
                let months: Vec<String> = months.iter().map(|month| format!("{month:02}")).collect();
                println!("{year}\t{}", months.join(" "));
            }
        },
        Commands::Heatmap { activity, year, month, day, precision } => {
            let grid = TrackFilter::new(activity.clone(), *year, *month, *day)
                .and_then(|filter| data_manager.heatmap_grid(&filter, *precision));

            match grid {
                Ok(Some(grid)) => {
                    println!("Bounds: {:?} - {:?}", grid.min_bound, grid.max_bound);
                    for cell in grid.cells {
                        println!("{}\t{}\t{}", cell.lat, cell.lng, cell.count);
                    }
                },
                Ok(None) => println!("No points"),
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        },
    }
}
