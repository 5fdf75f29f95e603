//! Read a saved run-map screenshot from the command line.
//! Usage: cargo run --bin read_map -- --data-dir ./data categories map.png

use clap::{Parser, Subcommand};
use map_reader_lib::commands::{
    self, CategoriesRequest, DiamondFileRequest, IconPointRequest, IconsRequest, PointRequest,
};
use map_reader_lib::{init_tracing, MapReader, ReaderConfig, RequestError};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON reader config; defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the config's data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Palette hex at a reference point
    Color { image: String, x: f64, y: f64 },
    /// Whether the pixel at a reference point is a minion marker
    Minion { image: String, x: f64, y: f64 },
    /// Category of every island
    Categories {
        image: String,
        /// JSON file holding a list of {"bgX", "bgY"} centers
        #[arg(long)]
        centers: Option<PathBuf>,
    },
    /// Circular crop matched against the templates
    Circle { image: String, x: f64, y: f64 },
    /// Diamond crop matched against the templates
    Diamond { image: String, x: f64, y: f64 },
    /// Small diamond crop as base64 PNG
    SmallDiamond { image: String, x: f64, y: f64 },
    /// Write a diamond crop to a PNG file
    DiamondFile {
        image: String,
        x: f64,
        y: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Connector arrows on both diagonals
    Arrows { image: String },
    /// Icons of every node, given 25 comma-separated categories
    Icons {
        image: String,
        #[arg(value_delimiter = ',')]
        categories: Vec<String>,
    },
    /// Decision icon labels and scores, given 25 comma-separated categories
    IconLabels {
        image: String,
        #[arg(value_delimiter = ',')]
        categories: Vec<String>,
    },
    /// Best shifted icon match around a reference point
    IconAt {
        image: String,
        x: f64,
        y: f64,
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Cache occupancy after warming it with the given images
    Status { images: Vec<String> },
}

fn point(image: String, x: f64, y: f64) -> PointRequest {
    PointRequest {
        image_url: Some(image),
        x: Some(x),
        y: Some(y),
    }
}

async fn dispatch(reader: &MapReader, command: Command) -> Result<serde_json::Value, RequestError> {
    match command {
        Command::Color { image, x, y } => commands::extract_color(reader, &point(image, x, y)),
        Command::Minion { image, x, y } => commands::check_minion(reader, &point(image, x, y)),
        Command::Categories { image, centers } => {
            let island_centers = match centers {
                Some(path) => {
                    let content = std::fs::read_to_string(&path).map_err(|e| {
                        RequestError::malformed(format!("Failed to read {}: {}", path.display(), e))
                    })?;
                    Some(serde_json::from_str(&content).map_err(|e| {
                        RequestError::malformed(format!("Bad centers in {}: {}", path.display(), e))
                    })?)
                }
                None => None,
            };
            let req = CategoriesRequest {
                image_url: Some(image),
                island_centers,
            };
            commands::extract_all_categories(reader, &req).await
        }
        Command::Circle { image, x, y } => commands::crop_circle(reader, &point(image, x, y)),
        Command::Diamond { image, x, y } => commands::crop_diamond(reader, &point(image, x, y)),
        Command::SmallDiamond { image, x, y } => {
            commands::crop_small_diamond(reader, &point(image, x, y))
        }
        Command::DiamondFile {
            image,
            x,
            y,
            output,
        } => {
            let req = DiamondFileRequest {
                image_url: Some(image),
                x: Some(x),
                y: Some(y),
                output_path: output,
            };
            commands::crop_diamond_to_file(reader, &req)
        }
        Command::Arrows { image } => {
            let req = PointRequest {
                image_url: Some(image),
                ..Default::default()
            };
            commands::arrow_check_bulk(reader, &req).await
        }
        Command::Icons { image, categories } => {
            let req = IconsRequest {
                image_url: Some(image),
                categories,
            };
            commands::crop_all_decision_icons(reader, &req).await
        }
        Command::IconLabels { image, categories } => {
            let req = IconsRequest {
                image_url: Some(image),
                categories,
            };
            commands::debug_decision_icon_labels(reader, &req).await
        }
        Command::IconAt {
            image,
            x,
            y,
            threshold,
        } => {
            let req = IconPointRequest {
                image_url: Some(image),
                x: Some(x),
                y: Some(y),
                threshold,
            };
            commands::debug_icon_at_point(reader, &req)
        }
        Command::Status { images } => {
            for image in &images {
                reader.fetch(image)?;
            }
            commands::status(reader)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    info!("Data directory: {}", config.data_dir.display());

    let reader = MapReader::from_config(config)?;

    let payload = match dispatch(&reader, cli.command).await {
        Ok(value) => value,
        Err(e) => {
            let payload = e.to_payload();
            println!("{}", serde_json::to_string_pretty(&payload)?);
            std::process::exit(1);
        }
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
