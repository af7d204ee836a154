//! Fetch one body from HORIZONS and print it as PlaneworldML.
//!
//! ```text
//! cargo run --example fetch_body -- earth
//! cargo run --example fetch_body -- mars --start 2024-01-01 --stop 2024-01-02 --json
//! RUST_LOG=horizons_client=debug cargo run --example fetch_body -- moon
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use horizons_client::{BodyDocument, EphemerisRequest, Query, Session, SessionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Query a solar system body from JPL HORIZONS")]
struct Args {
    /// Body name (sun, mercury, venus, earth, moon, mars, ...).
    body: String,

    /// JSON session configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inactivity timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// First epoch, YYYY-MM-DD.
    #[arg(long)]
    start: Option<String>,

    /// Last epoch, YYYY-MM-DD.
    #[arg(long)]
    stop: Option<String>,

    /// Output interval, e.g. 2d.
    #[arg(long)]
    step: Option<String>,

    /// Print the extracted record as JSON instead of markup.
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    let mut builder = Session::builder().config(config);
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let session = builder.build()?;

    let mut request = EphemerisRequest::default();
    if let Some(start) = args.start {
        request.start = start;
    }
    if let Some(stop) = args.stop {
        request.stop = stop;
    }
    if let Some(step) = args.step {
        request = request.step_size(step);
    }
    let query = Query::new(&args.body)?.with_ephemeris(request);

    tracing::info!("Querying {} (id {})", query.name(), query.id());
    let record = session.query(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", BodyDocument::from_record(&record)?.render());
    }
    Ok(())
}
