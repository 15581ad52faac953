#![warn(clippy::all)]

use std::{env, path::PathBuf};

use foodgram::config::Config;
use foodgram::data_loader::{
    data_loader::{import, DataLoader},
    json_loader::JsonFileLoader,
};
use foodgram::database::connection::establish_pooled_connection;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FIXTURE: &str = "fixtures/foodgram.json";

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE));

    if let Err(e) = run(path) {
        error!("Import failed: {e}");
        std::process::exit(1);
    }
}

fn run(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let pool = establish_pooled_connection(&config)?;
    let fixture = JsonFileLoader::new(path).load_fixture()?;

    let mut connection = pool.get()?;
    import(&mut connection, &fixture)?;

    Ok(())
}
