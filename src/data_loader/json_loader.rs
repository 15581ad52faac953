use std::{fs, path::PathBuf};

use lombok::AllArgsConstructor;
use tracing::debug;

use super::data_loader::{DataLoader, Fixture};
use crate::error::{AppError, AppResult};

#[derive(AllArgsConstructor, Debug)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl DataLoader for JsonFileLoader {
    fn load_fixture(&self) -> AppResult<Fixture> {
        debug!("Reading fixture from {}", self.path.display());

        let content = fs::read_to_string(&self.path).map_err(|e| {
            AppError::Internal(format!("Can't read {}: {e}", self.path.display()))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::Internal(format!("Can't parse {}: {e}", self.path.display()))
        })
    }
}
