use crate::domain::{Location, LocationId};
use crate::domain::seed::seed_locations;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Durable storage of the whole location collection.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<Vec<Location>>, RepositoryError>;

    async fn save(&self, locations: &[Location]) -> Result<(), RepositoryError>;
}

/// Stores the collection as a flat JSON list of `{id, name, address, coordinates?}` records.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRepository { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_else(|| "locations".into());
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

#[async_trait]
impl LocationRepository for JsonFileRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<Vec<Location>>, RepositoryError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RepositoryError::Io {
                    source: e,
                    path: self.path.clone(),
                });
            }
        };

        let locations = serde_json::from_str::<Vec<Location>>(&content).map_err(|e| RepositoryError::Corrupt {
            source: e,
            path: self.path.clone(),
        })?;
        check_ids(&locations).map_err(|reason| RepositoryError::Inconsistent {
            reason,
            path: self.path.clone(),
        })?;

        Ok(Some(locations))
    }

    #[instrument(skip_all, fields(path = %self.path.display(), count = locations.len()))]
    async fn save(&self, locations: &[Location]) -> Result<(), RepositoryError> {
        let content = serde_json::to_string_pretty(locations)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, content).await.map_err(|e| RepositoryError::Io {
            source: e,
            path: temp_path.clone(),
        })?;
        fs::rename(&temp_path, &self.path).await.map_err(|e| RepositoryError::Io {
            source: e,
            path: self.path.clone(),
        })?;

        Ok(())
    }
}

/// Ids must be unique and leave room for the next id to be assigned.
fn check_ids(locations: &[Location]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for location in locations {
        if location.id() == LocationId::MAX {
            return Err(format!("id {} is out of range", location.id()));
        }
        if !seen.insert(location.id()) {
            return Err(format!("id {} is used more than once", location.id()));
        }
    }
    Ok(())
}

/// Loads the stored collection, falling back to the seed list when it is absent or unreadable.
#[instrument(skip_all)]
pub async fn load_or_seed(repository: &dyn LocationRepository) -> Vec<Location> {
    info!("📁 Loading locations...");
    match repository.load().await {
        Ok(Some(locations)) => {
            info!("📁 Loading locations... OK, {} loaded", locations.len());
            locations
        }
        Ok(None) => {
            info!("📁 Loading locations... none stored, using the seed list");
            seed_locations()
        }
        Err(e) => {
            warn!("⚠️ Loading locations... failed, using the seed list: {}", e);
            seed_locations()
        }
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("stored locations in '{}' are corrupt: {}", path.display(), source)]
    Corrupt { source: serde_json::Error, path: PathBuf },
    #[error("stored locations in '{}' are inconsistent: {}", path.display(), reason)]
    Inconsistent { reason: String, path: PathBuf },
    #[error("{}: {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
    #[error("could not serialize locations: {0}")]
    Serialization(#[from] serde_json::Error),
}
