use camino::Utf8PathBuf;
use emosync_primitives::ArchiveRecord;
use eyre::{Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs::{read_to_string, write};
use tracing::debug;

/// Persistence for the prior-run archive records.
///
/// Read once at the start of a run, replaced wholesale at the end. A
/// missing file is an empty archive (first run), not an error.
#[derive(Clone, Debug)]
pub struct ArchiveStore {
    path: Utf8PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArchiveDocument {
    #[serde(default)]
    records: Vec<ArchiveRecord>,
}

impl ArchiveStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load_previous(&self) -> EyreResult<Vec<ArchiveRecord>> {
        if !self.path.is_file() {
            debug!(path = %self.path, "no prior archive, starting empty");
            return Ok(Vec::new());
        }

        let content = read_to_string(&self.path)
            .await
            .wrap_err_with(|| format!("failed to read {}", self.path))?;

        let document: ArchiveDocument =
            toml::from_str(&content).wrap_err_with(|| format!("failed to parse {}", self.path))?;

        Ok(document.records)
    }

    pub async fn save_previous(&self, records: &[ArchiveRecord]) -> EyreResult<()> {
        let document = ArchiveDocument {
            records: records.to_vec(),
        };
        let content = toml::to_string_pretty(&document)?;

        write(&self.path, content)
            .await
            .wrap_err_with(|| format!("failed to write {}", self.path))
    }
}
