//! Encounter persistence.

use tracing::{debug, info};

use super::{JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Encounter, EncounterId};

/// Encounters stored newest first in `encounters.jsonl`.
pub struct EncounterStore {
    reader: JsonlReader<Encounter>,
    writer: JsonlWriter<Encounter>,
}

fn not_found(id: &EncounterId) -> StorageError {
    StorageError::NotFound {
        kind: "Encounter",
        id: id.to_string(),
    }
}

impl EncounterStore {
    pub fn new(config: &StorageConfig) -> Self {
        let path = config.encounters_path();
        Self {
            reader: JsonlReader::new(path.clone()),
            writer: JsonlWriter::new(path),
        }
    }

    /// All encounters, newest first.
    pub fn list(&self) -> Result<Vec<Encounter>, StorageError> {
        self.reader.read_all()
    }

    pub fn get(&self, id: &EncounterId) -> Result<Encounter, StorageError> {
        self.reader
            .find(|e| &e.id == id)?
            .ok_or_else(|| not_found(id))
    }

    /// Store a new encounter in front of the existing ones.
    pub fn add(&self, encounter: Encounter) -> Result<(), StorageError> {
        let mut all = self.list()?;
        debug!("Adding encounter {} against {}", encounter.id, encounter.opponent_name);
        all.insert(0, encounter);
        self.writer.write_all(&all)?;
        Ok(())
    }

    /// Modify one encounter in place. Nothing is written when `f` fails.
    pub fn update<F, T, E>(&self, id: &EncounterId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Encounter) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut all = self.list()?;
        let encounter = all
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| not_found(id))?;

        let out = f(encounter)?;
        self.writer.write_all(&all)?;
        Ok(out)
    }

    pub fn delete(&self, id: &EncounterId) -> Result<Encounter, StorageError> {
        let mut all = self.list()?;
        let idx = all
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| not_found(id))?;

        let removed = all.remove(idx);
        self.writer.write_all(&all)?;
        info!("Deleted encounter {}", id);
        Ok(removed)
    }

    /// Overwrite the whole collection, e.g. after a remote snapshot wins.
    pub fn replace_all(&self, encounters: &[Encounter]) -> Result<usize, StorageError> {
        self.writer.write_all(encounters)
    }
}
