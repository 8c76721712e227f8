//! JSON file writer for consultation rounds.
//!
//! Each session is one file, `<dir>/<session_id>.json`, holding every
//! recorded round in round order. Saving a round that is already present
//! replaces it.

use chrono::{DateTime, SecondsFormat, Utc};
use mdt_application::ports::round_recorder::{RecordError, RoundRecord, RoundRecorder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// On-disk layout of one session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub session_id: String,
    pub created_at: String,
    pub last_updated: String,
    pub rounds: Vec<StoredRound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRound {
    pub round: u32,
    pub saved_at: String,
    #[serde(flatten)]
    pub record: RoundRecord,
}

/// Round recorder writing one pretty-printed JSON file per session.
///
/// Writes are serialized through a mutex and land via rename, so a reader
/// never sees a half-written file.
pub struct JsonRoundRecorder {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonRoundRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default location: `<data dir>/mdt-consult/sessions`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("mdt-consult").join("sessions"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(session_id)))
    }

    /// Read a session file back.
    pub fn load(&self, session_id: &str) -> Result<Option<SessionFile>, RecordError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write(&self, path: &Path, file: &SessionFile) -> Result<(), RecordError> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(file)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl RoundRecorder for JsonRoundRecorder {
    fn append_round(
        &self,
        session_id: &str,
        round: u32,
        record: &RoundRecord,
    ) -> Result<(), RecordError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = timestamp(Utc::now());
        let path = self.session_path(session_id);

        let mut file = self.load(session_id)?.unwrap_or_else(|| SessionFile {
            session_id: session_id.to_string(),
            created_at: now.clone(),
            last_updated: now.clone(),
            rounds: Vec::new(),
        });

        let stored = StoredRound {
            round,
            saved_at: now.clone(),
            record: record.clone(),
        };
        match file.rounds.binary_search_by_key(&round, |r| r.round) {
            Ok(index) => file.rounds[index] = stored,
            Err(index) => file.rounds.insert(index, stored),
        }
        file.last_updated = now;

        self.write(&path, &file)?;
        debug!("Recorded round {} of session {} to {}", round, session_id, path.display());
        Ok(())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Keep session ids from escaping the sessions directory.
fn sanitize(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
