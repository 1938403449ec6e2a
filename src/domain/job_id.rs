use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JOB_ID_LEN: usize = 8;

/// Short job identifier handed to indexing clients.
///
/// Eight hex characters of a v4 UUID; unique enough within one process
/// lifetime, and the queue rejects the rare collision with a live job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(JOB_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
