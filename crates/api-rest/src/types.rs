//! JSON response bodies for the REST API.

use chrono::{DateTime, Utc};
use courseviewer_core::ReadStatusRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// The most recently read path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LastReadRes {
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ReadStatusRecord> for LastReadRes {
    fn from(record: ReadStatusRecord) -> Self {
        Self {
            path: record.path,
            timestamp: record.read_at,
        }
    }
}

/// Read status of the whole course.
///
/// `lastRead` is `null` until something has been marked as read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusRes {
    pub paths: Vec<String>,
    pub last_read: Option<LastReadRes>,
}
