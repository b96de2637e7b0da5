//! Stateless repositories. Every method takes `&Connection`.

pub mod message;
pub mod session;

pub use message::MessageRepo;
pub use session::SessionRepo;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{Result, StoreError};

pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::InvalidRow(format!("{field} '{raw}': {e}")))
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRow(format!("{field} '{raw}': {e}")))
}
