//! Photo payload served by the remote endpoint.

use serde::{Deserialize, Serialize};

/// One photo record, e.g. `GET /photos/1`.
///
/// Unknown fields such as `albumId` are ignored. Missing text fields decode
/// as empty strings; a missing `id` is a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}
