//! Final nested dataset structure and its JSON persistence.
//!
//! Field names match what the downstream training code reads:
//!
//! ```text
//! {
//!   "data_neural": { <user id>: { "sessions", "train", "test", "pred_len",
//!                                 "valid_len", "train_loc", "explore",
//!                                 "entropy", "rg" } },
//!   "uid_list":    { <raw user>: [id, session count] },
//!   "vid_list":    { <raw location>: [id, visit count] },
//!   "parameters":  { ...run configuration... },
//!   "data_filter": { <raw user>: { ... } },      // Foursquare only
//!   "vid_lookup":  { <location id>: [lon, lat] }  // Foursquare only
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dictionary::DenseDictionary;
use crate::error::Result;
use crate::segment::Sessions;
use crate::stats::{EncodedSession, UserStatistics};

/// Prepared training data of one user.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    /// Raw user token (not persisted, the key is the dense id)
    #[serde(skip)]
    pub user: String,
    /// Session index -> `(location id, time slot)` tuples
    pub sessions: BTreeMap<usize, EncodedSession>,
    /// Training session indices, discovery order
    pub train: Vec<usize>,
    /// Test session indices, discovery order
    pub test: Vec<usize>,
    #[serde(flatten)]
    pub statistics: UserStatistics,
}

/// Filtering by-products of one user, kept for the Foursquare variant.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredUserData {
    pub sessions_count: usize,
    pub topk_count: usize,
    /// Location visit counts, most common first
    pub topk: Vec<(String, usize)>,
    /// Sessions surviving the length filter, re-densed
    pub sessions: Sessions,
    /// Segmentation output before the length filter
    pub raw_sessions: Sessions,
}

/// The assembled dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    /// Dense user id -> record
    pub data_neural: BTreeMap<usize, UserRecord>,
    pub uid_list: DenseDictionary,
    pub vid_list: DenseDictionary,
    pub parameters: PipelineConfig,
    /// Raw user -> filtering by-products, in filter order
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_in_order"
    )]
    pub data_filter: Option<Vec<(String, FilteredUserData)>>,
    /// Dense location id -> `[lon, lat]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid_lookup: Option<BTreeMap<usize, [f64; 2]>>,
}

impl Dataset {
    /// Number of users with prepared data.
    pub fn user_count(&self) -> usize {
        self.data_neural.len()
    }

    /// Number of locations in the dictionary, `unk` included.
    pub fn location_count(&self) -> usize {
        self.vid_list.len()
    }

    /// Record of a user by raw token.
    pub fn user_record(&self, user: &str) -> Option<&UserRecord> {
        self.uid_list
            .id(user)
            .and_then(|id| self.data_neural.get(&id))
    }

    /// Filtering by-products of a user by raw token (Foursquare only).
    pub fn filtered_user(&self, user: &str) -> Option<&FilteredUserData> {
        self.data_filter
            .as_ref()?
            .iter()
            .find(|(token, _)| token == user)
            .map(|(_, data)| data)
    }

    /// Serialize as JSON into `writer`.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Serialize as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the dataset to `path` as JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            "[Dataset] Saved {} users, {} locations to {}",
            self.user_count(),
            self.location_count(),
            path.display()
        );
        Ok(())
    }
}

/// Write `(key, value)` pairs as a JSON object without reordering the keys.
fn serialize_in_order<S: Serializer>(
    entries: &Option<Vec<(String, FilteredUserData)>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match entries {
        Some(entries) => {
            let mut map = serializer.serialize_map(Some(entries.len()))?;
            for (user, data) in entries {
                map.serialize_entry(user, data)?;
            }
            map.end()
        }
        None => serializer.serialize_none(),
    }
}
