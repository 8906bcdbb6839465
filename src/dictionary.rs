//! Insertion-ordered dense id dictionaries.
//!
//! Ids are handed out sequentially in first-encounter order and never change
//! afterwards. They are only stable within one run: a different iteration
//! order over users yields different ids.

use std::collections::HashMap;

use log::info;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::segment::Sessions;

/// Token reserved for unknown locations. Persisted as `"unk": [0, -1]`.
pub const UNKNOWN_LOCATION: &str = "unk";

/// Dense id of [`UNKNOWN_LOCATION`].
pub const UNKNOWN_LOCATION_ID: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    id: usize,
    count: usize,
}

/// Raw token -> dense id mapping with a per-token counter.
///
/// Serializes as a JSON object in id order: `token -> [id, count]`. A
/// reserved id 0 is written with a count of `-1`.
#[derive(Debug, Clone, Default)]
pub struct DenseDictionary {
    entries: HashMap<String, Entry>,
    tokens: Vec<String>,
    reserved: bool,
}

impl DenseDictionary {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            tokens: Vec::new(),
            reserved: false,
        }
    }

    /// Dictionary whose id 0 is taken by `token` with a count of 0.
    pub fn with_reserved(token: &str) -> Self {
        let mut dict = Self::new();
        dict.get_or_insert(token);
        dict.reserved = true;
        dict
    }

    /// Id of `token`, assigning the next sequential id if unseen.
    pub fn get_or_insert(&mut self, token: &str) -> usize {
        if let Some(entry) = self.entries.get(token) {
            return entry.id;
        }
        let id = self.tokens.len();
        self.entries.insert(token.to_string(), Entry { id, count: 0 });
        self.tokens.push(token.to_string());
        id
    }

    /// Like [`get_or_insert`](Self::get_or_insert), also adding `amount` to the token's count.
    pub fn record(&mut self, token: &str, amount: usize) -> usize {
        let id = self.get_or_insert(token);
        if let Some(entry) = self.entries.get_mut(token) {
            entry.count += amount;
        }
        id
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.entries.get(token).map(|e| e.id)
    }

    pub fn count(&self, token: &str) -> Option<usize> {
        self.entries.get(token).map(|e| e.count)
    }

    /// Raw token for a dense id.
    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(token, id, count)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, usize)> {
        self.tokens.iter().map(move |token| {
            let entry = self.entries[token];
            (token.as_str(), entry.id, entry.count)
        })
    }
}

impl Serialize for DenseDictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (token, id, count) in self.iter() {
            if self.reserved && id == 0 {
                map.serialize_entry(token, &(id, -1i64))?;
            } else {
                map.serialize_entry(token, &[id, count])?;
            }
        }
        map.end()
    }
}

/// User and location dictionaries of one run.
///
/// User counts hold the number of surviving sessions, location counts the
/// number of visits inside surviving sessions.
#[derive(Debug, Clone)]
pub struct Dictionaries {
    pub users: DenseDictionary,
    pub locations: DenseDictionary,
}

impl Default for Dictionaries {
    fn default() -> Self {
        Self {
            users: DenseDictionary::new(),
            locations: DenseDictionary::with_reserved(UNKNOWN_LOCATION),
        }
    }
}

/// Build both dictionaries in a single serialized pass.
///
/// Users receive ids in iteration order. Locations receive ids in order of
/// first appearance walking each user's sessions by index.
pub fn build_dictionaries<'a>(users: impl IntoIterator<Item = (&'a str, &'a Sessions)>) -> Dictionaries {
    let mut dicts = Dictionaries::default();

    for (user, sessions) in users {
        dicts.users.record(user, sessions.len());
        for session in sessions.values() {
            for visit in session {
                dicts.locations.record(&visit.location, 1);
            }
        }
    }

    info!(
        "[Dictionary] {} users, {} locations (including '{}')",
        dicts.users.len(),
        dicts.locations.len(),
        UNKNOWN_LOCATION
    );

    dicts
}
