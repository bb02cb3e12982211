use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Passage counts per year and counting site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageCounts(BTreeMap<i32, HashMap<String, f64>>);

impl PassageCounts {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn for_year(&self, year: i32) -> Option<&HashMap<String, f64>> {
        self.0.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.keys().copied()
    }

    pub fn insert(&mut self, year: i32, site_id: impl Into<String>, count: f64) {
        self.0.entry(year).or_default().insert(site_id.into(), count);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
