#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct View {
    /// Lower end of the year slider.
    pub min_year: i32,

    /// Year selected at startup. Defaults to the latest delivery year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_year: Option<i32>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            min_year: 2014,
            default_year: None,
        }
    }
}
