use crate::model::InfraFeature;
use serde::Serialize;

/// Whether `feature` exists in `year`: undated features always do.
#[inline]
pub fn is_delivered_by(feature: &InfraFeature, year: i32) -> bool {
    feature
        .delivery_year()
        .is_none_or(|delivered| delivered <= year)
}

/// Features visible when `year` is selected, in input order.
pub fn delivered_by(features: &[InfraFeature], year: i32) -> Vec<&InfraFeature> {
    features
        .iter()
        .filter(|feature| is_delivered_by(feature, year))
        .collect()
}

/// Bounds of the year slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// `[min_year, latest delivery year]`. Collapses to `min_year` when no
    /// feature is dated later.
    pub fn from_features(features: &[InfraFeature], min_year: i32) -> Self {
        let latest = features
            .iter()
            .filter_map(InfraFeature::delivery_year)
            .max()
            .unwrap_or(min_year);
        Self {
            min: min_year,
            max: latest.max(min_year),
        }
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min, self.max)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}
