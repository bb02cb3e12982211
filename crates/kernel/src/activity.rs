//! Activity score of counting sites relative to the yearly average.

use crate::model::{CountingSite, PassageCounts};
use crate::utils::clamp_unit;
use std::collections::HashMap;

/// Ratio at and below which a site scores 0.
pub const LOW_RATIO: f64 = 0.5;
/// Ratio at and above which a site scores 1.
pub const HIGH_RATIO: f64 = 1.5;

/// Mean count over every site with data. `0.0` for an empty year.
pub fn year_average(counts: &HashMap<String, f64>) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    counts.values().sum::<f64>() / counts.len() as f64
}

/// Linear score of `count` against `mean`: 0 below half the mean, 1 from
/// one and a half times the mean.
pub fn activity_score(count: f64, mean: f64) -> f64 {
    if !mean.is_finite() || mean <= 0.0 {
        return 0.0;
    }
    let ratio = count / mean;
    if ratio < LOW_RATIO {
        0.0
    } else if ratio >= HIGH_RATIO {
        1.0
    } else {
        (ratio - LOW_RATIO) / (HIGH_RATIO - LOW_RATIO)
    }
}

/// Hue rotation of a site marker: 140 at score 0, 240 at score 1.
pub fn marker_hue(score: f64) -> f64 {
    140.0 + 100.0 * clamp_unit(score)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteActivity<'a> {
    pub site: &'a CountingSite,
    pub count: f64,
    pub score: f64,
}

/// Score every site that has a count for `year`. Sites without one are left
/// out rather than given a default.
pub fn score_sites<'a>(
    sites: &'a [CountingSite],
    counts: &PassageCounts,
    year: i32,
) -> Vec<SiteActivity<'a>> {
    let Some(year_counts) = counts.for_year(year) else {
        return Vec::new();
    };
    let mean = year_average(year_counts);

    sites
        .iter()
        .filter_map(|site| {
            let count = *year_counts.get(site.site_id())?;
            Some(SiteActivity {
                site,
                count,
                score: activity_score(count, mean),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, SiteProperties};

    fn site(site_id: &str) -> CountingSite {
        CountingSite::new(
            format!("points_comptage.{site_id}"),
            Position::new(4.85, 45.75),
            SiteProperties {
                site_id: Some(site_id.into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn two_sites_against_their_mean() {
        let sites = [site("A"), site("B"), site("C")];
        let mut counts = PassageCounts::default();
        counts.insert(2020, "A", 100.0);
        counts.insert(2020, "B", 50.0);

        let scored = score_sites(&sites, &counts, 2020);
        assert_eq!(scored.len(), 2);

        let a = scored.iter().find(|s| s.site.site_id() == "A").unwrap();
        let b = scored.iter().find(|s| s.site.site_id() == "B").unwrap();
        assert_eq!(a.count, 100.0);
        assert!((a.score - (100.0 / 75.0 - 0.5)).abs() < 1e-12);
        assert!((a.score - 0.8333).abs() < 1e-3);
        assert!((b.score - 0.1667).abs() < 1e-3);
    }

    #[test]
    fn ratio_extremes_saturate() {
        assert_eq!(activity_score(40.0, 100.0), 0.0);
        assert_eq!(activity_score(50.0, 100.0), 0.0);
        assert_eq!(activity_score(150.0, 100.0), 1.0);
        assert_eq!(activity_score(200.0, 100.0), 1.0);
        assert_eq!(activity_score(100.0, 100.0), 0.5);
    }

    #[test]
    fn undefined_mean_scores_zero() {
        assert_eq!(activity_score(10.0, 0.0), 0.0);
        assert_eq!(activity_score(10.0, f64::NAN), 0.0);
        assert_eq!(year_average(&HashMap::new()), 0.0);
    }

    #[test]
    fn year_without_data_shows_nothing() {
        let sites = [site("A")];
        let mut counts = PassageCounts::default();
        counts.insert(2019, "A", 10.0);
        assert!(score_sites(&sites, &counts, 2020).is_empty());
    }

    #[test]
    fn marker_hue_range() {
        assert_eq!(marker_hue(0.0), 140.0);
        assert_eq!(marker_hue(1.0), 240.0);
        assert_eq!(marker_hue(4.0), 240.0);
    }
}
