#![forbid(unsafe_code)]

//! GeoJSON rendering of a [`View`], styled with simplestyle properties so
//! that any GeoJSON viewer draws the layers without further computation.

use super::View;
use crate::error::Error;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use kernel::bounds::Bounds;
use kernel::model::{CountingSite, InfraFeature, LineGeometry};
use serde_json::json;

const TENSION_STROKE: &str = "#000000";
const TENSION_WIDTH: f64 = 5.0;
const TENSION_DASHARRAY: &str = "10, 10";
const CELL_STROKE: &str = "#ffffff";
const CELL_FILL_OPACITY: f64 = 0.6;

/// One FeatureCollection per map layer.
#[derive(Debug, Clone)]
pub struct LayerSet {
    pub infrastructure: FeatureCollection,
    pub counters: FeatureCollection,
    pub volumes: FeatureCollection,
    pub predictions: FeatureCollection,
    pub tension: FeatureCollection,
}

impl LayerSet {
    pub fn from_view(view: &View<'_>) -> Result<Self, Error> {
        let infrastructure = view
            .infrastructure
            .iter()
            .map(|infra| {
                let mut properties = object(serde_json::to_value(&infra.feature.properties)?);
                properties.insert("year_score".into(), json!(infra.score));
                properties.insert("stroke".into(), json!(infra.style.color.to_string()));
                properties.insert("stroke-width".into(), json!(infra.style.weight));
                properties.insert("stroke-opacity".into(), json!(infra.style.opacity));
                Ok(line_feature(infra.feature, properties))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let counters = view
            .counters
            .iter()
            .map(|counter| {
                let mut properties = site_properties(counter.site);
                properties.insert("count".into(), json!(counter.count));
                properties.insert("activity".into(), json!(counter.score));
                properties.insert("hue".into(), json!(counter.hue));
                properties.insert("marker-color".into(), json!(counter.color.to_string()));
                point_feature(counter.site, properties)
            })
            .collect();

        let volumes = view
            .volumes
            .iter()
            .map(|volume| {
                let mut properties = site_properties(volume.site);
                properties.insert("marker-color".into(), json!(volume.color.to_string()));
                point_feature(volume.site, properties)
            })
            .collect();

        let predictions = view
            .predictions
            .iter()
            .map(|prediction| {
                let color = prediction.color.to_string();
                let properties = object(json!({
                    "prob_success": prediction.cell.probability,
                    "recommendation": prediction.cell.recommendation,
                    "stroke": CELL_STROKE,
                    "stroke-width": 1,
                    "fill": color,
                    "fill-opacity": CELL_FILL_OPACITY,
                }));
                Feature {
                    bbox: None,
                    geometry: Some(cell_polygon(&prediction.bounds)),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let tension = view
            .tension
            .iter()
            .map(|feature| {
                let properties = object(json!({
                    "nom": feature.properties.name,
                    "score": feature.properties.score,
                    "stroke": TENSION_STROKE,
                    "stroke-width": TENSION_WIDTH,
                    "stroke-dasharray": TENSION_DASHARRAY,
                }));
                line_feature(feature, properties)
            })
            .collect();

        Ok(Self {
            infrastructure: collection(infrastructure),
            counters: collection(counters),
            volumes: collection(volumes),
            predictions: collection(predictions),
            tension: collection(tension),
        })
    }

    /// File name and contents of every layer.
    pub fn files(&self) -> [(&'static str, &FeatureCollection); 5] {
        [
            ("infrastructure.geojson", &self.infrastructure),
            ("counters.geojson", &self.counters),
            ("volumes.geojson", &self.volumes),
            ("predictions.geojson", &self.predictions),
            ("tension.geojson", &self.tension),
        ]
    }
}

fn object(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn line_geometry(geometry: &LineGeometry) -> Geometry {
    let line = |positions: &[kernel::model::Position]| -> Vec<Vec<f64>> {
        positions.iter().map(|p| vec![p.lon, p.lat]).collect()
    };
    let value = match geometry {
        LineGeometry::LineString(positions) => Value::LineString(line(positions)),
        LineGeometry::MultiLineString(lines) => {
            Value::MultiLineString(lines.iter().map(|l| line(l)).collect())
        }
    };
    Geometry::new(value)
}

fn line_feature(feature: &InfraFeature, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(line_geometry(&feature.geometry)),
        id: Some(Id::String(feature.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn site_properties(site: &CountingSite) -> JsonObject {
    object(json!({
        "site_id": site.site_id(),
        "site_name": site.name(),
        "infrastructure_type": site.properties.infrastructure_type,
        "avg_volume": site.properties.avg_volume,
    }))
}

fn point_feature(site: &CountingSite, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            site.position.lon,
            site.position.lat,
        ]))),
        id: Some(Id::String(site.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn cell_polygon(bounds: &Bounds) -> Geometry {
    let ring = bounds.ring().into_iter().map(Vec::from).collect();
    Geometry::new(Value::Polygon(vec![ring]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::build_view;
    use crate::view::tests::datasets;
    use config::Layers;
    use kernel::ScoreMap;
    use pretty_assertions::assert_eq;

    fn prop<'a>(feature: &'a Feature, key: &str) -> &'a serde_json::Value {
        &feature.properties.as_ref().unwrap()[key]
    }

    #[test]
    fn layers_carry_simplestyle() {
        let datasets = datasets();
        let scores: ScoreMap = [("old".to_owned(), 0.0)].into_iter().collect();
        let view = build_view(&datasets, 2020, &scores, &Layers::default());
        let layers = LayerSet::from_view(&view).unwrap();

        let old = &layers.infrastructure.features[0];
        assert_eq!(old.id, Some(Id::String("old".into())));
        assert_eq!(prop(old, "stroke"), "rgb(239, 68, 68)");
        assert_eq!(prop(old, "typeamenagement"), "Piste Cyclable");
        assert_eq!(prop(old, "year_score"), 0.0);

        let undated = &layers.infrastructure.features[1];
        assert_eq!(prop(undated, "stroke"), "#6b7280");
        assert!(prop(undated, "year_score").is_null());

        assert_eq!(layers.counters.features.len(), 2);
        assert_eq!(layers.volumes.features.len(), 2);

        let cell = &layers.predictions.features[0];
        assert_eq!(prop(cell, "fill"), "#1a9850");
        match &cell.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => assert_eq!(rings[0].len(), 5),
            other => panic!("unexpected geometry {other:?}"),
        }

        let zone = &layers.tension.features[0];
        assert_eq!(prop(zone, "stroke-dasharray"), "10, 10");
    }

    #[test]
    fn files_cover_every_layer() {
        let datasets = datasets();
        let view = build_view(&datasets, 2020, &ScoreMap::default(), &Layers::default());
        let layers = LayerSet::from_view(&view).unwrap();
        let names: Vec<_> = layers.files().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "infrastructure.geojson",
                "counters.geojson",
                "volumes.geojson",
                "predictions.geojson",
                "tension.geojson",
            ]
        );
        let text = serde_json::to_string(&layers.tension).unwrap();
        assert!(text.contains("FeatureCollection"));
    }
}
