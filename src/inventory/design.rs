//! Designs as supplied by the remote catalog

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A printable design with its per-filament material needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Catalog identity, also the queue merge key
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight_grams: Option<f64>,

    #[serde(default)]
    pub filaments: Vec<DesignFilament>,

    /// Remote fields this crate does not interpret (category, pokemon, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One filament a design needs for a single print
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignFilament {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filament_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

impl DesignFilament {
    /// Grams for one print; missing or nonsensical weights count as zero
    pub fn weight(&self) -> f64 {
        self.weight_grams
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0)
    }
}

impl Design {
    /// Create a design with no filament requirements
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            image_url: None,
            total_weight_grams: None,
            filaments: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add a filament requirement (builder style)
    pub fn with_filament(mut self, filament: DesignFilament) -> Self {
        self.filaments.push(filament);
        self
    }

    /// Catalog category, if the API supplied one
    pub fn category(&self) -> Option<&str> {
        self.extra.get("category").and_then(Value::as_str)
    }

    /// Name of the featured pokemon, if any
    pub fn pokemon_name(&self) -> Option<&str> {
        self.extra
            .get("pokemon")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
    }

    /// Total print weight, treating a missing value as zero
    pub fn total_weight(&self) -> f64 {
        self.total_weight_grams
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: &str = r#"{
        "slug": "pikachu-planter",
        "title": "Pikachu Planter",
        "image_url": "https://cdn.example.com/pikachu.png",
        "total_weight_grams": 82.5,
        "category": "planters",
        "pokemon": {"name": "Pikachu", "number": 25},
        "filaments": [
            {"filament_id": "pla-matte-lemon-yellow", "color": "Lemon Yellow", "weight_grams": 70.0,
             "product_url": "https://shop.example.com/lemon"},
            {"color": "black", "weight_grams": 12.5}
        ]
    }"#;

    #[test]
    fn parses_api_design() {
        let design: Design = serde_json::from_str(PIKACHU).unwrap();
        assert_eq!(design.slug, "pikachu-planter");
        assert_eq!(design.filaments.len(), 2);
        assert_eq!(design.filaments[1].filament_id, None);
        assert_eq!(design.category(), Some("planters"));
        assert_eq!(design.pokemon_name(), Some("Pikachu"));
        assert_eq!(design.total_weight(), 82.5);
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let design: Design = serde_json::from_str(PIKACHU).unwrap();
        let json = serde_json::to_string(&design).unwrap();
        let again: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(again.extra.get("pokemon"), design.extra.get("pokemon"));
    }

    #[test]
    fn missing_weights_are_zero() {
        let design: Design = serde_json::from_str(r#"{"slug": "bare", "filaments": [{}]}"#).unwrap();
        assert_eq!(design.filaments[0].weight(), 0.0);
        assert_eq!(design.total_weight(), 0.0);
        assert_eq!(design.title, "");

        let negative = DesignFilament {
            weight_grams: Some(-4.0),
            ..DesignFilament::default()
        };
        assert_eq!(negative.weight(), 0.0);
    }
}
