//! Filament stock records and the bundled default catalog

use crate::error::{SpoolError, SpoolResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Hex swatch used when a filament ID is not in the bundled catalog
pub const FALLBACK_HEX: &str = "#666";

const BUNDLED_CATALOG: &str = include_str!("../../data/filaments.json");

/// Filament product line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    /// PLA Matte
    Matte,
    /// PLA Basic
    Basic,
}

impl Series {
    /// Display label stored on each filament record
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matte => "PLA Matte",
            Self::Basic => "PLA Basic",
        }
    }

    /// All series in catalog order
    pub fn all() -> &'static [Self] {
        &[Self::Matte, Self::Basic]
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A stocked filament spool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filament {
    /// Stable filament identifier
    pub filament_id: String,

    /// Display color name
    pub color: String,

    /// Swatch color
    #[serde(default)]
    pub hex: String,

    /// Product line label
    #[serde(default)]
    pub series: String,

    /// Grams on hand, never negative
    #[serde(default, deserialize_with = "grams_or_zero")]
    pub stock_grams: f64,
}

/// `null` and negative amounts read back as 0
fn grams_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let grams = Option::<f64>::deserialize(deserializer)?;
    Ok(grams.filter(|g| g.is_finite()).map_or(0.0, |g| g.max(0.0)))
}

impl Filament {
    /// Overwrite stock, clamping at zero
    ///
    /// Non-finite values count as 0: JSON cannot hold them.
    pub fn set_stock(&mut self, grams: f64) {
        self.stock_grams = if grams.is_finite() { grams.max(0.0) } else { 0.0 };
    }

    /// Take up to `grams` from stock, returning what was actually taken
    pub fn debit(&mut self, grams: f64) -> f64 {
        let before = self.stock_grams;
        self.set_stock(before - grams);
        before - self.stock_grams
    }

    /// Return grams to stock (no upper bound); non-finite amounts are ignored
    pub fn credit(&mut self, grams: f64) {
        if grams.is_finite() {
            self.set_stock(self.stock_grams + grams);
        }
    }

    /// Whether this record belongs to the given series
    pub fn in_series(&self, series: Series) -> bool {
        self.series == series.label()
    }

    /// Case-insensitive exact color comparison
    pub fn color_matches(&self, color: &str) -> bool {
        self.color.to_lowercase() == color.to_lowercase()
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    pla_matte: Vec<Filament>,
    #[serde(default)]
    pla_basic: Vec<Filament>,
}

/// Default stock levels shipped with the binary
#[derive(Debug, Clone)]
pub struct DefaultCatalog {
    filaments: Vec<Filament>,
}

impl DefaultCatalog {
    /// Load the catalog compiled into the binary
    pub fn bundled() -> SpoolResult<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Parse a catalog grouped by series and flatten it with series labels
    pub fn from_json(json: &str) -> SpoolResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| SpoolError::CatalogInvalid(e.to_string()))?;

        let tag = |series: Series| {
            move |mut filament: Filament| {
                filament.series = series.label().to_string();
                filament.set_stock(filament.stock_grams);
                filament
            }
        };

        let filaments = file
            .pla_matte
            .into_iter()
            .map(tag(Series::Matte))
            .chain(file.pla_basic.into_iter().map(tag(Series::Basic)))
            .collect();

        Ok(Self { filaments })
    }

    /// Build a catalog from explicit records
    pub fn from_filaments(filaments: Vec<Filament>) -> Self {
        Self { filaments }
    }

    /// All default records in catalog order
    pub fn filaments(&self) -> &[Filament] {
        &self.filaments
    }

    /// Swatch color for a filament ID, gray when unknown
    ///
    /// The designs API only returns filament IDs, so swatches come from here.
    pub fn hex_for(&self, filament_id: &str) -> &str {
        self.filaments
            .iter()
            .find(|f| f.filament_id == filament_id)
            .map(|f| f.hex.as_str())
            .unwrap_or(FALLBACK_HEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spool(stock: f64) -> Filament {
        Filament {
            filament_id: "pla-matte-charcoal".to_string(),
            color: "Charcoal".to_string(),
            hex: "#36454F".to_string(),
            series: "PLA Matte".to_string(),
            stock_grams: stock,
        }
    }

    #[test]
    fn debit_clamps_and_reports_taken() {
        let mut f = spool(100.0);
        assert_eq!(f.debit(30.0), 30.0);
        assert_eq!(f.stock_grams, 70.0);

        assert_eq!(f.debit(250.0), 70.0);
        assert_eq!(f.stock_grams, 0.0);
    }

    #[test]
    fn set_stock_never_negative() {
        let mut f = spool(10.0);
        f.set_stock(-5.0);
        assert_eq!(f.stock_grams, 0.0);
        f.set_stock(f64::NAN);
        assert_eq!(f.stock_grams, 0.0);
    }

    #[test]
    fn infinite_stock_counts_as_zero() {
        let mut f = spool(10.0);
        f.set_stock(f64::INFINITY);
        assert_eq!(f.stock_grams, 0.0);

        let mut f = spool(10.0);
        f.credit(f64::INFINITY);
        f.credit(f64::NAN);
        assert_eq!(f.stock_grams, 10.0);
        assert!(serde_json::to_string(&f).unwrap().contains("\"stock_grams\":10.0"));
    }

    #[test]
    fn null_stock_reads_as_zero() {
        let stock: Vec<Filament> = serde_json::from_str(
            r#"[{"filament_id":"a","color":"Amber","stock_grams":null},
                {"filament_id":"b","color":"Blue","stock_grams":-3}]"#,
        )
        .unwrap();
        assert_eq!(stock[0].stock_grams, 0.0);
        assert_eq!(stock[1].stock_grams, 0.0);
    }

    #[test]
    fn color_match_ignores_case() {
        let f = spool(0.0);
        assert!(f.color_matches("charcoal"));
        assert!(f.color_matches("CHARCOAL"));
        assert!(!f.color_matches("Charcoal Gray"));
    }

    #[test]
    fn bundled_catalog_is_tagged_by_series() {
        let catalog = DefaultCatalog::bundled().unwrap();
        assert!(!catalog.filaments().is_empty());

        let matte = catalog
            .filaments()
            .iter()
            .filter(|f| f.in_series(Series::Matte))
            .count();
        let basic = catalog
            .filaments()
            .iter()
            .filter(|f| f.in_series(Series::Basic))
            .count();
        assert_eq!(matte + basic, catalog.filaments().len());
        assert!(matte > 0 && basic > 0);
    }

    #[test]
    fn bundled_ids_are_unique() {
        let catalog = DefaultCatalog::bundled().unwrap();
        let mut ids: Vec<_> = catalog.filaments().iter().map(|f| &f.filament_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.filaments().len());
    }

    #[test]
    fn hex_lookup_falls_back_to_gray() {
        let catalog = DefaultCatalog::from_json(
            r##"{"pla_matte": [{"filament_id": "red-matte", "color": "Red", "hex": "#E0301E", "stock_grams": 200}]}"##,
        )
        .unwrap();

        assert_eq!(catalog.hex_for("red-matte"), "#E0301E");
        assert_eq!(catalog.hex_for("unknown"), FALLBACK_HEX);
        assert_eq!(catalog.filaments()[0].series, "PLA Matte");
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        let err = DefaultCatalog::from_json("{\"pla_matte\": 3}").unwrap_err();
        assert!(matches!(err, SpoolError::CatalogInvalid(_)));
    }
}
