use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;

use crate::{PopupAnchor, PopupField, ToggleLayerDescriptor, Visibility, Year, YearSequence};

/// Map variants bundled with the application.
pub const MAP_VARIANTS_TOML: &str = include_str!("../map_variants.toml");

/// Widest year range a variant may declare.
pub const MAX_YEAR_SPAN: i64 = 1000;

const MAPBOX_URL_SCHEME: &str = "mapbox://";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse map configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("map configuration declares no variants")]
    NoVariants,
    #[error("variant '{0}' is declared more than once")]
    DuplicateVariant(String),
    #[error("default variant '{0}' is not declared")]
    UnknownDefaultVariant(String),
    #[error("year range {first}..={last} is empty")]
    EmptyYearRange { first: i32, last: i32 },
    #[error("year range {first}..={last} spans more than {MAX_YEAR_SPAN} years")]
    YearRangeTooWide { first: i32, last: i32 },
    #[error("variant '{variant}': seed year {seed} is outside {first}..={last}")]
    SeedOutOfRange {
        variant: String,
        seed: i32,
        first: i32,
        last: i32,
    },
    #[error("variant '{variant}': layer '{layer}' uses undeclared source '{source_id}'")]
    UnknownSource {
        variant: String,
        layer: String,
        source_id: String,
    },
    #[error("variant '{variant}': {role} layer '{layer}' is not declared")]
    UnknownLayer {
        variant: String,
        role: &'static str,
        layer: String,
    },
    #[error("variant '{variant}': no layer is governed by the year filter")]
    NoFilteredLayers { variant: String },
    #[error("variant '{variant}': style '{style}' needs an access token")]
    MissingAccessToken { variant: String, style: String },
}

// ===== ROOT CONFIG =====

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub default_variant: String,
    #[serde(rename = "variant", default)]
    variants: Vec<MapVariant>,
}

impl MapConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(MAP_VARIANTS_TOML)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::NoVariants);
        }
        let mut ids = HashSet::new();
        for variant in &self.variants {
            if !ids.insert(variant.id.as_str()) {
                return Err(ConfigError::DuplicateVariant(variant.id.clone()));
            }
            variant.validate()?;
        }
        if !ids.contains(self.default_variant.as_str()) {
            return Err(ConfigError::UnknownDefaultVariant(
                self.default_variant.clone(),
            ));
        }
        Ok(())
    }

    pub fn variants(&self) -> &[MapVariant] {
        &self.variants
    }

    pub fn variant(&self, id: &str) -> Option<&MapVariant> {
        self.variants.iter().find(|variant| variant.id == id)
    }

    /// The requested variant when it exists, otherwise the default one.
    pub fn variant_or_default(&self, requested: Option<&str>) -> Option<&MapVariant> {
        requested
            .and_then(|id| self.variant(id))
            .or_else(|| self.variant(&self.default_variant))
    }
}

// ===== VARIANT CONFIG =====

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapVariant {
    pub id: String,
    pub title: String,
    pub map: MapViewSettings,
    pub years: YearRange,
    #[serde(default)]
    pub slider: SliderMode,
    pub sources: Vec<SourceSpec>,
    pub layers: Vec<LayerSpec>,
    pub filtered_layers: Vec<String>,
    #[serde(default)]
    pub tax_readout: Option<TaxReadoutSpec>,
}

impl MapVariant {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map.style.starts_with(MAPBOX_URL_SCHEME) && self.map.access_token.is_none() {
            return Err(ConfigError::MissingAccessToken {
                variant: self.id.clone(),
                style: self.map.style.clone(),
            });
        }
        let years = self.years.sequence()?;
        if !years.contains(self.years.seed()) {
            return Err(ConfigError::SeedOutOfRange {
                variant: self.id.clone(),
                seed: self.years.seed,
                first: self.years.first,
                last: self.years.last,
            });
        }

        for layer in &self.layers {
            if !self.sources.iter().any(|source| source.id == layer.source) {
                return Err(ConfigError::UnknownSource {
                    variant: self.id.clone(),
                    layer: layer.id.clone(),
                    source_id: layer.source.clone(),
                });
            }
        }

        if self.filtered_layers.is_empty() {
            return Err(ConfigError::NoFilteredLayers {
                variant: self.id.clone(),
            });
        }
        for layer_id in &self.filtered_layers {
            self.require_layer("filtered", layer_id)?;
        }
        if let Some(readout) = &self.tax_readout {
            self.require_layer("tax readout", &readout.layer)?;
        }
        Ok(())
    }

    fn require_layer(&self, role: &'static str, layer_id: &str) -> Result<(), ConfigError> {
        match self.layer(layer_id) {
            Some(_) => Ok(()),
            None => Err(ConfigError::UnknownLayer {
                variant: self.id.clone(),
                role,
                layer: layer_id.to_string(),
            }),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn year_sequence(&self) -> Result<YearSequence, ConfigError> {
        self.years.sequence()
    }

    /// Layers with a menu control, in declaration order. The first one is the primary layer.
    pub fn toggle_descriptors(&self) -> Vec<ToggleLayerDescriptor> {
        self.layers
            .iter()
            .filter_map(|layer| {
                layer.toggle_label.as_ref().map(|label| ToggleLayerDescriptor {
                    layer_id: layer.id.clone(),
                    label: label.clone(),
                    initial_visibility: layer.visibility,
                })
            })
            .collect()
    }

    /// Layers that open a popup on click.
    pub fn popup_layers(&self) -> impl Iterator<Item = (&LayerSpec, &PopupSpec)> {
        self.layers
            .iter()
            .filter_map(|layer| layer.popup.as_ref().map(|popup| (layer, popup)))
    }

    /// `(min, max, initial)` for the range input.
    pub fn slider_bounds(&self) -> (i32, i32, i32) {
        match self.slider {
            SliderMode::Year => (self.years.first, self.years.last, self.years.seed),
            SliderMode::Index => (
                0,
                self.years.last - self.years.first,
                self.years.seed - self.years.first,
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MapViewSettings {
    pub style: String,
    pub center: [f64; 2],
    pub zoom: f64,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl MapViewSettings {
    /// Constructor options for the map, mounted into `container`.
    pub fn map_options(&self, container: &str) -> Value {
        json!({
            "container": container,
            "style": self.style,
            "center": self.center,
            "zoom": self.zoom,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
    pub seed: i32,
}

impl YearRange {
    pub fn sequence(&self) -> Result<YearSequence, ConfigError> {
        YearSequence::new(self.first, self.last)
    }

    pub fn seed(&self) -> Year {
        Year(self.seed)
    }
}

/// How the slider's numeric value maps onto the year sequence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SliderMode {
    /// The value is the year itself.
    #[default]
    Year,
    /// The value is an index into the sequence.
    Index,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub id: String,
    pub data: String,
}

impl SourceSpec {
    pub fn descriptor(&self) -> Value {
        json!({ "type": "geojson", "data": self.data })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Circle,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Circle => "circle",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    #[serde(default)]
    pub paint: Map<String, Value>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub toggle_label: Option<String>,
    #[serde(default)]
    pub popup: Option<PopupSpec>,
}

impl LayerSpec {
    /// Layer descriptor in the map library's style-spec shape.
    pub fn descriptor(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind.as_str(),
            "source": self.source,
            "layout": { "visibility": self.visibility.as_str() },
            "paint": self.paint,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PopupSpec {
    #[serde(default)]
    pub anchor: PopupAnchor,
    pub fields: Vec<PopupField>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaxReadoutSpec {
    pub layer: String,
    pub property: String,
    pub title: String,
    /// Years without a computed value; the readout stays blank for them.
    #[serde(default)]
    pub skip_years: Vec<i32>,
}

impl TaxReadoutSpec {
    pub fn skips(&self, year: Year) -> bool {
        self.skip_years.contains(&year.0)
    }
}
