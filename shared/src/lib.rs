use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

mod config;

pub use config::{
    ConfigError, LayerKind, LayerSpec, MAP_VARIANTS_TOML, MAX_YEAR_SPAN, MapConfig, MapVariant,
    MapViewSettings, PopupSpec, SliderMode, SourceSpec, TaxReadoutSpec, YearRange,
};

// ===== MESSAGE TYPES =====

/// Messages from the frontend to the backend.
///
/// The map page only talks to the map library and to static GeoJSON URLs, so nothing
/// travels up. moon still needs a concrete message type to start its handler.
#[derive(Serialize, Deserialize, Debug)]
pub enum UpMsg {}

// ===== YEAR TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Year(pub i32);

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, contiguous list of the years a dataset covers.
///
/// Never empty. The label shown for a selected year is always read back from this
/// sequence, so callers get the canonical value rather than an echo of their input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSequence {
    years: Vec<Year>,
}

impl YearSequence {
    pub fn new(first: i32, last: i32) -> Result<Self, ConfigError> {
        if first > last {
            return Err(ConfigError::EmptyYearRange { first, last });
        }
        if i64::from(last) - i64::from(first) >= MAX_YEAR_SPAN {
            return Err(ConfigError::YearRangeTooWide { first, last });
        }
        Ok(Self {
            years: (first..=last).map(Year).collect(),
        })
    }

    pub fn contains(&self, year: Year) -> bool {
        self.index_of(year).is_some()
    }

    pub fn index_of(&self, year: Year) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    pub fn get(&self, index: usize) -> Option<Year> {
        self.years.get(index).copied()
    }

    /// Index lookup followed by a read-back of the sequence's own element.
    pub fn canonical(&self, year: Year) -> Option<Year> {
        self.index_of(year).and_then(|index| self.get(index))
    }

    pub fn first(&self) -> Year {
        self.years[0]
    }

    pub fn last(&self) -> Year {
        self.years[self.years.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Year> + '_ {
        self.years.iter().copied()
    }
}

// ===== LAYER TYPES =====

/// Equality predicate applied to a rendered layer, `attribute == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFilter {
    pub attribute: String,
    pub value: Value,
}

impl LayerFilter {
    pub const YEAR_ATTRIBUTE: &'static str = "year";

    pub fn year_equals(year: Year) -> Self {
        Self {
            attribute: Self::YEAR_ATTRIBUTE.to_string(),
            value: Value::from(year.0),
        }
    }

    /// Expression in the map library's filter syntax, e.g. `["==", "year", 2002]`.
    pub fn to_expression(&self) -> Value {
        json!(["==", self.attribute, self.value])
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    #[serde(rename = "visible")]
    Visible,
    #[serde(rename = "none")]
    Hidden,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "none",
        }
    }

    /// Reads a layout `visibility` value. Anything unrecognised is `None`.
    pub fn from_layout_value(value: &str) -> Option<Self> {
        match value {
            "visible" => Some(Visibility::Visible),
            "none" => Some(Visibility::Hidden),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Visible => Visibility::Hidden,
            Visibility::Hidden => Visibility::Visible,
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    /// CSS class of the menu control mirroring this state.
    pub fn control_class(self) -> &'static str {
        match self {
            Visibility::Visible => "active",
            Visibility::Hidden => "",
        }
    }
}

/// A layer that gets an on/off control in the layer menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleLayerDescriptor {
    pub layer_id: String,
    pub label: String,
    pub initial_visibility: Visibility,
}

// ===== FEATURE TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// Properties of a single rendered feature. Read-only.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FeatureAttributes(Map<String, Value>);

impl FeatureAttributes {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self(properties)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Display text for one attribute; missing attributes render empty.
    pub fn display(&self, name: &str) -> String {
        self.get(name).map(display_value).unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for FeatureAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RenderedFeature {
    #[serde(default)]
    pub properties: FeatureAttributes,
    #[serde(default)]
    pub geometry: Value,
}

impl RenderedFeature {
    /// First coordinate pair of the feature geometry, at any nesting depth.
    pub fn first_coordinate(&self) -> Option<LngLat> {
        match self.geometry.get("coordinates") {
            Some(coordinates) => first_pair(coordinates),
            None => self
                .geometry
                .get("geometries")
                .and_then(Value::as_array)
                .and_then(|geometries| geometries.first())
                .and_then(|geometry| geometry.get("coordinates"))
                .and_then(first_pair),
        }
    }
}

fn first_pair(value: &Value) -> Option<LngLat> {
    let items = value.as_array()?;
    let head = items.first()?;
    match (head.as_f64(), items.get(1).and_then(Value::as_f64)) {
        (Some(lng), Some(lat)) => Some(LngLat { lng, lat }),
        _ => first_pair(head),
    }
}

/// Text for a feature attribute value: strings verbatim, integral numbers without a
/// fractional part, `null` as empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.to_string()
            } else if let Some(uint) = number.as_u64() {
                uint.to_string()
            } else {
                // f64 Display drops a trailing ".0" and never switches to exponent form
                number.as_f64().map(|float| float.to_string()).unwrap_or_default()
            }
        }
        other => other.to_string(),
    }
}

// ===== POPUP TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PopupField {
    pub label: String,
    pub property: String,
}

/// Where a feature popup is attached.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PopupAnchor {
    /// Geographic coordinate of the click.
    #[default]
    Cursor,
    /// First coordinate pair of the clicked feature's geometry.
    Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupTable {
    rows: Vec<(String, String)>,
}

impl PopupTable {
    pub fn from_attributes(fields: &[PopupField], attributes: &FeatureAttributes) -> Self {
        Self {
            rows: fields
                .iter()
                .map(|field| (field.label.clone(), attributes.display(&field.property)))
                .collect(),
        }
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<table>");
        for (label, value) in &self.rows {
            html.push_str("<tr><td>");
            html.push_str(&v_htmlescape::escape(label).to_string());
            html.push_str("</td><td>");
            html.push_str(&v_htmlescape::escape(value).to_string());
            html.push_str("</td></tr>");
        }
        html.push_str("</table>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(value: Value) -> FeatureAttributes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_year_sequence_canonical_lookup() {
        let years = YearSequence::new(2002, 2021).unwrap();
        assert_eq!(years.len(), 20);
        assert_eq!(years.first(), Year(2002));
        assert_eq!(years.last(), Year(2021));
        for year in years.iter() {
            assert_eq!(years.canonical(year), Some(year));
        }
        assert_eq!(years.index_of(Year(2015)), Some(13));
        assert_eq!(years.canonical(Year(2001)), None);
        assert_eq!(years.canonical(Year(2022)), None);
    }

    #[test]
    fn test_year_sequence_rejects_reversed_range() {
        assert!(matches!(
            YearSequence::new(2021, 2002),
            Err(ConfigError::EmptyYearRange { first: 2021, last: 2002 })
        ));
        let single = YearSequence::new(2001, 2001).unwrap();
        assert_eq!(single.first(), single.last());
    }

    #[test]
    fn test_year_sequence_rejects_oversized_range() {
        assert!(matches!(
            YearSequence::new(i32::MIN, i32::MAX),
            Err(ConfigError::YearRangeTooWide { .. })
        ));
        assert!(matches!(
            YearSequence::new(1000, 2000),
            Err(ConfigError::YearRangeTooWide { first: 1000, last: 2000 })
        ));
        assert_eq!(YearSequence::new(1001, 2000).unwrap().len(), 1000);
    }

    #[test]
    fn test_year_filter_expression() {
        let filter = LayerFilter::year_equals(Year(2002));
        assert_eq!(filter.to_expression(), json!(["==", "year", 2002]));
        assert_eq!(
            serde_json::to_string(&filter.to_expression()).unwrap(),
            r#"["==","year",2002]"#
        );
    }

    #[test]
    fn test_visibility_toggle_and_serde() {
        assert_eq!(Visibility::Visible.toggled(), Visibility::Hidden);
        assert_eq!(Visibility::Hidden.toggled().toggled(), Visibility::Hidden);
        assert_eq!(serde_json::to_value(Visibility::Hidden).unwrap(), json!("none"));
        assert_eq!(Visibility::from_layout_value("visible"), Some(Visibility::Visible));
        assert_eq!(Visibility::from_layout_value(""), None);
        assert_eq!(Visibility::Visible.control_class(), "active");
        assert_eq!(Visibility::Hidden.control_class(), "");
    }

    #[test]
    fn test_display_value_rules() {
        assert_eq!(display_value(&json!("ACME CORP")), "ACME CORP");
        assert_eq!(display_value(&json!(1000000)), "1000000");
        assert_eq!(display_value(&json!(1000000.0)), "1000000");
        assert_eq!(display_value(&json!(1234.5)), "1234.5");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!(true)), "true");
    }

    #[test]
    fn test_missing_attribute_renders_empty() {
        let attrs = attributes(json!({ "ownername": "ACME CORP" }));
        assert_eq!(attrs.display("ownername"), "ACME CORP");
        assert_eq!(attrs.display("bldgarea"), "");
    }

    #[test]
    fn test_popup_table_html() {
        let fields = vec![
            PopupField { label: "Owner".into(), property: "ownername".into() },
            PopupField { label: "Estimated assessed value".into(), property: "assessed_adj".into() },
            PopupField { label: "Building sq. ft.".into(), property: "bldgarea".into() },
        ];
        let attrs = attributes(json!({ "ownername": "ACME & SONS", "assessed_adj": 1000000 }));
        let table = PopupTable::from_attributes(&fields, &attrs);

        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[2], ("Building sq. ft.".to_string(), String::new()));
        assert_eq!(
            table.to_html(),
            "<table><tr><td>Owner</td><td>ACME &amp; SONS</td></tr>\
             <tr><td>Estimated assessed value</td><td>1000000</td></tr>\
             <tr><td>Building sq. ft.</td><td></td></tr></table>"
        );
    }

    #[test]
    fn test_first_coordinate_of_nested_geometries() {
        let point = RenderedFeature {
            geometry: json!({ "type": "Point", "coordinates": [-73.99, 40.73] }),
            ..Default::default()
        };
        assert_eq!(point.first_coordinate(), Some(LngLat { lng: -73.99, lat: 40.73 }));

        let polygon = RenderedFeature {
            geometry: json!({
                "type": "MultiPolygon",
                "coordinates": [[[[-73.5, 40.5], [-73.6, 40.6], [-73.5, 40.5]]]]
            }),
            ..Default::default()
        };
        assert_eq!(polygon.first_coordinate(), Some(LngLat { lng: -73.5, lat: 40.5 }));

        let empty = RenderedFeature::default();
        assert_eq!(empty.first_coordinate(), None);
    }
}
