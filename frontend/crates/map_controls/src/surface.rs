//! Facades over the map library and the page DOM.
//!
//! The controllers only ever talk to these traits. The browser build implements them
//! with MapLibre and `web-sys`; tests implement them with in-memory fakes.

use shared::{LayerFilter, LayerSpec, LngLat, RenderedFeature, SourceSpec, Visibility};

/// Ids of the page elements the controllers write to.
pub mod element_ids {
    pub const MAP: &str = "map";
    pub const YEAR_LABEL: &str = "year";
    pub const SLIDER: &str = "slider";
    pub const MENU: &str = "menu";
    pub const TAX_VALUE: &str = "tax_calc";
    pub const TAX_TITLE: &str = "tax_calc_title";
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("map library unavailable: {0}")]
    Library(String),
    #[error("map rejected source '{id}': {message}")]
    Source { id: String, message: String },
    #[error("map rejected layer '{id}': {message}")]
    Layer { id: String, message: String },
    #[error("map call '{call}' failed for layer '{layer}': {message}")]
    Call {
        call: &'static str,
        layer: String,
        message: String,
    },
    #[error("failed to encode {what} for the map: {message}")]
    Encode { what: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("element '#{0}' not found")]
    MissingElement(String),
    #[error("failed to create element '#{id}': {message}")]
    Create { id: String, message: String },
}

/// Operations the controllers need from the map library.
pub trait MapSurface {
    fn add_source(&self, source: &SourceSpec) -> Result<(), MapError>;
    fn add_layer(&self, layer: &LayerSpec) -> Result<(), MapError>;
    fn has_layer(&self, layer_id: &str) -> bool;
    fn set_filter(&self, layer_id: &str, filter: &LayerFilter) -> Result<(), MapError>;
    /// Current layout `visibility`; `None` when unset or unrecognised.
    fn layout_visibility(&self, layer_id: &str) -> Option<Visibility>;
    fn set_layout_visibility(&self, layer_id: &str, visibility: Visibility)
    -> Result<(), MapError>;
    fn query_rendered_features(&self, layer_ids: &[&str]) -> Vec<RenderedFeature>;
    fn are_tiles_loaded(&self) -> bool;
    fn show_popup(&self, at: LngLat, html: &str) -> Result<(), MapError>;
    fn set_cursor(&self, cursor: &str);
}

/// Anchor element for the layer menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub id: String,
    pub text: String,
    pub class: String,
}

/// Operations the controllers need from the page.
pub trait DomSurface {
    fn element_exists(&self, id: &str) -> bool;
    fn set_text(&self, id: &str, text: &str) -> Result<(), DomError>;
    fn set_class(&self, id: &str, class: &str) -> Result<(), DomError>;
    /// Appends an `<a href="#">` to `parent_id`. Clicks call `on_click` and do not navigate.
    fn append_link(
        &self,
        parent_id: &str,
        link: &LinkSpec,
        on_click: Box<dyn FnMut()>,
    ) -> Result<(), DomError>;
}

/// A click on a rendered layer, as delivered by the map library.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub layer_id: String,
    pub lng_lat: LngLat,
    /// Features under the pointer, topmost first.
    pub features: Vec<RenderedFeature>,
}
