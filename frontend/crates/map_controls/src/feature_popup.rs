use shared::{LngLat, PopupAnchor, PopupSpec, PopupTable};

use crate::surface::{ClickEvent, MapSurface};

pub const POINTER_CURSOR: &str = "pointer";
pub const DEFAULT_CURSOR: &str = "";

/// A popup placed on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPopup {
    pub at: LngLat,
    pub html: String,
}

/// Attribute table popup for one clickable layer.
#[derive(Debug, Clone)]
pub struct FeaturePopupRenderer {
    layer_id: String,
    spec: PopupSpec,
}

impl FeaturePopupRenderer {
    pub fn new(layer_id: impl Into<String>, spec: PopupSpec) -> Self {
        Self {
            layer_id: layer_id.into(),
            spec,
        }
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Opens a popup for the topmost clicked feature. A click without features does nothing.
    pub fn on_click(&self, map: &dyn MapSurface, click: &ClickEvent) -> Option<RenderedPopup> {
        let feature = click.features.first()?;
        let table = PopupTable::from_attributes(&self.spec.fields, &feature.properties);
        let at = match self.spec.anchor {
            PopupAnchor::Cursor => click.lng_lat,
            PopupAnchor::Geometry => feature.first_coordinate().unwrap_or(click.lng_lat),
        };
        let popup = RenderedPopup {
            at,
            html: table.to_html(),
        };
        if let Err(error) = map.show_popup(popup.at, &popup.html) {
            log::warn!("popup for '{}' not shown: {error}", self.layer_id);
            return None;
        }
        Some(popup)
    }

    pub fn on_pointer_enter(&self, map: &dyn MapSurface) {
        map.set_cursor(POINTER_CURSOR);
    }

    pub fn on_pointer_leave(&self, map: &dyn MapSurface) {
        map.set_cursor(DEFAULT_CURSOR);
    }
}
