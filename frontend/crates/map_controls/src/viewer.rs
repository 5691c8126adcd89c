use indexmap::IndexMap;
use shared::{ConfigError, MapVariant, Visibility, Year};
use std::rc::Rc;

use crate::feature_popup::{FeaturePopupRenderer, RenderedPopup};
use crate::layer_toggle::LayerToggleManager;
use crate::surface::{ClickEvent, DomSurface, MapSurface};
use crate::tax_readout::{ReadoutUpdate, TaxReadout};
use crate::year_filter::YearFilterController;

/// Receives the layer id of a clicked menu control.
pub type ToggleSink = Rc<dyn Fn(&str)>;

/// Snapshot published to the page after every handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewerStatus {
    pub loaded: bool,
    pub year: Option<Year>,
}

/// One map page: its configuration, both surfaces and every controller.
///
/// Each handler runs to completion; the caller feeds events in one at a time.
pub struct MapViewer<M: MapSurface, D: DomSurface> {
    variant: MapVariant,
    map: M,
    dom: D,
    year_filter: YearFilterController,
    layer_toggle: LayerToggleManager,
    tax_readout: Option<TaxReadout>,
    popups: IndexMap<String, FeaturePopupRenderer>,
    toggle_sink: ToggleSink,
    loaded: bool,
    source_data_enabled: bool,
}

impl<M: MapSurface, D: DomSurface> MapViewer<M, D> {
    pub fn new(
        variant: MapVariant,
        map: M,
        dom: D,
        toggle_sink: ToggleSink,
    ) -> Result<Self, ConfigError> {
        variant.validate()?;
        let year_filter = YearFilterController::new(&variant)?;
        let layer_toggle = LayerToggleManager::new(&variant);
        let tax_readout = variant.tax_readout.clone().map(TaxReadout::new);
        let popups = variant
            .popup_layers()
            .map(|(layer, popup)| {
                (
                    layer.id.clone(),
                    FeaturePopupRenderer::new(layer.id.clone(), popup.clone()),
                )
            })
            .collect();
        Ok(Self {
            variant,
            map,
            dom,
            year_filter,
            layer_toggle,
            tax_readout,
            popups,
            toggle_sink,
            loaded: false,
            source_data_enabled: false,
        })
    }

    pub fn variant(&self) -> &MapVariant {
        &self.variant
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Layers that need click and hover subscriptions.
    pub fn popup_layers(&self) -> impl Iterator<Item = &str> {
        self.popups.keys().map(String::as_str)
    }

    pub fn status(&self) -> ViewerStatus {
        ViewerStatus {
            loaded: self.loaded,
            year: self.year_filter.displayed_year(),
        }
    }

    // ----- Map lifecycle -----

    /// Attaches sources and layers, then seeds the year filter.
    ///
    /// A rejected source or layer is logged and the rest are still attempted.
    pub fn on_map_loaded(&mut self) {
        if self.loaded {
            log::debug!("map '{}' already loaded", self.variant.id);
            return;
        }
        for source in &self.variant.sources {
            if let Err(error) = self.map.add_source(source) {
                log::error!("{error}");
            }
        }
        for layer in &self.variant.layers {
            if let Err(error) = self.map.add_layer(layer) {
                log::error!("{error}");
            }
        }
        let year = self.year_filter.seed(&self.map, &self.dom);
        self.loaded = true;
        log::info!(
            "map '{}' loaded with {} layers, year {}",
            self.variant.id,
            self.variant.layers.len(),
            year.map(|year| year.to_string()).unwrap_or_default()
        );
    }

    pub fn on_map_idle(&mut self) {
        let sink = self.toggle_sink.clone();
        let factory = move |layer_id: &str| -> Box<dyn FnMut()> {
            let sink = sink.clone();
            let layer_id = layer_id.to_string();
            Box::new(move || sink(layer_id.as_str()))
        };
        self.layer_toggle.provision(&self.map, &self.dom, &factory);
        self.refresh_tax_readout();
        if !self.source_data_enabled {
            log::debug!("first idle on map '{}', tracking source data", self.variant.id);
            self.source_data_enabled = true;
        }
    }

    pub fn on_source_data(&mut self) -> Option<ReadoutUpdate> {
        if !self.source_data_enabled {
            return None;
        }
        self.refresh_tax_readout()
    }

    fn refresh_tax_readout(&self) -> Option<ReadoutUpdate> {
        let readout = self.tax_readout.as_ref()?;
        let update = readout.refresh(&self.map, &self.dom, self.year_filter.displayed_year());
        log::trace!("tax readout: {update:?}");
        Some(update)
    }

    // ----- User input -----

    pub fn on_slider_input(&mut self, raw: &str) -> Option<Year> {
        if !self.loaded {
            log::debug!("slider moved before map load, ignoring '{raw}'");
            return None;
        }
        self.year_filter.on_slider_input(&self.map, &self.dom, raw)
    }

    pub fn on_toggle_clicked(&mut self, layer_id: &str) -> Option<Visibility> {
        self.layer_toggle.toggle(&self.map, &self.dom, layer_id)
    }

    pub fn on_feature_clicked(&mut self, click: &ClickEvent) -> Option<RenderedPopup> {
        let Some(renderer) = self.popups.get(&click.layer_id) else {
            log::warn!("click on layer '{}' without a popup", click.layer_id);
            return None;
        };
        renderer.on_click(&self.map, click)
    }

    pub fn on_pointer_entered(&mut self, layer_id: &str) {
        if let Some(renderer) = self.popups.get(layer_id) {
            renderer.on_pointer_enter(&self.map);
        }
    }

    pub fn on_pointer_left(&mut self, layer_id: &str) {
        if let Some(renderer) = self.popups.get(layer_id) {
            renderer.on_pointer_leave(&self.map);
        }
    }
}
