//! In-memory map and page used by the controller tests.

use indexmap::IndexMap;
use serde_json::Value;
use shared::{
    LayerFilter, LayerSpec, LngLat, MapConfig, MapVariant, RenderedFeature, SourceSpec, Visibility,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::feature_popup::RenderedPopup;
use crate::surface::{DomError, DomSurface, LinkSpec, MapError, MapSurface, element_ids};

pub fn variant(id: &str) -> MapVariant {
    MapConfig::embedded().unwrap().variant(id).unwrap().clone()
}

pub fn combined_variant() -> MapVariant {
    variant("combined")
}

pub fn feature(properties: Value) -> RenderedFeature {
    RenderedFeature {
        properties: serde_json::from_value(properties).unwrap(),
        geometry: Value::Null,
    }
}

pub fn ignore_clicks(_layer_id: &str) -> Box<dyn FnMut()> {
    Box::new(|| {})
}

// ===== MAP =====

#[derive(Debug, Default)]
struct FakeLayer {
    visibility: Option<Visibility>,
    filter: Option<Value>,
}

#[derive(Debug, Default)]
struct MapState {
    sources: Vec<String>,
    layers: IndexMap<String, FakeLayer>,
    rejected_layers: HashSet<String>,
    filter_calls: Vec<String>,
    rendered: HashMap<String, Vec<RenderedFeature>>,
    tiles_loaded: bool,
    popups: Vec<RenderedPopup>,
    cursor: String,
}

/// Clones share state, so a test can keep a handle after moving one into a viewer.
#[derive(Debug, Clone, Default)]
pub struct FakeMap {
    state: Rc<RefCell<MapState>>,
}

impl FakeMap {
    /// A map that already carries every layer of `variant`.
    pub fn with_variant_layers(variant: &MapVariant) -> Self {
        let map = Self::default();
        for layer in &variant.layers {
            map.add_layer(layer).unwrap();
        }
        map
    }

    pub fn reject_layer(&self, layer_id: &str) {
        self.state.borrow_mut().rejected_layers.insert(layer_id.to_string());
    }

    pub fn clear_layout_visibility(&self, layer_id: &str) {
        if let Some(layer) = self.state.borrow_mut().layers.get_mut(layer_id) {
            layer.visibility = None;
        }
    }

    pub fn set_tiles_loaded(&self, loaded: bool) {
        self.state.borrow_mut().tiles_loaded = loaded;
    }

    pub fn set_rendered(&self, layer_id: &str, features: Vec<RenderedFeature>) {
        self.state.borrow_mut().rendered.insert(layer_id.to_string(), features);
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.state.borrow().sources.clone()
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.state.borrow().layers.keys().cloned().collect()
    }

    pub fn filter(&self, layer_id: &str) -> Option<Value> {
        self.state.borrow().layers.get(layer_id)?.filter.clone()
    }

    pub fn filter_calls(&self) -> Vec<String> {
        self.state.borrow().filter_calls.clone()
    }

    pub fn popups(&self) -> Vec<RenderedPopup> {
        self.state.borrow().popups.clone()
    }

    pub fn cursor(&self) -> String {
        self.state.borrow().cursor.clone()
    }

    fn missing_layer(call: &'static str, layer_id: &str) -> MapError {
        MapError::Call {
            call,
            layer: layer_id.to_string(),
            message: "layer does not exist".to_string(),
        }
    }
}

impl MapSurface for FakeMap {
    fn add_source(&self, source: &SourceSpec) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        if state.sources.contains(&source.id) {
            return Err(MapError::Source {
                id: source.id.clone(),
                message: "source already exists".to_string(),
            });
        }
        state.sources.push(source.id.clone());
        Ok(())
    }

    fn add_layer(&self, layer: &LayerSpec) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        if state.rejected_layers.contains(&layer.id) || state.layers.contains_key(&layer.id) {
            return Err(MapError::Layer {
                id: layer.id.clone(),
                message: "rejected".to_string(),
            });
        }
        state.layers.insert(
            layer.id.clone(),
            FakeLayer {
                visibility: Some(layer.visibility),
                filter: None,
            },
        );
        Ok(())
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.state.borrow().layers.contains_key(layer_id)
    }

    fn set_filter(&self, layer_id: &str, filter: &LayerFilter) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        let layer = state
            .layers
            .get_mut(layer_id)
            .ok_or_else(|| Self::missing_layer("setFilter", layer_id))?;
        layer.filter = Some(filter.to_expression());
        state.filter_calls.push(layer_id.to_string());
        Ok(())
    }

    fn layout_visibility(&self, layer_id: &str) -> Option<Visibility> {
        self.state.borrow().layers.get(layer_id)?.visibility
    }

    fn set_layout_visibility(&self, layer_id: &str, visibility: Visibility) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        let layer = state
            .layers
            .get_mut(layer_id)
            .ok_or_else(|| Self::missing_layer("setLayoutProperty", layer_id))?;
        layer.visibility = Some(visibility);
        Ok(())
    }

    fn query_rendered_features(&self, layer_ids: &[&str]) -> Vec<RenderedFeature> {
        let state = self.state.borrow();
        layer_ids
            .iter()
            .filter(|id| state.layers.contains_key(**id))
            .filter_map(|id| state.rendered.get(*id))
            .flatten()
            .cloned()
            .collect()
    }

    fn are_tiles_loaded(&self) -> bool {
        self.state.borrow().tiles_loaded
    }

    fn show_popup(&self, at: LngLat, html: &str) -> Result<(), MapError> {
        self.state.borrow_mut().popups.push(RenderedPopup {
            at,
            html: html.to_string(),
        });
        Ok(())
    }

    fn set_cursor(&self, cursor: &str) {
        self.state.borrow_mut().cursor = cursor.to_string();
    }
}

// ===== PAGE =====

#[derive(Debug, Default, Clone)]
struct FakeElement {
    parent: Option<String>,
    text: String,
    class: String,
}

#[derive(Default)]
struct DomState {
    elements: IndexMap<String, FakeElement>,
    click_handlers: HashMap<String, Box<dyn FnMut()>>,
}

#[derive(Clone, Default)]
pub struct FakeDom {
    state: Rc<RefCell<DomState>>,
}

impl FakeDom {
    /// The elements the page skeleton renders.
    pub fn page() -> Self {
        let dom = Self::default();
        {
            let mut state = dom.state.borrow_mut();
            for id in [
                element_ids::MAP,
                element_ids::YEAR_LABEL,
                element_ids::SLIDER,
                element_ids::MENU,
                element_ids::TAX_VALUE,
                element_ids::TAX_TITLE,
            ] {
                state.elements.insert(id.to_string(), FakeElement::default());
            }
        }
        dom
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.state.borrow().elements.get(id).map(|element| element.text.clone())
    }

    pub fn class(&self, id: &str) -> Option<String> {
        self.state.borrow().elements.get(id).map(|element| element.class.clone())
    }

    /// Links appended to `parent_id`, in insertion order.
    pub fn links(&self, parent_id: &str) -> Vec<LinkSpec> {
        self.state
            .borrow()
            .elements
            .iter()
            .filter(|(_, element)| element.parent.as_deref() == Some(parent_id))
            .map(|(id, element)| LinkSpec {
                id: id.clone(),
                text: element.text.clone(),
                class: element.class.clone(),
            })
            .collect()
    }

    /// Runs the click handler of `id`. Returns false when the element has none.
    pub fn click(&self, id: &str) -> bool {
        let handler = self.state.borrow_mut().click_handlers.remove(id);
        let Some(mut handler) = handler else {
            return false;
        };
        handler();
        self.state
            .borrow_mut()
            .click_handlers
            .insert(id.to_string(), handler);
        true
    }

    fn with_element<T>(
        &self,
        id: &str,
        update: impl FnOnce(&mut FakeElement) -> T,
    ) -> Result<T, DomError> {
        let mut state = self.state.borrow_mut();
        let element = state
            .elements
            .get_mut(id)
            .ok_or_else(|| DomError::MissingElement(id.to_string()))?;
        Ok(update(element))
    }
}

impl DomSurface for FakeDom {
    fn element_exists(&self, id: &str) -> bool {
        self.state.borrow().elements.contains_key(id)
    }

    fn set_text(&self, id: &str, text: &str) -> Result<(), DomError> {
        self.with_element(id, |element| element.text = text.to_string())
    }

    fn set_class(&self, id: &str, class: &str) -> Result<(), DomError> {
        self.with_element(id, |element| element.class = class.to_string())
    }

    fn append_link(
        &self,
        parent_id: &str,
        link: &LinkSpec,
        on_click: Box<dyn FnMut()>,
    ) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if !state.elements.contains_key(parent_id) {
            return Err(DomError::MissingElement(parent_id.to_string()));
        }
        if state.elements.contains_key(&link.id) {
            return Err(DomError::Create {
                id: link.id.clone(),
                message: "duplicate id".to_string(),
            });
        }
        state.elements.insert(
            link.id.clone(),
            FakeElement {
                parent: Some(parent_id.to_string()),
                text: link.text.clone(),
                class: link.class.clone(),
            },
        );
        state.click_handlers.insert(link.id.clone(), on_click);
        Ok(())
    }
}
