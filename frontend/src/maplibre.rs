//! MapLibre GL JS behind the [`MapSurface`] facade.

use js_sys::Reflect;
use map_controls::{ClickEvent, MapError, MapSurface};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{
    LayerFilter, LayerSpec, LngLat, MapViewSettings, RenderedFeature, SourceSpec, Visibility,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::dataflow::Relay;

mod ffi {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = maplibregl)]
        pub type Map;

        #[wasm_bindgen(constructor, catch, js_namespace = maplibregl, js_class = "Map")]
        pub fn new(options: &JsValue) -> Result<Map, JsValue>;

        #[wasm_bindgen(method, catch, js_name = addSource)]
        pub fn add_source(this: &Map, id: &str, source: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, catch, js_name = addLayer)]
        pub fn add_layer(this: &Map, layer: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = getLayer)]
        pub fn get_layer(this: &Map, id: &str) -> JsValue;

        #[wasm_bindgen(method, catch, js_name = setFilter)]
        pub fn set_filter(this: &Map, layer: &str, filter: &JsValue) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = getLayoutProperty)]
        pub fn get_layout_property(this: &Map, layer: &str, name: &str) -> JsValue;

        #[wasm_bindgen(method, catch, js_name = setLayoutProperty)]
        pub fn set_layout_property(
            this: &Map,
            layer: &str,
            name: &str,
            value: &JsValue,
        ) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = queryRenderedFeatures)]
        pub fn query_rendered_features(this: &Map, options: &JsValue) -> JsValue;

        #[wasm_bindgen(method, js_name = areTilesLoaded)]
        pub fn are_tiles_loaded(this: &Map) -> bool;

        #[wasm_bindgen(method, js_name = getCanvas)]
        pub fn get_canvas(this: &Map) -> web_sys::HtmlElement;

        #[wasm_bindgen(method)]
        pub fn on(this: &Map, event: &str, listener: &Closure<dyn FnMut(JsValue)>);

        #[wasm_bindgen(method, js_name = on)]
        pub fn on_layer(
            this: &Map,
            event: &str,
            layer: &str,
            listener: &Closure<dyn FnMut(JsValue)>,
        );

        #[wasm_bindgen(js_namespace = maplibregl)]
        pub type Popup;

        #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Popup")]
        pub fn new() -> Popup;

        #[wasm_bindgen(method, js_name = setLngLat)]
        pub fn set_lng_lat(this: &Popup, lng_lat: &JsValue) -> Popup;

        #[wasm_bindgen(method, js_name = setHTML)]
        pub fn set_html(this: &Popup, html: &str) -> Popup;

        #[wasm_bindgen(method, js_name = addTo)]
        pub fn add_to(this: &Popup, map: &Map) -> Popup;
    }
}

/// Where map events are forwarded to.
pub struct MapEventRelays {
    pub map_loaded_relay: Relay<()>,
    pub map_idle_relay: Relay<()>,
    pub source_data_changed_relay: Relay<()>,
    pub feature_clicked_relay: Relay<ClickEvent>,
    pub layer_pointer_entered_relay: Relay<String>,
    pub layer_pointer_left_relay: Relay<String>,
}

pub struct BrowserMap {
    map: ffi::Map,
}

impl BrowserMap {
    /// Creates the map inside the element with id `container`.
    pub fn new(settings: &MapViewSettings, container: &str) -> Result<Self, MapError> {
        if let Some(token) = &settings.access_token {
            set_access_token(token)?;
        }
        let options = to_js("map options", &settings.map_options(container))?;
        let map = ffi::Map::new(&options).map_err(|error| MapError::Library(js_message(&error)))?;
        Ok(Self { map })
    }

    /// Forwards map and per-layer events into `relays`. Listeners stay for the page lifetime.
    pub fn subscribe<'a>(
        &self,
        relays: MapEventRelays,
        popup_layers: impl IntoIterator<Item = &'a str>,
    ) {
        let MapEventRelays {
            map_loaded_relay,
            map_idle_relay,
            source_data_changed_relay,
            feature_clicked_relay,
            layer_pointer_entered_relay,
            layer_pointer_left_relay,
        } = relays;

        self.on("load", move |_| map_loaded_relay.send(()));
        self.on("idle", move |_| map_idle_relay.send(()));
        self.on("sourcedata", move |_| source_data_changed_relay.send(()));

        for layer_id in popup_layers {
            self.on_layer("click", layer_id, {
                let relay = feature_clicked_relay.clone();
                let layer_id = layer_id.to_string();
                move |event| match click_event(&layer_id, &event) {
                    Ok(click) => relay.send(click),
                    Err(error) => log::warn!("{error}"),
                }
            });
            self.on_layer("mouseenter", layer_id, {
                let relay = layer_pointer_entered_relay.clone();
                let layer_id = layer_id.to_string();
                move |_| relay.send(layer_id.clone())
            });
            self.on_layer("mouseleave", layer_id, {
                let relay = layer_pointer_left_relay.clone();
                let layer_id = layer_id.to_string();
                move |_| relay.send(layer_id.clone())
            });
        }
    }

    fn on(&self, event: &str, handler: impl FnMut(JsValue) + 'static) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(handler);
        self.map.on(event, &closure);
        closure.forget();
    }

    fn on_layer(&self, event: &str, layer_id: &str, handler: impl FnMut(JsValue) + 'static) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(handler);
        self.map.on_layer(event, layer_id, &closure);
        closure.forget();
    }
}

impl MapSurface for BrowserMap {
    fn add_source(&self, source: &SourceSpec) -> Result<(), MapError> {
        let descriptor = to_js("source", &source.descriptor())?;
        self.map
            .add_source(&source.id, &descriptor)
            .map_err(|error| MapError::Source {
                id: source.id.clone(),
                message: js_message(&error),
            })
    }

    fn add_layer(&self, layer: &LayerSpec) -> Result<(), MapError> {
        let descriptor = to_js("layer", &layer.descriptor())?;
        self.map
            .add_layer(&descriptor)
            .map_err(|error| MapError::Layer {
                id: layer.id.clone(),
                message: js_message(&error),
            })
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        let layer = self.map.get_layer(layer_id);
        !(layer.is_undefined() || layer.is_null())
    }

    fn set_filter(&self, layer_id: &str, filter: &LayerFilter) -> Result<(), MapError> {
        let expression = to_js("filter", &filter.to_expression())?;
        self.map
            .set_filter(layer_id, &expression)
            .map_err(|error| call_error("setFilter", layer_id, &error))
    }

    fn layout_visibility(&self, layer_id: &str) -> Option<Visibility> {
        self.map
            .get_layout_property(layer_id, "visibility")
            .as_string()
            .and_then(|value| Visibility::from_layout_value(&value))
    }

    fn set_layout_visibility(&self, layer_id: &str, visibility: Visibility) -> Result<(), MapError> {
        self.map
            .set_layout_property(layer_id, "visibility", &JsValue::from_str(visibility.as_str()))
            .map_err(|error| call_error("setLayoutProperty", layer_id, &error))
    }

    fn query_rendered_features(&self, layer_ids: &[&str]) -> Vec<RenderedFeature> {
        let options = match to_js("query options", &serde_json::json!({ "layers": layer_ids })) {
            Ok(options) => options,
            Err(error) => {
                log::warn!("{error}");
                return Vec::new();
            }
        };
        let features = self.map.query_rendered_features(&options);
        from_js("rendered features", features).unwrap_or_else(|error| {
            log::warn!("{error}");
            Vec::new()
        })
    }

    fn are_tiles_loaded(&self) -> bool {
        self.map.are_tiles_loaded()
    }

    fn show_popup(&self, at: LngLat, html: &str) -> Result<(), MapError> {
        let position = to_js("popup position", &at)?;
        ffi::Popup::new()
            .set_lng_lat(&position)
            .set_html(html)
            .add_to(&self.map);
        Ok(())
    }

    fn set_cursor(&self, cursor: &str) {
        if let Err(error) = self.map.get_canvas().style().set_property("cursor", cursor) {
            log::warn!("cursor not set: {}", js_message(&error));
        }
    }
}

fn click_event(layer_id: &str, event: &JsValue) -> Result<ClickEvent, MapError> {
    let lng_lat = Reflect::get(event, &JsValue::from_str("lngLat"))
        .map_err(|error| call_error("click", layer_id, &error))?;
    let features = Reflect::get(event, &JsValue::from_str("features"))
        .map_err(|error| call_error("click", layer_id, &error))?;
    Ok(ClickEvent {
        layer_id: layer_id.to_string(),
        lng_lat: from_js("click position", lng_lat)?,
        features: if features.is_undefined() {
            Vec::new()
        } else {
            from_js("clicked features", features)?
        },
    })
}

fn set_access_token(token: &str) -> Result<(), MapError> {
    let namespace = Reflect::get(&js_sys::global(), &JsValue::from_str("maplibregl"))
        .map_err(|error| MapError::Library(js_message(&error)))?;
    if namespace.is_undefined() {
        return Err(MapError::Library("maplibregl is not loaded".to_string()));
    }
    Reflect::set(&namespace, &JsValue::from_str("accessToken"), &JsValue::from_str(token))
        .map(|_| ())
        .map_err(|error| MapError::Library(js_message(&error)))
}

fn to_js(what: &'static str, value: &impl Serialize) -> Result<JsValue, MapError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|error| MapError::Encode {
            what,
            message: error.to_string(),
        })
}

fn from_js<T: DeserializeOwned>(what: &'static str, value: JsValue) -> Result<T, MapError> {
    serde_wasm_bindgen::from_value(value).map_err(|error| MapError::Encode {
        what,
        message: error.to_string(),
    })
}

fn call_error(call: &'static str, layer_id: &str, error: &JsValue) -> MapError {
    MapError::Call {
        call,
        layer: layer_id.to_string(),
        message: js_message(error),
    }
}

fn js_message(error: &JsValue) -> String {
    error
        .dyn_ref::<js_sys::Error>()
        .map(|error| String::from(error.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"))
}
