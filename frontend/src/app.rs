//! MapViewerApp - browser events in, one viewer actor, page status out

use futures::{StreamExt, select};
use map_controls::{ClickEvent, DomError, MapError, MapViewer, ToggleSink, ViewerStatus, element_ids};
use shared::{ConfigError, MapVariant};
use std::rc::Rc;
use zoon::*;

use crate::browser_dom::BrowserDom;
use crate::dataflow::{Actor, Relay, relay};
use crate::maplibre::{BrowserMap, MapEventRelays};

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

type BrowserViewer = MapViewer<BrowserMap, BrowserDom>;

/// One map page.
#[derive(Clone)]
pub struct MapViewerApp {
    pub variant: MapVariant,

    /// Viewer status after the last handled event
    pub status: Actor<ViewerStatus>,

    // === EVENT-SOURCE RELAYS (page skeleton events) ===
    /// `#map` container attached to the document
    pub map_container_inserted_relay: Relay<()>,

    /// Raw value of the year range input
    pub year_slider_input_relay: Relay<String>,
}

impl MapViewerApp {
    pub fn new(variant: MapVariant) -> Self {
        let (map_container_inserted_relay, mut map_container_inserted_stream) = relay::<()>();
        let (year_slider_input_relay, mut year_slider_input_stream) = relay::<String>();

        let (map_loaded_relay, mut map_loaded_stream) = relay::<()>();
        let (map_idle_relay, mut map_idle_stream) = relay::<()>();
        let (source_data_changed_relay, mut source_data_changed_stream) = relay::<()>();
        let (feature_clicked_relay, mut feature_clicked_stream) = relay::<ClickEvent>();
        let (layer_pointer_entered_relay, mut layer_pointer_entered_stream) = relay::<String>();
        let (layer_pointer_left_relay, mut layer_pointer_left_stream) = relay::<String>();
        let (layer_toggle_clicked_relay, mut layer_toggle_clicked_stream) = relay::<String>();

        let map_events = MapEventRelays {
            map_loaded_relay,
            map_idle_relay,
            source_data_changed_relay,
            feature_clicked_relay,
            layer_pointer_entered_relay,
            layer_pointer_left_relay,
        };

        let status = Actor::new(ViewerStatus::default(), {
            let variant = variant.clone();
            async move |status| {
                // The map needs its container in the document before it can be created
                if map_container_inserted_stream.next().await.is_none() {
                    return;
                }
                let mut viewer = match mount_viewer(variant, map_events, layer_toggle_clicked_relay) {
                    Ok(viewer) => viewer,
                    Err(error) => {
                        log::error!("map viewer not started: {error}");
                        return;
                    }
                };

                loop {
                    select! {
                        event = map_loaded_stream.next() => match event {
                            Some(()) => viewer.on_map_loaded(),
                            None => break,
                        },
                        event = map_idle_stream.next() => match event {
                            Some(()) => viewer.on_map_idle(),
                            None => break,
                        },
                        event = source_data_changed_stream.next() => match event {
                            Some(()) => {
                                viewer.on_source_data();
                            }
                            None => break,
                        },
                        value = year_slider_input_stream.next() => match value {
                            Some(value) => {
                                viewer.on_slider_input(&value);
                            }
                            None => break,
                        },
                        layer_id = layer_toggle_clicked_stream.next() => match layer_id {
                            Some(layer_id) => {
                                viewer.on_toggle_clicked(&layer_id);
                            }
                            None => break,
                        },
                        click = feature_clicked_stream.next() => match click {
                            Some(click) => {
                                viewer.on_feature_clicked(&click);
                            }
                            None => break,
                        },
                        layer_id = layer_pointer_entered_stream.next() => match layer_id {
                            Some(layer_id) => viewer.on_pointer_entered(&layer_id),
                            None => break,
                        },
                        layer_id = layer_pointer_left_stream.next() => match layer_id {
                            Some(layer_id) => viewer.on_pointer_left(&layer_id),
                            None => break,
                        },
                        complete => break,
                    }
                    status.set_neq(viewer.status());
                }
            }
        });

        Self {
            variant,
            status,
            map_container_inserted_relay,
            year_slider_input_relay,
        }
    }

    pub fn root(&self) -> impl Element {
        crate::views::root(self)
    }
}

/// Creates the map in `#map`, wires its events and builds the viewer around it.
fn mount_viewer(
    variant: MapVariant,
    map_events: MapEventRelays,
    layer_toggle_clicked_relay: Relay<String>,
) -> Result<BrowserViewer, StartError> {
    let map = BrowserMap::new(&variant.map, element_ids::MAP)?;
    let dom = BrowserDom::new()?;
    let toggle_sink: ToggleSink =
        Rc::new(move |layer_id: &str| layer_toggle_clicked_relay.send(layer_id.to_string()));

    let viewer = MapViewer::new(variant, map, dom, toggle_sink)?;
    viewer.map().subscribe(map_events, viewer.popup_layers());
    log::info!("map viewer '{}' mounted", viewer.variant().id);
    Ok(viewer)
}
