use shared::{MapVariant, ToggleLayerDescriptor, Visibility};

use crate::surface::{DomSurface, LinkSpec, MapSurface, element_ids};

/// Builds the click handler for one menu control from its layer id.
pub type ClickHandlerFactory<'a> = dyn Fn(&str) -> Box<dyn FnMut()> + 'a;

/// One menu control per toggleable layer, each flipping that layer's visibility.
#[derive(Debug, Clone)]
pub struct LayerToggleManager {
    descriptors: Vec<ToggleLayerDescriptor>,
}

impl LayerToggleManager {
    pub fn new(variant: &MapVariant) -> Self {
        Self {
            descriptors: variant.toggle_descriptors(),
        }
    }

    pub fn descriptors(&self) -> &[ToggleLayerDescriptor] {
        &self.descriptors
    }

    /// Creates the missing menu controls. Safe to call on every idle event.
    ///
    /// Nothing happens until the primary layer is on the map. Returns how many
    /// controls were created by this call.
    pub fn provision(
        &self,
        map: &dyn MapSurface,
        dom: &dyn DomSurface,
        on_click: &ClickHandlerFactory<'_>,
    ) -> usize {
        let Some(primary) = self.descriptors.first() else {
            return 0;
        };
        if !map.has_layer(&primary.layer_id) {
            return 0;
        }

        let mut created = 0;
        for descriptor in &self.descriptors {
            if dom.element_exists(&descriptor.layer_id) {
                continue;
            }
            let visibility = map
                .layout_visibility(&descriptor.layer_id)
                .unwrap_or(descriptor.initial_visibility);
            let link = LinkSpec {
                id: descriptor.layer_id.clone(),
                text: descriptor.label.clone(),
                class: visibility.control_class().to_string(),
            };
            match dom.append_link(element_ids::MENU, &link, on_click(&descriptor.layer_id)) {
                Ok(()) => created += 1,
                Err(error) => log::warn!("menu control for '{}' not created: {error}", link.id),
            }
        }
        if created > 0 {
            log::debug!("created {created} layer menu controls");
        }
        created
    }

    /// Flips the layer between visible and hidden and mirrors the state on its control.
    ///
    /// An unset or unknown layout value counts as hidden, so the layer becomes visible.
    pub fn toggle(
        &self,
        map: &dyn MapSurface,
        dom: &dyn DomSurface,
        layer_id: &str,
    ) -> Option<Visibility> {
        if !map.has_layer(layer_id) {
            log::warn!("cannot toggle layer '{layer_id}', it is not on the map");
            return None;
        }
        let next = match map.layout_visibility(layer_id) {
            Some(Visibility::Visible) => Visibility::Hidden,
            _ => Visibility::Visible,
        };
        if let Err(error) = map.set_layout_visibility(layer_id, next) {
            log::warn!("{error}");
            return None;
        }
        if let Err(error) = dom.set_class(layer_id, next.control_class()) {
            log::warn!("menu control for '{layer_id}' not updated: {error}");
        }
        Some(next)
    }
}
