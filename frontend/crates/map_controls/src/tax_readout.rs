use shared::{TaxReadoutSpec, Visibility, Year};

use crate::surface::{DomSurface, MapSurface, element_ids};

/// What a [`TaxReadout::refresh`] call did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadoutUpdate {
    /// Preconditions not met; the readout was left as it was.
    Skipped,
    Cleared,
    Shown(String),
}

/// Shows a value from the first rendered feature of one layer, e.g. estimated taxes.
#[derive(Debug, Clone)]
pub struct TaxReadout {
    spec: TaxReadoutSpec,
}

impl TaxReadout {
    pub fn new(spec: TaxReadoutSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &TaxReadoutSpec {
        &self.spec
    }

    pub fn refresh(
        &self,
        map: &dyn MapSurface,
        dom: &dyn DomSurface,
        displayed_year: Option<Year>,
    ) -> ReadoutUpdate {
        if !map.has_layer(&self.spec.layer) || !map.are_tiles_loaded() {
            return ReadoutUpdate::Skipped;
        }

        if displayed_year.is_some_and(|year| self.spec.skips(year)) {
            return self.clear(dom);
        }

        if map.layout_visibility(&self.spec.layer) != Some(Visibility::Visible) {
            return self.clear(dom);
        }

        let features = map.query_rendered_features(&[self.spec.layer.as_str()]);
        let Some(first) = features.first() else {
            log::trace!("no rendered features on '{}'", self.spec.layer);
            return ReadoutUpdate::Skipped;
        };
        let value = first.properties.display(&self.spec.property);
        self.write(dom, &value, &self.spec.title);
        ReadoutUpdate::Shown(value)
    }

    fn clear(&self, dom: &dyn DomSurface) -> ReadoutUpdate {
        self.write(dom, "", "");
        ReadoutUpdate::Cleared
    }

    fn write(&self, dom: &dyn DomSurface, value: &str, title: &str) {
        for (id, text) in [(element_ids::TAX_VALUE, value), (element_ids::TAX_TITLE, title)] {
            if let Err(error) = dom.set_text(id, text) {
                log::warn!("tax readout not updated: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDom, FakeMap, combined_variant, feature};
    use serde_json::json;

    fn readout() -> TaxReadout {
        TaxReadout::new(combined_variant().tax_readout.unwrap())
    }

    fn loaded_map() -> FakeMap {
        let map = FakeMap::with_variant_layers(&combined_variant());
        map.set_tiles_loaded(true);
        map.set_rendered(
            "nyu_poly",
            vec![
                feature(json!({ "taxes_yr": 125000.5 })),
                feature(json!({ "taxes_yr": 99 })),
            ],
        );
        map
    }

    #[test]
    fn test_visible_layer_shows_first_feature() {
        let map = loaded_map();
        let dom = FakeDom::page();

        let update = readout().refresh(&map, &dom, Some(Year(2015)));

        assert_eq!(update, ReadoutUpdate::Shown("125000.5".to_string()));
        assert_eq!(dom.text(element_ids::TAX_VALUE).as_deref(), Some("125000.5"));
        assert_eq!(dom.text(element_ids::TAX_TITLE).as_deref(), Some("Estimated taxes"));
    }

    #[test]
    fn test_skip_year_forces_empty_readout() {
        let map = loaded_map();
        let dom = FakeDom::page();
        let readout = readout();
        readout.refresh(&map, &dom, Some(Year(2015)));

        assert_eq!(readout.refresh(&map, &dom, Some(Year(2001))), ReadoutUpdate::Cleared);
        assert_eq!(dom.text(element_ids::TAX_VALUE).as_deref(), Some(""));
        assert_eq!(dom.text(element_ids::TAX_TITLE).as_deref(), Some(""));
    }

    #[test]
    fn test_hidden_layer_clears_readout() {
        let map = loaded_map();
        map.set_layout_visibility("nyu_poly", Visibility::Hidden).unwrap();
        let dom = FakeDom::page();
        dom.set_text(element_ids::TAX_VALUE, "stale").unwrap();

        assert_eq!(readout().refresh(&map, &dom, Some(Year(2015))), ReadoutUpdate::Cleared);
        assert_eq!(dom.text(element_ids::TAX_VALUE).as_deref(), Some(""));
    }

    #[test]
    fn test_guards_leave_readout_untouched() {
        let dom = FakeDom::page();
        dom.set_text(element_ids::TAX_VALUE, "42").unwrap();

        let loading = loaded_map();
        loading.set_tiles_loaded(false);
        assert_eq!(readout().refresh(&loading, &dom, Some(Year(2001))), ReadoutUpdate::Skipped);

        let empty = loaded_map();
        empty.set_rendered("nyu_poly", Vec::new());
        assert_eq!(readout().refresh(&empty, &dom, Some(Year(2015))), ReadoutUpdate::Skipped);

        let bare = FakeMap::default();
        bare.set_tiles_loaded(true);
        assert_eq!(readout().refresh(&bare, &dom, Some(Year(2015))), ReadoutUpdate::Skipped);

        assert_eq!(dom.text(element_ids::TAX_VALUE).as_deref(), Some("42"));
    }
}
