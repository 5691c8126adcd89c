use shared::{ConfigError, LayerFilter, MapVariant, SliderMode, Year, YearSequence};

use crate::surface::{DomSurface, MapSurface, element_ids};

/// Label text for a year outside the supported sequence.
pub const UNRESOLVED_YEAR_LABEL: &str = "unknown";

/// Keeps the governed layers' `year` filter and the year label in step with the slider.
#[derive(Debug, Clone)]
pub struct YearFilterController {
    years: YearSequence,
    governed_layers: Vec<String>,
    slider_mode: SliderMode,
    seed: Year,
    displayed: Option<Year>,
}

impl YearFilterController {
    pub fn new(variant: &MapVariant) -> Result<Self, ConfigError> {
        Ok(Self {
            years: variant.year_sequence()?,
            governed_layers: variant.filtered_layers.clone(),
            slider_mode: variant.slider,
            seed: variant.years.seed(),
            displayed: None,
        })
    }

    pub fn years(&self) -> &YearSequence {
        &self.years
    }

    /// Year currently shown in the label; `None` before seeding or when unresolved.
    pub fn displayed_year(&self) -> Option<Year> {
        self.displayed
    }

    pub fn seed(&mut self, map: &dyn MapSurface, dom: &dyn DomSurface) -> Option<Year> {
        self.filter_by(map, dom, self.seed)
    }

    /// Filters every governed layer to `year` and mirrors it into the label.
    ///
    /// The filter is applied even when `year` is not in the sequence; only the label
    /// falls back to [`UNRESOLVED_YEAR_LABEL`].
    pub fn filter_by(
        &mut self,
        map: &dyn MapSurface,
        dom: &dyn DomSurface,
        year: Year,
    ) -> Option<Year> {
        let filter = LayerFilter::year_equals(year);
        for layer_id in &self.governed_layers {
            if let Err(error) = map.set_filter(layer_id, &filter) {
                log::warn!("{error}");
            }
        }

        self.displayed = self.years.canonical(year);
        let label = match self.displayed {
            Some(canonical) => canonical.to_string(),
            None => {
                log::warn!(
                    "year {year} is outside {}..={}, label left unresolved",
                    self.years.first(),
                    self.years.last()
                );
                UNRESOLVED_YEAR_LABEL.to_string()
            }
        };
        if let Err(error) = dom.set_text(element_ids::YEAR_LABEL, &label) {
            log::warn!("year label not updated: {error}");
        }
        self.displayed
    }

    /// Handles the slider's `input` value. Unusable values leave everything unchanged.
    pub fn on_slider_input(
        &mut self,
        map: &dyn MapSurface,
        dom: &dyn DomSurface,
        raw: &str,
    ) -> Option<Year> {
        let Some(year) = self.year_for_slider_value(raw) else {
            return self.displayed;
        };
        self.filter_by(map, dom, year)
    }

    fn year_for_slider_value(&self, raw: &str) -> Option<Year> {
        let value = match raw.trim().parse::<i32>() {
            Ok(value) => value,
            Err(error) => {
                log::warn!("ignoring slider value '{raw}': {error}");
                return None;
            }
        };
        match self.slider_mode {
            SliderMode::Year => Some(Year(value)),
            SliderMode::Index => {
                let year = usize::try_from(value)
                    .ok()
                    .and_then(|index| self.years.get(index));
                if year.is_none() {
                    log::warn!(
                        "ignoring slider index {value}, sequence has {} years",
                        self.years.len()
                    );
                }
                year
            }
        }
    }
}
