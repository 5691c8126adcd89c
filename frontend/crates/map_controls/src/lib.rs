//! Map page controllers: year filter, layer menu, tax readout and feature popups.
//!
//! Everything here talks to the map and the page through [`MapSurface`] and
//! [`DomSurface`], so it runs and tests natively. Logging goes through the `log`
//! facade; the frontend installs a browser console logger.

mod feature_popup;
mod layer_toggle;
mod surface;
mod tax_readout;
mod viewer;
mod year_filter;

#[cfg(test)]
mod testing;

pub use feature_popup::{DEFAULT_CURSOR, FeaturePopupRenderer, POINTER_CURSOR, RenderedPopup};
pub use layer_toggle::{ClickHandlerFactory, LayerToggleManager};
pub use surface::{ClickEvent, DomError, DomSurface, LinkSpec, MapError, MapSurface, element_ids};
pub use tax_readout::{ReadoutUpdate, TaxReadout};
pub use viewer::{MapViewer, ToggleSink, ViewerStatus};
pub use year_filter::{UNRESOLVED_YEAR_LABEL, YearFilterController};
