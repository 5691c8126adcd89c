use map_controls::element_ids;
use shared::MapVariant;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use zoon::*;

use crate::app::MapViewerApp;
use crate::dataflow::Relay;

const PANEL_BACKGROUND: &str = "rgba(255, 255, 255, 0.92)";
const PANEL_WIDTH: u32 = 320;

pub fn root(app: &MapViewerApp) -> impl Element {
    let has_menu = !app.variant.toggle_descriptors().is_empty();
    Stack::new()
        .s(Height::screen())
        .s(Width::fill())
        .s(Font::new().family([
            FontFamily::new("Open Sans"),
            FontFamily::new("system-ui"),
            FontFamily::new("Arial"),
            FontFamily::SansSerif,
        ]))
        .layer(map_container(app.map_container_inserted_relay.clone()))
        .layer(console_panel(app))
        .layer(has_menu.then(layer_menu))
}

/// Full-screen element the map library renders into.
fn map_container(map_container_inserted_relay: Relay<()>) -> impl Element {
    El::new()
        .s(Width::fill())
        .s(Height::fill())
        .update_raw_el(|raw_el| raw_el.attr("id", element_ids::MAP))
        .after_insert(move |_| map_container_inserted_relay.send(()))
}

fn console_panel(app: &MapViewerApp) -> impl Element {
    let variant = &app.variant;
    let has_readout = variant.tax_readout.is_some();
    Column::new()
        .s(Align::new().top().left())
        .s(Width::exact(PANEL_WIDTH))
        .s(Padding::all(12))
        .s(Gap::new().y(8))
        .s(Background::new().color(PANEL_BACKGROUND))
        .s(RoundedCorners::all(4))
        .update_raw_el(|raw_el| raw_el.style("margin", "12px"))
        .item(
            El::new()
                .s(Font::new().size(18).weight(FontWeight::Bold))
                .child(variant.title.clone()),
        )
        .item(
            Row::new()
                .s(Gap::new().x(6))
                .item(El::new().s(Font::new().size(14)).child("Year:"))
                .item(
                    RawHtmlEl::new("label")
                        .attr("id", element_ids::YEAR_LABEL)
                        .style("font-weight", "bold"),
                ),
        )
        .item(year_slider(variant, app.year_slider_input_relay.clone()))
        .item(has_readout.then(tax_readout))
        .item(loading_indicator(app))
}

/// Range input over the variant's years. Each `input` event forwards the raw value.
fn year_slider(variant: &MapVariant, year_slider_input_relay: Relay<String>) -> RawHtmlEl {
    let (min, max, initial) = variant.slider_bounds();
    let raw_el = RawHtmlEl::new("input")
        .attr("id", element_ids::SLIDER)
        .attr("type", "range")
        .attr("min", &min.to_string())
        .attr("max", &max.to_string())
        .attr("step", "1")
        .attr("value", &initial.to_string())
        .style("width", "100%");

    let input_closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let input = event
            .target()
            .and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok());
        if let Some(input) = input {
            year_slider_input_relay.send(input.value());
        }
    }) as Box<dyn FnMut(_)>);
    if let Err(error) = raw_el
        .dom_element()
        .add_event_listener_with_callback("input", input_closure.as_ref().unchecked_ref())
    {
        zoon::eprintln!("year slider listener not attached: {error:?}");
    }
    input_closure.forget();
    raw_el
}

fn tax_readout() -> impl Element {
    Column::new()
        .item(
            RawHtmlEl::new("h3")
                .attr("id", element_ids::TAX_TITLE)
                .style("margin", "0"),
        )
        .item(
            RawHtmlEl::new("p")
                .attr("id", element_ids::TAX_VALUE)
                .style("margin", "0"),
        )
}

/// Container for the layer toggle links, filled in once the map is idle.
fn layer_menu() -> impl Element {
    El::new()
        .s(Align::new().top().right())
        .update_raw_el(|raw_el| raw_el.style("margin", "12px"))
        .child(RawHtmlEl::new("nav").attr("id", element_ids::MENU))
}

fn loading_indicator(app: &MapViewerApp) -> impl Element {
    El::new()
        .s(Font::new().size(12).color("rgb(110, 110, 110)"))
        .child_signal(
            app.status
                .signal()
                .map(|status| (!status.loaded).then_some("Loading map...")),
        )
}
