use map_controls::{DomError, DomSurface, LinkSpec};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

/// The live page document behind the [`DomSurface`] facade.
pub struct BrowserDom {
    document: Document,
}

impl BrowserDom {
    pub fn new() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DomError::MissingElement("document".to_string()))?;
        Ok(Self { document })
    }

    fn element(&self, id: &str) -> Result<Element, DomError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| DomError::MissingElement(id.to_string()))
    }
}

impl DomSurface for BrowserDom {
    fn element_exists(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_text(&self, id: &str, text: &str) -> Result<(), DomError> {
        self.element(id)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_class(&self, id: &str, class: &str) -> Result<(), DomError> {
        self.element(id)?.set_class_name(class);
        Ok(())
    }

    fn append_link(
        &self,
        parent_id: &str,
        link: &LinkSpec,
        mut on_click: Box<dyn FnMut()>,
    ) -> Result<(), DomError> {
        let parent = self.element(parent_id)?;
        let create_error = |error: JsValue| DomError::Create {
            id: link.id.clone(),
            message: format!("{error:?}"),
        };

        let anchor = self.document.create_element("a").map_err(create_error)?;
        anchor.set_id(&link.id);
        anchor.set_attribute("href", "#").map_err(create_error)?;
        anchor.set_class_name(&link.class);
        anchor.set_text_content(Some(&link.text));

        let click_closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            event.prevent_default();
            event.stop_propagation();
            on_click();
        }) as Box<dyn FnMut(_)>);
        anchor
            .add_event_listener_with_callback("click", click_closure.as_ref().unchecked_ref())
            .map_err(create_error)?;
        click_closure.forget();

        parent.append_child(&anchor).map_err(create_error)?;
        Ok(())
    }
}
