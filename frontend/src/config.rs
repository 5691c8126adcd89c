//! Map variant selection for the page.

use shared::{ConfigError, MapConfig, MapVariant};

pub const VARIANT_QUERY_PARAM: &str = "variant";

/// Loads the bundled configuration and picks the variant named in the page URL.
pub fn load_variant() -> Result<MapVariant, ConfigError> {
    let config = MapConfig::embedded()?;
    select_variant(&config, requested_variant().as_deref())
}

/// The requested variant, or the default one when the request is absent or unknown.
pub fn select_variant(
    config: &MapConfig,
    requested: Option<&str>,
) -> Result<MapVariant, ConfigError> {
    if let Some(id) = requested {
        if config.variant(id).is_none() {
            log::warn!(
                "unknown map variant '{id}', using '{}'",
                config.default_variant
            );
        }
    }
    config
        .variant_or_default(requested)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownDefaultVariant(config.default_variant.clone()))
}

fn requested_variant() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    web_sys::UrlSearchParams::new_with_str(&search)
        .ok()?
        .get(VARIANT_QUERY_PARAM)
        .filter(|id| !id.is_empty())
}
