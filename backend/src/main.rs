use moon::*;
use shared::{MapConfig, UpMsg};

const MAPLIBRE_VERSION: &str = "1.15.2";

// Layer menu links are created by the frontend at runtime, outside zoon's styling.
const MENU_STYLES: &str = r#"
<style>
#menu {
    background: #fff;
    border-radius: 3px;
    width: 160px;
    border: 1px solid rgba(0, 0, 0, 0.4);
    font-family: 'Open Sans', sans-serif;
}
#menu a {
    font-size: 13px;
    color: #404040;
    display: block;
    margin: 0;
    padding: 10px;
    text-decoration: none;
    border-bottom: 1px solid rgba(0, 0, 0, 0.25);
    text-align: center;
}
#menu a:last-child {
    border: none;
}
#menu a:hover {
    background-color: #f8f8f8;
    color: #404040;
}
#menu a.active {
    background-color: #9057ff;
    color: #ffffff;
}
#menu a.active:hover {
    background: #7a45e0;
}
.maplibregl-popup-content td {
    padding: 2px 6px;
}
</style>
"#;

async fn frontend() -> Frontend {
    Frontend::new()
        .title("NYU property map")
        .append_to_head(&maplibre_head())
        .append_to_head(MENU_STYLES)
        .index_by_robots(false)
}

fn maplibre_head() -> String {
    format!(
        r#"<link href="https://unpkg.com/maplibre-gl@{MAPLIBRE_VERSION}/dist/maplibre-gl.css" rel="stylesheet" />
<script src="https://unpkg.com/maplibre-gl@{MAPLIBRE_VERSION}/dist/maplibre-gl.js"></script>"#
    )
}

/// The map page sends nothing upstream; the message type has no values.
async fn up_msg_handler(req: UpMsgRequest<UpMsg>) {
    match req.up_msg {}
}

#[moon::main]
async fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("BACKEND PANIC: {:?}", panic_info);
    }));

    // Refuse to serve a page whose bundled map configuration would not load.
    let config = MapConfig::embedded()
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
    let variants: Vec<&str> = config.variants().iter().map(|variant| variant.id.as_str()).collect();
    println!(
        "Serving map variants {:?} (default '{}')",
        variants, config.default_variant
    );

    start(frontend, up_msg_handler, |_error| {}).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maplibre_head_references_pinned_release() {
        let head = maplibre_head();
        assert!(head.contains("maplibre-gl@1.15.2/dist/maplibre-gl.css"));
        assert!(head.contains("maplibre-gl@1.15.2/dist/maplibre-gl.js"));
    }
}
