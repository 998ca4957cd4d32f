use axum::response::Html;

use novelsum_core::{Config, SummaryParams};

const INDEX_HTML: &str = include_str!("../../../templates/index.html");

/// Render the index page with slider bounds and defaults filled in.
pub fn render_index(config: &Config) -> Html<String> {
    let defaults = config.default_params;
    let html = INDEX_HTML
        .replace("{{ min_max_length }}", &SummaryParams::MIN_MAX_LENGTH.to_string())
        .replace("{{ max_max_length }}", &SummaryParams::MAX_MAX_LENGTH.to_string())
        .replace("{{ max_length }}", &defaults.max_length.to_string())
        .replace("{{ min_ratio }}", &SummaryParams::MIN_RATIO.to_string())
        .replace("{{ max_ratio }}", &SummaryParams::MAX_RATIO.to_string())
        .replace("{{ ratio_step }}", &SummaryParams::RATIO_STEP.to_string())
        .replace("{{ ratio }}", &defaults.ratio.to_string())
        .replace("{{ model }}", &html_escape(&config.model));
    Html(html)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
