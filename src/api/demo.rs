//! Browser demo page served on `/`

/// Self-contained HTML page that posts to `/remove-bg`
pub const DEMO_PAGE: &str = include_str!("../../static/index.html");
