#![forbid(unsafe_code)]

pub(crate) const LAYOUT_HTML: &str = include_str!("assets/layout.html");
pub(crate) const APP_CSS: &str = include_str!("assets/app.css");
