//! Page monitor: the guard that runs in every page.

mod monitor;
mod url_watch;

pub use monitor::{Overlay, PageEffect, PageMonitor};
pub use url_watch::{UrlChange, UrlSource, UrlWatcher};
