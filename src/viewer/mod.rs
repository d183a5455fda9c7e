pub mod controller;
pub mod render;

use std::time::Duration;

pub use controller::ViewerController;
pub use render::{StatusView, ViewState};

#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub store_key: String,
    /// Records written longer ago than this are shown as stale.
    pub stale_after: Duration,
}
