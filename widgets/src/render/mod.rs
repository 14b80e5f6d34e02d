pub mod info_panel;
pub mod online_list;
pub mod sidebar;

use std::time::Duration;

use chrono::{DateTime, Local};
use otstatus_shared::StatusPayload;

use crate::dom::Element;

pub use info_panel::ServerInfoPanel;
pub use online_list::OnlinePlayers;
pub use sidebar::SidebarStatus;

/// A widget type: where it lives on the page, how often it would like to poll, and how
/// it turns a payload into text.
///
/// `render` only touches `root`, and calling it twice with the same payload and clock
/// leaves `root` unchanged the second time.
pub trait WidgetRenderer: Send + Sync + 'static {
    fn kind(&self) -> &'static str;

    fn default_element_id(&self) -> &'static str;

    fn default_endpoint(&self) -> &'static str;

    fn default_interval(&self) -> Duration;

    /// An empty hosting element with every slot this widget writes.
    fn template(&self, id: &str) -> Element;

    fn render(&self, root: &mut Element, payload: &StatusPayload, now: DateTime<Local>);
}

pub(crate) fn status_text(online: bool) -> &'static str {
    if online { "ONLINE" } else { "OFFLINE" }
}

pub(crate) fn clock_text(now: DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

pub(crate) fn rate_text(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |rate| rate.to_string())
}

pub(crate) fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
