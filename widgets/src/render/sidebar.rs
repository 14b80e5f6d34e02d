use std::time::Duration;

use chrono::{DateTime, Local};
use otstatus_shared::{PlayerCounts, StatusPayload};

use super::{WidgetRenderer, clock_text, status_text};
use crate::config::{SIDEBAR_POLL_INTERVAL_SECS, STATUS_PATH};
use crate::dom::Element;

/// Compact sidebar box: status, players online, record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidebarStatus;

impl WidgetRenderer for SidebarStatus {
    fn kind(&self) -> &'static str {
        "sidebar-status"
    }

    fn default_element_id(&self) -> &'static str {
        "server-status-box"
    }

    fn default_endpoint(&self) -> &'static str {
        STATUS_PATH
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(SIDEBAR_POLL_INTERVAL_SECS)
    }

    fn template(&self, id: &str) -> Element {
        Element::new(id)
            .with_slot(".js-status")
            .with_slot(".js-players")
            .with_slot(".js-peak")
            .with_slot(".js-updated")
    }

    fn render(&self, root: &mut Element, payload: &StatusPayload, now: DateTime<Local>) {
        let players = if payload.online {
            payload.players
        } else {
            PlayerCounts::default()
        };

        root.set_text(".js-status", status_text(payload.online));
        root.set_text(".js-players", players.online.to_string());
        root.set_text(".js-peak", players.peak.to_string());
        root.set_text(".js-updated", format!("Last updated {}", clock_text(now)));
    }
}

#[cfg(test)]
mod tests {
    use otstatus_shared::{OFFLINE, PlayerCounts, StatusPayload};

    use super::SidebarStatus;
    use crate::render::WidgetRenderer;
    use crate::testing::{fixed_clock, online_payload};

    #[test]
    fn renders_online_counts() {
        let widget = SidebarStatus;
        let mut root = widget.template("server-status-box");

        widget.render(&mut root, &online_payload(5, 12, 3661), fixed_clock());

        assert_eq!(root.text(".js-status"), Some("ONLINE"));
        assert_eq!(root.text(".js-players"), Some("5"));
        assert_eq!(root.text(".js-peak"), Some("12"));
        assert_eq!(root.text(".js-updated"), Some("Last updated 12:30:05"));
    }

    #[test]
    fn offline_zeroes_counters_even_with_leftovers() {
        let widget = SidebarStatus;
        let mut root = widget.template("server-status-box");
        let stale = StatusPayload {
            online: false,
            players: PlayerCounts {
                online: 40,
                peak: 80,
                max: 100,
            },
            ..OFFLINE
        };

        widget.render(&mut root, &stale, fixed_clock());

        assert_eq!(root.text(".js-status"), Some("OFFLINE"));
        assert_eq!(root.text(".js-players"), Some("0"));
        assert_eq!(root.text(".js-peak"), Some("0"));
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let widget = SidebarStatus;
        let payload = online_payload(5, 12, 3661);
        let mut root = widget.template("server-status-box");

        widget.render(&mut root, &payload, fixed_clock());
        let first = root.clone();
        widget.render(&mut root, &payload, fixed_clock());

        assert_eq!(root, first);
        assert_eq!(root.text_content(), first.text_content());
    }

    #[test]
    fn missing_slots_are_skipped() {
        let widget = SidebarStatus;
        let mut root = crate::dom::Element::new("server-status-box").with_slot(".js-status");

        widget.render(&mut root, &online_payload(5, 12, 0), fixed_clock());

        assert_eq!(root.text(".js-status"), Some("ONLINE"));
        assert_eq!(root.text(".js-players"), None);
    }
}
