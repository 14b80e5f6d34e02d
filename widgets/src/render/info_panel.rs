use std::time::Duration;

use chrono::{DateTime, Local};
use otstatus_shared::{OFFLINE, StatusPayload, format_uptime};

use super::{WidgetRenderer, clock_text, or_dash, rate_text, status_text};
use crate::config::{INFO_PANEL_POLL_INTERVAL_SECS, STATUS_PATH};
use crate::dom::Element;

const RATE_SLOTS: [&str; 5] = [
    ".js-rate-exp",
    ".js-rate-magic",
    ".js-rate-skill",
    ".js-rate-loot",
    ".js-rate-spawn",
];

/// Full server information page: uptime, counters, rates, map and message of the day.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerInfoPanel;

impl WidgetRenderer for ServerInfoPanel {
    fn kind(&self) -> &'static str {
        "server-info"
    }

    fn default_element_id(&self) -> &'static str {
        "server-info"
    }

    fn default_endpoint(&self) -> &'static str {
        STATUS_PATH
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(INFO_PANEL_POLL_INTERVAL_SECS)
    }

    fn template(&self, id: &str) -> Element {
        let root = [
            ".js-status",
            ".js-server-name",
            ".js-version",
            ".js-uptime",
            ".js-players",
            ".js-peak",
            ".js-characters",
            ".js-map-name",
            ".js-map-author",
            ".js-map-size",
            ".js-motd",
            ".js-updated",
        ]
        .into_iter()
        .fold(Element::new(id), Element::with_slot);
        RATE_SLOTS.into_iter().fold(root, Element::with_slot)
    }

    fn render(&self, root: &mut Element, payload: &StatusPayload, now: DateTime<Local>) {
        let offline = OFFLINE;
        let shown = if payload.online { payload } else { &offline };

        root.set_text(".js-status", status_text(shown.online));
        root.set_text(".js-server-name", or_dash(&shown.server.name));
        root.set_text(".js-version", or_dash(&shown.server.version));
        root.set_text(
            ".js-uptime",
            if shown.online {
                format_uptime(shown.server.uptime_sec)
            } else {
                "—".to_string()
            },
        );
        root.set_text(".js-players", shown.players.online.to_string());
        root.set_text(".js-peak", shown.players.peak.to_string());
        root.set_text(".js-characters", shown.players.max.to_string());

        let rates = [
            shown.rates.experience,
            shown.rates.magic,
            shown.rates.skill,
            shown.rates.loot,
            shown.rates.spawn,
        ];
        for (slot, rate) in RATE_SLOTS.into_iter().zip(rates) {
            root.set_text(slot, rate_text(rate));
        }

        root.set_text(".js-map-name", or_dash(&shown.map.name));
        root.set_text(".js-map-author", or_dash(&shown.map.author));
        root.set_text(
            ".js-map-size",
            format!("{}×{}", shown.map.width, shown.map.height),
        );
        root.set_text(".js-motd", shown.motd.as_str());
        root.set_text(".js-updated", format!("Last updated {}", clock_text(now)));
    }
}

#[cfg(test)]
mod tests {
    use otstatus_shared::{MapInfo, OFFLINE, Rates, StatusPayload};

    use super::ServerInfoPanel;
    use crate::render::WidgetRenderer;
    use crate::testing::{fixed_clock, online_payload};

    #[test]
    fn renders_online_details() {
        let widget = ServerInfoPanel;
        let mut root = widget.template("server-info");
        let payload = StatusPayload {
            rates: Rates {
                experience: Some(5.0),
                magic: Some(3.0),
                skill: None,
                loot: Some(2.0),
                spawn: Some(1.0),
            },
            map: MapInfo {
                name: "forgotten".to_string(),
                author: String::new(),
                width: 2048,
                height: 1024,
            },
            motd: "Welcome to Retro".to_string(),
            ..online_payload(5, 12, 90065)
        };

        widget.render(&mut root, &payload, fixed_clock());

        assert_eq!(root.text(".js-status"), Some("ONLINE"));
        assert_eq!(root.text(".js-uptime"), Some("1d 1h 1m"));
        assert_eq!(root.text(".js-players"), Some("5"));
        assert_eq!(root.text(".js-peak"), Some("12"));
        assert_eq!(root.text(".js-characters"), Some("100"));
        assert_eq!(root.text(".js-rate-exp"), Some("5"));
        assert_eq!(root.text(".js-rate-skill"), Some("-"));
        assert_eq!(root.text(".js-map-name"), Some("forgotten"));
        assert_eq!(root.text(".js-map-author"), Some("-"));
        assert_eq!(root.text(".js-map-size"), Some("2048×1024"));
        assert_eq!(root.text(".js-motd"), Some("Welcome to Retro"));
        assert_eq!(root.text(".js-updated"), Some("Last updated 12:30:05"));
    }

    #[test]
    fn offline_shows_placeholders() {
        let widget = ServerInfoPanel;
        let mut root = widget.template("server-info");
        let stale = StatusPayload {
            online: false,
            motd: "old news".to_string(),
            ..online_payload(5, 12, 3661)
        };

        widget.render(&mut root, &stale, fixed_clock());

        assert_eq!(root.text(".js-status"), Some("OFFLINE"));
        assert_eq!(root.text(".js-uptime"), Some("—"));
        assert_eq!(root.text(".js-players"), Some("0"));
        assert_eq!(root.text(".js-rate-loot"), Some("-"));
        assert_eq!(root.text(".js-map-size"), Some("0×0"));
        assert_eq!(root.text(".js-motd"), Some(""));
    }

    #[test]
    fn offline_render_matches_canonical_offline_render() {
        let widget = ServerInfoPanel;
        let mut from_stale = widget.template("server-info");
        let mut from_canonical = widget.template("server-info");

        widget.render(
            &mut from_stale,
            &StatusPayload {
                online: false,
                ..online_payload(9, 9, 9)
            },
            fixed_clock(),
        );
        widget.render(&mut from_canonical, &OFFLINE, fixed_clock());

        assert_eq!(from_stale, from_canonical);
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let widget = ServerInfoPanel;
        let payload = online_payload(5, 12, 3661);
        let mut root = widget.template("server-info");

        widget.render(&mut root, &payload, fixed_clock());
        let first = root.text_content();
        widget.render(&mut root, &payload, fixed_clock());

        assert_eq!(root.text_content(), first);
    }
}
