use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical degraded payload. Every failure path hands out this exact value.
pub const OFFLINE: StatusPayload = StatusPayload {
    online: false,
    players: PlayerCounts {
        online: 0,
        peak: 0,
        max: 0,
    },
    server: ServerDetails {
        uptime_sec: 0,
        name: String::new(),
        location: String::new(),
        software: String::new(),
        version: String::new(),
    },
    rates: Rates {
        experience: None,
        magic: None,
        skill: None,
        loot: None,
        spawn: None,
    },
    map: MapInfo {
        name: String::new(),
        author: String::new(),
        width: 0,
        height: 0,
    },
    motd: String::new(),
    list: Vec::new(),
};

/// Fully-formed server status as seen by every widget on a page.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusPayload {
    pub online: bool,
    pub players: PlayerCounts,
    pub server: ServerDetails,
    pub rates: Rates,
    pub map: MapInfo,
    pub motd: String,
    pub list: Vec<OnlinePlayer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerCounts {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub peak: u32,
    #[serde(default)]
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ServerDetails {
    pub uptime_sec: u64,
    pub name: String,
    pub location: String,
    pub software: String,
    pub version: String,
}

/// Server rate multipliers. `None` means the server did not report the rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnlinePlayer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: u32,
}

impl StatusPayload {
    pub fn offline() -> Self {
        OFFLINE
    }

    pub fn is_offline(&self) -> bool {
        !self.online
    }

    /// Parse a status endpoint body.
    ///
    /// Absent or `null` fields become defaults. A body with the wrong shape is an error,
    /// and an `online: false` body collapses to [`OFFLINE`] regardless of leftovers.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawStatus = serde_json::from_slice(bytes)?;
        Ok(Self::from(raw))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawStatus {
    #[serde(default)]
    online: Option<bool>,
    #[serde(default)]
    players: Option<RawPlayers>,
    #[serde(default)]
    server: Option<RawServer>,
    #[serde(default)]
    rates: Option<RawRates>,
    #[serde(default)]
    map: Option<RawMap>,
    #[serde(default)]
    motd: Option<String>,
    #[serde(default)]
    list: Option<Vec<RawOnlinePlayer>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlayers {
    #[serde(default)]
    online: Option<u32>,
    #[serde(default)]
    peak: Option<u32>,
    #[serde(default)]
    max: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    #[serde(default)]
    uptime_sec: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    software: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

// Rates come through as loose values: the TSQP status block reports them as
// attribute strings, our own server reports them as numbers.
#[derive(Debug, Default, Deserialize)]
struct RawRates {
    #[serde(default)]
    experience: Option<Value>,
    #[serde(default)]
    magic: Option<Value>,
    #[serde(default)]
    skill: Option<Value>,
    #[serde(default)]
    loot: Option<Value>,
    #[serde(default)]
    spawn: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMap {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOnlinePlayer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    level: Option<u32>,
}

impl From<RawStatus> for StatusPayload {
    fn from(raw: RawStatus) -> Self {
        if !raw.online.unwrap_or(false) {
            return OFFLINE;
        }

        let players = raw.players.unwrap_or_default();
        let server = raw.server.unwrap_or_default();
        let rates = raw.rates.unwrap_or_default();
        let map = raw.map.unwrap_or_default();

        Self {
            online: true,
            players: PlayerCounts {
                online: players.online.unwrap_or(0),
                peak: players.peak.unwrap_or(0),
                max: players.max.unwrap_or(0),
            },
            server: ServerDetails {
                uptime_sec: server.uptime_sec.unwrap_or(0),
                name: server.name.unwrap_or_default(),
                location: server.location.unwrap_or_default(),
                software: server.software.unwrap_or_default(),
                version: server.version.unwrap_or_default(),
            },
            rates: Rates {
                experience: rate_value(rates.experience.as_ref()),
                magic: rate_value(rates.magic.as_ref()),
                skill: rate_value(rates.skill.as_ref()),
                loot: rate_value(rates.loot.as_ref()),
                spawn: rate_value(rates.spawn.as_ref()),
            },
            map: MapInfo {
                name: map.name.unwrap_or_default(),
                author: map.author.unwrap_or_default(),
                width: map.width.unwrap_or(0),
                height: map.height.unwrap_or(0),
            },
            motd: raw.motd.unwrap_or_default(),
            list: raw
                .list
                .unwrap_or_default()
                .into_iter()
                .map(|player| OnlinePlayer {
                    name: player.name.unwrap_or_default(),
                    level: player.level.unwrap_or(0),
                })
                .collect(),
        }
    }
}

fn rate_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|rate| rate.is_finite()),
        _ => None,
    }
}
