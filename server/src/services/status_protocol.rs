use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use bytes::Buf;
use otstatus_shared::{
    MapInfo, OnlinePlayer, OwnerBlock, PlayerCounts, PlayersReport, Rates, ServerBlock,
    StatusReport, TotalBlock,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::debug;

use crate::config;

/// `[len=6][0xFF 0xFF "info"]`
pub const INFO_REQUEST: [u8; 8] = [0x06, 0x00, 0xFF, 0xFF, b'i', b'n', b'f', b'o'];

const STATUS_SELECTOR: u8 = 0xFF;
const REQUEST_PLAYERS: u8 = 0x01;
pub const FLAG_PLAYERS_INFO: u16 = 0x0008;
pub const FLAG_EXT_PLAYERS_INFO: u16 = 0x0020;

const BLOCK_PLAYER_COUNTS: u8 = 0x20;
const BLOCK_PLAYER_LIST: u8 = 0x21;

#[derive(Debug, thiserror::Error)]
pub enum StatusQueryError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),
    #[error("status socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Empty response.")]
    EmptyResponse,
    #[error("No XML found in response.")]
    NoXml,
    #[error("invalid status XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("No length header.")]
    NoLengthHeader,
    #[error("Bad length.")]
    BadLength,
    #[error("Truncated body.")]
    Truncated,
}

/// Where and how patiently to ask the game server for its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusQueryConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl StatusQueryConfig {
    pub fn from_env() -> Self {
        Self {
            host: config::ot_status_host(),
            port: config::ot_status_port(),
            timeout: config::ot_status_timeout(),
            retries: config::ot_status_retries(),
            retry_delay: config::ot_status_retry_delay(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub type QueryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StatusQueryError>> + Send + 'a>>;

/// Source of game-server status for the HTTP routes.
pub trait StatusBackend: Send + Sync + 'static {
    fn query_info(&self) -> QueryFuture<'_, StatusReport>;
    fn query_players(&self) -> QueryFuture<'_, PlayersReport>;
}

/// Talks to the game server's status port over TCP.
#[derive(Debug, Clone)]
pub struct TcpStatusBackend {
    config: StatusQueryConfig,
}

impl TcpStatusBackend {
    pub fn new(config: StatusQueryConfig) -> Self {
        Self { config }
    }
}

impl StatusBackend for TcpStatusBackend {
    fn query_info(&self) -> QueryFuture<'_, StatusReport> {
        Box::pin(query_info(&self.config))
    }

    fn query_players(&self) -> QueryFuture<'_, PlayersReport> {
        Box::pin(query_players(&self.config))
    }
}

pub async fn query_info(config: &StatusQueryConfig) -> Result<StatusReport, StatusQueryError> {
    with_retries(config, "info", || query_info_once(config)).await
}

pub async fn query_players(config: &StatusQueryConfig) -> Result<PlayersReport, StatusQueryError> {
    with_retries(config, "players", || query_players_once(config)).await
}

pub fn players_request() -> [u8; 6] {
    let flags = (FLAG_PLAYERS_INFO | FLAG_EXT_PLAYERS_INFO).to_le_bytes();
    [0x04, 0x00, STATUS_SELECTOR, REQUEST_PLAYERS, flags[0], flags[1]]
}

async fn with_retries<T, F, Fut>(
    config: &StatusQueryConfig,
    request: &'static str,
    mut attempt: F,
) -> Result<T, StatusQueryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StatusQueryError>>,
{
    let mut last_err = None;
    for attempt_no in 0..=config.retries {
        if attempt_no > 0 {
            tokio::time::sleep(config.retry_delay).await;
        }
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!(
                    request,
                    attempt = attempt_no + 1,
                    addr = %config.address(),
                    error = %e,
                    "status query attempt failed"
                );
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or(StatusQueryError::EmptyResponse))
}

async fn connect(config: &StatusQueryConfig) -> Result<TcpStream, StatusQueryError> {
    let addr = config.address();
    let stream = match timeout(config.timeout, TcpStream::connect(addr.as_str())).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(StatusQueryError::Connect { addr, source }),
        Err(_) => return Err(StatusQueryError::ConnectTimeout(addr)),
    };
    stream.set_nodelay(true)?;
    Ok(stream)
}

async fn query_info_once(config: &StatusQueryConfig) -> Result<StatusReport, StatusQueryError> {
    let mut stream = connect(config).await?;
    stream.write_all(&INFO_REQUEST).await?;
    let deadline = deadline_after(config.timeout);

    let mut header = [0u8; 2];
    let got = read_exact_until(&mut stream, &mut header, deadline).await?;
    let mut raw = header[..got].to_vec();

    if got == header.len() {
        let total = u16::from_le_bytes(header) as usize;
        if total >= 4 {
            let mut body = vec![0u8; total];
            let got = read_exact_until(&mut stream, &mut body, deadline).await?;
            if got == total && body.starts_with(b"<") {
                return parse_info_xml(&body);
            }
            raw.extend_from_slice(&body[..got]);
        }
    }

    read_until_idle(&mut stream, &mut raw, deadline).await?;
    if raw.is_empty() {
        tokio::time::sleep(Duration::from_millis(config::STATUS_EMPTY_GRACE_MS)).await;
        read_until_idle(&mut stream, &mut raw, deadline).await?;
    }
    if raw.is_empty() {
        return Err(StatusQueryError::EmptyResponse);
    }
    let xml = locate_xml(&raw).ok_or(StatusQueryError::NoXml)?;
    parse_info_xml(xml)
}

async fn query_players_once(config: &StatusQueryConfig) -> Result<PlayersReport, StatusQueryError> {
    let mut stream = connect(config).await?;
    stream.write_all(&players_request()).await?;
    let deadline = deadline_after(config.timeout);

    let mut header = [0u8; 2];
    if read_exact_until(&mut stream, &mut header, deadline).await? != header.len() {
        return Err(StatusQueryError::NoLengthHeader);
    }
    let total = u16::from_le_bytes(header) as usize;
    if total == 0 {
        return Err(StatusQueryError::BadLength);
    }
    let mut body = vec![0u8; total];
    if read_exact_until(&mut stream, &mut body, deadline).await? != total {
        return Err(StatusQueryError::Truncated);
    }
    parse_players_body(&body)
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_millis(config::MAX_OT_STATUS_TIMEOUT_MS))
}

/// Fills `buf` until it is full, the peer closes, or `deadline` passes. Returns the
/// number of bytes read.
async fn read_exact_until(
    stream: &mut TcpStream,
    buf: &mut [u8],
    deadline: Instant,
) -> Result<usize, StatusQueryError> {
    let mut filled = 0;
    while filled < buf.len() {
        match timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Err(_) | Ok(Ok(0)) => break,
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(e.into()),
        }
    }
    Ok(filled)
}

async fn read_until_idle(
    stream: &mut TcpStream,
    raw: &mut Vec<u8>,
    deadline: Instant,
) -> Result<(), StatusQueryError> {
    let idle = Duration::from_millis(config::STATUS_READ_IDLE_MS);
    let mut chunk = [0u8; 8192];
    while raw.len() < config::MAX_RAW_STATUS_BYTES {
        let wait_until = (Instant::now() + idle).min(deadline);
        match timeout_at(wait_until, stream.read(&mut chunk)).await {
            Err(_) | Ok(Ok(0)) => break,
            Ok(Ok(n)) => raw.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Finds the XML document inside an unframed (or oddly framed) info reply.
pub fn locate_xml(raw: &[u8]) -> Option<&[u8]> {
    let mut raw = raw;
    if raw.len() >= 2 {
        let len = u16::from_le_bytes([raw[0], raw[1]]) as usize;
        if let Some(candidate) = raw
            .get(2..2 + len)
            .filter(|candidate| candidate.starts_with(b"<"))
        {
            raw = candidate;
        }
    }
    if raw.starts_with(b"<") {
        return Some(raw);
    }
    find(raw, b"<?xml")
        .or_else(|| find(raw, b"<tsqp"))
        .map(|start| &raw[start..])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decodes a TSQP `<tsqp>` info document. Missing elements and attributes read as
/// empty strings and zeros.
pub fn parse_info_xml(xml: &[u8]) -> Result<StatusReport, StatusQueryError> {
    let text = String::from_utf8_lossy(xml);
    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut report = StatusReport {
        online: true,
        ..StatusReport::default()
    };
    let mut server = ServerBlock::default();
    let mut owner = OwnerBlock::default();
    let mut players = PlayerCounts::default();
    let mut monsters = TotalBlock::default();
    let mut npcs = TotalBlock::default();
    let mut rates = Rates::default();
    let mut map = MapInfo::default();
    let mut motd = String::new();
    let mut in_motd = false;

    loop {
        let element = match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"motd" => {
                in_motd = true;
                continue;
            }
            Event::End(e) if e.name().as_ref() == b"motd" => {
                in_motd = false;
                continue;
            }
            Event::Text(t) if in_motd => {
                motd.push_str(&t.unescape()?);
                continue;
            }
            Event::CData(c) if in_motd => {
                motd.push_str(&String::from_utf8_lossy(&c));
                continue;
            }
            Event::Start(e) | Event::Empty(e) => e,
            Event::Eof => break,
            _ => continue,
        };

        let attrs = attributes(&element)?;
        match element.name().as_ref() {
            b"serverinfo" => {
                server = ServerBlock {
                    name: text_attr(&attrs, "servername"),
                    ip: text_attr(&attrs, "ip"),
                    port: number_attr(&attrs, "port"),
                    uptime_sec: number_attr(&attrs, "uptime"),
                    location: text_attr(&attrs, "location"),
                    url: text_attr(&attrs, "url"),
                    software: text_attr(&attrs, "server"),
                    version: text_attr(&attrs, "version"),
                    client: text_attr(&attrs, "client"),
                }
            }
            b"owner" => {
                owner = OwnerBlock {
                    name: text_attr(&attrs, "name"),
                    email: text_attr(&attrs, "email"),
                }
            }
            b"players" => {
                players = PlayerCounts {
                    online: number_attr(&attrs, "online"),
                    peak: number_attr(&attrs, "peak"),
                    max: number_attr(&attrs, "max"),
                }
            }
            b"monsters" => monsters.total = number_attr(&attrs, "total"),
            b"npcs" => npcs.total = number_attr(&attrs, "total"),
            b"rates" => {
                rates = Rates {
                    experience: rate_attr(&attrs, "experience"),
                    magic: rate_attr(&attrs, "magic"),
                    skill: rate_attr(&attrs, "skill"),
                    loot: rate_attr(&attrs, "loot"),
                    spawn: rate_attr(&attrs, "spawn"),
                }
            }
            b"map" => {
                map = MapInfo {
                    name: text_attr(&attrs, "name"),
                    author: text_attr(&attrs, "author"),
                    width: number_attr(&attrs, "width"),
                    height: number_attr(&attrs, "height"),
                }
            }
            _ => {}
        }
    }

    report.server = Some(server);
    report.owner = Some(owner);
    report.players = Some(players);
    report.monsters = Some(monsters);
    report.npcs = Some(npcs);
    report.rates = Some(rates);
    report.map = Some(map);
    report.motd = Some(motd.trim().to_string());
    Ok(report)
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>, StatusQueryError> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn text_attr(attrs: &HashMap<String, String>, name: &str) -> String {
    attrs.get(name).cloned().unwrap_or_default()
}

fn number_attr<T: FromStr + Default>(attrs: &HashMap<String, String>, name: &str) -> T {
    attrs
        .get(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}

fn rate_attr(attrs: &HashMap<String, String>, name: &str) -> Option<f64> {
    attrs
        .get(name)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Decodes the blocks of a binary player-list reply. An unknown block code ends the
/// reply; a block cut short is an error.
pub fn parse_players_body(body: &[u8]) -> Result<PlayersReport, StatusQueryError> {
    let mut buf = body;
    let mut report = PlayersReport {
        online: true,
        ..PlayersReport::default()
    };

    while buf.has_remaining() {
        match buf.get_u8() {
            BLOCK_PLAYER_COUNTS => {
                ensure_remaining(buf, 12)?;
                report.players.online = buf.get_u32_le();
                report.players.max = buf.get_u32_le();
                report.players.peak = buf.get_u32_le();
            }
            BLOCK_PLAYER_LIST => {
                ensure_remaining(buf, 4)?;
                let count = buf.get_u32_le();
                for _ in 0..count {
                    ensure_remaining(buf, 2)?;
                    let len = buf.get_u16_le() as usize;
                    ensure_remaining(buf, len + 4)?;
                    let name = String::from_utf8_lossy(&buf[..len]).into_owned();
                    buf.advance(len);
                    let level = buf.get_u32_le();
                    report.list.push(OnlinePlayer { name, level });
                }
            }
            _ => break,
        }
    }

    Ok(report)
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<(), StatusQueryError> {
    if buf.remaining() < needed {
        return Err(StatusQueryError::Truncated);
    }
    Ok(())
}
