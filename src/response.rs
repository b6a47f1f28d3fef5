//! Parsers for the two structured response payloads: the player listing
//! and the mission listing.
//!
//! Both formats are line oriented and produced by the game server for
//! human eyes, so the parsers are defensive: a line that fails its
//! structural checks is reported as a [`RconError::Parse`] while its
//! sibling lines still parse independently.

use crate::error::RconError;

/// Marker appended to a GUID once the server has verified it.
const VERIFIED_MARKER: &str = "(OK)";
/// Package suffix stripped from mission names.
const MISSION_SUFFIX: &str = ".pbo";
/// Header lines preceding the first player row.
const PLAYER_HEADER_LINES: usize = 3;

/// One row of the player listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub slot: u8,
    pub ip: String,
    pub port: u16,
    pub ping: u32,
    pub guid: String,
    pub verified: bool,
    pub name: String,
}

/// Parses a full player listing message.
///
/// The first three lines (title, column header, separator) and the
/// trailing player-count summary are skipped; everything in between is
/// parsed per line.
pub fn parse_player_listing(message: &str) -> Vec<Result<PlayerRecord, RconError>> {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= PLAYER_HEADER_LINES + 1 {
        return Vec::new();
    }
    lines[PLAYER_HEADER_LINES..lines.len() - 1]
        .iter()
        .map(|line| parse_player_line(line))
        .collect()
}

/// Parses one player row.
///
/// Columns are separated by runs of spaces. The GUID column carries the
/// verification state as a trailing parenthesized marker; the name is
/// everything after that marker in the unsplit line, since player names
/// may themselves contain spaces.
pub fn parse_player_line(line: &str) -> Result<PlayerRecord, RconError> {
    let parse_err = || RconError::Parse(line.to_string());

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 5 {
        return Err(parse_err());
    }

    let slot = tokens[0].parse().map_err(|_| parse_err())?;
    let (ip, port) = tokens[1].split_once(':').ok_or_else(parse_err)?;
    let port = port.parse().map_err(|_| parse_err())?;
    let ping = tokens[2].parse().map_err(|_| parse_err())?;

    let (guid, verified) = match tokens[3].strip_suffix(VERIFIED_MARKER) {
        Some(prefix) => (prefix, true),
        None => {
            // Unverified GUIDs carry a different trailing marker, e.g. "(?)".
            let guid = tokens[3].split('(').next().unwrap_or(tokens[3]);
            (guid, false)
        }
    };

    // The name starts two characters past the marker's closing paren.
    let name = line
        .find(')')
        .and_then(|pos| line.get(pos + 2..))
        .unwrap_or("")
        .to_string();

    Ok(PlayerRecord {
        slot,
        ip: ip.to_string(),
        port,
        ping,
        guid: guid.to_string(),
        verified,
        name,
    })
}

/// Parses a mission listing message into mission names in source order.
///
/// The header line is skipped and a trailing `.pbo` is stripped from each
/// name. An empty listing is a valid result, distinct from "no response
/// yet" (which callers represent by not calling this at all).
pub fn parse_mission_listing(message: &str) -> Vec<String> {
    message
        .lines()
        .skip(1)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(MISSION_SUFFIX).unwrap_or(line).to_string())
        .collect()
}
