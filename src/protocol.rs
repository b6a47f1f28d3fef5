//! Frame encoding and decoding for the BattlEye RCON wire protocol.
//!
//! Every datagram carries exactly one frame:
//!
//! ```text
//! 'B' 'E' crc0 crc1 crc2 crc3 0xFF type <type-specific bytes>
//! ```
//!
//! The checksum is a CRC32 over everything from the `0xFF` marker onward,
//! emitted in little-endian byte order. Inbound bytes are network
//! controlled, so [`decode`] validates length, magic and checksum before
//! touching any payload offset and fails closed on anything it does not
//! recognize.

use crate::error::RconError;

/// Two-byte magic opening every frame.
pub const MAGIC: [u8; 2] = [b'B', b'E'];
/// Marker byte separating the header from the checksummed payload.
pub const PAYLOAD_MARKER: u8 = 0xFF;

/// Login request/response frames.
pub const TYPE_LOGIN: u8 = 0x00;
/// Command frames and their (possibly fragmented) responses.
pub const TYPE_COMMAND: u8 = 0x01;
/// Unsolicited server messages (chat) and their acknowledgments.
pub const TYPE_MESSAGE: u8 = 0x02;

/// Shortest well-formed frame: magic + checksum + marker + type byte.
pub const MIN_FRAME_LEN: usize = 8;

/// A frame the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPacket {
    /// Password exchange opening a session.
    Login { password: String },
    /// An administrative command tagged with a sequence byte.
    Command { seq: u8, text: String },
    /// Acknowledgment of a server chat message, echoing one byte back.
    ServerAck { echo: u8 },
}

/// Body of a command response, either complete or one fragment of many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// The whole response fit in one datagram.
    Single(Vec<u8>),
    /// One indexed piece of a multi-part response.
    Fragment { total: u8, index: u8, bytes: Vec<u8> },
}

/// A frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Result of a login attempt.
    LoginAck { success: bool },
    /// Response correlated to a command by its sequence byte.
    CommandResponse { seq: u8, body: ResponseBody },
    /// Unsolicited chat broadcast; must be acked with `echo`.
    ServerMessage { echo: u8, text: String },
}

/// Encodes an outbound packet into its on-wire byte form.
///
/// Pure function: builds the type-specific payload, checksums it and
/// prefixes the magic and the checksum bytes.
pub fn encode(packet: &OutboundPacket) -> Vec<u8> {
    let mut payload = vec![PAYLOAD_MARKER];
    match packet {
        OutboundPacket::Login { password } => {
            payload.push(TYPE_LOGIN);
            payload.extend_from_slice(password.as_bytes());
        }
        OutboundPacket::Command { seq, text } => {
            payload.push(TYPE_COMMAND);
            payload.push(*seq);
            payload.extend_from_slice(text.as_bytes());
        }
        OutboundPacket::ServerAck { echo } => {
            payload.push(TYPE_MESSAGE);
            payload.push(*echo);
        }
    }

    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(MAGIC.len() + 4 + payload.len());
    frame.extend_from_slice(&MAGIC);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    frame
}

/// Decodes one inbound datagram into a typed frame.
///
/// Returns [`RconError::MalformedFrame`] on truncated input, bad magic,
/// checksum mismatch or an unknown type byte instead of reading past the
/// buffer.
pub fn decode(bytes: &[u8]) -> Result<InboundFrame, RconError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(RconError::MalformedFrame("frame too short"));
    }
    if bytes[..2] != MAGIC {
        return Err(RconError::MalformedFrame("bad magic"));
    }
    if bytes[6] != PAYLOAD_MARKER {
        return Err(RconError::MalformedFrame("missing payload marker"));
    }

    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&bytes[2..6]);
    let payload = &bytes[6..];
    if crc32fast::hash(payload) != u32::from_le_bytes(crc_bytes) {
        return Err(RconError::MalformedFrame("checksum mismatch"));
    }

    let body = &bytes[8..];
    match bytes[7] {
        TYPE_LOGIN => {
            let result = body
                .first()
                .ok_or(RconError::MalformedFrame("login ack without result byte"))?;
            Ok(InboundFrame::LoginAck { success: *result == 0x01 })
        }
        TYPE_COMMAND => {
            let (seq, rest) = body
                .split_first()
                .ok_or(RconError::MalformedFrame("command response without sequence"))?;
            // A zero byte right after the sequence marks a multi-part
            // response; anything else is the start of the message itself.
            if rest.first() == Some(&0x00) && rest.len() > 1 {
                if rest.len() < 3 {
                    return Err(RconError::MalformedFrame("truncated fragment header"));
                }
                Ok(InboundFrame::CommandResponse {
                    seq: *seq,
                    body: ResponseBody::Fragment {
                        total: rest[1],
                        index: rest[2],
                        bytes: rest[3..].to_vec(),
                    },
                })
            } else {
                Ok(InboundFrame::CommandResponse {
                    seq: *seq,
                    body: ResponseBody::Single(rest.to_vec()),
                })
            }
        }
        TYPE_MESSAGE => {
            let (echo, rest) = body
                .split_first()
                .ok_or(RconError::MalformedFrame("server message without echo byte"))?;
            Ok(InboundFrame::ServerMessage {
                echo: *echo,
                text: String::from_utf8_lossy(rest).into_owned(),
            })
        }
        _ => Err(RconError::MalformedFrame("unknown frame type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a server-side frame around a raw payload (marker included).
    fn server_frame(payload: &[u8]) -> Vec<u8> {
        let crc = crc32fast::hash(payload);
        let mut frame = Vec::new();
        frame.extend_from_slice(&MAGIC);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    #[test]
    fn command_round_trip_recovers_sequence_and_text() {
        for seq in [0u8, 1, 2, 255] {
            let packet = OutboundPacket::Command {
                seq,
                text: "say -1 restart in 10 mins".to_string(),
            };
            let bytes = encode(&packet);
            match decode(&bytes).unwrap() {
                InboundFrame::CommandResponse { seq: got, body: ResponseBody::Single(text) } => {
                    assert_eq!(got, seq);
                    assert_eq!(text, b"say -1 restart in 10 mins");
                }
                other => panic!("unexpected frame: {:?}", other),
            }
        }
    }

    #[test]
    fn checksum_matches_independent_computation() {
        let packet = OutboundPacket::Login {
            password: "hunter2".to_string(),
        };
        let bytes = encode(&packet);

        let expected = crc32fast::hash(&bytes[6..]);
        let mut stored = [0u8; 4];
        stored.copy_from_slice(&bytes[2..6]);
        assert_eq!(u32::from_le_bytes(stored), expected);
    }

    #[test]
    fn login_layout_is_magic_checksum_marker_type_password() {
        let bytes = encode(&OutboundPacket::Login {
            password: "pw".to_string(),
        });
        assert_eq!(&bytes[..2], b"BE");
        assert_eq!(bytes[6], PAYLOAD_MARKER);
        assert_eq!(bytes[7], TYPE_LOGIN);
        assert_eq!(&bytes[8..], b"pw");
    }

    #[test]
    fn server_ack_echoes_one_byte() {
        let bytes = encode(&OutboundPacket::ServerAck { echo: 0x2a });
        assert_eq!(bytes[7], TYPE_MESSAGE);
        assert_eq!(&bytes[8..], &[0x2a]);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let frame = encode(&OutboundPacket::ServerAck { echo: 1 });
        for len in 0..MIN_FRAME_LEN {
            assert!(matches!(
                decode(&frame[..len]),
                Err(RconError::MalformedFrame(_))
            ));
        }
    }

    #[test]
    fn decode_rejects_bad_magic_and_checksum() {
        let mut frame = encode(&OutboundPacket::ServerAck { echo: 1 });
        frame[0] = b'X';
        assert!(matches!(decode(&frame), Err(RconError::MalformedFrame(_))));

        let mut frame = encode(&OutboundPacket::ServerAck { echo: 1 });
        frame[2] ^= 0xff;
        assert!(matches!(decode(&frame), Err(RconError::MalformedFrame(_))));
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let frame = server_frame(&[PAYLOAD_MARKER, 0x07, 0x00]);
        assert!(matches!(decode(&frame), Err(RconError::MalformedFrame(_))));
    }

    #[test]
    fn login_ack_success_and_failure() {
        let ok = server_frame(&[PAYLOAD_MARKER, TYPE_LOGIN, 0x01]);
        assert_eq!(decode(&ok).unwrap(), InboundFrame::LoginAck { success: true });

        let denied = server_frame(&[PAYLOAD_MARKER, TYPE_LOGIN, 0x00]);
        assert_eq!(decode(&denied).unwrap(), InboundFrame::LoginAck { success: false });
    }

    #[test]
    fn fragment_header_is_total_then_index() {
        let frame = server_frame(&[PAYLOAD_MARKER, TYPE_COMMAND, 2, 0x00, 3, 1, b'a', b'b']);
        match decode(&frame).unwrap() {
            InboundFrame::CommandResponse { seq, body: ResponseBody::Fragment { total, index, bytes } } => {
                assert_eq!(seq, 2);
                assert_eq!(total, 3);
                assert_eq!(index, 1);
                assert_eq!(bytes, b"ab");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn empty_command_response_is_a_single_body() {
        let frame = server_frame(&[PAYLOAD_MARKER, TYPE_COMMAND, 0]);
        assert_eq!(
            decode(&frame).unwrap(),
            InboundFrame::CommandResponse {
                seq: 0,
                body: ResponseBody::Single(Vec::new())
            }
        );
    }

    #[test]
    fn server_message_carries_echo_and_text() {
        let frame = server_frame(&[PAYLOAD_MARKER, TYPE_MESSAGE, 9, b'h', b'i']);
        assert_eq!(
            decode(&frame).unwrap(),
            InboundFrame::ServerMessage {
                echo: 9,
                text: "hi".to_string()
            }
        );
    }
}
