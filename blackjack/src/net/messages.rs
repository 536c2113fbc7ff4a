//! Fixed-length wire records exchanged between blackjack peers.
//!
//! Every record starts with the 4-byte magic cookie and a 1-byte
//! message-type tag. Integers are big-endian and text fields are
//! zero-padded to their declared width:
//!
//! | Message  | Tag  | Body                                    | Size |
//! |----------|------|-----------------------------------------|------|
//! | Offer    | 0x02 | tcp_port u16, server_name \[u8; 32\]     | 39   |
//! | Request  | 0x03 | num_rounds u8, client_name \[u8; 32\]    | 38   |
//! | Decision | 0x04 | decision \[u8; 5\] (`Hittt` or `Stand`)  | 10   |
//! | Payload  | 0x04 | result u8, rank u16, suit u8            | 9    |

use bincode::{
    config,
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

use super::errors::{ProtocolError, Result};
use crate::game::{
    constants::{ACE, KING},
    entities::{Card, Outcome, Suit},
};

/// Identifies every record as belonging to this protocol.
pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

/// Width of the zero-padded name fields.
pub const NAME_LEN: usize = 32;

/// Well-known UDP port servers broadcast offers to.
pub const DISCOVERY_PORT: u16 = 13122;

/// Bytes the server writes after accepting a request. They sit outside
/// the framed records and clients don't interpret them.
pub const ACK: &[u8] = b"OK";

/// Sent in place of a real card once a round is over.
pub const FILLER_CARD: Card = Card(ACE, Suit::Heart);

const HIT_LITERAL: [u8; 5] = *b"Hittt";
const STAND_LITERAL: [u8; 5] = *b"Stand";

fn wire_config() -> impl config::Config {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageKind {
    Offer,
    Request,
    Decision,
    Payload,
}

impl MessageKind {
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::Offer => 0x02,
            Self::Request => 0x03,
            Self::Decision | Self::Payload => 0x04,
        }
    }

    /// Exact record length, header included.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Offer => 39,
            Self::Request => 38,
            Self::Decision => 10,
            Self::Payload => 9,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Offer => "offer",
            Self::Request => "request",
            Self::Decision => "decision",
            Self::Payload => "payload",
        };
        write!(f, "{repr}")
    }
}

/// A message with a fixed-length binary record.
pub trait WireMessage: Sized {
    const KIND: MessageKind;

    /// Serializes into exactly `Self::KIND.size()` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] if a field is outside its
    /// domain. Nothing is clamped.
    fn encode(&self) -> Result<Vec<u8>>;

    /// Parses a record.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedMessage`] on a length, magic, or
    /// tag mismatch and [`ProtocolError::InvalidField`] on an out-of-domain
    /// field value.
    fn decode(bytes: &[u8]) -> Result<Self>;
}

#[derive(Deserialize, Serialize)]
struct Frame<B> {
    magic: u32,
    tag: u8,
    body: B,
}

fn encode_frame<B: Serialize>(kind: MessageKind, body: B) -> Result<Vec<u8>> {
    let frame = Frame {
        magic: MAGIC_COOKIE,
        tag: kind.tag(),
        body,
    };
    let bytes = encode_to_vec(frame, wire_config())?;
    debug_assert_eq!(bytes.len(), kind.size());
    Ok(bytes)
}

fn decode_frame<B: DeserializeOwned>(kind: MessageKind, bytes: &[u8]) -> Result<B> {
    if bytes.len() != kind.size() {
        return Err(ProtocolError::malformed(
            kind,
            format!("length {} != {}", bytes.len(), kind.size()),
        ));
    }
    let (frame, _): (Frame<B>, usize) = decode_from_slice(bytes, wire_config())
        .map_err(|error| ProtocolError::malformed(kind, error.to_string()))?;
    if frame.magic != MAGIC_COOKIE {
        return Err(ProtocolError::malformed(
            kind,
            format!("bad magic cookie {:#010x}", frame.magic),
        ));
    }
    if frame.tag != kind.tag() {
        return Err(ProtocolError::malformed(
            kind,
            format!("unexpected message type {:#04x}", frame.tag),
        ));
    }
    Ok(frame.body)
}

/// Zero-pads `name` to the field width, truncating at the last char
/// boundary that fits.
fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut end = name.len().min(NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = [0; NAME_LEN];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field
}

/// Reads up to the first zero byte and decodes lossily.
fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Server advertisement broadcast over UDP.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub tcp_port: u16,
    pub server_name: String,
}

#[derive(Deserialize, Serialize)]
struct OfferBody {
    tcp_port: u16,
    server_name: [u8; NAME_LEN],
}

impl WireMessage for Offer {
    const KIND: MessageKind = MessageKind::Offer;

    fn encode(&self) -> Result<Vec<u8>> {
        let body = OfferBody {
            tcp_port: self.tcp_port,
            server_name: encode_name(&self.server_name),
        };
        encode_frame(Self::KIND, body)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let body: OfferBody = decode_frame(Self::KIND, bytes)?;
        Ok(Self {
            tcp_port: body.tcp_port,
            server_name: decode_name(&body.server_name),
        })
    }
}

/// First record a client sends after connecting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub num_rounds: u8,
    pub client_name: String,
}

#[derive(Deserialize, Serialize)]
struct RequestBody {
    num_rounds: u8,
    client_name: [u8; NAME_LEN],
}

impl WireMessage for Request {
    const KIND: MessageKind = MessageKind::Request;

    fn encode(&self) -> Result<Vec<u8>> {
        if self.num_rounds == 0 {
            return Err(ProtocolError::invalid("num_rounds", self.num_rounds));
        }
        let body = RequestBody {
            num_rounds: self.num_rounds,
            client_name: encode_name(&self.client_name),
        };
        encode_frame(Self::KIND, body)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let body: RequestBody = decode_frame(Self::KIND, bytes)?;
        if body.num_rounds == 0 {
            return Err(ProtocolError::invalid("num_rounds", body.num_rounds));
        }
        Ok(Self {
            num_rounds: body.num_rounds,
            client_name: decode_name(&body.client_name),
        })
    }
}

/// The player's choice at their decision point.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Decision {
    Hit,
    Stand,
}

impl Decision {
    #[must_use]
    pub fn literal(self) -> [u8; 5] {
        match self {
            Self::Hit => HIT_LITERAL,
            Self::Stand => STAND_LITERAL,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
        };
        write!(f, "{repr}")
    }
}

impl WireMessage for Decision {
    const KIND: MessageKind = MessageKind::Decision;

    fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(Self::KIND, self.literal())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let literal: [u8; 5] = decode_frame(Self::KIND, bytes)?;
        match literal {
            HIT_LITERAL => Ok(Self::Hit),
            STAND_LITERAL => Ok(Self::Stand),
            other => Err(ProtocolError::invalid(
                "decision",
                String::from_utf8_lossy(&other),
            )),
        }
    }
}

/// Result code carried by every server payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RoundResult {
    NotOver,
    Tie,
    Loss,
    Win,
}

impl RoundResult {
    #[must_use]
    pub fn to_wire(self) -> u8 {
        match self {
            Self::NotOver => 0,
            Self::Tie => 1,
            Self::Loss => 2,
            Self::Win => 3,
        }
    }

    #[must_use]
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotOver),
            1 => Some(Self::Tie),
            2 => Some(Self::Loss),
            3 => Some(Self::Win),
            _ => None,
        }
    }

    /// The finished outcome, or `None` while the round is still running.
    #[must_use]
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Self::NotOver => None,
            Self::Tie => Some(Outcome::Tie),
            Self::Loss => Some(Outcome::Loss),
            Self::Win => Some(Outcome::Win),
        }
    }
}

impl From<Outcome> for RoundResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Win => Self::Win,
            Outcome::Loss => Self::Loss,
            Outcome::Tie => Self::Tie,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotOver => "NOT_OVER",
            Self::Tie => "TIE",
            Self::Loss => "LOSS",
            Self::Win => "WIN",
        };
        write!(f, "{repr}")
    }
}

/// Server-to-client record used both for dealt cards and for the final
/// result. Finished rounds carry [`FILLER_CARD`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundPayload {
    pub result: RoundResult,
    pub card: Card,
}

impl RoundPayload {
    #[must_use]
    pub fn card(card: Card) -> Self {
        Self {
            result: RoundResult::NotOver,
            card,
        }
    }

    #[must_use]
    pub fn finished(outcome: Outcome) -> Self {
        Self {
            result: outcome.into(),
            card: FILLER_CARD,
        }
    }
}

#[derive(Deserialize, Serialize)]
struct PayloadBody {
    result: u8,
    rank: u16,
    suit: u8,
}

impl WireMessage for RoundPayload {
    const KIND: MessageKind = MessageKind::Payload;

    fn encode(&self) -> Result<Vec<u8>> {
        let Card(rank, suit) = self.card;
        if !(ACE..=KING).contains(&rank) {
            return Err(ProtocolError::invalid("rank", rank));
        }
        let body = PayloadBody {
            result: self.result.to_wire(),
            rank: u16::from(rank),
            suit: suit.to_wire(),
        };
        encode_frame(Self::KIND, body)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let body: PayloadBody = decode_frame(Self::KIND, bytes)?;
        let result = RoundResult::from_wire(body.result)
            .ok_or_else(|| ProtocolError::invalid("result", body.result))?;
        let rank = u8::try_from(body.rank)
            .ok()
            .filter(|rank| (ACE..=KING).contains(rank))
            .ok_or_else(|| ProtocolError::invalid("rank", body.rank))?;
        let suit =
            Suit::from_wire(body.suit).ok_or_else(|| ProtocolError::invalid("suit", body.suit))?;
        Ok(Self {
            result,
            card: Card(rank, suit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(tag: u8) -> Vec<u8> {
        let mut bytes = MAGIC_COOKIE.to_be_bytes().to_vec();
        bytes.push(tag);
        bytes
    }

    #[test]
    fn offer_layout() {
        let offer = Offer {
            tcp_port: 0x1F90,
            server_name: "dealer".to_string(),
        };
        let bytes = offer.encode().unwrap();
        assert_eq!(bytes.len(), 39);
        assert_eq!(&bytes[..5], &[0xAB, 0xCD, 0xDC, 0xBA, 0x02]);
        assert_eq!(&bytes[5..7], &[0x1F, 0x90]);
        assert_eq!(&bytes[7..13], b"dealer");
        assert!(bytes[13..].iter().all(|&b| b == 0));
    }

    #[test]
    fn request_layout() {
        let request = Request {
            num_rounds: 3,
            client_name: "alice".to_string(),
        };
        let bytes = request.encode().unwrap();
        assert_eq!(bytes.len(), 38);
        assert_eq!(&bytes[..5], &header(0x03)[..]);
        assert_eq!(bytes[5], 3);
        assert_eq!(&bytes[6..11], b"alice");
        assert!(bytes[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn decision_layout() {
        let hit = Decision::Hit.encode().unwrap();
        assert_eq!(hit.len(), 10);
        assert_eq!(&hit[..5], &header(0x04)[..]);
        assert_eq!(&hit[5..], b"Hittt");
        assert_eq!(&Decision::Stand.encode().unwrap()[5..], b"Stand");
    }

    #[test]
    fn payload_layout() {
        let payload = RoundPayload::card(Card(12, Suit::Club));
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes, [0xAB, 0xCD, 0xDC, 0xBA, 0x04, 0x00, 0x00, 0x0C, 0x02]);
    }

    #[test]
    fn finished_payload_carries_filler_card() {
        let bytes = RoundPayload::finished(Outcome::Win).encode().unwrap();
        assert_eq!(&bytes[5..], &[0x03, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn long_names_are_truncated() {
        let offer = Offer {
            tcp_port: 1,
            server_name: "x".repeat(40),
        };
        let decoded = Offer::decode(&offer.encode().unwrap()).unwrap();
        assert_eq!(decoded.server_name, "x".repeat(NAME_LEN));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 31 ASCII bytes followed by a 2-byte character that doesn't fit.
        let name = format!("{}é", "a".repeat(31));
        let request = Request {
            num_rounds: 1,
            client_name: name,
        };
        let decoded = Request::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded.client_name, "a".repeat(31));
    }

    #[test]
    fn names_decode_leniently() {
        let mut bytes = header(0x02);
        bytes.extend_from_slice(&[0x00, 0x50]);
        let mut name = [0u8; NAME_LEN];
        name[..4].copy_from_slice(&[b'a', 0xFF, 0xFE, b'b']);
        bytes.extend_from_slice(&name);
        let offer = Offer::decode(&bytes).unwrap();
        assert_eq!(offer.tcp_port, 80);
        assert!(offer.server_name.starts_with('a'));
        assert!(offer.server_name.ends_with('b'));
    }

    #[test]
    fn full_width_name_without_terminator() {
        let name = "n".repeat(NAME_LEN);
        let request = Request {
            num_rounds: 255,
            client_name: name.clone(),
        };
        let decoded = Request::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded.client_name, name);
        assert_eq!(decoded.num_rounds, 255);
    }

    #[test]
    fn zero_rounds_rejected_both_ways() {
        let request = Request {
            num_rounds: 0,
            client_name: "bob".to_string(),
        };
        assert!(matches!(
            request.encode(),
            Err(ProtocolError::InvalidField { field: "num_rounds", .. })
        ));

        let mut bytes = header(0x03);
        bytes.push(0);
        bytes.extend_from_slice(&[0u8; NAME_LEN]);
        assert!(matches!(
            Request::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "num_rounds", .. })
        ));
    }

    #[test]
    fn out_of_range_rank_is_not_encoded() {
        for rank in [0, 14, 255] {
            let payload = RoundPayload::card(Card(rank, Suit::Heart));
            assert!(matches!(
                payload.encode(),
                Err(ProtocolError::InvalidField { field: "rank", .. })
            ));
        }
    }

    #[test]
    fn out_of_range_payload_fields_are_rejected() {
        let base = RoundPayload::card(Card(5, Suit::Spade)).encode().unwrap();

        let mut bad_result = base.clone();
        bad_result[5] = 4;
        assert!(matches!(
            RoundPayload::decode(&bad_result),
            Err(ProtocolError::InvalidField { field: "result", .. })
        ));

        let mut bad_rank = base.clone();
        bad_rank[6] = 0x01;
        assert!(matches!(
            RoundPayload::decode(&bad_rank),
            Err(ProtocolError::InvalidField { field: "rank", .. })
        ));

        let mut bad_suit = base;
        bad_suit[8] = 4;
        assert!(matches!(
            RoundPayload::decode(&bad_suit),
            Err(ProtocolError::InvalidField { field: "suit", .. })
        ));
    }

    #[test]
    fn unknown_decision_literal() {
        let mut bytes = header(0x04);
        bytes.extend_from_slice(b"Hit!!");
        assert!(matches!(
            Decision::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "decision", .. })
        ));
    }

    type Decoder = fn(&[u8]) -> Result<()>;

    /// One valid record of every kind, with the decoder for that kind.
    fn samples() -> Vec<(MessageKind, Vec<u8>, Decoder)> {
        fn decoder<T: WireMessage>(bytes: &[u8]) -> Result<()> {
            T::decode(bytes).map(drop)
        }
        vec![
            (
                MessageKind::Offer,
                Offer {
                    tcp_port: 4000,
                    server_name: "table".to_string(),
                }
                .encode()
                .unwrap(),
                decoder::<Offer> as Decoder,
            ),
            (
                MessageKind::Request,
                Request {
                    num_rounds: 3,
                    client_name: "alice".to_string(),
                }
                .encode()
                .unwrap(),
                decoder::<Request> as Decoder,
            ),
            (
                MessageKind::Decision,
                Decision::Stand.encode().unwrap(),
                decoder::<Decision> as Decoder,
            ),
            (
                MessageKind::Payload,
                RoundPayload::finished(Outcome::Tie).encode().unwrap(),
                decoder::<RoundPayload> as Decoder,
            ),
        ]
    }

    fn assert_malformed(kind: MessageKind, result: Result<()>) {
        match result {
            Err(ProtocolError::MalformedMessage { kind: reported, .. }) => {
                assert_eq!(reported, kind)
            }
            other => panic!("{kind} accepted a broken record: {other:?}"),
        }
    }

    #[test]
    fn samples_decode() {
        for (kind, bytes, decode) in samples() {
            assert_eq!(bytes.len(), kind.size());
            decode(&bytes).unwrap();
        }
    }

    #[test]
    fn bad_magic() {
        for (kind, bytes, decode) in samples() {
            for byte in 0..4 {
                let mut broken = bytes.clone();
                broken[byte] ^= 0xFF;
                assert_malformed(kind, decode(&broken));
            }
        }
    }

    #[test]
    fn foreign_tag() {
        for (kind, bytes, decode) in samples() {
            for tag in [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0xFF] {
                if tag == kind.tag() {
                    continue;
                }
                let mut broken = bytes.clone();
                broken[4] = tag;
                assert_malformed(kind, decode(&broken));
            }
        }
    }

    #[test]
    fn wrong_length() {
        for (kind, bytes, decode) in samples() {
            assert_malformed(kind, decode(&[]));
            assert_malformed(kind, decode(&bytes[..5]));
            assert_malformed(kind, decode(&bytes[..bytes.len() - 1]));
            let mut long = bytes.clone();
            long.push(0);
            assert_malformed(kind, decode(&long));
        }
    }

    #[test]
    fn offer_prefix_is_not_a_request() {
        let offer = Offer {
            tcp_port: 1,
            server_name: String::new(),
        }
        .encode()
        .unwrap();
        let mut as_request = offer[..MessageKind::Request.size()].to_vec();
        as_request[5] = 1;
        assert_malformed(MessageKind::Request, Request::decode(&as_request).map(drop));
    }

    #[test]
    fn result_codes() {
        for result in [
            RoundResult::NotOver,
            RoundResult::Tie,
            RoundResult::Loss,
            RoundResult::Win,
        ] {
            assert_eq!(RoundResult::from_wire(result.to_wire()), Some(result));
        }
        assert_eq!(RoundResult::Win.outcome(), Some(Outcome::Win));
        assert_eq!(RoundResult::NotOver.outcome(), None);
        assert_eq!(RoundResult::Loss.to_string(), "LOSS");
    }
}
