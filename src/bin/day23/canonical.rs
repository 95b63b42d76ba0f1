//! A one-line textual form of a burrow, listing its occupants in
//! position order: `4x2: B@r0.0 A@r0.1 C@r1.0 ...`.  Two burrows with
//! the same layout are equal exactly when their canonical forms are
//! equal.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use regex::{Captures, Regex};

use crate::amphipod::Amphipod;
use crate::burrow::Burrow;
use crate::position::{Layout, Position};

#[derive(Debug)]
pub struct BadCanonicalForm {
    input: String,
    message: String,
}

impl Display for BadCanonicalForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "bad canonical form '{}': {}", self.input, self.message)
    }
}

impl Error for BadCanonicalForm {}

pub fn to_canonical(burrow: &Burrow) -> String {
    let layout = burrow.layout();
    let mut result = format!("{}x{}:", layout.rooms(), layout.depth());
    for (pos, who) in burrow.occupants() {
        result.push_str(&format!(" {}@{}", who, pos));
    }
    result
}

pub struct CanonicalParser {
    header_rx: Regex,
    occupant_rx: Regex,
}

impl CanonicalParser {
    pub fn new() -> CanonicalParser {
        CanonicalParser {
            header_rx: Regex::new(r"^\s*(\d+)x(\d+):(.*)$").unwrap(),
            occupant_rx: Regex::new(r"^([A-Za-z])@(?:h(\d+)|r(\d+)\.(\d+))$").unwrap(),
        }
    }

    fn fail(input: &str, message: String) -> BadCanonicalForm {
        BadCanonicalForm {
            input: input.to_string(),
            message,
        }
    }

    fn number(input: &str, caps: &Captures, group: usize) -> Result<u8, BadCanonicalForm> {
        let text = caps.get(group).map(|m| m.as_str()).unwrap_or("");
        text.parse()
            .map_err(|e| Self::fail(input, format!("bad number '{}': {}", text, e)))
    }

    fn parse_occupant(&self, input: &str, token: &str) -> Result<(Position, Amphipod), BadCanonicalForm> {
        let caps = match self.occupant_rx.captures(token) {
            Some(caps) => caps,
            None => {
                return Err(Self::fail(input, format!("cannot understand '{}'", token)));
            }
        };
        let symbol = caps[1].chars().next().unwrap_or(' ');
        let who = Amphipod::try_from(symbol).map_err(|e| Self::fail(input, e))?;
        let pos = if caps.get(2).is_some() {
            Position::Hallway(Self::number(input, &caps, 2)?)
        } else {
            Position::Room {
                room: Self::number(input, &caps, 3)?,
                slot: Self::number(input, &caps, 4)?,
            }
        };
        Ok((pos, who))
    }

    pub fn parse(&self, input: &str) -> Result<Burrow, BadCanonicalForm> {
        let input = input.trim_end();
        let caps = match self.header_rx.captures(input) {
            Some(caps) => caps,
            None => {
                return Err(Self::fail(
                    input,
                    "expected '<rooms>x<depth>:' at the start".to_string(),
                ));
            }
        };
        let layout = Layout::new(Self::number(input, &caps, 1)?, Self::number(input, &caps, 2)?)
            .map_err(|e| Self::fail(input, e))?;
        let occupants = caps[3]
            .split_whitespace()
            .map(|token| self.parse_occupant(input, token))
            .collect::<Result<Vec<(Position, Amphipod)>, BadCanonicalForm>>()?;
        Burrow::from_occupants(layout, occupants).map_err(|e| Self::fail(input, e))
    }
}

#[test]
fn test_to_canonical() {
    let sample = crate::burrow::sample_input();
    assert_eq!(
        to_canonical(&sample),
        "4x2: B@r0.0 A@r0.1 C@r1.0 D@r1.1 B@r2.0 C@r2.1 D@r3.0 A@r3.1"
    );
}

#[test]
fn test_canonical_round_trip() {
    let parser = CanonicalParser::new();
    let sample = crate::burrow::sample_input();
    assert_eq!(parser.parse(&to_canonical(&sample)).expect("valid"), sample);

    let layout = Layout::new(4, 2).expect("valid layout");
    let empty = Burrow::new(layout);
    assert_eq!(to_canonical(&empty), "4x2:");
    assert_eq!(parser.parse("4x2:").expect("valid"), empty);
}

#[test]
fn test_canonical_order_does_not_matter() {
    let parser = CanonicalParser::new();
    let a = parser.parse("2x1: A@h0 B@r0.0").expect("valid");
    let b = parser.parse("2x1:  B@r0.0   A@h0\n").expect("valid");
    assert_eq!(a, b);
    assert_eq!(to_canonical(&a), "2x1: A@h0 B@r0.0");
}

#[test]
fn test_bad_canonical_forms() {
    let parser = CanonicalParser::new();
    assert!(parser.parse("").is_err());
    assert!(parser.parse("4x2 A@h0").is_err());
    assert!(parser.parse("4x2: E@h0").is_err());
    assert!(parser.parse("4x2: A@x3").is_err());
    assert!(parser.parse("4x2: A@h2").is_err()); // doorway
    assert!(parser.parse("4x2: A@h0 B@h0").is_err());
    assert!(parser.parse("4x2: A@r0.0").is_err()); // gap
    assert!(parser.parse("9x2:").is_err());
    assert!(parser.parse("4x2: A@h999").is_err());
}
