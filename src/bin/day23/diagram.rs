use std::error::Error;
use std::fmt::{self, Display, Formatter};

use nom::{
    branch::alt,
    character::complete::{char, space0},
    combinator::{all_consuming, map, recognize, value},
    multi::{count, many1, separated_list1},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

use crate::amphipod::Amphipod;
use crate::burrow::Burrow;
use crate::position::{Layout, Position, HALLWAY_LEN};

/// The rows folded out of the diagram for the second half of the puzzle.
const HIDDEN_ROWS: [&str; 2] = ["  #D#C#B#A#", "  #D#B#A#C#"];

/// Room rows start below hallway column 2, which is column 3 of the line.
const ROOM_INDENT: usize = 3;

#[derive(Debug, PartialEq, Eq)]
pub struct BadDiagram {
    line: Option<usize>,
    message: String,
}

impl BadDiagram {
    fn at_line(line: usize, message: String) -> BadDiagram {
        BadDiagram {
            line: Some(line),
            message,
        }
    }

    fn whole(message: String) -> BadDiagram {
        BadDiagram {
            line: None,
            message,
        }
    }
}

impl Display for BadDiagram {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(n) => write!(f, "bad diagram at line {}: {}", n, self.message),
            None => write!(f, "bad diagram: {}", self.message),
        }
    }
}

impl Error for BadDiagram {}

fn parse_cell(input: &str) -> IResult<&str, Option<Amphipod>> {
    alt((
        value(None, char('.')),
        value(Some(Amphipod::A), char('A')),
        value(Some(Amphipod::B), char('B')),
        value(Some(Amphipod::C), char('C')),
        value(Some(Amphipod::D), char('D')),
    ))(input)
}

fn parse_wall(input: &str) -> IResult<&str, ()> {
    value((), tuple((space0, many1(char('#')), space0)))(input)
}

fn parse_hallway(input: &str) -> IResult<&str, Vec<Option<Amphipod>>> {
    terminated(
        delimited(
            char('#'),
            count(parse_cell, usize::from(HALLWAY_LEN)),
            char('#'),
        ),
        space0,
    )(input)
}

/// A row of rooms, such as `###B#C#B#D###` or `  #A#D#C#A#`.  We
/// return the width of the indentation before the first room along
/// with the contents of each room.
fn parse_room_row(input: &str) -> IResult<&str, (usize, Vec<Option<Amphipod>>)> {
    map(
        tuple((
            recognize(pair(space0, many1(char('#')))),
            separated_list1(char('#'), parse_cell),
            many1(char('#')),
            space0,
        )),
        |(indent, cells, _, _)| (indent.len(), cells),
    )(input)
}

fn check_symbols(lineno: usize, line: &str) -> Result<(), BadDiagram> {
    for ch in line.chars() {
        if ch.is_alphabetic() {
            Amphipod::try_from(ch).map_err(|e| BadDiagram::at_line(lineno, e))?;
        } else if !matches!(ch, '#' | '.' | ' ') {
            return Err(BadDiagram::at_line(
                lineno,
                format!("unexpected character '{}'", ch),
            ));
        }
    }
    Ok(())
}

fn diagram_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|line| !line.trim().is_empty()).collect()
}

pub fn parse_diagram(text: &str) -> Result<Burrow, BadDiagram> {
    let lines = diagram_lines(text);
    if lines.len() < 4 {
        return Err(BadDiagram::whole(format!(
            "expected at least 4 lines, got {}",
            lines.len()
        )));
    }
    for (i, line) in lines.iter().enumerate() {
        check_symbols(i + 1, line)?;
    }
    let last = lines.len() - 1;
    for i in [0, last] {
        if all_consuming(parse_wall)(lines[i]).is_err() {
            return Err(BadDiagram::at_line(
                i + 1,
                format!("expected a wall, got '{}'", lines[i]),
            ));
        }
    }
    let hallway = match all_consuming(parse_hallway)(lines[1]) {
        Ok((_, cells)) => cells,
        Err(e) => {
            return Err(BadDiagram::at_line(
                2,
                format!("failed to parse hallway '{}': {}", lines[1], e),
            ));
        }
    };

    let mut room_rows: Vec<Vec<Option<Amphipod>>> = Vec::with_capacity(last - 2);
    for (i, line) in lines.iter().copied().enumerate().take(last).skip(2) {
        match all_consuming(parse_room_row)(line) {
            Ok((_, (indent, cells))) => {
                if indent != ROOM_INDENT {
                    return Err(BadDiagram::at_line(
                        i + 1,
                        format!("rooms are misaligned with the hallway in '{}'", line),
                    ));
                }
                if let Some(first) = room_rows.first() {
                    if first.len() != cells.len() {
                        return Err(BadDiagram::at_line(
                            i + 1,
                            format!("expected {} rooms, got {}", first.len(), cells.len()),
                        ));
                    }
                }
                room_rows.push(cells);
            }
            Err(e) => {
                return Err(BadDiagram::at_line(
                    i + 1,
                    format!("failed to parse room row '{}': {}", line, e),
                ));
            }
        }
    }

    let rooms = room_rows.first().map(|row| row.len()).unwrap_or(0);
    let layout = match (u8::try_from(rooms), u8::try_from(room_rows.len())) {
        (Ok(rooms), Ok(depth)) => Layout::new(rooms, depth).map_err(BadDiagram::whole)?,
        _ => {
            return Err(BadDiagram::whole(format!(
                "{} rooms of depth {} is far too big",
                rooms,
                room_rows.len()
            )));
        }
    };

    let in_hallway = (0..HALLWAY_LEN)
        .zip(hallway)
        .filter_map(|(x, cell)| cell.map(|who| (Position::Hallway(x), who)));
    let in_rooms = (0..layout.depth()).zip(room_rows).flat_map(|(slot, row)| {
        (0..layout.rooms())
            .zip(row)
            .filter_map(move |(room, cell)| cell.map(|who| (Position::Room { room, slot }, who)))
    });
    Burrow::from_occupants(layout, in_hallway.chain(in_rooms)).map_err(BadDiagram::whole)
}

/// Insert the two hidden rows beneath the first row of rooms.
pub fn unfold(text: &str) -> Result<String, BadDiagram> {
    let lines = diagram_lines(text);
    if lines.len() < 4 {
        return Err(BadDiagram::whole(format!(
            "expected at least 4 lines, got {}",
            lines.len()
        )));
    }
    let mut result = String::with_capacity(text.len() + 32);
    for (i, line) in lines.iter().enumerate() {
        result.push_str(line);
        result.push('\n');
        if i == 2 {
            for hidden in HIDDEN_ROWS {
                result.push_str(hidden);
                result.push('\n');
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
const SAMPLE: &str = concat!(
    "#############\n",
    "#...........#\n",
    "###B#C#B#D###\n",
    "  #A#D#C#A#  \n",
    "  #########  \n",
);

#[test]
fn test_parse_diagram() {
    let sample_handcoded = crate::burrow::sample_input();
    let sample_parsed = parse_diagram(SAMPLE).expect("test input should be valid");
    assert_eq!(sample_parsed, sample_handcoded);
}

#[test]
fn test_parse_hallway_occupants() {
    let burrow = parse_diagram(concat!(
        "#############\n",
        "#.A.......D.#\n",
        "###.#B#C#.###\n",
        "  #A#B#C#D#\n",
        "  #########\n",
    ))
    .expect("valid diagram");
    assert_eq!(burrow.occupant(&Position::Hallway(1)), Some(Amphipod::A));
    assert_eq!(burrow.occupant(&Position::Hallway(9)), Some(Amphipod::D));
    assert_eq!(
        burrow.occupant(&Position::Room { room: 0, slot: 0 }),
        None
    );
}

#[test]
fn test_display_round_trip() {
    let burrow = parse_diagram(&unfold(SAMPLE).expect("unfoldable")).expect("valid diagram");
    let again = parse_diagram(&burrow.to_string()).expect("rendered diagram should parse");
    assert_eq!(burrow, again);
}

#[test]
fn test_unfold() {
    let unfolded = unfold(SAMPLE).expect("unfoldable");
    assert_eq!(
        unfolded,
        concat!(
            "#############\n",
            "#...........#\n",
            "###B#C#B#D###\n",
            "  #D#C#B#A#\n",
            "  #D#B#A#C#\n",
            "  #A#D#C#A#  \n",
            "  #########  \n",
        )
    );
    let burrow = parse_diagram(&unfolded).expect("valid diagram");
    assert_eq!(burrow.layout().depth(), 4);
    assert_eq!(burrow.layout().rooms(), 4);
    assert_eq!(
        burrow.occupant(&Position::Room { room: 3, slot: 2 }),
        Some(Amphipod::C)
    );
}

#[test]
fn test_small_diagram() {
    let burrow = parse_diagram(concat!(
        "#############\n",
        "#...........#\n",
        "###B#A#######\n",
        "  #####\n",
    ))
    .expect("valid diagram");
    assert_eq!(burrow.layout().rooms(), 2);
    assert_eq!(burrow.layout().depth(), 1);
}

#[test]
fn test_bad_diagrams() {
    // Not an amphipod.
    let err = parse_diagram(&SAMPLE.replace("#A#D", "#E#D")).expect_err("E is unknown");
    assert_eq!(err.line, Some(4));
    // An amphipod floating above an empty slot.
    assert!(parse_diagram(&SAMPLE.replace("#A#D", "#.#D")).is_err());
    // Missing the hallway wall.
    assert!(parse_diagram(&SAMPLE.replace("#...........#", "#..........#")).is_err());
    // Standing in a doorway.
    assert!(parse_diagram(&SAMPLE.replace("#...........#", "#..A........#")).is_err());
    // Rows of different widths.
    assert!(parse_diagram(&SAMPLE.replace("#A#D#C#A#", "#A#D#C#")).is_err());
    // Rooms shifted away from their doorways.
    assert!(parse_diagram(&SAMPLE.replace("  #A#D#C#A#", " #A#D#C#A# ")).is_err());
    assert!(parse_diagram("#############\n").is_err());
}
