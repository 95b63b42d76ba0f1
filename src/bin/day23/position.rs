use std::fmt::{self, Debug, Display, Formatter};

use crate::amphipod::{Amphipod, Cost, Rules};

//            1
//  01234567890
// #############
// #...........#   hallway
// ###B#C#B#D###   slot 0
//   #A#D#C#A#     slot 1
//   #########
//    0 1 2 3      room

pub const HALLWAY_LEN: u8 = 11;
pub const MAX_ROOMS: u8 = 4;

/// The hallway column directly outside `room`.
pub fn door_column(room: u8) -> u8 {
    2 + 2 * room
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Position {
    Hallway(u8),
    /// Slot 0 is the slot nearest the hallway.
    Room { room: u8, slot: u8 },
}

impl Position {
    pub fn column(&self) -> u8 {
        match self {
            Position::Hallway(x) => *x,
            Position::Room { room, .. } => door_column(*room),
        }
    }

    /// Number of steps between this position and the hallway.
    pub fn rise(&self) -> u64 {
        match self {
            Position::Hallway(_) => 0,
            Position::Room { slot, .. } => u64::from(*slot) + 1,
        }
    }

    /// Length of the walk from here to the hallway square at `x`.
    pub fn distance_to_column(&self, x: u8) -> u64 {
        self.rise() + u64::from(self.column().abs_diff(x))
    }
}

impl Debug for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Position::Hallway(x) => write!(f, "h{}", x),
            Position::Room { room, slot } => write!(f, "r{}.{}", room, slot),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// The shape of a burrow: how many rooms there are, how deep they
/// are, and which rules the amphipods in it follow.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Layout {
    rooms: u8,
    depth: u8,
    rules: Rules,
}

impl Layout {
    pub fn new(rooms: u8, depth: u8) -> Result<Layout, String> {
        if rooms == 0 || rooms > MAX_ROOMS {
            return Err(format!(
                "a burrow has between 1 and {} rooms, not {}",
                MAX_ROOMS, rooms
            ));
        }
        if depth == 0 {
            return Err("rooms must have at least one slot".to_string());
        }
        Ok(Layout {
            rooms,
            depth,
            rules: Rules::default(),
        })
    }

    #[cfg(test)]
    pub fn with_rules(self, rules: Rules) -> Layout {
        Layout { rules, ..self }
    }

    pub fn rooms(&self) -> u8 {
        self.rooms
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn step_cost(&self, who: Amphipod) -> Cost {
        self.rules.step_cost(who)
    }

    pub fn home(&self, who: Amphipod) -> u8 {
        self.rules.home(who)
    }

    pub fn room_at_column(&self, x: u8) -> Option<u8> {
        (0..self.rooms).find(|room| door_column(*room) == x)
    }

    pub fn is_doorway(&self, x: u8) -> bool {
        self.room_at_column(x).is_some()
    }

    pub fn contains(&self, pos: &Position) -> bool {
        match pos {
            Position::Hallway(x) => *x < HALLWAY_LEN,
            Position::Room { room, slot } => *room < self.rooms && *slot < self.depth,
        }
    }

    /// The hallway squares an amphipod may stop on.
    pub fn resting_places(&self) -> impl Iterator<Item = Position> + '_ {
        (0..HALLWAY_LEN)
            .filter(move |x| !self.is_doorway(*x))
            .map(Position::Hallway)
    }

    /// The slots of `room`, from the hallway downwards.
    pub fn room_slots(&self, room: u8) -> impl Iterator<Item = Position> {
        (0..self.depth).map(move |slot| Position::Room { room, slot })
    }
}

/// The squares an amphipod passes through during a single move, in
/// order.  The starting square is not included; the destination is.
#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    pub steps: Vec<Position>,
}

impl Debug for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Path{{ steps: {:?} }}", &self.steps)
    }
}

impl Path {
    pub fn between(from: &Position, to: &Position) -> Path {
        let mut steps: Vec<Position> = Vec::with_capacity(16);
        match (*from, *to) {
            (
                Position::Room { room: a, slot: s },
                Position::Room { room: b, slot: t },
            ) if a == b => {
                // Shuffling within one room never goes via the hallway.
                if s < t {
                    steps.extend(((s + 1)..=t).map(|slot| Position::Room { room: a, slot }));
                } else {
                    steps.extend((t..s).rev().map(|slot| Position::Room { room: a, slot }));
                }
            }
            _ => {
                if let Position::Room { room, slot } = *from {
                    steps.extend((0..slot).rev().map(|slot| Position::Room { room, slot }));
                    steps.push(Position::Hallway(door_column(room)));
                }
                let (x0, x1) = (from.column(), to.column());
                if x0 < x1 {
                    steps.extend(((x0 + 1)..=x1).map(Position::Hallway));
                } else {
                    steps.extend((x1..x0).rev().map(Position::Hallway));
                }
                if let Position::Room { room, slot } = *to {
                    steps.extend((0..=slot).map(|slot| Position::Room { room, slot }));
                }
            }
        }
        Path { steps }
    }

    pub fn last(&self) -> Option<&Position> {
        self.steps.last()
    }

    pub fn len(&self) -> u64 {
        self.steps.len() as u64
    }

    pub fn total_cost(&self, unit_cost: Cost) -> Cost {
        unit_cost * self.len()
    }
}

#[cfg(test)]
fn room(room: u8, slot: u8) -> Position {
    Position::Room { room, slot }
}

#[test]
fn test_path_from_room_to_room() {
    let path = Path::between(&room(0, 1), &room(1, 0));
    assert_eq!(
        path.steps,
        vec![
            room(0, 0),
            Position::Hallway(2),
            Position::Hallway(3),
            Position::Hallway(4),
            room(1, 0),
        ]
    );
}

#[test]
fn test_path_from_hallway_to_room() {
    let path = Path::between(&Position::Hallway(3), &room(0, 1));
    assert_eq!(
        path.steps,
        vec![Position::Hallway(2), room(0, 0), room(0, 1)]
    );
    assert_eq!(path.total_cost(Cost(10)), Cost(30));
}

#[test]
fn test_path_within_room() {
    assert_eq!(Path::between(&room(2, 0), &room(2, 1)).steps, vec![room(2, 1)]);
    assert_eq!(Path::between(&room(2, 3), &room(2, 1)).steps, vec![room(2, 2), room(2, 1)]);
    assert!(Path::between(&room(2, 1), &room(2, 1)).steps.is_empty());
}

#[test]
fn test_path_leftward_from_room() {
    let path = Path::between(&room(3, 0), &Position::Hallway(0));
    assert_eq!(path.len(), 9);
    assert_eq!(path.steps.first(), Some(&Position::Hallway(8)));
    assert_eq!(path.last(), Some(&Position::Hallway(0)));
}

#[test]
fn test_distance_to_column() {
    assert_eq!(room(0, 1).distance_to_column(2), 2);
    assert_eq!(room(0, 1).distance_to_column(8), 8);
    assert_eq!(Position::Hallway(10).distance_to_column(4), 6);
}

#[test]
fn test_resting_places() {
    let folded = Layout::new(4, 2).expect("valid layout");
    let places: Vec<u8> = folded.resting_places().map(|p| p.column()).collect();
    assert_eq!(places, vec![0, 1, 3, 5, 7, 9, 10]);

    // Without rooms behind them, columns 6 and 8 are ordinary hallway.
    let small = Layout::new(2, 1).expect("valid layout");
    let places: Vec<u8> = small.resting_places().map(|p| p.column()).collect();
    assert_eq!(places, vec![0, 1, 3, 5, 6, 7, 8, 9, 10]);
}

#[test]
fn test_layout_validation() {
    assert!(Layout::new(0, 2).is_err());
    assert!(Layout::new(5, 2).is_err());
    assert!(Layout::new(4, 0).is_err());
    let layout = Layout::new(3, 4).expect("valid layout");
    assert!(layout.contains(&room(2, 3)));
    assert!(!layout.contains(&room(3, 0)));
    assert!(!layout.contains(&room(0, 4)));
    assert!(!layout.contains(&Position::Hallway(11)));
}
