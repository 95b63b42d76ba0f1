use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Debug, Display, Formatter};

use ndarray::Array2;

use crate::amphipod::{Amphipod, Cost};
use crate::position::{door_column, Layout, Path, Position, HALLWAY_LEN};

/// Which moves an amphipod leaving a room is offered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitPolicy {
    /// An amphipod which can walk straight into its home room does
    /// only that.  Stopping in the hallway first can never be
    /// cheaper.
    PreferHome,
    /// Offer every hallway stop as well as the walk home.
    AllStops,
}

/// A snapshot of which amphipod is where.  Empty squares are not
/// stored.  Moves produce new snapshots; a `Burrow` is never changed
/// once built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Burrow {
    layout: Layout,
    location_contents: BTreeMap<Position, Amphipod>,
}

impl Burrow {
    pub fn new(layout: Layout) -> Burrow {
        Burrow {
            layout,
            location_contents: BTreeMap::new(),
        }
    }

    pub fn from_occupants<I>(layout: Layout, occupants: I) -> Result<Burrow, String>
    where
        I: IntoIterator<Item = (Position, Amphipod)>,
    {
        let mut result = Burrow::new(layout);
        for (pos, who) in occupants {
            if result.location_contents.contains_key(&pos) {
                return Err(format!("position {:?} has multiple occupants", &pos));
            }
            result.location_contents.insert(pos, who);
        }
        result.check_invariants()?;
        Ok(result)
    }

    /// Every family with a room in `layout` fills it.
    #[cfg(test)]
    pub fn organized(layout: Layout) -> Burrow {
        let occupants = Amphipod::ALL
            .into_iter()
            .filter(|who| layout.home(*who) < layout.rooms())
            .flat_map(|who| {
                layout
                    .room_slots(layout.home(who))
                    .map(move |pos| (pos, who))
            });
        Burrow::from_occupants(layout, occupants).expect("organized burrows are valid")
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn occupant(&self, pos: &Position) -> Option<Amphipod> {
        self.location_contents.get(pos).copied()
    }

    pub fn occupants(&self) -> impl Iterator<Item = (&Position, &Amphipod)> {
        self.location_contents.iter()
    }

    /// How many amphipods of each family there are.
    pub fn census(&self) -> BTreeMap<Amphipod, usize> {
        let mut counts: BTreeMap<Amphipod, usize> = BTreeMap::new();
        for who in self.location_contents.values() {
            *counts.entry(*who).or_insert(0) += 1
        }
        counts
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        let rooms = self.layout.rooms();
        for (pos, who) in self.location_contents.iter() {
            if !self.layout.contains(pos) {
                return Err(format!(
                    "position {:?} is outside a burrow of {} rooms with depth {}",
                    pos,
                    rooms,
                    self.layout.depth()
                ));
            }
            if let Position::Hallway(x) = pos {
                if self.layout.is_doorway(*x) {
                    return Err(format!("{} is standing in the doorway at {:?}", who, pos));
                }
            }
            if self.layout.home(*who) >= rooms {
                return Err(format!(
                    "{} has no home room in a burrow with {} rooms",
                    who, rooms
                ));
            }
        }
        for room in 0..rooms {
            let mut above_occupied = false;
            for pos in self.layout.room_slots(room) {
                match self.occupant(&pos) {
                    Some(_) => above_occupied = true,
                    None if above_occupied => {
                        return Err(format!("room {} has a gap at {:?}", room, pos));
                    }
                    None => (),
                }
            }
        }
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.location_contents.iter().all(|(pos, who)| match pos {
            Position::Room { room, .. } => *room == self.layout.home(*who),
            Position::Hallway(_) => false,
        })
    }

    /// A room is evictable when it holds at least one amphipod
    /// which belongs in some other room.
    pub fn is_evictable(&self, room: u8) -> bool {
        self.layout
            .room_slots(room)
            .filter_map(|pos| self.occupant(&pos))
            .any(|who| self.layout.home(who) != room)
    }

    pub fn is_receivable(&self, room: u8) -> bool {
        !self.is_evictable(room)
    }

    /// The amphipod at `pos` is in its home room with only its own
    /// family below it, so it never needs to move again.
    pub fn is_settled(&self, pos: &Position) -> bool {
        match (*pos, self.occupant(pos)) {
            (Position::Room { room, slot }, Some(who)) if self.layout.home(who) == room => {
                ((slot + 1)..self.layout.depth())
                    .all(|below| self.occupant(&Position::Room { room, slot: below }) == Some(who))
            }
            _ => false,
        }
    }

    /// Where `who` would stop if it walked into its home room now.
    pub fn home_slot(&self, who: Amphipod) -> Option<Position> {
        let home = self.layout.home(who);
        if home >= self.layout.rooms() || !self.is_receivable(home) {
            return None;
        }
        self.layout
            .room_slots(home)
            .filter(|pos| self.occupant(pos).is_none())
            .last()
    }

    fn position_is_occupied(&self, pos: &Position) -> bool {
        self.location_contents.contains_key(pos)
    }

    pub fn is_path_blocked(&self, path: &Path) -> bool {
        path.steps.iter().any(|pos| self.position_is_occupied(pos))
    }

    fn with_moved_amphipod(&self, from: &Position, to: &Position) -> Burrow {
        if from == to {
            panic!("with_moved_amphipod: it did not actually move");
        }
        if let Some(existing) = self.location_contents.get(to) {
            panic!(
                "with_moved_amphipod: destination {:?} already contains {:?}",
                to, existing,
            );
        }
        let mut next = self.clone();
        let who = match next.location_contents.remove(from) {
            Some(who) => who,
            None => {
                panic!("with_moved_amphipod: nobody is at {:?}", from);
            }
        };
        next.location_contents.insert(*to, who);
        debug_assert_eq!(next.check_invariants(), Ok(()));
        next
    }

    /// The unobstructed paths the amphipod at `current` may take.
    pub fn unblocked_moves_for(&self, current: &Position, policy: ExitPolicy) -> Vec<Path> {
        let who = match self.occupant(current) {
            Some(who) => who,
            None => {
                panic!("unblocked_moves_for: called for unoccupied position {:?}", current);
            }
        };
        if self.is_settled(current) {
            return Vec::new();
        }
        let mut result: Vec<Path> = Vec::new();
        if let Some(home) = self.home_slot(who) {
            let path = Path::between(current, &home);
            if !self.is_path_blocked(&path) {
                result.push(path);
                if policy == ExitPolicy::PreferHome {
                    return result;
                }
            }
        }
        match current {
            // Amphipods in the hallway are locked in place until they
            // can go home.
            Position::Hallway(_) => result,
            Position::Room { .. } => {
                result.extend(
                    self.layout
                        .resting_places()
                        .map(|stop| Path::between(current, &stop))
                        .filter(|path| !self.is_path_blocked(path)),
                );
                result
            }
        }
    }

    pub fn legal_moves(&self, policy: ExitPolicy) -> Vec<(Burrow, Cost)> {
        let mut result = Vec::new();
        for (pos, who) in self.location_contents.iter() {
            let unit_cost: Cost = self.layout.step_cost(*who);
            for path in self.unblocked_moves_for(pos, policy) {
                match path.last() {
                    Some(last) => {
                        let next_state = self.with_moved_amphipod(pos, last);
                        result.push((next_state, path.total_cost(unit_cost)));
                    }
                    None => {
                        panic!(
                            "unblocked_moves_for({:?}) at {:?} suggested an empty path",
                            who, pos,
                        );
                    }
                }
            }
        }
        result
    }

    /// A lower bound on the energy needed to settle everybody.
    pub fn heuristic(&self) -> Cost {
        let mut total_h: Cost = Cost(0);
        for (pos, who) in self.location_contents.iter() {
            if self.is_settled(pos) {
                continue;
            }
            // Walk to the doorway of the home room, then at least one
            // step inside.
            let doorway = door_column(self.layout.home(*who));
            total_h += self.layout.step_cost(*who) * (pos.distance_to_column(doorway) + 1);
        }
        total_h
    }

    fn render(&self) -> Array2<char> {
        let depth = usize::from(self.layout.depth());
        let width = usize::from(HALLWAY_LEN) + 2;
        let right_wall = 2 + 2 * usize::from(self.layout.rooms());
        let mut grid = Array2::from_elem((depth + 3, width), ' ');
        for x in 0..width {
            grid[(0, x)] = '#';
            grid[(2, x)] = '#';
        }
        grid[(1, 0)] = '#';
        grid[(1, width - 1)] = '#';
        for y in 3..(depth + 3) {
            for x in 2..=right_wall {
                grid[(y, x)] = '#';
            }
        }
        let symbol = |pos: Position| self.occupant(&pos).map(|who| who.symbol()).unwrap_or('.');
        for x in 0..HALLWAY_LEN {
            grid[(1, usize::from(x) + 1)] = symbol(Position::Hallway(x));
        }
        for room in 0..self.layout.rooms() {
            for pos in self.layout.room_slots(room) {
                if let Position::Room { slot, .. } = pos {
                    grid[(2 + usize::from(slot), usize::from(pos.column()) + 1)] = symbol(pos);
                }
            }
        }
        grid
    }
}

impl Display for Burrow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.render().rows() {
            let line: String = row.iter().collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl Debug for Burrow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Burrow{{ {}x{}:",
            self.layout.rooms(),
            self.layout.depth()
        )?;
        for (pos, who) in self.location_contents.iter() {
            write!(f, " {}@{:?}", who, pos)?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
fn room(room: u8, slot: u8) -> Position {
    Position::Room { room, slot }
}

#[cfg(test)]
pub fn sample_input() -> Burrow {
    //            1
    //  01234567890
    // #############
    // #...........#
    // ###B#C#B#D###
    //   #A#D#C#A#
    //   #########
    let layout = Layout::new(4, 2).expect("valid layout");
    Burrow::from_occupants(
        layout,
        vec![
            (room(0, 0), Amphipod::B),
            (room(0, 1), Amphipod::A),
            (room(1, 0), Amphipod::C),
            (room(1, 1), Amphipod::D),
            (room(2, 0), Amphipod::B),
            (room(2, 1), Amphipod::C),
            (room(3, 0), Amphipod::D),
            (room(3, 1), Amphipod::A),
        ],
    )
    .expect("sample input is valid")
}

#[test]
fn test_occupant() {
    let s = sample_input();
    assert_eq!(s.occupant(&room(2, 0)), Some(Amphipod::B));
    assert_eq!(s.occupant(&Position::Hallway(3)), None);
    assert_eq!(s.census().get(&Amphipod::C), Some(&2));
}

#[test]
fn test_unblocked_moves_for() {
    let current = sample_input();
    let paths = current.unblocked_moves_for(&room(2, 0), ExitPolicy::PreferHome);
    let mut destinations: HashSet<u8> = HashSet::with_capacity(10);
    for path in paths {
        assert_eq!(path.steps.first(), Some(&Position::Hallway(6)));
        match path.last() {
            Some(Position::Hallway(x)) => {
                destinations.insert(*x);
            }
            other => panic!("unexpected destination {:?}", other),
        }
    }
    assert!(destinations.contains(&0));
    assert!(destinations.contains(&1));
    assert!(!destinations.contains(&2)); // doorway
    assert!(destinations.contains(&3));
    assert!(!destinations.contains(&4)); // doorway
    assert!(destinations.contains(&5));
    assert!(!destinations.contains(&6)); // doorway
    assert!(destinations.contains(&7));
    assert!(!destinations.contains(&8)); // doorway
    assert!(destinations.contains(&9));
    assert!(destinations.contains(&10));
    assert_eq!(destinations.len(), 7);

    // The D at the bottom of room 1 is stuck behind the C above it.
    let paths = current.unblocked_moves_for(&room(1, 1), ExitPolicy::PreferHome);
    assert!(paths.is_empty(), "unexpected paths {:#?}", paths);

    // The A at the bottom of room 0 is already home.
    assert!(current.is_settled(&room(0, 1)));
    assert!(current
        .unblocked_moves_for(&room(0, 1), ExitPolicy::AllStops)
        .is_empty());
}

#[test]
fn test_successors() {
    //            1
    //  01234567890
    // #############
    // #.B.D.A.....#
    // ###.#B#.#D###
    //   #.#A#C#C#
    //   #########
    let layout = Layout::new(4, 2).expect("valid layout");
    let s = Burrow::from_occupants(
        layout,
        vec![
            (Position::Hallway(1), Amphipod::B),
            (Position::Hallway(3), Amphipod::D),
            (Position::Hallway(5), Amphipod::A),
            (room(1, 0), Amphipod::B),
            (room(1, 1), Amphipod::A),
            (room(2, 1), Amphipod::C),
            (room(3, 0), Amphipod::D),
            (room(3, 1), Amphipod::C),
        ],
    )
    .expect("valid state");

    // Only the D at the top of room 3 can go anywhere, and only rightwards.
    let succ_states = s.legal_moves(ExitPolicy::PreferHome);
    let mut found: Vec<(Option<u8>, Cost)> = succ_states
        .iter()
        .map(|(next, cost)| {
            assert_eq!(next.occupant(&room(3, 0)), None);
            let stop = next
                .occupants()
                .find(|(pos, who)| {
                    **who == Amphipod::D && matches!(pos, Position::Hallway(x) if *x > 5)
                })
                .map(|(pos, _)| pos.column());
            (stop, *cost)
        })
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            (Some(7), Cost(2000)),
            (Some(9), Cost(2000)),
            (Some(10), Cost(3000)),
        ]
    );
}

#[test]
fn test_direct_route_home_preferred() {
    // The B at the top of room 0 can walk straight into room 1.
    let layout = Layout::new(4, 2).expect("valid layout");
    let s = Burrow::from_occupants(
        layout,
        vec![
            (room(0, 0), Amphipod::B),
            (room(0, 1), Amphipod::A),
            (room(1, 1), Amphipod::B),
        ],
    )
    .expect("valid state");
    let preferred = s.unblocked_moves_for(&room(0, 0), ExitPolicy::PreferHome);
    assert_eq!(preferred.len(), 1);
    assert_eq!(preferred[0].last(), Some(&room(1, 0)));
    assert_eq!(preferred[0].total_cost(Cost(10)), Cost(40));

    let everything = s.unblocked_moves_for(&room(0, 0), ExitPolicy::AllStops);
    assert_eq!(everything.len(), 1 + 7);
    assert_eq!(everything[0], preferred[0]);
}

#[test]
fn test_is_settled() {
    //            1
    //  01234567890
    // #############
    // #DC.D.B.B.B.#
    // ###.#.#.#D###
    //   #.#C#.#A#
    //   #.#B#A#C#
    //   #A#D#C#A#
    //   #########
    let layout = Layout::new(4, 4).expect("valid layout");
    let s = Burrow::from_occupants(
        layout,
        vec![
            (Position::Hallway(0), Amphipod::D),
            (Position::Hallway(1), Amphipod::C),
            (Position::Hallway(3), Amphipod::D),
            (Position::Hallway(5), Amphipod::B),
            (Position::Hallway(7), Amphipod::B),
            (Position::Hallway(9), Amphipod::B),
            (room(0, 3), Amphipod::A),
            (room(1, 1), Amphipod::C),
            (room(1, 2), Amphipod::B),
            (room(1, 3), Amphipod::D),
            (room(2, 2), Amphipod::A),
            (room(2, 3), Amphipod::C),
            (room(3, 0), Amphipod::D),
            (room(3, 1), Amphipod::A),
            (room(3, 2), Amphipod::C),
            (room(3, 3), Amphipod::A),
        ],
    )
    .expect("valid state");
    assert!(s.is_settled(&room(0, 3)));
    assert!(s.is_settled(&room(2, 3)));
    assert!(!s.is_settled(&room(1, 2)));
    assert!(!s.is_settled(&room(3, 0)));
    assert!(!s.is_settled(&Position::Hallway(5)));
    assert_eq!(s.home_slot(Amphipod::A), Some(room(0, 2)));
    assert_eq!(s.home_slot(Amphipod::B), None);
    assert!(s.is_receivable(0));
    assert!(s.is_evictable(1));
    assert!(!s.is_solved());
}

#[test]
fn test_home_slot_of_full_room() {
    let layout = Layout::new(1, 1).expect("valid layout");
    let s = Burrow::from_occupants(
        layout,
        vec![(room(0, 0), Amphipod::A), (Position::Hallway(0), Amphipod::A)],
    )
    .expect("valid state");
    assert_eq!(s.home_slot(Amphipod::A), None);
    assert!(s.legal_moves(ExitPolicy::AllStops).is_empty());
}

#[test]
fn test_is_solved() {
    let layout = Layout::new(4, 2).expect("valid layout");
    assert!(Burrow::organized(layout).is_solved());
    assert!(Burrow::new(layout).is_solved());
    assert!(!sample_input().is_solved());
}

#[test]
fn test_invalid_states_rejected() {
    let layout = Layout::new(2, 2).expect("valid layout");
    // Gap beneath an amphipod.
    assert!(Burrow::from_occupants(layout, vec![(room(0, 0), Amphipod::A)]).is_err());
    // Standing in a doorway.
    assert!(Burrow::from_occupants(layout, vec![(Position::Hallway(4), Amphipod::A)]).is_err());
    // No room for C in a two-room burrow.
    assert!(Burrow::from_occupants(layout, vec![(room(0, 1), Amphipod::C)]).is_err());
    // Off the end of the room.
    assert!(Burrow::from_occupants(layout, vec![(room(1, 2), Amphipod::A)]).is_err());
    // Two amphipods in one place.
    assert!(Burrow::from_occupants(
        layout,
        vec![(room(0, 1), Amphipod::A), (room(0, 1), Amphipod::B)]
    )
    .is_err());
}

#[test]
#[should_panic]
fn test_move_onto_occupied_square_panics() {
    let s = sample_input();
    s.with_moved_amphipod(&room(0, 0), &room(1, 0));
}

#[test]
fn test_generated_states_keep_invariants() {
    let start = sample_input();
    let census = start.census();
    let mut seen: HashSet<Burrow> = HashSet::new();
    let mut todo: VecDeque<Burrow> = VecDeque::new();
    todo.push_back(start);
    while let Some(current) = todo.pop_front() {
        if seen.len() >= 5000 {
            break;
        }
        if !seen.insert(current.clone()) {
            continue;
        }
        for (next, cost) in current.legal_moves(ExitPolicy::AllStops) {
            assert_eq!(next.check_invariants(), Ok(()));
            assert_eq!(next.census(), census);
            assert_ne!(next, current);
            assert!(cost > Cost(0));
            todo.push_back(next);
        }
    }
    assert!(seen.len() > 1000);
}

#[test]
fn test_heuristic() {
    let layout = Layout::new(4, 2).expect("valid layout");
    assert_eq!(Burrow::organized(layout).heuristic(), Cost(0));
    // B at r0.0: 1 up, 2 across, 1 in.  A at r3.1: 2 up, 6 across, 1 in.
    // C at r1.0: 1 up, 2 across, 1 in.  D at r1.1: 2 up, 4 across, 1 in.
    // B at r2.0: 1 up, 2 across, 1 in.  D at r3.0: 1 up, 0 across, 1 in.
    assert_eq!(
        sample_input().heuristic(),
        Cost(40 + 9 + 400 + 7000 + 40 + 2000)
    );
}

#[test]
fn test_display() {
    let expected = concat!(
        "#############\n",
        "#...........#\n",
        "###B#C#B#D###\n",
        "  #A#D#C#A#\n",
        "  #########\n",
    );
    assert_eq!(sample_input().to_string(), expected);

    let small = Burrow::from_occupants(
        Layout::new(2, 1).expect("valid layout"),
        vec![(room(0, 0), Amphipod::B), (Position::Hallway(10), Amphipod::A)],
    )
    .expect("valid state");
    assert_eq!(
        small.to_string(),
        concat!("#############\n", "#..........A#\n", "###B#.#######\n", "  #####\n",)
    );
}
