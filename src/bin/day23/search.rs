use std::collections::HashMap;
use std::str::FromStr;

use pathfinding::directed::astar::astar;
use pathfinding::directed::dijkstra::dijkstra;
use pathfinding::num_traits::Zero;
use tracing::{event, span, Level};

use crate::amphipod::Cost;
use crate::burrow::{Burrow, ExitPolicy};

/// How to search for the cheapest way to rearrange the burrow.  All
/// strategies find the same cost.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Strategy {
    Memoized,
    Dijkstra,
    AStar,
}

impl FromStr for Strategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Strategy, String> {
        match s {
            "memoized" => Ok(Strategy::Memoized),
            "dijkstra" => Ok(Strategy::Dijkstra),
            "astar" => Ok(Strategy::AStar),
            _ => Err(format!(
                "unknown search strategy '{}', should be memoized, dijkstra or astar",
                s
            )),
        }
    }
}

/// Depth-first search which remembers the best cost from every
/// burrow it has seen.  Every move changes who is where, and nobody
/// moves more than twice, so the move graph has no cycles.
pub struct MemoizedSearch<'a> {
    target: &'a Burrow,
    policy: ExitPolicy,
    cache: HashMap<Burrow, Option<Cost>>,
}

impl<'a> MemoizedSearch<'a> {
    pub fn new(target: &'a Burrow, policy: ExitPolicy) -> MemoizedSearch<'a> {
        MemoizedSearch {
            target,
            policy,
            cache: HashMap::new(),
        }
    }

    /// The cheapest way to get from `state` to the target, or `None`
    /// if the target can't be reached.
    pub fn minimum_cost(&mut self, state: &Burrow) -> Option<Cost> {
        if state == self.target {
            return Some(Cost::zero());
        }
        if let Some(known) = self.cache.get(state) {
            return *known;
        }
        let best: Option<Cost> = state
            .legal_moves(self.policy)
            .into_iter()
            .filter_map(|(next, step_cost)| self.minimum_cost(&next).map(|rest| step_cost + rest))
            .min();
        self.cache.insert(state.clone(), best);
        best
    }

    pub fn states_explored(&self) -> usize {
        self.cache.len()
    }
}

fn dijkstra_cost(start: &Burrow, target: &Burrow, policy: ExitPolicy) -> Option<Cost> {
    let successors = |s: &Burrow| -> Vec<(Burrow, Cost)> { s.legal_moves(policy) };
    let success = |s: &Burrow| -> bool { s == target };
    dijkstra(start, successors, success).map(|(path, cost)| {
        event!(Level::DEBUG, "dijkstra: solution takes {} moves", path.len() - 1);
        cost
    })
}

fn astar_cost(start: &Burrow, target: &Burrow, policy: ExitPolicy) -> Option<Cost> {
    // The heuristic only underestimates when the target has
    // everybody at home.
    let informed = target.is_solved();
    if !informed {
        event!(
            Level::DEBUG,
            "astar: target is not a solved burrow, so searching without a heuristic",
        );
    }
    let heuristic = |s: &Burrow| -> Cost {
        if informed {
            s.heuristic()
        } else {
            Cost::zero()
        }
    };
    let successors = |s: &Burrow| -> Vec<(Burrow, Cost)> { s.legal_moves(policy) };
    let success = |s: &Burrow| -> bool { s == target };
    astar(start, successors, heuristic, success).map(|(path, cost)| {
        event!(Level::DEBUG, "astar: solution takes {} moves", path.len() - 1);
        cost
    })
}

/// The least energy needed to turn `start` into `target`.  `None`
/// means there is no way to do it.
pub fn minimum_cost(
    start: &Burrow,
    target: &Burrow,
    strategy: Strategy,
    policy: ExitPolicy,
) -> Option<Cost> {
    let span = span!(Level::INFO, "minimum_cost", ?strategy, ?policy);
    let _enter = span.enter();
    if start.layout() != target.layout() || start.census() != target.census() {
        event!(
            Level::WARN,
            "start {:?} and target {:?} do not hold the same amphipods in the same burrow",
            start,
            target,
        );
        return None;
    }
    let result = match strategy {
        Strategy::Memoized => {
            let mut search = MemoizedSearch::new(target, policy);
            let result = search.minimum_cost(start);
            event!(
                Level::DEBUG,
                "memoized search examined {} states",
                search.states_explored()
            );
            result
        }
        Strategy::Dijkstra => dijkstra_cost(start, target, policy),
        Strategy::AStar => astar_cost(start, target, policy),
    };
    match result {
        Some(cost) => event!(Level::INFO, "minimum cost is {}", cost),
        None => event!(Level::INFO, "target is unreachable"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amphipod::{Amphipod, Rules};
    use crate::burrow::sample_input;
    use crate::position::{Layout, Position};

    fn room(room: u8, slot: u8) -> Position {
        Position::Room { room, slot }
    }

    fn relabel(burrow: &Burrow, layout: Layout, a: Amphipod, b: Amphipod) -> Burrow {
        let swap = |who: Amphipod| {
            if who == a {
                b
            } else if who == b {
                a
            } else {
                who
            }
        };
        Burrow::from_occupants(
            layout,
            burrow.occupants().map(|(pos, who)| (*pos, swap(*who))),
        )
        .expect("relabelled burrow is valid")
    }

    /// The cheapest of every complete sequence of moves, found
    /// without remembering anything.
    fn brute_force(state: &Burrow, target: &Burrow) -> Option<Cost> {
        if state == target {
            return Some(Cost(0));
        }
        state
            .legal_moves(ExitPolicy::AllStops)
            .into_iter()
            .filter_map(|(next, step)| brute_force(&next, target).map(|rest| step + rest))
            .min()
    }

    fn unfolded_sample() -> Burrow {
        let layout = Layout::new(4, 4).expect("valid layout");
        let rows = ["BCBD", "DCBA", "DBAC", "ADCA"];
        let occupants = rows.iter().enumerate().flat_map(|(slot, row)| {
            row.chars().enumerate().map(move |(r, ch)| {
                (
                    room(r as u8, slot as u8),
                    Amphipod::try_from(ch).expect("valid amphipod"),
                )
            })
        });
        Burrow::from_occupants(layout, occupants).expect("valid burrow")
    }

    fn swap_puzzle() -> (Burrow, Burrow) {
        let layout = Layout::new(2, 1).expect("valid layout");
        let start = Burrow::from_occupants(
            layout,
            vec![(room(0, 0), Amphipod::B), (room(1, 0), Amphipod::A)],
        )
        .expect("valid burrow");
        (start, Burrow::organized(layout))
    }

    #[test]
    fn test_sample_folded() {
        let start = sample_input();
        let target = Burrow::organized(*start.layout());
        let mut search = MemoizedSearch::new(&target, ExitPolicy::PreferHome);
        assert_eq!(search.minimum_cost(&start), Some(Cost(12521)));
        assert!(search.states_explored() > 0);
    }

    #[test]
    fn test_sample_unfolded() {
        let start = unfolded_sample();
        let target = Burrow::organized(*start.layout());
        assert_eq!(
            minimum_cost(&start, &target, Strategy::Memoized, ExitPolicy::PreferHome),
            Some(Cost(44169))
        );
    }

    #[test]
    fn test_strategies_agree() {
        let start = sample_input();
        let target = Burrow::organized(*start.layout());
        for strategy in [Strategy::Memoized, Strategy::Dijkstra, Strategy::AStar] {
            assert_eq!(
                minimum_cost(&start, &target, strategy, ExitPolicy::PreferHome),
                Some(Cost(12521)),
                "strategy {:?}",
                strategy
            );
        }
    }

    #[test]
    fn test_exit_policies_agree() {
        let start = sample_input();
        let target = Burrow::organized(*start.layout());
        let mut shortcut = MemoizedSearch::new(&target, ExitPolicy::PreferHome);
        let mut everything = MemoizedSearch::new(&target, ExitPolicy::AllStops);
        assert_eq!(shortcut.minimum_cost(&start), Some(Cost(12521)));
        assert_eq!(everything.minimum_cost(&start), Some(Cost(12521)));
        assert!(shortcut.states_explored() <= everything.states_explored());
    }

    #[test]
    fn test_same_state_costs_nothing() {
        for s in [sample_input(), unfolded_sample(), swap_puzzle().0] {
            for strategy in [Strategy::Memoized, Strategy::Dijkstra, Strategy::AStar] {
                assert_eq!(
                    minimum_cost(&s, &s, strategy, ExitPolicy::PreferHome),
                    Some(Cost(0))
                );
            }
        }
    }

    #[test]
    fn test_relabelling() {
        let start = sample_input();
        let target = Burrow::organized(*start.layout());
        let layout = start
            .layout()
            .with_rules(Rules::STANDARD.swapped(Amphipod::A, Amphipod::B));
        let swapped_start = relabel(&start, layout, Amphipod::A, Amphipod::B);
        let swapped_target = relabel(&target, layout, Amphipod::A, Amphipod::B);
        assert!(swapped_target.is_solved());
        assert_eq!(
            minimum_cost(
                &swapped_start,
                &swapped_target,
                Strategy::Memoized,
                ExitPolicy::PreferHome
            ),
            Some(Cost(12521))
        );
    }

    #[test]
    fn test_single_amphipod() {
        let layout = Layout::new(1, 1).expect("valid layout");
        let target = Burrow::organized(layout);
        for x in [0, 1, 3, 10] {
            let start = Burrow::from_occupants(layout, vec![(Position::Hallway(x), Amphipod::A)])
                .expect("valid burrow");
            let expected = Cost(u64::from(x.abs_diff(2)) + 1);
            assert_eq!(brute_force(&start, &target), Some(expected));
            assert_eq!(
                minimum_cost(&start, &target, Strategy::Memoized, ExitPolicy::PreferHome),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_swap_puzzle() {
        // B steps out to column 3, A waits at column 5, B goes home
        // and then A goes home: 20 + 2 + 20 + 4.
        let (start, target) = swap_puzzle();
        assert_eq!(brute_force(&start, &target), Some(Cost(46)));
        for strategy in [Strategy::Memoized, Strategy::Dijkstra, Strategy::AStar] {
            for policy in [ExitPolicy::PreferHome, ExitPolicy::AllStops] {
                assert_eq!(
                    minimum_cost(&start, &target, strategy, policy),
                    Some(Cost(46))
                );
            }
        }
    }

    #[test]
    fn test_brute_force_agrees_on_small_burrows() {
        let three_rooms = Layout::new(3, 1).expect("valid layout");
        let mut starts: Vec<Burrow> = ["CAB", "BCA", "CBA"]
            .iter()
            .map(|rooms| {
                let occupants = rooms.chars().enumerate().map(|(r, ch)| {
                    (room(r as u8, 0), Amphipod::try_from(ch).expect("valid amphipod"))
                });
                Burrow::from_occupants(three_rooms, occupants).expect("valid burrow")
            })
            .collect();
        starts.push(
            Burrow::from_occupants(
                Layout::new(2, 2).expect("valid layout"),
                vec![
                    (Position::Hallway(0), Amphipod::B),
                    (Position::Hallway(10), Amphipod::A),
                    (room(0, 1), Amphipod::B),
                    (room(1, 1), Amphipod::A),
                ],
            )
            .expect("valid burrow"),
        );
        for start in starts {
            let target = Burrow::organized(*start.layout());
            let expected = brute_force(&start, &target);
            assert!(expected.is_some(), "no solution for {:?}", start);
            for strategy in [Strategy::Memoized, Strategy::Dijkstra, Strategy::AStar] {
                for policy in [ExitPolicy::PreferHome, ExitPolicy::AllStops] {
                    assert_eq!(
                        minimum_cost(&start, &target, strategy, policy),
                        expected,
                        "{:?} {:?} from {:?}",
                        strategy,
                        policy,
                        start
                    );
                }
            }
        }
    }

    #[test]
    fn test_unreachable() {
        // The only room is full, so the A in the hallway can never
        // get in, and the A in the room never needs to leave.
        let layout = Layout::new(1, 1).expect("valid layout");
        let start = Burrow::from_occupants(
            layout,
            vec![(room(0, 0), Amphipod::A), (Position::Hallway(0), Amphipod::A)],
        )
        .expect("valid burrow");
        let target = Burrow::from_occupants(
            layout,
            vec![(room(0, 0), Amphipod::A), (Position::Hallway(10), Amphipod::A)],
        )
        .expect("valid burrow");
        for strategy in [Strategy::Memoized, Strategy::Dijkstra, Strategy::AStar] {
            assert_eq!(
                minimum_cost(&start, &target, strategy, ExitPolicy::PreferHome),
                None
            );
        }
        assert_eq!(brute_force(&start, &target), None);
    }

    #[test]
    fn test_mismatched_amphipods_are_unreachable() {
        let start = sample_input();
        let target = Burrow::organized(Layout::new(4, 4).expect("valid layout"));
        assert_eq!(
            minimum_cost(&start, &target, Strategy::Memoized, ExitPolicy::PreferHome),
            None
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("astar".parse::<Strategy>(), Ok(Strategy::AStar));
        assert_eq!("memoized".parse::<Strategy>(), Ok(Strategy::Memoized));
        assert!("bfs".parse::<Strategy>().is_err());
    }
}
