use std::env;
use std::io;
use std::io::prelude::*;

use tracing::{event, Level};
use tracing_subscriber::prelude::*;

mod amphipod;
mod burrow;
mod canonical;
mod diagram;
mod position;
mod search;

use burrow::{Burrow, ExitPolicy};
use canonical::{to_canonical, CanonicalParser};
use diagram::{parse_diagram, unfold};
use search::{minimum_cost, Strategy};

const ORGANIZED_FOLDED: &str = concat!(
    "#############\n",
    "#...........#\n",
    "###A#B#C#D###\n",
    "  #A#B#C#D#\n",
    "  #########\n",
);

const ORGANIZED_UNFOLDED: &str = concat!(
    "#############\n",
    "#...........#\n",
    "###A#B#C#D###\n",
    "  #A#B#C#D#\n",
    "  #A#B#C#D#\n",
    "  #A#B#C#D#\n",
    "  #########\n",
);

#[derive(Debug, PartialEq, Eq)]
struct Config {
    strategy: Strategy,
    policy: ExitPolicy,
}

impl Config {
    fn from_vars(strategy: Option<&str>, exits: Option<&str>) -> Result<Config, String> {
        let strategy = match strategy {
            None => Strategy::Memoized,
            Some(s) => s.parse()?,
        };
        let policy = match exits {
            None | Some("prefer-home") => ExitPolicy::PreferHome,
            Some("all-stops") => ExitPolicy::AllStops,
            Some(other) => {
                return Err(format!(
                    "unknown exit policy '{}', should be prefer-home or all-stops",
                    other
                ));
            }
        };
        Ok(Config { strategy, policy })
    }

    fn from_env() -> Result<Config, String> {
        let strategy = env::var("BURROW_STRATEGY").ok();
        let exits = env::var("BURROW_EXITS").ok();
        Config::from_vars(strategy.as_deref(), exits.as_deref())
    }
}

fn init_tracing() -> Result<(), String> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .map_err(|e| e.to_string())?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// The fully sorted burrow for a burrow of the same shape as `start`.
fn target_for(start: &Burrow) -> Result<Burrow, String> {
    let layout = start.layout();
    let diagram = match (layout.rooms(), layout.depth()) {
        (4, 2) => ORGANIZED_FOLDED,
        (4, 4) => ORGANIZED_UNFOLDED,
        (rooms, depth) => {
            return Err(format!(
                "don't know what a sorted burrow of {} rooms with depth {} looks like",
                rooms, depth
            ));
        }
    };
    parse_diagram(diagram).map_err(|e| e.to_string())
}

fn solve_part(part: u32, start: &Burrow, config: &Config) -> Result<(), String> {
    let target = target_for(start)?;
    event!(Level::DEBUG, "part {} starts from:\n{}", part, start);
    event!(Level::DEBUG, "part {} canonical start: {}", part, to_canonical(start));
    match minimum_cost(start, &target, config.strategy, config.policy) {
        Some(cost) => println!("Day 23 part {}: minimum energy is {}", part, cost),
        None => println!("Day 23 part {}: no solution", part),
    }
    Ok(())
}

fn run() -> Result<(), String> {
    init_tracing()?;
    let config = Config::from_env()?;
    event!(Level::DEBUG, "configuration: {:?}", config);

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read input: {}", e))?;

    if input.trim_start().starts_with('#') {
        let start = parse_diagram(&input).map_err(|e| e.to_string())?;
        if start.layout().depth() == 2 {
            solve_part(1, &start, &config)?;
            let unfolded = unfold(&input).map_err(|e| e.to_string())?;
            let start = parse_diagram(&unfolded).map_err(|e| e.to_string())?;
            solve_part(2, &start, &config)
        } else {
            solve_part(2, &start, &config)
        }
    } else {
        let start = CanonicalParser::new()
            .parse(&input)
            .map_err(|e| e.to_string())?;
        solve_part(1, &start, &config)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[test]
fn test_config_from_vars() {
    assert_eq!(
        Config::from_vars(None, None),
        Ok(Config {
            strategy: Strategy::Memoized,
            policy: ExitPolicy::PreferHome,
        })
    );
    assert_eq!(
        Config::from_vars(Some("dijkstra"), Some("all-stops")),
        Ok(Config {
            strategy: Strategy::Dijkstra,
            policy: ExitPolicy::AllStops,
        })
    );
    assert!(Config::from_vars(Some("bfs"), None).is_err());
    assert!(Config::from_vars(None, Some("sometimes")).is_err());
}

#[test]
fn test_targets_are_solved() {
    for diagram in [ORGANIZED_FOLDED, ORGANIZED_UNFOLDED] {
        let target = parse_diagram(diagram).expect("target literal is valid");
        assert!(target.is_solved());
        assert_eq!(target, Burrow::organized(*target.layout()));
    }
}

#[test]
fn test_no_target_for_small_burrows() {
    let start = Burrow::new(position::Layout::new(2, 1).expect("valid layout"));
    assert!(target_for(&start).is_err());
}
