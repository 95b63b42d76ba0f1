use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign, Mul};

use pathfinding::num_traits::Zero;

/// Energy spent moving amphipods around.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Cost(pub u64);

impl Zero for Cost {
    fn zero() -> Self {
        Cost(0)
    }
    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Mul<u64> for Cost {
    type Output = Cost;
    fn mul(self, n: u64) -> <Self as Mul<u64>>::Output {
        Cost(self.0 * n)
    }
}

impl AddAssign<Cost> for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        self.0 += rhs.0
    }
}

impl Add<Cost> for Cost {
    type Output = Cost;
    fn add(self, other: Cost) -> <Self as Add<Cost>>::Output {
        Cost(self.0 + other.0)
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Amphipod {
    A,
    B,
    C,
    D,
}

impl Amphipod {
    #[cfg(test)]
    pub const ALL: [Amphipod; 4] = [Amphipod::A, Amphipod::B, Amphipod::C, Amphipod::D];

    fn index(&self) -> usize {
        match self {
            Amphipod::A => 0,
            Amphipod::B => 1,
            Amphipod::C => 2,
            Amphipod::D => 3,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Amphipod::A => 'A',
            Amphipod::B => 'B',
            Amphipod::C => 'C',
            Amphipod::D => 'D',
        }
    }
}

impl TryFrom<char> for Amphipod {
    type Error = String;
    fn try_from(ch: char) -> Result<Amphipod, String> {
        match ch {
            'A' => Ok(Amphipod::A),
            'B' => Ok(Amphipod::B),
            'C' => Ok(Amphipod::C),
            'D' => Ok(Amphipod::D),
            _ => Err(format!("unknown symbol {}, should be A, B, C or D", ch)),
        }
    }
}

impl Display for Amphipod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The per-family movement cost and home room.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Rules {
    step_costs: [u64; 4],
    homes: [u8; 4],
}

impl Rules {
    pub const STANDARD: Rules = Rules {
        step_costs: [1, 10, 100, 1000],
        homes: [0, 1, 2, 3],
    };

    pub fn step_cost(&self, who: Amphipod) -> Cost {
        Cost(self.step_costs[who.index()])
    }

    /// The index of the room `who` wants to end up in.
    pub fn home(&self, who: Amphipod) -> u8 {
        self.homes[who.index()]
    }

    /// Rules in which `a` and `b` have traded both their step cost
    /// and their home room.
    #[cfg(test)]
    pub fn swapped(&self, a: Amphipod, b: Amphipod) -> Rules {
        let mut result = *self;
        result.step_costs.swap(a.index(), b.index());
        result.homes.swap(a.index(), b.index());
        result
    }
}

impl Default for Rules {
    fn default() -> Rules {
        Rules::STANDARD
    }
}

#[test]
fn test_standard_rules() {
    let rules = Rules::STANDARD;
    assert_eq!(rules.step_cost(Amphipod::A), Cost(1));
    assert_eq!(rules.step_cost(Amphipod::D), Cost(1000));
    assert_eq!(rules.home(Amphipod::C), 2);
}

#[test]
fn test_swapped_rules() {
    let rules = Rules::STANDARD.swapped(Amphipod::A, Amphipod::B);
    assert_eq!(rules.step_cost(Amphipod::A), Cost(10));
    assert_eq!(rules.step_cost(Amphipod::B), Cost(1));
    assert_eq!(rules.home(Amphipod::A), 1);
    assert_eq!(rules.home(Amphipod::B), 0);
    assert_eq!(rules.home(Amphipod::D), 3);
}

#[test]
fn test_amphipod_from_char() {
    assert_eq!(Amphipod::try_from('C'), Ok(Amphipod::C));
    assert!(Amphipod::try_from('E').is_err());
    for who in Amphipod::ALL {
        assert_eq!(Amphipod::try_from(who.symbol()), Ok(who));
    }
}
