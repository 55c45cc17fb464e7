use crate::engine::{Direction, Location, Order};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides the orders of the players the agent plays against.
///
/// Called once per turn for every opposing player that still has ants, after
/// the agent's orders have been submitted and before the turn is finished.
pub trait OpponentStrategy: Send + Sync {
    fn orders(&mut self, player: usize, ants: &[Location]) -> Vec<Order>;
}

/// Opponents that never move.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passive;

impl OpponentStrategy for Passive {
    fn orders(&mut self, _player: usize, _ants: &[Location]) -> Vec<Order> {
        Vec::new()
    }
}

/// Opponents that move every ant in a random direction.
#[derive(Clone, Debug)]
pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new(seed: u64) -> RandomOpponent {
        RandomOpponent {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from `seed` when given, from the operating system otherwise.
    pub fn from_seed(seed: Option<u64>) -> RandomOpponent {
        match seed {
            Some(seed) => RandomOpponent::new(seed),
            None => RandomOpponent {
                rng: StdRng::from_entropy(),
            },
        }
    }
}

impl OpponentStrategy for RandomOpponent {
    fn orders(&mut self, _player: usize, ants: &[Location]) -> Vec<Order> {
        ants.iter()
            .map(|&(row, col)| {
                let direction: Direction = self.rng.gen();
                Order::new(row, col, direction)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_asking_a_passive_opponent_for_orders_none_are_returned() {
        assert!(Passive.orders(1, &[(0, 0), (1, 1)]).is_empty());
    }

    #[test]
    fn when_asking_a_random_opponent_for_orders_every_ant_gets_one() {
        let ants = [(0, 0), (2, 3), (4, 1)];
        let orders = RandomOpponent::new(0).orders(1, &ants);

        let locations: Vec<Location> = orders.iter().map(Order::location).collect();
        assert_eq!(locations, ants.to_vec());
    }

    #[test]
    fn when_two_random_opponents_share_a_seed_they_issue_the_same_orders() {
        let ants: Vec<Location> = (0..16).map(|col| (0, col)).collect();

        let first = RandomOpponent::new(42).orders(1, &ants);
        let second = RandomOpponent::from_seed(Some(42)).orders(1, &ants);

        assert_eq!(first, second);
    }
}
