//! Fixed-point solver for the 2½-player parity-3 product game.

use log::trace;

use crate::game::{Move, NodeIndex, Player, ProductGame, Region};

/// The quantification over player-2 moves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Quantification {
    /// Player 2 is adversarial: a player-2 node satisfies a move
    /// condition only if every move does.
    Adversarial,
    /// Player 2 cooperates: one satisfying move suffices for either
    /// player.
    Cooperative,
}

/// Returns the player-1 almost-surely winning region against an
/// adversarial player 2.
pub fn solve(game: &ProductGame) -> Region {
    SolverInstance::new(game, Quantification::Adversarial).run()
}

/// Returns the player-1 almost-surely winning region with a cooperative
/// player 2.
pub fn solve_cooperative(game: &ProductGame) -> Region {
    SolverInstance::new(game, Quantification::Cooperative).run()
}

struct SolverInstance<'a> {
    game: &'a ProductGame,
    quantification: Quantification,
}

impl<'a> SolverInstance<'a> {
    fn new(game: &'a ProductGame, quantification: Quantification) -> Self {
        Self {
            game,
            quantification,
        }
    }

    fn all_in(targets: &Move, region: &Region) -> bool {
        targets.iter().all(|&j| region[j])
    }

    fn any_in(targets: &Move, region: &Region) -> bool {
        targets.iter().any(|&j| region[j])
    }

    /// Evaluates the per-state predicate for the given move condition.
    fn satisfies<C: Fn(&Move) -> bool>(&self, index: NodeIndex, condition: C) -> bool {
        let node = &self.game[index];
        match (self.quantification, node.owner()) {
            (Quantification::Adversarial, Player::Two) => node.moves().iter().all(condition),
            _ => node.moves().iter().any(condition),
        }
    }

    /// One application of the combined predecessor operator
    /// `pre₁(S₀, X) ∪ pre₂(S₁, X, Y) ∪ pre₃(S₂, Z, X, Y)`.
    fn step(&self, x: &Region, y: &Region, z: &Region) -> Region {
        let mut next = Region::with_capacity(self.game.num_nodes());
        for i in self.game.nodes_with_priority(0) {
            if self.satisfies(i, |targets| Self::all_in(targets, x)) {
                next.insert(i);
            }
        }
        for i in self.game.nodes_with_priority(1) {
            if self.satisfies(i, |targets| {
                Self::all_in(targets, x) && Self::any_in(targets, y)
            }) {
                next.insert(i);
            }
        }
        for i in self.game.nodes_with_priority(2) {
            if self.satisfies(i, |targets| {
                Self::all_in(targets, z) || (Self::all_in(targets, x) && Self::any_in(targets, y))
            }) {
                next.insert(i);
            }
        }
        next
    }

    /// The triply-nested fixed point: a greatest fixed point over `Z`
    /// inside a least fixed point over `Y` inside a greatest fixed point
    /// over `X`.
    fn run(&self) -> Region {
        let n = self.game.num_nodes();
        let mut x = Region::full(n);
        loop {
            let mut y = Region::with_capacity(n);
            loop {
                let mut z = Region::full(n);
                loop {
                    let z_next = self.step(&x, &y, &z);
                    if z_next == z {
                        break;
                    }
                    z = z_next;
                }
                if z == y {
                    break;
                }
                y = z;
            }
            trace!("outer iteration: |X| = {}, |Y*| = {}", x.size(), y.size());
            if y == x {
                break;
            }
            x = y;
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::NodeId;
    use tinyvec::tiny_vec;

    /// A reachability chain: from `a` the single action has one support
    /// covering both `a` and the priority-0 cycle at `b`.
    fn chain_game() -> ProductGame {
        let mut game = ProductGame::default();
        let (a1, _) = game.take(NodeId::p1("a", "q0"), 1);
        let (a2, _) = game.take(NodeId::p2("a", 0, "q0"), 1);
        let (b1, _) = game.take(NodeId::p1("b", "q1"), 0);
        let (b2, _) = game.take(NodeId::p2("b", 0, "q1"), 0);
        game.add_move(a1, tiny_vec!(_ => a2));
        game.add_move(a2, tiny_vec![a1, b1]);
        game.add_move(b1, tiny_vec!(_ => b2));
        game.add_move(b2, tiny_vec!(_ => b1));
        game.add_initial(a1);
        game.validate().unwrap();
        game
    }

    /// As [`chain_game`], but player 2 may also choose a support that
    /// stays in `a` forever.
    fn chain_game_with_escape() -> ProductGame {
        let mut game = ProductGame::default();
        let (a1, _) = game.take(NodeId::p1("a", "q0"), 1);
        let (a2, _) = game.take(NodeId::p2("a", 0, "q0"), 1);
        let (b1, _) = game.take(NodeId::p1("b", "q1"), 0);
        let (b2, _) = game.take(NodeId::p2("b", 0, "q1"), 0);
        game.add_move(a1, tiny_vec!(_ => a2));
        game.add_move(a2, tiny_vec!(_ => a1));
        game.add_move(a2, tiny_vec![a1, b1]);
        game.add_move(b1, tiny_vec!(_ => b2));
        game.add_move(b2, tiny_vec!(_ => b1));
        game.add_initial(a1);
        game.validate().unwrap();
        game
    }

    /// A dead-end loop: two nodes of priority 1 pointing at each other.
    fn losing_game() -> ProductGame {
        let mut game = ProductGame::default();
        let (a1, _) = game.take(NodeId::p1("", "__END__"), 1);
        let (a2, _) = game.take(NodeId::p2("", 0, "__END__"), 1);
        game.add_move(a1, tiny_vec!(_ => a2));
        game.add_move(a2, tiny_vec!(_ => a1));
        game.validate().unwrap();
        game
    }

    #[test]
    fn test_almost_sure_reachability_wins() {
        let game = chain_game();
        let win = solve(&game);
        // every step has positive probability of entering the even cycle
        assert_eq!(win.size(), game.num_nodes());
    }

    #[test]
    fn test_adversarial_support_choice_loses() {
        let game = chain_game_with_escape();
        let win = solve(&game);
        let coop = solve_cooperative(&game);
        let a1 = game.node_index(&NodeId::p1("a", "q0")).unwrap();
        let b1 = game.node_index(&NodeId::p1("b", "q1")).unwrap();
        // player 2 pins the play in the odd-priority part
        assert!(!win[a1]);
        assert!(win[b1]);
        // with cooperation the chain support is chosen
        assert!(coop[a1]);
        assert!(coop[b1]);
    }

    #[test]
    fn test_neutral_loop_wins() {
        // a play that never visits E satisfies the Streett pair vacuously
        let mut game = ProductGame::default();
        let (a1, _) = game.take(NodeId::p1("a", "q0"), 2);
        let (a2, _) = game.take(NodeId::p2("a", 0, "q0"), 2);
        game.add_move(a1, tiny_vec!(_ => a2));
        game.add_move(a2, tiny_vec!(_ => a1));
        game.validate().unwrap();
        assert_eq!(solve(&game).size(), 2);
    }

    #[test]
    fn test_odd_loop_loses_for_both_quantifications() {
        let game = losing_game();
        assert_eq!(solve(&game).size(), 0);
        assert_eq!(solve_cooperative(&game).size(), 0);
    }

    #[test]
    fn test_adversarial_subset_of_cooperative() {
        for game in &[chain_game(), chain_game_with_escape(), losing_game()] {
            let win = solve(game);
            let coop = solve_cooperative(game);
            assert!(win.is_subset(&coop));
        }
    }

    #[test]
    fn test_solver_deterministic() {
        let game = chain_game_with_escape();
        assert_eq!(solve(&game), solve(&game));
        assert_eq!(solve_cooperative(&game), solve_cooperative(&game));
    }

    #[test]
    fn test_inner_iteration_monotone() {
        let game = chain_game_with_escape();
        let instance = SolverInstance::new(&game, Quantification::Adversarial);
        let n = game.num_nodes();
        let x = Region::full(n);
        let mut y = Region::with_capacity(n);
        loop {
            // the Z sequence decreases towards its fixed point
            let mut z = Region::full(n);
            loop {
                let z_next = instance.step(&x, &y, &z);
                assert!(z_next.is_subset(&z));
                if z_next == z {
                    break;
                }
                z = z_next;
            }
            // the Y sequence increases towards its fixed point
            assert!(y.is_subset(&z));
            if z == y {
                break;
            }
            y = z;
        }
    }
}
