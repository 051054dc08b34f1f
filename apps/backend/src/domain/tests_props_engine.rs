//! Property tests for the rule engine: cell permanence, turn alternation and the
//! three win policies checked against an independent oracle.
//!
//! Increase cases locally with: PROPTEST_CASES=800 cargo test

use std::collections::HashMap;

use proptest::prelude::*;

use crate::domain::board::{Position, Seat};
use crate::domain::engine::GameEngine;
use crate::domain::rules::GameRule;

const SIZE: i32 = 9;

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);
    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

fn moves_strategy() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec((-1..=SIZE, -1..=SIZE), 1..80)
}

fn rule_strategy() -> impl Strategy<Value = GameRule> {
    prop_oneof![
        Just(GameRule::Standard),
        Just(GameRule::FreeStyle),
        Just(GameRule::Caro),
    ]
}

/// Naive oracle: full uncapped run length through `last` along `(dx, dy)` and whether each
/// end is held by the opponent.
fn oracle_run(
    cells: &HashMap<Position, Seat>,
    last: Position,
    (dx, dy): (i32, i32),
) -> (i32, bool, bool) {
    let owner = cells[&last];
    let mut fwd = 1;
    while cells.get(&last.offset(dx, dy, fwd)) == Some(&owner) {
        fwd += 1;
    }
    let mut bwd = 1;
    while cells.get(&last.offset(dx, dy, -bwd)) == Some(&owner) {
        bwd += 1;
    }
    let capped = |pos: Position| cells.get(&pos) == Some(&owner.opponent());
    (
        fwd + bwd - 1,
        capped(last.offset(dx, dy, fwd)),
        capped(last.offset(dx, dy, -bwd)),
    )
}

fn oracle_wins(rule: GameRule, cells: &HashMap<Position, Seat>, last: Position) -> bool {
    [(1, 0), (0, 1), (1, 1), (1, -1)].iter().any(|&dir| {
        let (len, capped_f, capped_b) = oracle_run(cells, last, dir);
        match rule {
            GameRule::Standard => len == 5,
            GameRule::FreeStyle => len >= 5,
            GameRule::Caro => len == 5 && !(capped_f && capped_b),
        }
    })
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn owned_cells_are_never_overwritten(moves in moves_strategy(), rule in rule_strategy()) {
        let mut engine = GameEngine::new(SIZE as usize, SIZE as usize, rule);
        let mut owners: HashMap<Position, Seat> = HashMap::new();
        for (x, y) in moves {
            let pos = Position::new(x, y);
            let mover = engine.current_player();
            let before = owners.get(&pos).copied();
            let accepted = engine.place_piece(pos);
            if accepted {
                prop_assert!(before.is_none());
                owners.insert(pos, mover);
            }
            for (cell, seat) in &owners {
                prop_assert_eq!(engine.board().owner(*cell), Some(*seat));
            }
        }
    }

    #[test]
    fn turn_alternates_only_on_accepted_moves(moves in moves_strategy(), rule in rule_strategy()) {
        let mut engine = GameEngine::new(SIZE as usize, SIZE as usize, rule);
        for (x, y) in moves {
            let before = engine.current_player();
            let accepted = engine.place_piece(Position::new(x, y));
            if accepted && !engine.is_game_over() {
                prop_assert_eq!(engine.current_player(), before.opponent());
            } else {
                prop_assert_eq!(engine.current_player(), before);
            }
        }
    }

    #[test]
    fn win_matches_oracle(moves in moves_strategy(), rule in rule_strategy()) {
        let mut engine = GameEngine::new(SIZE as usize, SIZE as usize, rule);
        let mut cells: HashMap<Position, Seat> = HashMap::new();
        for (x, y) in moves {
            let pos = Position::new(x, y);
            let mover = engine.current_player();
            if !engine.place_piece(pos) {
                continue;
            }
            cells.insert(pos, mover);
            let expected = oracle_wins(rule, &cells, pos);
            prop_assert_eq!(engine.winner() == Some(mover), expected);
            if expected {
                let line = engine.winning_line().unwrap_or_default();
                prop_assert!(line.contains(&pos));
                prop_assert!(line.iter().all(|c| cells.get(c) == Some(&mover)));
                break;
            }
            if engine.is_game_over() {
                break;
            }
        }
    }

    #[test]
    fn game_over_is_monotonic(moves in moves_strategy(), rule in rule_strategy()) {
        let mut engine = GameEngine::new(SIZE as usize, SIZE as usize, rule);
        let mut seen_over = false;
        for (x, y) in moves {
            let accepted = engine.place_piece(Position::new(x, y));
            if seen_over {
                prop_assert!(!accepted);
                prop_assert!(engine.is_game_over());
            }
            seen_over = engine.is_game_over();
        }
    }
}
