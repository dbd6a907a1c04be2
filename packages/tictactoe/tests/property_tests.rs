use proptest::prelude::*;

use tictactoe::{
    Board, Cell, ConnectionId, GameError, MoveOutcome, Outcome, Phase, SIZE, Session, Symbol,
};

/// Independent scan of the board used to cross-check `Board::evaluate`.
fn scan(rows: &[[Cell; SIZE]; SIZE]) -> Outcome {
    let mut lines: Vec<[Cell; 3]> = Vec::new();
    for i in 0..SIZE {
        lines.push(rows[i]);
        lines.push([rows[0][i], rows[1][i], rows[2][i]]);
    }
    lines.push([rows[0][0], rows[1][1], rows[2][2]]);
    lines.push([rows[0][2], rows[1][1], rows[2][0]]);

    for symbol in [Symbol::X, Symbol::O] {
        if lines.iter().any(|line| line.iter().all(|c| *c == Some(symbol))) {
            return Outcome::Win(symbol);
        }
    }
    if rows.iter().flatten().all(Option::is_some) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

/// (which player attempts, row, col); rows and cols deliberately overshoot the
/// board on both sides.
fn arb_attempts() -> impl Strategy<Value = Vec<(bool, i64, i64)>> {
    prop::collection::vec((any::<bool>(), -2i64..5, -2i64..5), 0..40)
}

fn arb_cell_order() -> impl Strategy<Value = Vec<usize>> {
    Just((0..SIZE * SIZE).collect::<Vec<_>>()).prop_shuffle()
}

fn started() -> (Session, ConnectionId, ConnectionId) {
    let mut session = Session::new();
    let x = ConnectionId::new();
    let o = ConnectionId::new();
    session.bind(x).unwrap();
    session.bind(o).unwrap();
    (session, x, o)
}

proptest! {
    #[test]
    fn occupancy_matches_accepted_moves(attempts in arb_attempts()) {
        let (mut session, x, o) = started();
        let mut accepted = 0usize;

        for (as_x, row, col) in attempts {
            let who = if as_x { x } else { o };
            let before: Board = *session.board();
            match session.apply_move(who, row, col) {
                Ok(outcome) => {
                    accepted += 1;
                    let p = outcome.placement();
                    prop_assert_eq!(before.cell(p.row, p.col), Some(None));
                    // Every previously placed mark survives
                    for r in 0..SIZE {
                        for c in 0..SIZE {
                            if let Some(Some(s)) = before.cell(r, c) {
                                prop_assert_eq!(session.board().cell(r, c), Some(Some(s)));
                            }
                        }
                    }
                }
                Err(_) => prop_assert_eq!(*session.board(), before),
            }
            prop_assert_eq!(session.board().occupied(), accepted);
            prop_assert_eq!(session.moves_played(), accepted);
        }
    }

    #[test]
    fn turns_strictly_alternate_from_x(attempts in arb_attempts()) {
        let (mut session, x, o) = started();
        let mut movers = Vec::new();

        for (as_x, row, col) in attempts {
            let who = if as_x { x } else { o };
            if let Ok(outcome) = session.apply_move(who, row, col) {
                movers.push(outcome.placement().player);
            }
        }

        for (i, mover) in movers.iter().enumerate() {
            let expected = if i % 2 == 0 { Symbol::X } else { Symbol::O };
            prop_assert_eq!(*mover, expected);
        }
    }

    #[test]
    fn evaluate_matches_post_hoc_scan(attempts in arb_attempts()) {
        let (mut session, x, o) = started();

        for (as_x, row, col) in attempts {
            let who = if as_x { x } else { o };
            if let Ok(outcome) = session.apply_move(who, row, col) {
                let board = session.board();
                prop_assert_eq!(board.evaluate(), scan(&board.rows()));
                if let MoveOutcome::Finished { outcome, .. } = outcome {
                    prop_assert_eq!(outcome, scan(&board.rows()));
                }
            }
        }
    }

    #[test]
    fn finished_sessions_reject_every_move(order in arb_cell_order(), extra in arb_attempts()) {
        let (mut session, x, o) = started();
        // Alternating players over distinct cells always ends within nine moves
        for (i, cell) in order.into_iter().enumerate() {
            let who = if i % 2 == 0 { x } else { o };
            let (row, col) = ((cell / SIZE) as i64, (cell % SIZE) as i64);
            if let MoveOutcome::Finished { .. } = session.apply_move(who, row, col).unwrap() {
                break;
            }
        }
        prop_assert!(matches!(session.phase(), Phase::Finished(_)));

        let frozen = *session.board();
        let phase = session.phase();
        for (as_x, row, col) in extra {
            let who = if as_x { x } else { o };
            prop_assert_eq!(session.apply_move(who, row, col), Err(GameError::GameNotInProgress));
            prop_assert_eq!(*session.board(), frozen);
            prop_assert_eq!(session.phase(), phase);
        }
    }
}

#[test]
fn waiting_session_never_accepts_moves() {
    let mut session = Session::new();
    let x = ConnectionId::new();
    session.bind(x).unwrap();

    for row in -1i64..=3 {
        for col in -1i64..=3 {
            assert_eq!(
                session.apply_move(x, row, col),
                Err(GameError::GameNotInProgress)
            );
        }
    }
    assert_eq!(session.phase(), Phase::WaitingForPlayers);
    assert_eq!(session.board().occupied(), 0);
}
