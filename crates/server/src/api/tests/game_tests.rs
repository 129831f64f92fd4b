use super::*;
use rand::{rngs::StdRng, SeedableRng};
use shakmaty::CastlingMode;

fn parse_position(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.parse().ok()?;
    fen.into_position(CastlingMode::Standard).ok()
}

fn automated() -> MoverKind {
    MoverKind::Automated {
        engine: "random".to_string(),
    }
}

fn human_game() -> HostedGame {
    HostedGame::new(MoverKind::Human, MoverKind::Human, SessionMode::HumanHuman, 100)
}

fn descriptor(text: &str) -> MoveDescriptor {
    text.parse().expect("descriptor")
}

#[test]
fn human_move_is_applied_and_reported() {
    let mut game = human_game();
    let mut rng = StdRng::seed_from_u64(7);
    let reply = game
        .play(Side::White, Some(descriptor("e2e4")), &mut rng)
        .expect("legal");
    assert_eq!(reply.applied_move, descriptor("e2e4"));
    assert!(reply
        .position
        .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
    assert_eq!(reply.result, None);
    assert_eq!(game.plies(), 1);
}

#[test]
fn wrong_side_and_illegal_moves_are_refused() {
    let mut game = human_game();
    let mut rng = StdRng::seed_from_u64(7);

    let err = game
        .play(Side::Black, Some(descriptor("e7e5")), &mut rng)
        .expect_err("not black's turn");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = game
        .play(Side::White, Some(descriptor("e2e5")), &mut rng)
        .expect_err("illegal");
    assert_eq!(err.code, ErrorCode::IllegalMove);
    assert_eq!(game.plies(), 0);
}

#[test]
fn mover_kind_decides_who_may_submit() {
    let mut game = HostedGame::new(
        MoverKind::Human,
        automated(),
        SessionMode::HumanAutomated,
        100,
    );
    let mut rng = StdRng::seed_from_u64(1);

    let err = game.play(Side::White, None, &mut rng).expect_err("human must move");
    assert_eq!(err.code, ErrorCode::Validation);

    game.play(Side::White, Some(descriptor("d2d4")), &mut rng)
        .expect("human move");
    let err = game
        .play(Side::Black, Some(descriptor("d7d5")), &mut rng)
        .expect_err("automated side cannot submit");
    assert_eq!(err.code, ErrorCode::Validation);

    let reply = game.play(Side::Black, None, &mut rng).expect("random move");
    assert_eq!(game.side_to_move(), Side::White);
    assert!(reply.position.split_whitespace().nth(1) == Some("w"));
}

#[test]
fn checkmate_by_black_reports_player_two_win() {
    let position = parse_position("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2")
        .expect("fen");
    let mut game = HostedGame::from_position(
        MoverKind::Human,
        MoverKind::Human,
        SessionMode::HumanHuman,
        position,
        100,
    );
    let mut rng = StdRng::seed_from_u64(3);
    let reply = game
        .play(Side::Black, Some(descriptor("d8h4")), &mut rng)
        .expect("mate");
    assert_eq!(reply.result, Some(-1.0));

    let err = game
        .play(Side::White, Some(descriptor("e2e3")), &mut rng)
        .expect_err("game over");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn stalemate_is_a_draw() {
    // Qc7 leaves the black king on a8 without a move.
    let position = parse_position("k7/8/1Q6/8/8/8/8/4K3 w - - 0 1").expect("fen");
    let mut game = HostedGame::from_position(
        MoverKind::Human,
        MoverKind::Human,
        SessionMode::HumanHuman,
        position,
        100,
    );
    let mut rng = StdRng::seed_from_u64(3);
    let reply = game
        .play(Side::White, Some(descriptor("b6c7")), &mut rng)
        .expect("legal");
    assert_eq!(reply.result, Some(DRAW_RESULT));
}

#[test]
fn threefold_repetition_is_a_draw() {
    let mut game = human_game();
    let mut rng = StdRng::seed_from_u64(3);
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
    let mut last = None;
    for _ in 0..2 {
        for (index, text) in shuffle.iter().enumerate() {
            let side = if index % 2 == 0 { Side::White } else { Side::Black };
            last = game.play(side, Some(descriptor(text)), &mut rng).expect("legal").result;
        }
    }
    assert_eq!(last, Some(DRAW_RESULT));
    assert!(game.is_over());
}

#[test]
fn halfmove_limit_ends_the_game() {
    let mut game = HostedGame::new(MoverKind::Human, MoverKind::Human, SessionMode::HumanHuman, 2);
    let mut rng = StdRng::seed_from_u64(3);
    let first = game
        .play(Side::White, Some(descriptor("g1f3")), &mut rng)
        .expect("legal");
    assert_eq!(first.result, None);
    let second = game
        .play(Side::Black, Some(descriptor("g8f6")), &mut rng)
        .expect("legal");
    assert_eq!(second.result, Some(DRAW_RESULT));
}

#[test]
fn castling_and_promotion_map_back_to_descriptors() {
    let position = parse_position("r3k3/1P6/8/8/8/8/8/R3K2R w KQq - 0 1").expect("fen");
    let mut game = HostedGame::from_position(
        MoverKind::Human,
        MoverKind::Human,
        SessionMode::HumanHuman,
        position,
        100,
    );
    let mut rng = StdRng::seed_from_u64(3);
    let reply = game
        .play(Side::White, Some(descriptor("e1g1")), &mut rng)
        .expect("castle");
    assert_eq!(reply.applied_move, descriptor("e1g1"));
    assert!(reply.position.starts_with("r3k3/1P6/8/8/8/8/8/R4RK1 b"));

    let promotion = descriptor_of(
        &find_move(
            &parse_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").expect("fen"),
            &descriptor("e7e8n"),
        )
        .expect("underpromotion"),
    );
    assert_eq!(promotion, Some(descriptor("e7e8n")));
}

#[test]
fn random_moves_are_always_legal() {
    let mut game = HostedGame::new(automated(), automated(), SessionMode::AutomatedAutomated, 100);
    let mut rng = StdRng::seed_from_u64(42);
    while !game.is_over() && game.plies() < 60 {
        let side = game.side_to_move();
        let before = game.fen();
        let reply = game.play(side, None, &mut rng).expect("random move");
        let replay = parse_position(&before)
            .and_then(|position| find_move(&position, &reply.applied_move));
        assert!(replay.is_some(), "{} not legal in {before}", reply.applied_move);
    }
}
