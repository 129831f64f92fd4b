use super::*;
use shared::domain::{MoverKind, Side};

fn context(max_sessions: usize) -> ApiContext {
    ApiContext::new(GameLimits {
        max_sessions,
        draw_halfmove_limit: 100,
    })
}

fn engine() -> MoverKind {
    MoverKind::Automated {
        engine: "random".to_string(),
    }
}

fn request(player_one: MoverKind, player_two: MoverKind) -> OpenSessionRequest {
    let mode = SessionMode::from_movers(&player_one, &player_two);
    OpenSessionRequest {
        player_one,
        player_two,
        mode,
    }
}

#[tokio::test]
async fn open_session_issues_alphanumeric_ids() {
    let ctx = context(8);
    let first = open_session(&ctx, request(MoverKind::Human, engine()))
        .await
        .expect("open");
    let second = open_session(&ctx, request(MoverKind::Human, engine()))
        .await
        .expect("open");

    for id in [&first.session_id, &second.session_id] {
        assert_eq!(id.as_str().len(), SESSION_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(ctx.session_count().await, 2);
}

#[tokio::test]
async fn mode_must_match_movers() {
    let ctx = context(8);
    let mut mismatched = request(MoverKind::Human, engine());
    mismatched.mode = SessionMode::HumanHuman;

    let err = open_session(&ctx, mismatched)
        .await
        .expect_err("inconsistent mode");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(ctx.session_count().await, 0);
}

#[tokio::test]
async fn session_limit_is_enforced() {
    let ctx = context(1);
    open_session(&ctx, request(MoverKind::Human, MoverKind::Human))
        .await
        .expect("first");
    let err = open_session(&ctx, request(MoverKind::Human, MoverKind::Human))
        .await
        .expect_err("over limit");
    assert_eq!(err.code, ErrorCode::RateLimited);
}

#[tokio::test]
async fn finished_games_give_up_their_slot() {
    let ctx = context(1);
    let finished = open_session(&ctx, request(engine(), engine()))
        .await
        .expect("first");

    let mut side = Side::White;
    loop {
        let reply = play_move(
            &ctx,
            &finished.session_id,
            MoveRequest {
                side,
                descriptor: None,
            },
        )
        .await
        .expect("automated move");
        if reply.result.is_some() {
            break;
        }
        side = side.opposite();
    }
    let summary = session_summary(&ctx, &finished.session_id)
        .await
        .expect("finished game is still readable");
    assert!(summary.result.is_some());

    let second = open_session(&ctx, request(MoverKind::Human, MoverKind::Human))
        .await
        .expect("slot freed");
    assert_eq!(ctx.session_count().await, 1);
    let err = session_summary(&ctx, &finished.session_id)
        .await
        .expect_err("evicted");
    assert_eq!(err.code, ErrorCode::NotFound);

    // An unfinished game still holds its slot.
    let err = open_session(&ctx, request(MoverKind::Human, MoverKind::Human))
        .await
        .expect_err("over limit");
    assert_eq!(err.code, ErrorCode::RateLimited);
    assert!(session_summary(&ctx, &second.session_id).await.is_ok());
}

#[tokio::test]
async fn moves_for_unknown_sessions_are_not_found() {
    let ctx = context(8);
    let err = play_move(
        &ctx,
        &SessionId("missing".to_string()),
        MoveRequest {
            side: Side::White,
            descriptor: None,
        },
    )
    .await
    .expect_err("unknown");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn automated_move_updates_summary() {
    let ctx = context(8);
    let opened = open_session(&ctx, request(engine(), MoverKind::Human))
        .await
        .expect("open");

    let reply = play_move(
        &ctx,
        &opened.session_id,
        MoveRequest {
            side: Side::White,
            descriptor: None,
        },
    )
    .await
    .expect("automated move");

    let summary = session_summary(&ctx, &opened.session_id)
        .await
        .expect("summary");
    assert_eq!(summary.mode, SessionMode::AutomatedHuman);
    assert_eq!(summary.plies, 1);
    assert_eq!(summary.position, reply.position);
    assert_eq!(summary.result, None);
}
