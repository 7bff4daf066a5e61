//! End-to-end harness tests against scripted stub engines.
//!
//! Each stub is a small shell script speaking just enough UCI to exercise
//! the harness: handshake, option declaration, scripted `bestmove` replies.
//! Faulty engines (stalls, illegal moves, silence) are scripted the same
//! way.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use gauntlet::cancel::CancelToken;
use gauntlet::limit::MoveLimit;
use gauntlet::recorder::{Outcome, ResultRecorder};
use gauntlet::scheduler::{GameError, MatchScheduler, Seat};
use gauntlet::storage::SqliteSink;
use gauntlet::uci_client::{UciClient, UciError};
use gauntlet_chess::ChessOracle;

/// Black mates on the fourth ply.
const FOOLS_MATE: [&str; 4] = ["f2f3", "e7e5", "g2g4", "d8h4"];

/// Writes an executable stub engine script and returns its path.
fn stub_engine(tag: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "gauntlet-stub-{}-{}",
        tag,
        std::process::id()
    ));
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("failed to write stub");
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A stub that answers the handshake and then plays `moves` in order,
/// one per `go`, regardless of position.
fn scripted_engine(tag: &str, name: &str, moves: &[&str]) -> PathBuf {
    let body = format!(
        r#"set -- {moves}
while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name {name}"
      echo "id author stub"
      echo "option name Hash type spin default 16 min 1 max 1024"
      echo "uciok"
      ;;
    isready) echo "readyok" ;;
    go*) echo "bestmove $1"; shift ;;
    quit) exit 0 ;;
  esac
done"#,
        moves = moves.join(" "),
        name = name,
    );
    stub_engine(tag, &body)
}

/// A stub that completes the handshake but never answers `go`.
fn stalling_engine(tag: &str) -> PathBuf {
    let body = r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "id name Staller"; echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
  esac
done"#;
    stub_engine(tag, body)
}

fn connect(path: &PathBuf) -> UciClient {
    let mut client = UciClient::spawn(path)
        .expect("failed to spawn stub")
        .with_grace(Duration::from_millis(200));
    client.init(Duration::from_secs(5)).expect("handshake failed");
    client
}

fn scheduler() -> MatchScheduler<ChessOracle> {
    MatchScheduler::new(
        ChessOracle::new(),
        MoveLimit::move_time(Duration::from_millis(50)).unwrap(),
        ResultRecorder::new(Some("it-run".to_string())),
        CancelToken::new(),
    )
}

#[test]
fn test_scripted_game_ends_in_checkmate() {
    let white_path = scripted_engine("mate-w", "White Stub", &[FOOLS_MATE[0], FOOLS_MATE[2]]);
    let black_path = scripted_engine("mate-b", "Black Stub", &[FOOLS_MATE[1], FOOLS_MATE[3]]);
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let report = scheduler()
        .play_game(
            Seat::new("alpha", &mut white),
            Seat::new("beta", &mut black),
            &[],
        )
        .unwrap();

    assert!(report.abort.is_none());
    assert_eq!(report.result.outcome, Outcome::BlackWins);
    assert_eq!(report.result.moves, FOOLS_MATE.map(String::from).to_vec());
    assert_eq!(report.result.winner_name(), "beta");
    assert!(report.result.finished_at >= report.result.started_at);
    assert_eq!(report.result.invocation_id.as_deref(), Some("it-run"));
    assert!(report.result.record.contains("[Result \"0-1\"]"));
    assert_eq!(report.result.white.reported_name, "White Stub");
    assert_eq!(report.result.black.reported_name, "Black Stub");

    white.shutdown().unwrap();
    black.shutdown().unwrap();
    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}

#[test]
fn test_opening_prefix_is_replayed_before_play() {
    // Opening covers the first two plies; the stubs only supply the rest.
    let white_path = scripted_engine("open-w", "W", &[FOOLS_MATE[2]]);
    let black_path = scripted_engine("open-b", "B", &[FOOLS_MATE[3]]);
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let opening: Vec<String> = FOOLS_MATE[..2].iter().map(|m| m.to_string()).collect();
    let report = scheduler()
        .play_game(
            Seat::new("w", &mut white),
            Seat::new("b", &mut black),
            &opening,
        )
        .unwrap();

    assert!(report.abort.is_none());
    assert_eq!(report.result.outcome, Outcome::BlackWins);
    assert_eq!(report.result.moves.len(), 4);

    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}

#[test]
fn test_illegal_opening_is_rejected_up_front() {
    let white_path = scripted_engine("badbook-w", "W", &[]);
    let black_path = scripted_engine("badbook-b", "B", &[]);
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let opening = vec!["e2e4".to_string(), "e2e4".to_string()];
    match scheduler().play_game(
        Seat::new("w", &mut white),
        Seat::new("b", &mut black),
        &opening,
    ) {
        Err(GameError::InvalidOpening { ply, .. }) => assert_eq!(ply, 1),
        other => panic!("expected InvalidOpening, got {:?}", other.err()),
    }

    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}

#[test]
fn test_stalled_engine_times_out_with_partial_moves() {
    let white_path = scripted_engine("stall-w", "W", &["e2e4"]);
    let black_path = stalling_engine("stall-b");
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let report = scheduler()
        .play_game(
            Seat::new("w", &mut white),
            Seat::new("b", &mut black),
            &[],
        )
        .unwrap();

    assert_eq!(report.result.outcome, Outcome::Aborted);
    // White's move landed before the stall; the partial list keeps it.
    assert_eq!(report.result.moves, vec!["e2e4".to_string()]);
    match report.abort {
        Some(GameError::Uci(UciError::Timeout(_))) => {}
        other => panic!("expected timeout abort, got {:?}", other),
    }
    assert_eq!(report.result.winner_name(), "");

    // A hung engine must still be forcibly shut down.
    black.shutdown().unwrap();
    assert!(black.is_stopped());

    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}

#[test]
fn test_illegal_engine_move_aborts_without_applying() {
    let white_path = scripted_engine("illegal-w", "W", &["e2e5"]);
    let black_path = scripted_engine("illegal-b", "B", &["e7e5"]);
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let report = scheduler()
        .play_game(
            Seat::new("w", &mut white),
            Seat::new("b", &mut black),
            &[],
        )
        .unwrap();

    assert_eq!(report.result.outcome, Outcome::Aborted);
    assert!(report.result.moves.is_empty(), "illegal move must not be applied");
    match report.abort {
        Some(GameError::IllegalMove(uci)) => assert_eq!(uci, "e2e5"),
        other => panic!("expected IllegalMove abort, got {:?}", other),
    }

    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}

#[test]
fn test_repeated_matches_alternate_colors_without_leakage() {
    const GAMES: usize = 10;

    // Each engine's scripted list matches the seat it occupies per game:
    // engine A is white in even games, black in odd games.
    let mut a_moves = Vec::new();
    let mut b_moves = Vec::new();
    for game in 0..GAMES {
        if game % 2 == 0 {
            a_moves.extend([FOOLS_MATE[0], FOOLS_MATE[2]]);
            b_moves.extend([FOOLS_MATE[1], FOOLS_MATE[3]]);
        } else {
            a_moves.extend([FOOLS_MATE[1], FOOLS_MATE[3]]);
            b_moves.extend([FOOLS_MATE[0], FOOLS_MATE[2]]);
        }
    }

    let a_path = scripted_engine("series-a", "A", &a_moves);
    let b_path = scripted_engine("series-b", "B", &b_moves);
    let mut engine_a = connect(&a_path);
    let mut engine_b = connect(&b_path);

    let scheduler = scheduler();
    let sink = SqliteSink::open_in_memory().unwrap();

    for game in 0..GAMES {
        let report = if game % 2 == 0 {
            scheduler.play_game(
                Seat::new("a", &mut engine_a),
                Seat::new("b", &mut engine_b),
                &[],
            )
        } else {
            scheduler.play_game(
                Seat::new("b", &mut engine_b),
                Seat::new("a", &mut engine_a),
                &[],
            )
        }
        .unwrap();

        assert!(report.abort.is_none(), "game {} aborted", game);
        // Fresh state per game: always exactly the four mating plies.
        assert_eq!(report.result.moves.len(), 4, "history leaked into game {}", game);
        assert_eq!(report.result.outcome, Outcome::BlackWins);
        let expected_winner = if game % 2 == 0 { "b" } else { "a" };
        assert_eq!(report.result.winner_name(), expected_winner);

        scheduler
            .recorder()
            .persist(&sink, &report.result)
            .unwrap();
    }

    assert_eq!(sink.count().unwrap(), GAMES as i64);

    fs::remove_file(&a_path).ok();
    fs::remove_file(&b_path).ok();
}

#[test]
fn test_shutdown_is_idempotent() {
    let path = scripted_engine("shutdown", "S", &[]);
    let mut client = connect(&path);

    client.shutdown().unwrap();
    assert!(client.is_stopped());
    client.shutdown().unwrap();
    assert!(client.is_stopped());

    fs::remove_file(&path).ok();
}

#[test]
fn test_handshake_times_out_on_silent_engine() {
    let body = "while IFS= read -r line; do :; done";
    let path = stub_engine("silent", body);

    let mut client = UciClient::spawn(&path).unwrap();
    match client.init(Duration::from_millis(200)) {
        Err(UciError::Protocol(message)) => assert!(message.contains("uciok")),
        other => panic!("expected Protocol error, got {:?}", other),
    }

    fs::remove_file(&path).ok();
}

#[test]
fn test_configure_rejects_undeclared_option() {
    let path = scripted_engine("options", "Opt", &[]);
    let mut client = connect(&path);

    assert!(client.declared_options().contains_key("Hash"));

    let mut unknown = std::collections::BTreeMap::new();
    unknown.insert("Ponder".to_string(), "true".to_string());
    match client.configure(&unknown) {
        Err(UciError::UnsupportedOption(name)) => assert_eq!(name, "Ponder"),
        other => panic!("expected UnsupportedOption, got {:?}", other),
    }

    let mut known = std::collections::BTreeMap::new();
    known.insert("Hash".to_string(), "64".to_string());
    client.configure(&known).unwrap();
    let snapshot = client.snapshot("opt");
    assert_eq!(snapshot.options.to_json(), r#"{"Hash":"64"}"#);

    fs::remove_file(&path).ok();
}

#[test]
fn test_cancellation_aborts_between_moves() {
    let white_path = scripted_engine("cancel-w", "W", &["e2e4"]);
    let black_path = scripted_engine("cancel-b", "B", &["e7e5"]);
    let mut white = connect(&white_path);
    let mut black = connect(&black_path);

    let cancel = CancelToken::new();
    cancel.cancel();
    let scheduler = MatchScheduler::new(
        ChessOracle::new(),
        MoveLimit::move_time(Duration::from_millis(50)).unwrap(),
        ResultRecorder::new(None),
        cancel,
    );

    let report = scheduler
        .play_game(
            Seat::new("w", &mut white),
            Seat::new("b", &mut black),
            &[],
        )
        .unwrap();

    assert_eq!(report.result.outcome, Outcome::Aborted);
    assert!(report.result.moves.is_empty());
    match report.abort {
        Some(GameError::Cancelled) => {}
        other => panic!("expected Cancelled abort, got {:?}", other),
    }

    fs::remove_file(&white_path).ok();
    fs::remove_file(&black_path).ok();
}
