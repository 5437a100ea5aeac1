use std::collections::HashSet;
use std::time::Duration;

use assert_matches::assert_matches;
use rand::{rngs::StdRng, SeedableRng};
use tempfile::tempdir;

use tabelline::audio::Audio;
use tabelline::difficulty::Difficulty;
use tabelline::feedback::{Answer, Feedback};
use tabelline::game::{Game, Outcome, Phase};
use tabelline::question::Cell;
use tabelline::store::{FileStore, Store};

fn feedback() -> Feedback {
    Feedback {
        message: "ok".into(),
        emoji: "🙂".into(),
        tip: None,
    }
}

fn file_game(store: FileStore, difficulty: Difficulty, seed: u64) -> Game {
    Game::new(
        difficulty,
        Box::new(store),
        Audio::silent(),
        StdRng::seed_from_u64(seed),
    )
}

/// Answers the current question and waits until the next one is drawn
fn play(game: &mut Game, correct: bool) -> Cell {
    let q = game.current_question().expect("question in play");
    let answer = if correct { q.result } else { q.result + 1 };
    let ticket = game.submit_answer(&answer.to_string()).expect("accepted");
    assert!(game.resolve_feedback(ticket.token, feedback()));
    game.advance(Duration::from_secs(4));
    q.cell()
}

#[test]
fn full_easy_session_persists_high_score() {
    let dir = tempdir().unwrap();
    let mut game = file_game(FileStore::with_dir(dir.path()), Difficulty::Easy, 1);
    game.start_game();

    let mut asked = Vec::new();
    let mut misses = 0;
    while game.phase() == Phase::Playing {
        // miss every fourth question on the first pass
        let correct = asked.len() >= 25 || asked.len() % 4 != 3;
        if !correct {
            misses += 1;
        }
        asked.push(play(&mut game, correct));
        assert!(asked.len() < 100, "session never finished");
    }

    assert_eq!(game.phase(), Phase::GameOver);
    assert_eq!(game.solved_count(), 25);
    assert_eq!(game.correct_count(), 25);
    assert_eq!(game.wrong_count(), misses);
    assert_eq!(asked.len(), 25 + misses as usize);

    let solved_then_asked: Vec<_> = asked
        .iter()
        .enumerate()
        .filter(|(i, c)| asked[..*i].contains(*c))
        .map(|(_, c)| *c)
        .collect();
    assert_eq!(solved_then_asked.len(), misses as usize, "only misses repeat");

    let report = game.table_report();
    assert_eq!(report.len(), 5);
    let total: u32 = report.iter().map(|r| r.total).sum();
    assert_eq!(total, 25 + misses);

    let reloaded = FileStore::with_dir(dir.path()).load();
    assert_eq!(reloaded.high_score, game.score());
    assert!(reloaded.high_score > 0);
}

#[test]
fn solved_pairs_never_come_back_within_a_game() {
    let dir = tempdir().unwrap();
    let mut game = file_game(FileStore::with_dir(dir.path()), Difficulty::Medium, 2);
    game.start_game();

    let mut solved = HashSet::new();
    for i in 0..150 {
        if game.phase() != Phase::Playing {
            break;
        }
        let q = game.current_question().unwrap();
        assert!(!solved.contains(&q.cell()), "{} asked again", q.cell());
        let cell = play(&mut game, i % 3 != 0);
        if i % 3 != 0 {
            solved.insert(cell);
        }
    }
    assert_eq!(game.solved_count(), solved.len());
}

#[test]
fn switching_to_hard_mid_game_keeps_score_only() {
    let dir = tempdir().unwrap();
    let mut game = file_game(FileStore::with_dir(dir.path()), Difficulty::Medium, 3);
    game.start_game();
    play(&mut game, true);
    play(&mut game, true);
    play(&mut game, false);
    let score = game.score();

    game.change_difficulty(Difficulty::Hard);
    assert_eq!(game.score(), score);
    assert_eq!(game.correct_count(), 0);
    assert_eq!(game.wrong_count(), 0);
    assert_eq!(game.streak(), 0);
    assert_eq!(game.solved_count(), 0);
    assert!(game.table_report().is_empty());
    assert_eq!(game.total_cells(), 144);

    // the hard range is 1..=12, so over a full pass something beyond 10 shows up
    let mut saw_beyond_medium = false;
    for _ in 0..144 {
        let q = game.current_question().unwrap();
        assert!((1..=12).contains(&q.a) && (1..=12).contains(&q.b));
        saw_beyond_medium |= q.a > 10 || q.b > 10;
        play(&mut game, false);
    }
    assert!(saw_beyond_medium);
}

#[test]
fn timeout_counts_as_a_miss() {
    let dir = tempdir().unwrap();
    let mut game = file_game(FileStore::with_dir(dir.path()), Difficulty::Hard, 4);
    game.start_game();
    play(&mut game, true);
    let q = game.current_question().unwrap();

    let ticket = game.advance(Duration::from_secs(10)).expect("timed out");
    assert_matches!(ticket.request.answer, Answer::TimedOut);
    assert_eq!(game.last_outcome(), Some(Outcome::TimedOut));
    assert_eq!(game.correct_count(), 1);
    assert_eq!(game.wrong_count(), 1);
    assert_eq!(game.streak(), 0);
    assert!(!game.is_solved(q.cell()));

    assert!(game.submit_answer(&q.result.to_string()).is_none());
}

#[test]
fn timer_preference_survives_restart() {
    let dir = tempdir().unwrap();
    let mut game = file_game(FileStore::with_dir(dir.path()), Difficulty::Easy, 5);
    game.set_timer(45);
    game.change_difficulty(Difficulty::Hard);
    game.set_timer(1);
    drop(game);

    let game = file_game(FileStore::with_dir(dir.path()), Difficulty::Easy, 6);
    assert_eq!(game.timer_setting(), 45);
    assert_eq!(game.seconds_left(), 45);

    let saved = FileStore::with_dir(dir.path()).load();
    assert_eq!(saved.timers.hard, 3);
    assert_eq!(saved.timers.medium, 15);
}
