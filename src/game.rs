//! Session state machine: phases, the current question, counters, the
//! solved-cell set and the countdown.
//!
//! `Game` never blocks and never spawns. Answers and timeouts hand back a
//! [`FeedbackTicket`]; whoever drives the game resolves it (on a worker
//! thread in the binary, inline in tests) and passes the result to
//! [`Game::resolve_feedback`]. Each drawn question gets a fresh
//! [`QuestionToken`], and anything tagged with an older token is dropped.

use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::audio::{Audio, Cue};
use crate::difficulty::Difficulty;
use crate::feedback::{Answer, Feedback, FeedbackRequest};
use crate::question::{Cell, Question, QuestionPool};
use crate::stats::{TableAccuracy, TableStats};
use crate::store::{CustomTimers, SavedState, Store};
use crate::timer::{Countdown, CountdownEvent, TimerHandle};

pub const HINT_COST: u32 = 5;
pub const CORRECT_BASE_POINTS: u32 = 10;
pub const MAX_INPUT_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Landing,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    TimedOut,
}

impl Outcome {
    /// How long the feedback stays up before the next question
    pub fn advance_delay(self) -> Duration {
        match self {
            Outcome::Correct => Duration::from_millis(2500),
            Outcome::Incorrect => Duration::from_millis(3500),
            Outcome::TimedOut => Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionToken(u64);

/// A feedback request tagged with the question it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTicket {
    pub token: QuestionToken,
    pub request: FeedbackRequest,
}

#[derive(Debug, Clone, Copy)]
struct PendingAdvance {
    token: QuestionToken,
    remaining: Duration,
}

fn is_integer_literal(input: &str) -> bool {
    let digits = input.strip_prefix('-').unwrap_or(input);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub struct Game {
    phase: Phase,
    difficulty: Difficulty,
    timers: CustomTimers,
    high_score: u32,
    new_high_score: bool,

    score: u32,
    streak: u32,
    correct_count: u32,
    wrong_count: u32,
    solved: HashSet<Cell>,
    table_stats: TableStats,

    pool: QuestionPool,
    current: Option<Question>,
    token: QuestionToken,
    input: String,
    feedback: Option<Feedback>,
    last_outcome: Option<Outcome>,
    loading: bool,
    error: bool,
    hint_active: bool,

    countdown: Countdown,
    timer: Option<TimerHandle>,
    awaiting: Option<(QuestionToken, Outcome)>,
    pending: Option<PendingAdvance>,

    rng: StdRng,
    store: Box<dyn Store>,
    audio: Audio,
}

impl Game {
    pub fn new(
        difficulty: Difficulty,
        store: Box<dyn Store>,
        audio: Audio,
        mut rng: StdRng,
    ) -> Self {
        let SavedState { high_score, timers } = store.load();
        let mut pool = QuestionPool::new();
        pool.regenerate(difficulty, &mut rng);

        Self {
            phase: Phase::Landing,
            difficulty,
            timers,
            high_score,
            new_high_score: false,
            score: 0,
            streak: 0,
            correct_count: 0,
            wrong_count: 0,
            solved: HashSet::new(),
            table_stats: TableStats::new(),
            pool,
            current: None,
            token: QuestionToken(0),
            input: String::new(),
            feedback: None,
            last_outcome: None,
            loading: false,
            error: false,
            hint_active: false,
            countdown: Countdown::new(timers.get(difficulty)),
            timer: None,
            awaiting: None,
            pending: None,
            rng,
            store,
            audio,
        }
    }

    pub fn start_game(&mut self) {
        self.audio.play(Cue::Click);
        info!("starting {} game", self.difficulty);

        self.cancel_in_flight();
        self.reset_progress();
        self.score = 0;
        self.new_high_score = false;
        self.pool.regenerate(self.difficulty, &mut self.rng);
        self.phase = Phase::Playing;
        self.draw_next_question();
    }

    /// Replay the same difficulty after a finished game
    pub fn replay(&mut self) {
        self.start_game();
    }

    pub fn go_to_landing(&mut self) {
        if self.phase == Phase::Playing {
            debug!("abandoning game at score {}", self.score);
        }
        self.stop_timer();
        self.cancel_in_flight();
        self.current = None;
        self.input.clear();
        self.feedback = None;
        self.last_outcome = None;
        self.error = false;
        self.hint_active = false;
        self.phase = Phase::Landing;
    }

    pub fn change_difficulty(&mut self, difficulty: Difficulty) {
        if difficulty == self.difficulty {
            return;
        }
        self.audio.play(Cue::Click);
        debug!("difficulty {} -> {}", self.difficulty, difficulty);

        self.difficulty = difficulty;
        self.cancel_in_flight();
        self.reset_progress();
        self.pool.regenerate(difficulty, &mut self.rng);
        self.timer = None;
        self.countdown.reset(self.timer_setting());

        if self.phase == Phase::Playing {
            self.draw_next_question();
        }
    }

    pub fn cycle_difficulty(&mut self) {
        self.change_difficulty(self.difficulty.next());
    }

    pub fn draw_next_question(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        self.pending = None;

        if self.pool.is_empty() {
            self.pool
                .regenerate_excluding(self.difficulty, &self.solved, &mut self.rng);
            if self.pool.is_empty() {
                info!(
                    "all {} cells solved, score {}",
                    self.difficulty.total_cells(),
                    self.score
                );
                self.stop_timer();
                self.current = None;
                self.phase = Phase::GameOver;
                return;
            }
            debug!("new pass with {} unsolved questions", self.pool.len());
        }

        let Some(question) = self.pool.pop() else {
            return;
        };
        self.token = QuestionToken(self.token.0 + 1);
        self.current = Some(question);
        self.input.clear();
        self.feedback = None;
        self.last_outcome = None;
        self.error = false;
        self.hint_active = false;
        self.countdown.reset(self.timer_setting());
        self.timer = Some(self.countdown.start());
    }

    /// Evaluate `input` against the current question
    pub fn submit_answer(&mut self, input: &str) -> Option<FeedbackTicket> {
        let question = self.current?;
        let input = input.trim();
        if input.is_empty() || !self.countdown.is_running() {
            return None;
        }
        // integers outside i64 still count as an answer, just never a right one
        let value = match input.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) if is_integer_literal(input) => None,
            Err(_) => return None,
        };

        self.stop_timer();
        self.input = input.to_string();
        let is_correct = value == Some(i64::from(question.result));
        self.table_stats.record(question.a, is_correct);

        let outcome = if is_correct {
            self.correct_count += 1;
            self.solved.insert(question.cell());
            self.score += CORRECT_BASE_POINTS + self.countdown.seconds_left() / 2;
            self.streak += 1;
            self.error = false;
            self.audio.play(Cue::Correct);
            self.update_high_score();
            Outcome::Correct
        } else {
            self.wrong_count += 1;
            self.streak = 0;
            self.error = true;
            self.audio.play(Cue::Incorrect);
            Outcome::Incorrect
        };
        debug!("{} answered {input}: {outcome:?}", question.cell());

        Some(self.await_feedback(question, outcome, Answer::Given(input.to_string())))
    }

    /// Submit whatever is on the keypad
    pub fn submit(&mut self) -> Option<FeedbackTicket> {
        let input = self.input.clone();
        self.submit_answer(&input)
    }

    /// Feed elapsed wall-clock time. Returns a ticket when the countdown ran out.
    pub fn advance(&mut self, elapsed: Duration) -> Option<FeedbackTicket> {
        if self.phase != Phase::Playing {
            return None;
        }

        let mut ticket = None;
        if let Some(handle) = self.timer {
            let events = if self.countdown.is_current(handle) {
                self.countdown.advance(elapsed)
            } else {
                Vec::new()
            };
            for event in events {
                match event {
                    CountdownEvent::Tick { low: true, .. } => self.audio.play(Cue::Tick),
                    CountdownEvent::Tick { .. } => {}
                    CountdownEvent::Expired => ticket = self.on_timeout(handle),
                }
            }
        }

        if let Some(mut pending) = self.pending.take() {
            if pending.token == self.token {
                pending.remaining = pending.remaining.saturating_sub(elapsed);
                if pending.remaining.is_zero() {
                    self.draw_next_question();
                } else {
                    self.pending = Some(pending);
                }
            }
        }

        ticket
    }

    /// Apply a resolved feedback. Returns false when the ticket is stale.
    pub fn resolve_feedback(&mut self, token: QuestionToken, feedback: Feedback) -> bool {
        match self.awaiting {
            Some((awaited, outcome)) if awaited == token && self.phase == Phase::Playing => {
                self.awaiting = None;
                self.loading = false;
                self.feedback = Some(feedback);
                self.pending = Some(PendingAdvance {
                    token,
                    remaining: outcome.advance_delay(),
                });
                true
            }
            _ => {
                debug!("dropping stale feedback for {token:?}");
                false
            }
        }
    }

    pub fn request_hint(&mut self) {
        if self.current.is_none()
            || !self.countdown.is_running()
            || self.hint_active
            || self.score < HINT_COST
        {
            return;
        }
        self.audio.play(Cue::Click);
        self.hint_active = true;
        self.score = self.score.saturating_sub(HINT_COST);
    }

    pub fn press_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit()
            || !self.countdown.is_running()
            || self.input.len() >= MAX_INPUT_DIGITS
        {
            return;
        }
        self.audio.play(Cue::Click);
        self.input.push(digit);
    }

    pub fn clear_input(&mut self) {
        self.audio.play(Cue::Click);
        self.input.clear();
    }

    pub fn backspace(&mut self) {
        if self.countdown.is_running() {
            self.input.pop();
        }
    }

    /// Set the countdown length for the current difficulty and remember it
    pub fn set_timer(&mut self, secs: u32) {
        let stored = self.timers.set(self.difficulty, secs);
        self.persist();
        if self.countdown.is_running() {
            self.countdown.set_seconds_left(stored);
        } else if self.phase != Phase::Playing {
            self.countdown.reset(stored);
        }
    }

    pub fn adjust_timer(&mut self, delta: i32) {
        let secs = (self.timer_setting() as i64 + delta as i64).max(0) as u32;
        self.set_timer(secs);
    }

    pub fn toggle_sound(&mut self) {
        self.audio.set_enabled(!self.audio.is_enabled());
        self.audio.play(Cue::Click);
    }

    fn on_timeout(&mut self, handle: TimerHandle) -> Option<FeedbackTicket> {
        if self.timer != Some(handle) {
            return None;
        }
        let question = self.current?;
        self.stop_timer();
        self.wrong_count += 1;
        self.streak = 0;
        self.error = true;
        self.table_stats.record(question.a, false);
        self.audio.play(Cue::Incorrect);
        debug!("{} timed out", question.cell());

        Some(self.await_feedback(question, Outcome::TimedOut, Answer::TimedOut))
    }

    fn await_feedback(
        &mut self,
        question: Question,
        outcome: Outcome,
        answer: Answer,
    ) -> FeedbackTicket {
        self.loading = true;
        self.last_outcome = Some(outcome);
        self.awaiting = Some((self.token, outcome));
        FeedbackTicket {
            token: self.token,
            request: FeedbackRequest {
                a: question.a,
                b: question.b,
                is_correct: outcome == Outcome::Correct,
                answer,
            },
        }
    }

    fn stop_timer(&mut self) {
        self.timer = None;
        self.countdown.stop();
    }

    fn reset_progress(&mut self) {
        self.streak = 0;
        self.correct_count = 0;
        self.wrong_count = 0;
        self.solved.clear();
        self.table_stats.clear();
    }

    fn cancel_in_flight(&mut self) {
        self.awaiting = None;
        self.pending = None;
        self.loading = false;
    }

    fn update_high_score(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
            self.new_high_score = true;
            self.persist();
        }
    }

    fn persist(&self) {
        let state = SavedState {
            high_score: self.high_score,
            timers: self.timers,
        };
        if let Err(e) = self.store.save(&state) {
            warn!("could not save progress: {e}");
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Whether this game raised the stored record
    pub fn is_new_high_score(&self) -> bool {
        self.new_high_score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn solved_cells(&self) -> &HashSet<Cell> {
        &self.solved
    }

    pub fn is_solved(&self, cell: Cell) -> bool {
        self.solved.contains(&cell)
    }

    pub fn solved_count(&self) -> usize {
        self.solved.len()
    }

    pub fn total_cells(&self) -> usize {
        self.difficulty.total_cells()
    }

    pub fn table_stats(&self) -> &TableStats {
        &self.table_stats
    }

    /// Per-table accuracy for the game-over screen
    pub fn table_report(&self) -> Vec<TableAccuracy> {
        self.table_stats.report()
    }

    pub fn current_question(&self) -> Option<Question> {
        self.current
    }

    pub fn current_token(&self) -> QuestionToken {
        self.token
    }

    pub fn remaining_in_pool(&self) -> usize {
        self.pool.len()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn is_hint_active(&self) -> bool {
        self.hint_active
    }

    pub fn seconds_left(&self) -> u32 {
        self.countdown.seconds_left()
    }

    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Configured countdown length for the current difficulty
    pub fn timer_setting(&self) -> u32 {
        self.timers.get(self.difficulty)
    }

    pub fn sound_enabled(&self) -> bool {
        self.audio.is_enabled()
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("difficulty", &self.difficulty)
            .field("score", &self.score)
            .field("streak", &self.streak)
            .field("current", &self.current)
            .field("solved", &self.solved.len())
            .finish_non_exhaustive()
    }
}
