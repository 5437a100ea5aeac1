use ratatui::Frame;

use tabelline::game::Phase;

use crate::{ui::report::render_report, App};

/// A UI Screen boundary: one renderer per game phase
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Title, high score and settings
pub struct LandingScreen;

impl Screen for LandingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Question, countdown, feedback and grid
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Summary and per-table accuracy
pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_report(app, f);
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::Landing => Box::new(LandingScreen),
        Phase::Playing => Box::new(PlayingScreen),
        Phase::GameOver => Box::new(GameOverScreen),
    }
}
