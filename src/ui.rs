pub mod grid;
pub mod report;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use tabelline::{
    difficulty::Difficulty,
    game::{Game, Outcome, Phase, HINT_COST},
    timer::LOW_TIME_SECS,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.game.phase() {
            Phase::Landing => render_landing(self, area, buf),
            Phase::Playing => render_playing(&self.game, area, buf),
            // drawn by the report screen
            Phase::GameOver => {}
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn render_landing(app: &App, area: Rect, buf: &mut Buffer) {
    let game = &app.game;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(2), // title
            Constraint::Length(2), // high score
            Constraint::Length(2), // difficulty picker
            Constraint::Length(2), // timer, sound, feedback
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled(
            "🧮 Tabelline",
            bold_style.fg(Color::Magenta),
        )),
        Line::from(Span::styled("learn the times tables", italic_style)),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!("🏆 High score: {}", game.high_score()),
        bold_style.fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let picker = Difficulty::ALL
        .iter()
        .enumerate()
        .map(|(idx, d)| {
            let label = format!(" {} {} ({}) ", idx + 1, d, d.range_label());
            if *d == game.difficulty() {
                Span::styled(label, bold_style.fg(Color::Black).bg(Color::Cyan))
            } else {
                Span::styled(label, Style::default().add_modifier(Modifier::DIM))
            }
        })
        .interleave_shortest(std::iter::repeat(Span::raw(" ")).take(Difficulty::ALL.len() - 1))
        .collect_vec();
    Paragraph::new(Line::from(picker))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(format!(
        "⏱ {}s per question   🔊 sound {}   💬 {} feedback",
        game.timer_setting(),
        on_off(game.sound_enabled()),
        app.feedback_mode
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) start / (1-3) difficulty / (+/-) timer / (s)ound / (q)uit",
        italic_style,
    ))
    .render(chunks[6], buf);
}

fn render_playing(game: &Game, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let grid_height = game.difficulty().max_range() as u16 + 1;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // countdown
            Constraint::Length(1),
            Constraint::Length(1), // question
            Constraint::Length(4), // feedback panel
            Constraint::Min(grid_height),
            Constraint::Length(1), // counters
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = Line::from(vec![
        Span::styled(
            format!("{} {}", game.difficulty(), game.difficulty().range_label()),
            bold_style.fg(Color::Cyan),
        ),
        Span::raw(format!(
            "  ⏱ {}s  🔊 {}  ",
            game.timer_setting(),
            on_off(game.sound_enabled())
        )),
        Span::styled(format!("⭐ {}", game.score()), bold_style.fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(format!("🔥 {}", game.streak()), bold_style.fg(Color::Red)),
        Span::styled(format!("  best {}", game.high_score()), dim_style),
    ]);
    Paragraph::new(header).render(chunks[0], buf);

    let setting = game.timer_setting().max(1);
    let left = game.seconds_left();
    let gauge_color = if left <= LOW_TIME_SECS {
        Color::Red
    } else {
        Color::Green
    };
    Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .ratio((left as f64 / setting as f64).clamp(0.0, 1.0))
        .label(format!("{left}s"))
        .render(chunks[1], buf);

    if let Some(q) = game.current_question() {
        let input_style = if game.is_error() {
            bold_style.fg(Color::Red)
        } else if game.last_outcome() == Some(Outcome::Correct) {
            bold_style.fg(Color::Green)
        } else {
            bold_style.add_modifier(Modifier::UNDERLINED)
        };
        let shown = if game.input().is_empty() {
            "?".to_string()
        } else {
            game.input().to_string()
        };
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} × {} = ", q.a, q.b), bold_style),
            Span::styled(shown, input_style),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    feedback_panel(game).render(chunks[4], buf);

    Paragraph::new(grid::grid_lines(game))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    Paragraph::new(format!(
        "✅ {}  ❌ {}  🎯 {}/{}",
        game.correct_count(),
        game.wrong_count(),
        game.solved_count(),
        game.total_cells()
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);

    Paragraph::new(Span::styled(
        "(0-9) answer / (enter) submit / (c)lear / (h)int / (tab) difficulty / (esc) menu",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[7], buf);
}

fn feedback_panel(game: &Game) -> Paragraph<'static> {
    let block = Block::default().borders(Borders::ALL);

    let lines = if game.is_loading() {
        vec![Line::from(Span::styled(
            "thinking…",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))]
    } else if let Some(feedback) = game.feedback() {
        let color = if game.last_outcome() == Some(Outcome::Correct) {
            Color::Green
        } else {
            Color::Yellow
        };
        let mut lines = vec![Line::from(Span::styled(
            format!("{} {}", feedback.emoji, feedback.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))];
        if let Some(tip) = &feedback.tip {
            lines.push(Line::from(Span::styled(
                format!("💡 {tip}"),
                Style::default().fg(Color::Cyan),
            )));
        }
        lines
    } else if game.is_hint_active() {
        vec![Line::from(Span::styled(
            format!("💡 The answer is showing in the grid (-{HINT_COST} points)"),
            Style::default().fg(Color::Cyan),
        ))]
    } else {
        vec![Line::from(Span::styled(
            format!("(h) hint costs {HINT_COST} points"),
            Style::default().add_modifier(Modifier::DIM),
        ))]
    };

    Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}
