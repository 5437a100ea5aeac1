use itertools::Itertools;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use tabelline::{game::Game, question::Cell};

/// What a single grid cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Solved(u32),
    /// The cell being asked; shows the product only while a hint is active
    Current { hint: Option<u32> },
}

impl CellView {
    pub fn label(&self) -> String {
        match self {
            CellView::Hidden => "·".to_string(),
            CellView::Solved(product) => product.to_string(),
            CellView::Current { hint: Some(product) } => product.to_string(),
            CellView::Current { hint: None } => "?".to_string(),
        }
    }

    fn style(&self) -> Style {
        match self {
            CellView::Hidden => Style::default().add_modifier(Modifier::DIM),
            CellView::Solved(_) => Style::default().fg(Color::Green),
            CellView::Current { .. } => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }
}

pub fn cell_view(game: &Game, a: u32, b: u32) -> CellView {
    if let Some(q) = game.current_question() {
        if q.a == a && q.b == b {
            let hint = game.is_hint_active().then_some(q.result);
            return CellView::Current { hint };
        }
    }
    if game.is_solved(Cell::new(a, b)) {
        CellView::Solved(a * b)
    } else {
        CellView::Hidden
    }
}

/// Right-align `text` in `width` terminal columns
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{text}", " ".repeat(fill))
}

/// Column width fitting the largest product plus a space
pub fn column_width(max_range: u32) -> usize {
    (max_range * max_range).to_string().width() + 1
}

/// Header row plus one line per table
pub fn grid_lines(game: &Game) -> Vec<Line<'static>> {
    let max = game.difficulty().max_range();
    let width = column_width(max);
    let current = game.current_question();
    let header_style = |n: u32, on: Option<u32>| {
        if on == Some(n) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Blue)
        }
    };

    let mut lines = Vec::with_capacity(max as usize + 1);
    let header = std::iter::once(Span::styled(pad("×", width), Style::default().fg(Color::Blue)))
        .chain((1..=max).map(|b| {
            Span::styled(pad(&b.to_string(), width), header_style(b, current.map(|q| q.b)))
        }))
        .collect_vec();
    lines.push(Line::from(header));

    for a in 1..=max {
        let row = std::iter::once(Span::styled(
            pad(&a.to_string(), width),
            header_style(a, current.map(|q| q.a)),
        ))
        .chain((1..=max).map(|b| {
            let view = cell_view(game, a, b);
            Span::styled(pad(&view.label(), width), view.style())
        }))
        .collect_vec();
        lines.push(Line::from(row));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use tabelline::{audio::Audio, difficulty::Difficulty, store::MemoryStore};

    fn playing_game() -> Game {
        let mut game = Game::new(
            Difficulty::Easy,
            Box::new(MemoryStore::new()),
            Audio::silent(),
            StdRng::seed_from_u64(8),
        );
        game.start_game();
        game
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_column_width_fits_largest_product() {
        assert_eq!(column_width(5), 3);
        assert_eq!(column_width(10), 4);
        assert_eq!(column_width(12), 4);
    }

    #[test]
    fn test_current_cell_hidden_until_hint() {
        let game = playing_game();
        let q = game.current_question().unwrap();
        assert_eq!(cell_view(&game, q.a, q.b), CellView::Current { hint: None });
        assert_eq!(cell_view(&game, q.a, q.b).label(), "?");
    }

    #[test]
    fn test_solved_cell_shows_product() {
        let mut game = playing_game();
        let q = game.current_question().unwrap();
        let ticket = game.submit_answer(&q.result.to_string()).unwrap();
        game.resolve_feedback(
            ticket.token,
            tabelline::feedback::Feedback {
                message: "yes".into(),
                emoji: "🌟".into(),
                tip: None,
            },
        );
        game.advance(std::time::Duration::from_secs(3));
        assert_eq!(cell_view(&game, q.a, q.b), CellView::Solved(q.result));
    }

    #[test]
    fn test_grid_has_header_and_one_row_per_table() {
        let game = playing_game();
        let lines = grid_lines(&game);
        assert_eq!(lines.len(), 6);
        assert_eq!(line_text(&lines[0]), "  ×  1  2  3  4  5");
        let first_row = line_text(&lines[1]);
        assert!(first_row.starts_with("  1"));
        assert_eq!(first_row.width(), 18);
    }
}
