use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use tabelline::stats::{Grade, TableAccuracy};

use crate::App;

pub fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::Good => Color::Green,
        Grade::Fair => Color::Yellow,
        Grade::Poor => Color::Red,
    }
}

/// Pure presenter for a single table accuracy row
pub fn present_row(row: &TableAccuracy) -> Row<'static> {
    let color = grade_color(row.grade());
    Row::new(vec![
        Cell::from(format!("Table of {}", row.table))
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}/{}", row.correct, row.total)),
        Cell::from(format!("{}%", row.percentage))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

pub fn render_report(app: &App, f: &mut Frame) {
    let game = &app.game;
    let report = game.table_report();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(2), // summary
            Constraint::Min(3),    // per-table rows
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled("🎉 Game over! ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "{}/{} cells solved on {} ({})",
            game.solved_count(),
            game.total_cells(),
            game.difficulty(),
            game.difficulty().range_label()
        )),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    let high = if game.is_new_high_score() {
        "  🏅 new high score!"
    } else {
        ""
    };
    let summary = Paragraph::new(format!(
        "✅ {} correct   ❌ {} wrong   ⭐ {} points{high}",
        game.correct_count(),
        game.wrong_count(),
        game.score()
    ))
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[1]);

    if report.is_empty() {
        let empty = Paragraph::new("No answers recorded.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(empty, chunks[2]);
    } else {
        let rows: Vec<Row> = report.iter().map(present_row).collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(14),
                Constraint::Length(8),
                Constraint::Length(6),
            ],
        )
        .header(
            Row::new(vec!["Table", "Score", "Acc"])
                .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Accuracy by table "),
        );
        f.render_widget(table, chunks[2]);
    }

    let legend = Paragraph::new(Span::styled(
        "(r)eplay / (l)anding / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    f.render_widget(legend, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accuracy(correct: u32, total: u32) -> TableAccuracy {
        TableAccuracy {
            table: 7,
            correct,
            total,
            percentage: ((correct as f64 / total as f64) * 100.0).round() as u32,
        }
    }

    #[test]
    fn test_grade_colors() {
        assert_eq!(grade_color(accuracy(4, 5).grade()), Color::Green);
        assert_eq!(grade_color(accuracy(1, 2).grade()), Color::Yellow);
        assert_eq!(grade_color(accuracy(1, 3).grade()), Color::Red);
    }

    #[test]
    fn test_present_row_builds() {
        let _row = present_row(&accuracy(3, 4));
    }
}
