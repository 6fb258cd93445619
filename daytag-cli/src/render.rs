//! Terminal rendering of the month grid using owo_colors.

use daytag_core::StyleBits;
use owo_colors::{OwoColorize, Style};

use crate::grid::MonthGrid;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for MonthGrid {
    fn render(&self) -> String {
        let title = self.month().format("%B %Y").to_string();
        let mut lines = vec![
            format!("{:^20}", title).bold().to_string(),
            "Mo Tu We Th Fr Sa Su".dimmed().to_string(),
        ];

        for week in self.weeks() {
            let cells: Vec<String> = week
                .iter()
                .map(|date| {
                    let label = format!("{:>2}", chrono::Datelike::day(date));
                    let mut style = day_style(self.mark(*date));
                    if !self.in_month(*date) {
                        style = style.dimmed();
                    }
                    label.style(style).to_string()
                })
                .collect();
            lines.push(cells.join(" "));
        }

        lines.join("\n")
    }
}

fn day_style(mark: StyleBits) -> Style {
    let mut style = Style::new();
    if mark.contains(StyleBits::BOLD) {
        style = style.bold();
    }
    if mark.contains(StyleBits::ITALIC) {
        style = style.italic();
    }
    style
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
