use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Counts at or above this render with full intensity.
pub const MAX_INTENSITY: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// Column, counted in weeks from the grid start.
    pub week: u32,
    /// Row, Monday = 0.
    pub weekday: u32,
    pub count: u32,
    pub intensity: u32,
}

/// Contribution-style activity grid, one column per week starting Monday.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cells: Vec<HeatmapCell>,
    /// `(week, "Mar")` for each column whose Monday starts a new month label.
    pub month_labels: Vec<(u32, String)>,
}

/// Monday on or before the first of `today`'s month, 365 days back.
pub fn grid_start(today: NaiveDate) -> NaiveDate {
    let first_of_month = today.with_day(1).unwrap_or(today);
    let start = first_of_month - Days::new(365);
    start - Days::new(u64::from(start.weekday().num_days_from_monday()))
}

impl Heatmap {
    pub fn build(today: NaiveDate, counts: &BTreeMap<NaiveDate, u32>) -> Self {
        let start = grid_start(today);
        let mut cells = Vec::new();
        let mut month_labels: Vec<(u32, String)> = Vec::new();

        for (offset, date) in start.iter_days().take_while(|d| *d <= today).enumerate() {
            let week = (offset / 7) as u32;
            let weekday = date.weekday().num_days_from_monday();

            if weekday == 0 {
                let label = date.format("%b").to_string();
                if month_labels.last().map(|(_, l)| l != &label).unwrap_or(true) {
                    month_labels.push((week, label));
                }
            }

            let count = counts.get(&date).copied().unwrap_or(0);
            cells.push(HeatmapCell {
                date,
                week,
                weekday,
                count,
                intensity: count.min(MAX_INTENSITY),
            });
        }

        Self {
            start,
            end: today,
            cells,
            month_labels,
        }
    }

    pub fn weeks(&self) -> u32 {
        self.cells.last().map(|cell| cell.week + 1).unwrap_or(0)
    }

    /// Plain-text rendering: rows Monday..Sunday, one glyph per day.
    pub fn render(&self) -> String {
        const GLYPHS: [char; 6] = ['·', '░', '▒', '▓', '█', '█'];
        const ROW_LABELS: [&str; 7] = ["Mon", "   ", "Wed", "   ", "Fri", "   ", "   "];

        let weeks = self.weeks() as usize;
        let mut grid = vec![vec![' '; weeks]; 7];
        for cell in &self.cells {
            grid[cell.weekday as usize][cell.week as usize] = GLYPHS[cell.intensity as usize];
        }

        let mut header = vec![' '; weeks];
        for (week, label) in &self.month_labels {
            for (i, ch) in label.chars().enumerate() {
                if let Some(slot) = header.get_mut(*week as usize + i) {
                    *slot = ch;
                }
            }
        }

        let mut out = String::new();
        out.push_str("    ");
        out.extend(header);
        out.push('\n');
        for (row, label) in grid.into_iter().zip(ROW_LABELS) {
            out.push_str(label);
            out.push(' ');
            out.extend(row);
            out.push('\n');
        }
        out
    }
}
