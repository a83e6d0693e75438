use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::gameweek::{GameweekPredictions, MatchPrediction};
use crate::ratings::RatingTable;

const PREDICTION_HEADERS: [&str; 11] = [
    "Match",
    "Home %",
    "Draw %",
    "Away %",
    "Fair Home Odds",
    "Fair Draw Odds",
    "Fair Away Odds",
    "Exp Goals (Home)",
    "Exp Goals (Away)",
    "Most Likely Score",
    "Model diff (H-A)",
];

fn prediction_cells(row: &MatchPrediction) -> Vec<String> {
    vec![
        row.match_label.clone(),
        format!("{:.1}", row.home_percentage),
        format!("{:.1}", row.draw_percentage),
        format!("{:.1}", row.away_percentage),
        format!("{:.2}", row.fair_home_odds),
        format!("{:.2}", row.fair_draw_odds),
        format!("{:.2}", row.fair_away_odds),
        format!("{:.2}", row.exp_goals_home),
        format!("{:.2}", row.exp_goals_away),
        row.most_likely_score.clone(),
        format!("{:.2}", row.rating_diff),
    ]
}

fn prediction_rows(gw: &GameweekPredictions) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> =
        vec![PREDICTION_HEADERS.iter().map(|h| h.to_string()).collect()];
    rows.extend(gw.predictions.iter().map(prediction_cells));
    rows
}

pub fn render_table(gw: &GameweekPredictions) -> String {
    let mut out = String::new();
    let title = format!(
        "GAMEWEEK {} PREDICTIONS ({} season)",
        gw.gameweek, gw.season
    );
    let rows = prediction_rows(gw);
    let body = align_columns(&rows);
    let width = body.lines().map(str::len).max().unwrap_or(0).max(title.len());

    let _ = writeln!(out, "{}", "=".repeat(width));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(width));
    out.push_str(&body);
    for failure in &gw.failures {
        let _ = writeln!(out, "skipped {}: {}", failure.match_label, failure.error);
    }
    out
}

pub fn render_ratings_table(table: &RatingTable) -> String {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Rating".to_string(),
        "Change".to_string(),
        "Reason".to_string(),
    ]];
    for r in &table.ratings {
        rows.push(vec![
            r.team.clone(),
            format!("{:.2}", r.rating),
            r.change_from_previous
                .map(|c| format!("{c:+.2}"))
                .unwrap_or_default(),
            r.reason.clone().unwrap_or_default(),
        ]);
    }
    let mut out = format!(
        "GW{} ratings ({} season)\n",
        table.gameweek, table.season
    );
    out.push_str(&align_columns(&rows));
    out
}

// First column left-aligned, the rest right-aligned.
fn align_columns(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; cols];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate() {
            if idx > 0 {
                line.push_str("  ");
            }
            if idx == 0 {
                let _ = write!(line, "{cell:<w$}", w = widths[idx]);
            } else {
                let _ = write!(line, "{cell:>w$}", w = widths[idx]);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn write_csv<W: Write>(gw: &GameweekPredictions, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in prediction_rows(gw) {
        wtr.write_record(&row).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn render_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize json")
}

pub fn write_xlsx(gw: &GameweekPredictions, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Predictions")
        .context("name predictions sheet")?;
    write_rows(sheet, &prediction_rows(gw))?;

    if !gw.failures.is_empty() {
        let mut rows = vec![vec!["Match".to_string(), "Error".to_string()]];
        rows.extend(
            gw.failures
                .iter()
                .map(|f| vec![f.match_label.clone(), f.error.clone()]),
        );
        let sheet = workbook.add_worksheet();
        sheet.set_name("Errors").context("name errors sheet")?;
        write_rows(sheet, &rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
