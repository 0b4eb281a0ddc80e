//! Terminal rendering of boards and cards

use chrono::Local;
use console::{style, Style};
use tabled::{builder::Builder, settings::Style as TableStyle};

use crate::cli::helpers::{humanize, truncate_str};
use crate::core::Config;
use crate::entities::{Card, List};

/// Longest card title shown in a board cell
const CELL_TITLE_WIDTH: usize = 32;

/// A board as a table with one column per list.
///
/// Each cell holds a card title above its short id; shorter lists leave
/// their lower cells empty.
pub fn render_board(columns: &[(List, Vec<Card>)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|(list, _)| list.id.clone()));

    let depth = columns
        .iter()
        .map(|(_, cards)| cards.len())
        .max()
        .unwrap_or(0);
    for row in 0..depth {
        builder.push_record(columns.iter().map(|(_, cards)| match cards.get(row) {
            Some(card) => format!(
                "{}\n{}",
                truncate_str(&card.title, CELL_TITLE_WIDTH),
                card.short_id()
            ),
            None => String::new(),
        }));
    }

    builder.build().with(TableStyle::modern()).to_string()
}

/// Full card: title, body, attributes and footer
pub fn render_card(card: &Card, config: &Config) -> String {
    let rule = style("─".repeat(60)).dim().to_string();
    let mut lines = vec![
        rule.clone(),
        style(&card.title).bold().to_string(),
        rule.clone(),
    ];

    let body = card.content.trim_end();
    if !body.is_empty() {
        lines.push(body.to_string());
        lines.push(rule.clone());
    }

    let attributes: Vec<(String, String)> = card
        .extra_attributes()
        .into_iter()
        .map(|(key, value)| match key.as_str() {
            "labels" => {
                let painted: Vec<String> =
                    card.labels.iter().map(|l| paint_label(l, config)).collect();
                (key, painted.join(", "))
            }
            _ => (key, value),
        })
        .collect();
    if !attributes.is_empty() {
        lines.extend(align_attributes(&attributes));
        lines.push(rule);
    }

    lines.push(format!(
        "{} {}",
        style(card.short_id()).cyan(),
        style(format!(
            "({})",
            card.date.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ))
        .dim()
    ));
    lines.join("\n")
}

/// `Key:` labels padded so every value starts in the same column
pub fn align_attributes(attributes: &[(String, String)]) -> Vec<String> {
    let labels: Vec<String> = attributes
        .iter()
        .map(|(key, _)| format!("{}:", humanize(key)))
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2;

    labels
        .iter()
        .zip(attributes)
        .map(|(label, (_, value))| format!("{:<width$}{}", label, value, width = width))
        .collect()
}

fn paint_label(label: &str, config: &Config) -> String {
    match config.label_color(label) {
        Some(color) => Style::from_dotted_str(color).apply_to(label).to_string(),
        None => label.to_string(),
    }
}
