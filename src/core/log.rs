use crate::db::log::LogEntry;
use ansi_term::Colour;
use regex::Regex;

fn strip_ansi(s: &str) -> String {
    match Regex::new(r"\x1B\[[0-9;]*[mK]") {
        Ok(re) => re.replace_all(s, "").into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Colour per audit operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "entrada" => Colour::Green,
        "salida" => Colour::Cyan,
        "auto_close" => Colour::Red,
        "notify" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "worker" | "regional" | "site" => Colour::Blue,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

pub struct LogLogic;

impl LogLogic {
    /// Renders audit entries as aligned, coloured lines.
    pub fn render(entries: &[LogEntry]) -> Vec<String> {
        let op_w = entries
            .iter()
            .map(|e| op_target(e).len())
            .max()
            .unwrap_or(10)
            .min(60);
        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);

        entries
            .iter()
            .map(|e| {
                let color = color_for_operation(&e.operation);
                let visible = op_target(e);
                let visible = if visible.chars().count() > 60 {
                    let mut s = visible.chars().take(57).collect::<String>();
                    s.push_str("...");
                    s
                } else {
                    visible
                };

                // only the operation word is coloured
                let colored = match visible.split_once(' ') {
                    Some((op, rest)) => format!("{} {}", color.paint(op), rest),
                    None => color.paint(visible.as_str()).to_string(),
                };
                let padding = " ".repeat(op_w.saturating_sub(strip_ansi(&colored).chars().count()));

                format!(
                    "{:>id_w$}: {:<date_w$} | {}{} => {}",
                    e.id,
                    e.date,
                    colored,
                    padding,
                    e.message,
                    id_w = id_w,
                    date_w = date_w
                )
            })
            .collect()
    }
}

fn op_target(e: &LogEntry) -> String {
    if e.target.is_empty() {
        e.operation.clone()
    } else {
        format!("{} ({})", e.operation, e.target)
    }
}
