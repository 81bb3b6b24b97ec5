use terminal_size::{terminal_size, Height, Width};

use crate::model::{AccessGrant, ActivityEvent, Entity, Record};

/// A value the console can lay out as table rows.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Tabular for Entity {
    fn headers() -> &'static [&'static str] { &["handle", "controller", "title", "registered_at", "active"] }
    fn cells(&self) -> Vec<String> {
        vec![
            self.handle.to_string(),
            self.controller.to_string(),
            self.title.to_string(),
            self.registered_at.to_string(),
            self.active.to_string(),
        ]
    }
}

impl Tabular for Record {
    fn headers() -> &'static [&'static str] {
        &["entity", "record", "iteration", "active", "category", "title", "checksum", "created_at", "updated_at"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.entity.to_string(),
            self.handle.to_string(),
            self.iteration.to_string(),
            self.active.to_string(),
            self.category.to_string(),
            self.title.to_string(),
            self.checksum.to_string(),
            self.created_at.to_string(),
            self.updated_at.to_string(),
        ]
    }
}

impl Tabular for AccessGrant {
    fn headers() -> &'static [&'static str] { &["actor", "tier", "grantor", "granted_at"] }
    fn cells(&self) -> Vec<String> {
        vec![self.actor.to_string(), self.tier.to_string(), self.grantor.to_string(), self.granted_at.to_string()]
    }
}

impl Tabular for ActivityEvent {
    fn headers() -> &'static [&'static str] { &["seq", "operation", "actor", "occurred_at", "memo"] }
    fn cells(&self) -> Vec<String> {
        vec![
            self.sequence.to_string(),
            self.operation.to_string(),
            self.actor.to_string(),
            self.occurred_at.to_string(),
            self.memo.to_string(),
        ]
    }
}

/// Lay out `rows` as an ASCII table no wider than `maxw` columns. Returns an
/// empty vec for no rows; callers print their own "no rows" line.
pub fn render_table<T: Tabular>(rows: &[T], maxw: usize) -> Vec<String> {
    if rows.is_empty() { return Vec::new(); }
    let cols: Vec<String> = T::headers().iter().map(|s| s.to_string()).collect();
    let cells: Vec<Vec<String>> = rows.iter().map(|r| r.cells()).collect();

    // Cap each column so a single long memo or checksum cannot push others off screen
    let cap = (maxw / cols.len().max(1)).max(8);
    let mut widths: Vec<usize> = cols.iter().map(|c| c.chars().count().min(cap)).collect();
    for r in &cells {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = cell.chars().count();
            if w > widths[i] { widths[i] = w.min(cap); }
        }
    }

    let sep = build_separator(&widths);
    let mut out = Vec::with_capacity(cells.len() + 5);
    out.push(sep.clone());
    out.push(build_row(&cols, &widths));
    out.push(sep.clone());
    for r in &cells { out.push(build_row(r, &widths)); }
    out.push(sep);
    out.push(format!("rows: {}", cells.len()));
    out
}

/// Terminal width, or 80 when not attached to a terminal.
pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_h))) if w > 4 => (w - 4) as usize,
        _ => 80,
    }
}

/// Honour `TIERGUARD_OUTPUT=json` to bypass table rendering.
pub fn json_output_requested() -> bool {
    std::env::var("TIERGUARD_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(text.chars().count()));
        s.push(' ');
        if is_numeric_like(cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().all(|c| c.is_ascii_digit())
}
