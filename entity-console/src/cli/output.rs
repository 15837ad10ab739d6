//! Terminal rendering for the entity console
//!
//! Every command prints through [`OutputFormatter`] so `--format` switches
//! between coloured tables, tab-separated plain text and JSON in one place.
//! In JSON mode only structured payloads reach stdout; notices go to stderr.

use colored::Colorize;
use entity_tree::tree::VisualNode;
use serde::Serialize;
use std::fmt::Display;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns, icons and colour
    #[default]
    Table,
    Json,
    /// Tab-separated, uncoloured; suited to scripts
    Plain,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "plain" => Ok(Self::Plain),
            other => Err(format!("'{}' is not an output format (table, json, plain)", other)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Plain => "plain",
        };
        f.write_str(name)
    }
}

/// A rendered tree node as it appears in `tree --format json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLine {
    pub depth: usize,
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    pub expand: String,
    pub deletable: bool,
    pub upload: String,
}

impl TreeLine {
    pub fn new(depth: usize, node: &VisualNode) -> Self {
        Self {
            depth,
            id: node.entity_id.clone(),
            type_name: node.type_name.clone(),
            name: node.display_name().to_string(),
            expand: format!("{:?}", node.expand).to_lowercase(),
            deletable: node.delete.is_enabled(),
            upload: format!("{:?}", node.upload).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    Success,
    Warning,
    Error,
}

impl Notice {
    fn tag(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn mark(self) -> String {
        match self {
            Self::Success => "✓".green().to_string(),
            Self::Warning => "⚠".yellow().to_string(),
            Self::Error => "✗".red().to_string(),
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn success(&self, message: &str) {
        self.notice(Notice::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.notice(Notice::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.notice(Notice::Error, message);
    }

    /// Successes share stdout with results; warnings and errors use stderr.
    fn notice(&self, notice: Notice, message: &str) {
        let line = match self.format {
            OutputFormat::Json => {
                serde_json::json!({"status": notice.tag(), "message": message}).to_string()
            }
            OutputFormat::Plain => format!("{}: {}", notice.tag(), message),
            OutputFormat::Table => format!("{} {}", notice.mark(), message),
        };
        if notice == Notice::Success {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }

    /// Pretty-print a payload; a value that cannot be encoded is reported
    /// as an error instead.
    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Could not encode output as JSON: {}", e)),
        }
    }

    /// One labelled field, such as a config setting or an access switch
    pub fn kv(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::json!({ key: value })),
            OutputFormat::Table => println!("{}: {}", key.cyan(), value),
            OutputFormat::Plain => println!("{}: {}", key, value),
        }
    }

    /// Print rows under a header. Table output pads every column to its
    /// widest cell; plain output separates cells with tabs. JSON callers
    /// serialise their own records, so nothing is printed there.
    pub fn table(&self, columns: &[&str], rows: &[Vec<String>]) {
        match self.format {
            OutputFormat::Table => {
                let widths = column_widths(columns, rows);
                let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                let header = pad_row(&header, &widths);
                println!("{}", header.bold());
                println!("{}", "─".repeat(header.chars().count()).dimmed());
                for row in rows {
                    println!("{}", pad_row(row, &widths));
                }
            }
            OutputFormat::Plain => {
                println!("{}", columns.join("\t"));
                for row in rows {
                    println!("{}", row.join("\t"));
                }
            }
            OutputFormat::Json => {}
        }
    }

    /// Heading for a group of fields, e.g. an inspector tab
    pub fn section(&self, title: &str) {
        match self.format {
            OutputFormat::Table => println!("\n{}\n", title.bold().underline()),
            OutputFormat::Plain => println!("\n{}\n", title),
            OutputFormat::Json => {}
        }
    }

    /// A placeholder or bullet under a section
    pub fn list_item(&self, item: &str) {
        match self.format {
            OutputFormat::Table => println!("  {} {}", "•".cyan(), item),
            _ => println!("  - {}", item),
        }
    }

    /// Print one node of a rendered tree, indented by depth
    pub fn tree_node(&self, depth: usize, node: &VisualNode) {
        let indent = "  ".repeat(depth);
        let name = match node.display_name() {
            "" => "(unnamed)",
            name => name,
        };
        match self.format {
            OutputFormat::Table => {
                let lock = if node.delete.is_enabled() { "" } else { " 🔒" };
                println!(
                    "{}{} {} {} {}{}",
                    indent,
                    node.expand.icon(),
                    node.entity_type.icon(),
                    name.bold(),
                    format!("[{}]", node.entity_id).dimmed(),
                    lock
                );
            }
            OutputFormat::Plain => {
                println!("{}{} {} [{}]", indent, node.type_name, name, node.entity_id);
            }
            OutputFormat::Json => {}
        }
    }
}

/// Widest cell per column, header included. Counted in chars so accented
/// names line up.
fn column_widths(columns: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}

/// Join cells two spaces apart, padding all but the last to its width.
fn pad_row(row: &[String], widths: &[usize]) -> String {
    let last = row.len().saturating_sub(1);
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            if i == last {
                cell.clone()
            } else {
                format!("{:<width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_tree::{Entity, EntityKind, TreeView};
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn format_names_ignore_case() {
        assert_eq!("Table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
        assert!("yaml".parse::<OutputFormat>().unwrap_err().contains("'yaml'"));
    }

    #[test]
    fn widths_cover_header_and_cells() {
        let rows = vec![row(&["e1", "-", "r1"]), row(&["élément", "c1", "-"])];
        assert_eq!(column_widths(&["Entity", "Parent", "Resource"], &rows), vec![7, 6, 8]);
    }

    #[test]
    fn padded_rows_line_up() {
        let widths = vec![7, 6, 8];
        assert_eq!(pad_row(&row(&["e1", "-", "r1"]), &widths), "e1       -       r1");
        assert_eq!(pad_row(&row(&["élément", "c1", "-"]), &widths), "élément  c1      -");
    }

    #[test]
    fn ragged_rows_still_measure() {
        let rows = vec![row(&["title", "Welcome", "yes", "extra"])];
        let widths = column_widths(&["Key", "Value"], &rows);
        assert_eq!(widths, vec![5, 7, 3, 5]);
        assert_eq!(pad_row(&row(&["id"]), &widths), "id");
    }

    #[test]
    fn notices_are_tagged_by_kind() {
        assert_eq!(Notice::Success.tag(), "ok");
        assert_eq!(Notice::Warning.tag(), "warning");
        assert_eq!(Notice::Error.tag(), "error");
    }

    #[test]
    fn group_line_reports_collapsed_and_locked() {
        let mut view = TreeView::default();
        let group = Entity::new(
            "g1",
            EntityKind::Group {
                users: vec![Entity::new("u1", EntityKind::User)],
            },
        )
        .with_name("Editors");
        let handle = view.render(&group, None, None, false, true).handle();

        let line = TreeLine::new(0, view.node(handle).unwrap());
        assert_eq!(line.name, "Editors");
        assert_eq!(line.type_name, "Group");
        assert_eq!(line.expand, "collapsed");
        assert!(!line.deletable);
        assert_eq!(line.upload, "notrequired");
    }
}
