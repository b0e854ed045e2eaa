//! Transport-agnostic command output types.
//!
//! Handlers describe what to say; the dispatcher renders it to plain text
//! before handing it to the [`Responder`](super::router::Responder).

use serde::Serialize;

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutput {
    /// Informational message.
    Info { text: String },

    /// Error message.
    Error { text: String },

    /// Structured table data for display.
    Table {
        /// Column headers.
        headers: Vec<String>,
        /// Row data (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
    },

    /// Nothing to reply.
    None,
}

impl CommandOutput {
    /// Creates an info message.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info { text: msg.into() }
    }

    /// Creates an error message.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { text: msg.into() }
    }

    /// Creates a table output.
    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table { headers, rows }
    }

    /// Renders the output as reply text. `None` renders to nothing.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Info { text } => Some(text.clone()),
            Self::Error { text } => Some(format!("Error: {text}")),
            Self::Table { headers, rows } => Some(render_table(headers, rows)),
            Self::None => None,
        }
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(rows.iter().map(|row| line(row.as_slice())));
    out.join("\n")
}
