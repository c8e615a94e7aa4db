//! Projection of the incident list onto a table-shaped rendering surface.

use std::fmt;

use shared::domain::{Incident, IncidentId, IncidentStatus};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::controller::UiCommand;

/// Invoked with the newly chosen status when a row's selector changes.
pub type SelectionHandler = Box<dyn Fn(IncidentStatus) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOption {
    pub value: IncidentStatus,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSelector {
    pub options: Vec<StatusOption>,
    pub selected: IncidentStatus,
}

impl StatusSelector {
    pub fn new(selected: IncidentStatus) -> Self {
        Self {
            options: IncidentStatus::ALL
                .into_iter()
                .map(|value| StatusOption {
                    value,
                    label: value.label(),
                })
                .collect(),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRow {
    pub id: IncidentId,
    pub title: String,
    pub description: String,
    pub status_label: String,
    pub selector: StatusSelector,
}

impl IncidentRow {
    pub const HEADERS: [&'static str; 5] = ["ID", "Title", "Description", "Status", "Actions"];

    /// Text of every column, the action column showing the selected option.
    pub fn cells(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.title.clone(),
            self.description.clone(),
            self.status_label.clone(),
            format!("[{}]", self.selector.selected.label()),
        ]
    }
}

impl From<&Incident> for IncidentRow {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            title: incident.title.clone(),
            description: incident.description.clone(),
            status_label: incident.status.label(),
            selector: StatusSelector::new(incident.status),
        }
    }
}

/// What the renderer needs from a rendering host.
pub trait RenderSurface: Send {
    /// Drops every row along with the handlers registered on it.
    fn clear(&mut self);
    /// Appends a row and returns its index.
    fn append_row(&mut self, row: IncidentRow) -> usize;
    fn on_selection_change(&mut self, row: usize, handler: SelectionHandler);
}

/// Rebuilds the whole table on every call. Selector changes are forwarded to
/// the controller as [`UiCommand::UpdateStatus`].
#[derive(Clone)]
pub struct Renderer {
    commands: UnboundedSender<UiCommand>,
}

impl Renderer {
    pub fn new(commands: UnboundedSender<UiCommand>) -> Self {
        Self { commands }
    }

    pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S, incidents: &[Incident]) {
        surface.clear();
        for incident in incidents {
            let row = surface.append_row(IncidentRow::from(incident));
            let commands = self.commands.clone();
            let id = incident.id;
            surface.on_selection_change(
                row,
                Box::new(move |status| {
                    if commands
                        .send(UiCommand::UpdateStatus { id, status })
                        .is_err()
                    {
                        warn!(
                            incident_id = id.0,
                            %status,
                            "status change dropped: controller stopped"
                        );
                    }
                }),
            );
        }
    }
}

/// In-memory table, usable as the surface of a text host.
#[derive(Default)]
pub struct TableSurface {
    rows: Vec<IncidentRow>,
    handlers: Vec<Vec<SelectionHandler>>,
}

impl TableSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[IncidentRow] {
        &self.rows
    }

    pub fn row_for(&self, id: IncidentId) -> Option<(usize, &IncidentRow)> {
        self.rows.iter().enumerate().find(|(_, row)| row.id == id)
    }

    pub fn handler_count(&self, row: usize) -> usize {
        self.handlers.get(row).map_or(0, Vec::len)
    }

    /// Picks `status` in the row's selector the way a user would: the
    /// visible selection changes immediately and the handlers fire. Returns
    /// `false` when the row does not exist.
    pub fn select(&mut self, row: usize, status: IncidentStatus) -> bool {
        let Some(visible) = self.rows.get_mut(row) else {
            return false;
        };
        visible.selector.selected = status;
        for handler in self.handlers.get(row).into_iter().flatten() {
            handler(status);
        }
        true
    }
}

impl RenderSurface for TableSurface {
    fn clear(&mut self) {
        self.rows.clear();
        self.handlers.clear();
    }

    fn append_row(&mut self, row: IncidentRow) -> usize {
        self.rows.push(row);
        self.handlers.push(Vec::new());
        self.rows.len() - 1
    }

    fn on_selection_change(&mut self, row: usize, handler: SelectionHandler) {
        if let Some(handlers) = self.handlers.get_mut(row) {
            handlers.push(handler);
        }
    }
}

impl fmt::Debug for TableSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSurface")
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TableSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 5]> = self.rows.iter().map(IncidentRow::cells).collect();
        let mut widths = IncidentRow::HEADERS.map(|header| header.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let write_line = |f: &mut fmt::Formatter<'_>, line: &[&str]| -> fmt::Result {
            let mut first = true;
            for (cell, width) in line.iter().zip(widths) {
                if !first {
                    f.write_str(" | ")?;
                }
                first = false;
                write!(f, "{cell:<width$}")?;
            }
            writeln!(f)
        };

        write_line(f, &IncidentRow::HEADERS)?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        write_line(f, &rule.iter().map(String::as_str).collect::<Vec<_>>())?;
        for row in &cells {
            write_line(f, &row.iter().map(String::as_str).collect::<Vec<_>>())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
