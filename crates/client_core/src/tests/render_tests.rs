use super::*;
use tokio::sync::mpsc;

fn incident(id: i64, title: &str, status: IncidentStatus) -> Incident {
    Incident {
        id: IncidentId(id),
        title: title.to_string(),
        description: String::new(),
        status,
    }
}

fn rendered(incidents: &[Incident]) -> TableSurface {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut surface = TableSurface::new();
    Renderer::new(tx).render(&mut surface, incidents);
    surface
}

#[test]
fn selector_lists_every_status_with_current_one_selected() {
    let surface = rendered(&[incident(1, "a", IncidentStatus::InProgress)]);
    let selector = &surface.rows()[0].selector;

    let options: Vec<(IncidentStatus, &str)> = selector
        .options
        .iter()
        .map(|option| (option.value, option.label.as_str()))
        .collect();
    assert_eq!(
        options,
        [
            (IncidentStatus::Open, "Open"),
            (IncidentStatus::InProgress, "Inprogress"),
            (IncidentStatus::Closed, "Closed"),
        ]
    );
    assert_eq!(selector.selected, IncidentStatus::InProgress);
}

#[test]
fn rows_keep_incoming_order_and_cell_text() {
    let surface = rendered(&[
        incident(2, "second", IncidentStatus::Closed),
        incident(1, "first", IncidentStatus::Open),
    ]);
    let cells: Vec<[String; 5]> = surface.rows().iter().map(IncidentRow::cells).collect();
    assert_eq!(cells[0][0], "2");
    assert_eq!(cells[0][1], "second");
    assert_eq!(cells[0][3], "Closed");
    assert_eq!(cells[1][0], "1");
    assert_eq!(cells[1][3], "Open");
}

#[test]
fn rendering_an_empty_list_clears_the_table() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let renderer = Renderer::new(tx);
    let mut surface = TableSurface::new();
    renderer.render(&mut surface, &[incident(1, "a", IncidentStatus::Open)]);
    renderer.render(&mut surface, &[]);

    assert!(surface.rows().is_empty());
    assert_eq!(surface.handler_count(0), 0);
}

#[test]
fn each_row_gets_a_single_handler_per_render() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let renderer = Renderer::new(tx);
    let mut surface = TableSurface::new();
    let incidents = [incident(4, "a", IncidentStatus::Open)];
    renderer.render(&mut surface, &incidents);
    renderer.render(&mut surface, &incidents);

    assert!(surface.select(0, IncidentStatus::Closed));
    assert_eq!(
        rx.try_recv().expect("one command"),
        UiCommand::UpdateStatus {
            id: IncidentId(4),
            status: IncidentStatus::Closed,
        }
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn selecting_a_missing_row_does_nothing() {
    let mut surface = rendered(&[]);
    assert!(!surface.select(3, IncidentStatus::Closed));
}

#[test]
fn selection_after_controller_is_gone_is_dropped_quietly() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut surface = TableSurface::new();
    Renderer::new(tx).render(&mut surface, &[incident(1, "a", IncidentStatus::Open)]);
    drop(rx);

    assert!(surface.select(0, IncidentStatus::Closed));
    assert_eq!(surface.rows()[0].selector.selected, IncidentStatus::Closed);
}

#[test]
fn text_table_aligns_columns() {
    let surface = rendered(&[
        incident(1, "Server down", IncidentStatus::Open),
        incident(12, "DNS", IncidentStatus::Closed),
    ]);
    let text = surface.to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ID | Title       | Description | Status | Actions"));
    assert!(lines[1].starts_with("---"));
    assert!(lines[2].starts_with("1  | Server down |"));
    assert!(lines[3].contains("| Closed | [Closed]"));
}
