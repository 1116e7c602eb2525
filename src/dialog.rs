//! The results dialog as a plain state object.
//!
//! The host toolkit owns the window and forwards user input as
//! [`DialogEvent`]s; the dialog answers by pushing columns, rows and
//! messages into its [`DisplaySurface`].

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::columns::{build_columns, ColumnDescriptor, ColumnId};
use crate::config::{DisplayPreferences, TagSettings};
use crate::export::{self, ExportError, ExportFormat};
use crate::models::{AnalysisReport, AnalysisSummary, ResultRecord, TrackId};
use crate::sort::{SortEngine, SortState};
use crate::table::ResultTable;
use crate::tagging::{BatchId, TagWriter};

/// Header of one displayed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub id: ColumnId,
    pub title: String,
    /// Width in characters: the longest of the header and every cell.
    pub width: usize,
    pub right_aligned: bool,
}

/// One displayed row. `logical` is the record's storage position, which is
/// what the surface reports back in row events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub logical: usize,
    pub cells: Vec<String>,
}

/// Table widget and popups supplied by the host.
pub trait DisplaySurface {
    fn set_columns(&mut self, columns: &[ColumnHeader]);
    /// Rows in visual order.
    fn set_rows(&mut self, rows: &[DisplayRow]);
    fn show_message(&mut self, title: &str, text: &str);
    fn show_track_properties(&mut self, id: TrackId);
}

#[derive(Debug, Clone)]
pub enum DialogEvent {
    /// A column header was clicked; index into the displayed columns.
    HeaderClicked(usize),
    /// A row was double-clicked; logical row index.
    RowDoubleClicked(usize),
    /// The file picker returned a destination.
    Export(PathBuf),
    WriteTags,
    ClearTags,
    PreferencesChanged(DisplayPreferences),
}

pub struct ResultsDialog<S: DisplaySurface> {
    surface: S,
    records: Vec<ResultRecord>,
    summary: AnalysisSummary,
    prefs: DisplayPreferences,
    tag_settings: TagSettings,
    columns: Vec<ColumnDescriptor>,
    table: ResultTable,
    sort: SortState,
    order: Vec<usize>,
    tags: Rc<TagWriter>,
}

impl<S: DisplaySurface> ResultsDialog<S> {
    /// Build the dialog and populate the surface. `tags` is shared with the
    /// host, which keeps routing change notifications to it after the dialog
    /// closes.
    pub fn new(
        surface: S,
        report: AnalysisReport,
        prefs: DisplayPreferences,
        tag_settings: TagSettings,
        tags: Rc<TagWriter>,
    ) -> Self {
        let order = (0..report.records.len()).collect();
        let mut dialog = Self {
            surface,
            records: report.records,
            summary: report.summary,
            prefs,
            tag_settings,
            columns: Vec::new(),
            table: ResultTable::default(),
            sort: SortState::default(),
            order,
            tags,
        };
        dialog.rebuild_columns();
        dialog
    }

    pub fn handle(&mut self, event: DialogEvent) {
        match event {
            DialogEvent::HeaderClicked(column) => self.click_header(column),
            DialogEvent::RowDoubleClicked(row) => {
                if let Some(record) = self.records.get(row) {
                    self.surface.show_track_properties(record.id);
                }
            }
            DialogEvent::Export(path) => match self.export_to(&path) {
                Ok(_) => self
                    .surface
                    .show_message("Export", &format!("Saved to {}", path.display())),
                Err(e) => {
                    warn!(error = %e, "export failed");
                    self.surface.show_message("Export failed", &e.to_string());
                }
            },
            DialogEvent::WriteTags => {
                self.write_tags();
            }
            DialogEvent::ClearTags => {
                self.clear_tags();
            }
            DialogEvent::PreferencesChanged(prefs) => {
                self.prefs = prefs;
                self.rebuild_columns();
            }
        }
    }

    /// Sort by a column as if its header had been clicked until the
    /// direction matches. Returns `false` when the column is not shown.
    pub fn sort_by(&mut self, id: ColumnId, ascending: bool) -> bool {
        let Some(column) = self.columns.iter().position(|c| c.id == id) else {
            return false;
        };
        self.sort = SortState {
            column: Some(column),
            ascending,
        };
        self.apply_sort();
        true
    }

    /// Write the current view to `path`, format chosen by extension.
    pub fn export_to(&self, path: &Path) -> Result<ExportFormat, ExportError> {
        export::write_export(path, &self.columns, &self.table, &self.order, &self.summary)
    }

    /// Render the current view without touching the filesystem.
    pub fn render(&self, format: ExportFormat) -> Vec<u8> {
        export::render(format, &self.columns, &self.table, &self.order, &self.summary)
    }

    /// Write every enabled result tag to every track.
    pub fn write_tags(&mut self) -> Option<BatchId> {
        let pairs = self.tag_settings.pairs();
        self.tags.write_multiple_tags(
            &pairs,
            &self.records,
            self.tag_settings.precision,
            None,
        )
    }

    /// Remove every enabled result tag from every track.
    pub fn clear_tags(&mut self) -> Option<BatchId> {
        let names = self.tag_settings.enabled_names();
        let ids: Vec<TrackId> = self.records.iter().map(|r| r.id).collect();
        self.tags.clear_multiple_tags(&names, &ids, None)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Visual row order as storage positions.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn click_header(&mut self, column: usize) {
        if column >= self.columns.len() {
            debug!(column, "click on unknown column ignored");
            return;
        }
        SortEngine::new(&self.columns, &self.records, &self.table).click(
            &mut self.order,
            &mut self.sort,
            column,
        );
        self.push_rows();
    }

    fn apply_sort(&mut self) {
        SortEngine::new(&self.columns, &self.records, &self.table).sort(&mut self.order, self.sort);
        self.push_rows();
    }

    fn rebuild_columns(&mut self) {
        self.columns = build_columns(&self.prefs);
        self.table = ResultTable::build(&self.columns, &self.records);
        self.sort.reset();

        let headers: Vec<ColumnHeader> = self
            .columns
            .iter()
            .zip(self.table.widths())
            .map(|(column, &width)| ColumnHeader {
                id: column.id,
                title: column.name.to_string(),
                width,
                right_aligned: column.right_aligned(),
            })
            .collect();
        self.surface.set_columns(&headers);
        self.push_rows();
    }

    fn push_rows(&mut self) {
        let rows: Vec<DisplayRow> = self
            .order
            .iter()
            .map(|&logical| DisplayRow {
                logical,
                cells: self.table.row(logical).into_iter().map(String::from).collect(),
            })
            .collect();
        self.surface.set_rows(&rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::tagging::{MemoryLibrary, MessageSink};
    use crate::tagging::library::LibraryTrack;

    #[derive(Default)]
    struct RecordingSurface {
        headers: Vec<ColumnHeader>,
        rows: Vec<DisplayRow>,
        messages: Vec<(String, String)>,
        properties: Vec<TrackId>,
    }

    impl DisplaySurface for RecordingSurface {
        fn set_columns(&mut self, columns: &[ColumnHeader]) {
            self.headers = columns.to_vec();
        }

        fn set_rows(&mut self, rows: &[DisplayRow]) {
            self.rows = rows.to_vec();
        }

        fn show_message(&mut self, title: &str, text: &str) {
            self.messages.push((title.to_string(), text.to_string()));
        }

        fn show_track_properties(&mut self, id: TrackId) {
            self.properties.push(id);
        }
    }

    #[derive(Default)]
    struct Popups(RefCell<Vec<String>>);

    impl MessageSink for Popups {
        fn show_message(&self, _title: &str, text: &str) {
            self.0.borrow_mut().push(text.to_string());
        }
    }

    fn report() -> AnalysisReport {
        let record = |id: u64, title: &str, dr: f64| ResultRecord {
            title: title.to_string(),
            dynamic_range: dr,
            ..ResultRecord::new(TrackId(id))
        };
        AnalysisReport {
            records: vec![
                record(10, "Beta", 8.0),
                record(11, "alpha", 12.0),
                record(12, "Gamma", 10.0),
            ],
            summary: AnalysisSummary::default(),
        }
    }

    fn prefs() -> DisplayPreferences {
        DisplayPreferences {
            index: true,
            title: true,
            dynamic_range: true,
            ..DisplayPreferences::none()
        }
    }

    fn dialog() -> (ResultsDialog<RecordingSurface>, Rc<MemoryLibrary>, Rc<Popups>) {
        let library = Rc::new(MemoryLibrary::new());
        for id in [10, 11] {
            library.insert(LibraryTrack {
                id: TrackId(id),
                path: None,
                tags: None,
            });
        }
        let popups = Rc::new(Popups::default());
        let writer = Rc::new(TagWriter::new(library.clone(), popups.clone()));
        let dialog = ResultsDialog::new(
            RecordingSurface::default(),
            report(),
            prefs(),
            TagSettings::default(),
            writer,
        );
        (dialog, library, popups)
    }

    #[test]
    fn test_populates_surface() {
        let (dialog, _, _) = dialog();
        let surface = dialog.surface();
        let titles: Vec<&str> = surface.headers.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["#", "Title", "DR"]);
        assert_eq!(surface.headers[2].width, 4);
        assert!(surface.headers[2].right_aligned);
        assert_eq!(surface.rows.len(), 3);
        assert_eq!(surface.rows[1].cells, vec!["2", "alpha", "12.0"]);
    }

    #[test]
    fn test_header_clicks_sort_rows() {
        let (mut dialog, _, _) = dialog();
        dialog.handle(DialogEvent::HeaderClicked(1));
        assert_eq!(dialog.order(), &[1, 0, 2]);
        assert_eq!(dialog.surface().rows[0].cells[1], "alpha");
        assert_eq!(dialog.surface().rows[0].cells[0], "2");

        dialog.handle(DialogEvent::HeaderClicked(1));
        assert_eq!(dialog.order(), &[2, 0, 1]);

        dialog.handle(DialogEvent::HeaderClicked(0));
        assert_eq!(dialog.order(), &[0, 1, 2]);
        assert_eq!(
            dialog.sort_state(),
            SortState {
                column: Some(0),
                ascending: true
            }
        );

        dialog.handle(DialogEvent::HeaderClicked(9));
        assert_eq!(dialog.order(), &[0, 1, 2]);
    }

    #[test]
    fn test_double_click_uses_logical_row() {
        let (mut dialog, _, _) = dialog();
        dialog.handle(DialogEvent::HeaderClicked(2));
        assert_eq!(dialog.order(), &[0, 2, 1]);
        dialog.handle(DialogEvent::RowDoubleClicked(2));
        dialog.handle(DialogEvent::RowDoubleClicked(7));
        assert_eq!(dialog.surface().properties, vec![TrackId(12)]);
    }

    #[test]
    fn test_preferences_change_resets_sort() {
        let (mut dialog, _, _) = dialog();
        dialog.handle(DialogEvent::HeaderClicked(2));
        dialog.handle(DialogEvent::PreferencesChanged(DisplayPreferences::none()));
        assert!(dialog.columns().is_empty());
        assert_eq!(dialog.sort_state(), SortState::default());
        assert!(dialog.surface().headers.is_empty());
        assert!(dialog.surface().rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn test_export_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dialog, _, _) = dialog();
        dialog.handle(DialogEvent::HeaderClicked(2));

        let path = dir.path().join("results.csv");
        dialog.handle(DialogEvent::Export(path.clone()));
        let csv = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = csv.split("\r\n").skip(3).collect();
        assert_eq!(rows[0], "1,\"Beta\",8.0");
        assert_eq!(rows[2], "2,\"alpha\",12.0");

        dialog.handle(DialogEvent::Export(dir.path().join("results.xml")));
        let messages = &dialog.surface().messages;
        assert_eq!(messages[0].0, "Export");
        assert_eq!(messages[1].0, "Export failed");
        assert!(messages[1].1.contains("Unsupported export file type"));
    }

    #[test]
    fn test_sort_by_column_id() {
        let (mut dialog, _, _) = dialog();
        assert!(dialog.sort_by(ColumnId::DynamicRange, false));
        assert_eq!(dialog.order(), &[1, 2, 0]);
        assert!(!dialog.sort_by(ColumnId::Artist, true));
    }

    #[test]
    fn test_write_tags_through_library() {
        let (mut dialog, library, popups) = dialog();
        dialog.handle(DialogEvent::WriteTags);
        assert_eq!(library.pending_submissions(), 1);
        assert!(popups.0.borrow().is_empty());

        // Track 12 is not in the library and was skipped.
        let notifications = library.process_pending();
        assert_eq!(notifications, vec![vec![TrackId(10), TrackId(11)]]);
        for changed in &notifications {
            dialog.tags.on_items_changed(changed);
        }

        let tags = library.tags(TrackId(11)).unwrap();
        assert_eq!(tags.get("DYNAMIC RANGE"), Some("12.00"));
        assert_eq!(tags.get("PURE DYNAMICS"), Some("-inf"));
        assert_eq!(popups.0.borrow().len(), 1);
        assert!(popups.0.borrow()[0].ends_with("written."));
    }

    #[test]
    fn test_clear_tags_outlives_dialog() {
        let (mut dialog, library, popups) = dialog();
        let writer = dialog.tags.clone();
        let id = dialog.clear_tags().unwrap();
        drop(dialog);

        for changed in library.process_pending() {
            writer.on_items_changed(&changed);
        }
        assert_eq!(writer.batch_state(id), crate::tagging::BatchState::Completed);
        assert!(popups.0.borrow()[0].ends_with("cleared."));
    }
}
