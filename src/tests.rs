use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use crate::cli::run_host;
use crate::config::{SessionConfig, SessionOptions};
use crate::domain::entities::address::{AddressRange, CellRef};
use crate::domain::entities::edit::{ChangeKind, RegionColor, SessionState};
use crate::domain::entities::schema::SchemaDescriptor;
use crate::domain::entities::table::RowImage;
use crate::domain::entities::value::CellValue;
use crate::infra::grid::memory::MemoryGrid;
use crate::infra::sqlite::repo::SqliteRepo;
use crate::usecase::ports::grid::GridSurface;
use crate::usecase::ports::notify::OutcomeSink;
use crate::usecase::ports::repo::{RepoError, TableRepository, TabularData};
use crate::usecase::services::edit_session::{
    CommitOutcome, EditSession, MutationOutcome, SessionError,
};
use crate::usecase::services::session_registry::SessionRegistry;
use crate::usecase::services::update_command::UpdateCommandTemplate;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("gridedit-{prefix}-{nanos}"))
}

#[derive(Debug, Clone, PartialEq)]
struct Report {
    success: bool,
    summary: String,
    details: String,
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<Report>>>);

impl RecordingSink {
    fn reports(&self) -> Vec<Report> {
        self.0.borrow().clone()
    }
}

impl OutcomeSink for RecordingSink {
    fn report_outcome(&mut self, success: bool, summary: &str, details: &str) {
        self.0.borrow_mut().push(Report {
            success,
            summary: summary.to_string(),
            details: details.to_string(),
        });
    }
}

/// Schema-only repository for tables SQLite itself cannot describe.
struct SchemaOnlyRepo(SchemaDescriptor);

impl TableRepository for SchemaOnlyRepo {
    fn table_schema(&self, _table: &str) -> Result<SchemaDescriptor, RepoError> {
        Ok(self.0.clone())
    }

    fn fill_from_query(&self, _query: &str) -> Result<TabularData, RepoError> {
        Ok(TabularData::default())
    }

    fn begin(&mut self) -> Result<(), RepoError> {
        Err(RepoError::Message("read only".to_string()))
    }

    fn execute_update(
        &mut self,
        _template: &UpdateCommandTemplate,
        _row: RowImage<'_>,
    ) -> Result<usize, RepoError> {
        Err(RepoError::Message("read only".to_string()))
    }

    fn finish(&mut self, _commit: bool) -> Result<(), RepoError> {
        Ok(())
    }
}

struct Fixture {
    dir: PathBuf,
    db_path: PathBuf,
}

impl Fixture {
    fn new(prefix: &str) -> Self {
        let dir = unique_test_dir(prefix);
        fs::create_dir_all(&dir).expect("should create temp dir");
        let db_path = dir.join("app.sqlite");
        let conn = Connection::open(&db_path).expect("should open sqlite db");
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO people (id, name) VALUES (1, 'a'), (2, 'b');",
        )
        .expect("should seed people table");
        Fixture { dir, db_path }
    }

    fn conn(&self) -> Connection {
        Connection::open(&self.db_path).expect("should open sqlite db")
    }

    fn start(
        &self,
        options: SessionOptions,
    ) -> (EditSession, MemoryGrid, RecordingSink) {
        let sink = RecordingSink::default();
        let mut grid = MemoryGrid::new("Sheet1");
        let session = start_session(&self.db_path, SessionConfig::new("people").with_options(options), &sink, &mut grid)
            .expect("session should start");
        (session, grid, sink)
    }

    fn names(&self) -> Vec<String> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM people ORDER BY id")
            .expect("should prepare");
        stmt.query_map([], |row| row.get(0))
            .expect("should query names")
            .collect::<rusqlite::Result<Vec<String>>>()
            .expect("should collect names")
    }

    fn cleanup(self) {
        fs::remove_dir_all(&self.dir).expect("should cleanup temp dir");
    }
}

fn start_session(
    db_path: &Path,
    config: SessionConfig,
    sink: &RecordingSink,
    grid: &mut MemoryGrid,
) -> Result<EditSession, SessionError> {
    let repo = SqliteRepo::open(db_path).expect("should open repo");
    EditSession::start(config, Box::new(repo), Box::new(sink.clone()), grid)
}

fn cell(address: &str) -> CellRef {
    address.parse().expect("address should parse")
}

fn range(address: &str) -> AddressRange {
    address.parse().expect("range should parse")
}

fn edit(session: &mut EditSession, grid: &mut MemoryGrid, address: &str, value: CellValue) -> MutationOutcome {
    grid.set_value(cell(address), value);
    session
        .on_region_changed(grid, &range(address))
        .expect("edit should be applied")
}

fn manual() -> SessionOptions {
    SessionOptions::default()
}

fn auto() -> SessionOptions {
    SessionOptions {
        auto_commit: true,
        header_row: true,
    }
}

#[test]
fn start_draws_table_with_header_at_anchor() {
    let fixture = Fixture::new("start");
    let sink = RecordingSink::default();
    let mut grid = MemoryGrid::new("Sheet1");

    let session = start_session(
        &fixture.db_path,
        SessionConfig::new("people").with_anchor(cell("B2")),
        &sink,
        &mut grid,
    )
    .expect("session should start");

    assert_eq!(session.region(), range("B2:C4"));
    assert_eq!(grid.value(cell("B2")), CellValue::Text("id".to_string()));
    assert_eq!(grid.value(cell("C3")), CellValue::Text("a".to_string()));
    assert_eq!(grid.value(cell("B4")), CellValue::Integer(2));
    assert_eq!(session.state(), SessionState::Clean);
    assert!(!session.commit_enabled());
    assert_eq!(
        session.template().sql(),
        "UPDATE \"people\" SET \"name\"=@S_name WHERE \"id\"=@W_id AND \"name\"=@W_name"
    );

    session.close();
    fixture.cleanup();
}

#[test]
fn manual_edit_is_committed_through_the_template() {
    let fixture = Fixture::new("manual-edit");
    let (mut session, mut grid, sink) = fixture.start(manual());

    let outcome = edit(&mut session, &mut grid, "B2", "aa".into());

    assert_eq!(outcome, MutationOutcome::Applied(ChangeKind::CellEdit));
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.state(), SessionState::Dirty);
    assert!(session.commit_enabled());
    assert_eq!(grid.color(cell("B2")), RegionColor::Uncommitted);
    assert_eq!(fixture.names(), vec!["a", "b"], "nothing is written before commit");

    let committed = session.commit(&mut grid).expect("commit should succeed");

    assert_eq!(committed, CommitOutcome::Committed { rows: 1 });
    assert_eq!(fixture.names(), vec!["aa", "b"]);
    assert_eq!(session.state(), SessionState::Clean);
    assert!(session.ledger().is_empty());
    assert!(!session.commit_enabled());
    assert!(!session.table().has_changes());
    assert_eq!(
        session.table().original_value(0, 1),
        Some(&CellValue::Text("aa".to_string()))
    );
    assert_eq!(grid.color(cell("B2")), RegionColor::Committed);

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].success);
    assert_eq!(
        reports[0].summary,
        "Edited data for table people was committed successfully."
    );
    assert!(reports[0].details.contains("1 rows have been updated successfully."));

    session.close();
    fixture.cleanup();
}

#[test]
fn row_deletion_only_touches_the_buffer() {
    let fixture = Fixture::new("row-delete");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    let target = grid.delete_rows(2, 1);
    let outcome = session
        .on_region_changed(&mut grid, &target)
        .expect("deletion should be applied");

    assert_eq!(outcome, MutationOutcome::Applied(ChangeKind::RowDeleted));
    assert_eq!(session.table().row_count(), 1);
    assert_eq!(session.table().value(0, 0), Some(&CellValue::Integer(2)));
    assert_eq!(session.region(), range("A1:B2"));

    session.commit(&mut grid).expect("commit should succeed");
    assert_eq!(fixture.names(), vec!["a", "b"], "rows are never deleted in the source");

    session.close();
    fixture.cleanup();
}

#[test]
fn deleting_the_header_row_drops_the_header() {
    let fixture = Fixture::new("header-delete");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    let target = grid.delete_rows(1, 1);
    session
        .on_region_changed(&mut grid, &target)
        .expect("deletion should be applied");

    assert!(!session.header_row());
    assert_eq!(session.table().row_count(), 2);
    assert_eq!(session.region(), range("A1:B2"));

    edit(&mut session, &mut grid, "B1", "first".into());
    assert_eq!(
        session.table().value(0, 1),
        Some(&CellValue::Text("first".to_string()))
    );

    session.close();
    fixture.cleanup();
}

#[test]
fn header_edit_renames_only_the_buffered_column() {
    let fixture = Fixture::new("header-rename");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    edit(&mut session, &mut grid, "B1", "full_name".into());

    assert_eq!(session.table().column_names(), vec!["id", "full_name"]);
    assert!(!session.table().has_changes());

    session.commit(&mut grid).expect("commit should succeed");
    let conn = fixture.conn();
    let name: String = conn
        .query_row("SELECT name FROM pragma_table_info('people') WHERE cid = 1", [], |row| {
            row.get(0)
        })
        .expect("should read column name");
    assert_eq!(name, "name", "source schema keeps its column names");

    session.close();
    fixture.cleanup();
}

#[test]
fn column_deletion_hides_the_column_but_updates_still_match_it() {
    let fixture = Fixture::new("column-delete");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    let target = grid.delete_columns(1, 1);
    let outcome = session
        .on_region_changed(&mut grid, &target)
        .expect("deletion should be applied");

    assert_eq!(outcome, MutationOutcome::Applied(ChangeKind::ColumnDeleted));
    assert_eq!(session.table().column_names(), vec!["name"]);
    assert_eq!(session.region(), range("A1:A3"));

    edit(&mut session, &mut grid, "A3", "bb".into());
    session.commit(&mut grid).expect("commit should succeed");

    assert_eq!(fixture.names(), vec!["a", "bb"]);

    session.close();
    fixture.cleanup();
}

#[test]
fn range_edit_spanning_the_header_renames_and_sets_values() {
    let fixture = Fixture::new("range-edit");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    grid.set_value(cell("B1"), "label".into());
    grid.set_value(cell("B2"), "x".into());
    grid.set_value(cell("B3"), "y".into());
    session
        .on_region_changed(&mut grid, &range("B1:B3"))
        .expect("range edit should be applied");

    assert_eq!(session.table().column_names(), vec!["id", "label"]);
    assert_eq!(session.ledger().len(), 1);

    let committed = session.commit(&mut grid).expect("commit should succeed");
    assert_eq!(committed, CommitOutcome::Committed { rows: 2 });
    assert_eq!(fixture.names(), vec!["x", "y"]);

    session.close();
    fixture.cleanup();
}

#[test]
fn edits_outside_the_region_are_ignored() {
    let fixture = Fixture::new("outside");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    let outcome = edit(&mut session, &mut grid, "D7", "stray".into());

    assert_eq!(outcome, MutationOutcome::Ignored);
    assert_eq!(session.state(), SessionState::Clean);
    assert!(session.ledger().is_empty());

    session.close();
    fixture.cleanup();
}

#[test]
fn selection_tracks_visibility() {
    let fixture = Fixture::new("selection");
    let (mut session, grid, _sink) = fixture.start(manual());

    assert!(!session.on_selection_changed(&grid, &range("D5")));
    assert!(!session.is_visible());
    assert!(session.on_selection_changed(&grid, &range("B2:E9")));
    assert!(session.is_visible());

    session.close();
    fixture.cleanup();
}

#[test]
fn region_tracks_table_rows_across_mutations() {
    let fixture = Fixture::new("row-count");
    let conn = fixture.conn();
    conn.execute("INSERT INTO people (id, name) VALUES (?1, ?2)", params![3, "c"])
        .expect("should insert row");
    let (mut session, mut grid, _sink) = fixture.start(manual());

    edit(&mut session, &mut grid, "B2", "aa".into());
    let target = grid.delete_rows(3, 2);
    session
        .on_region_changed(&mut grid, &target)
        .expect("deletion should be applied");
    edit(&mut session, &mut grid, "A1", "key".into());

    let header = usize::from(session.header_row());
    assert_eq!(session.table().row_count(), 1);
    assert_eq!(session.region().row_count(), session.table().row_count() + header);
    assert_eq!(grid.used_extent().rows, session.region().row_count());

    session.close();
    fixture.cleanup();
}

#[test]
fn auto_commit_writes_each_edit_silently() {
    let fixture = Fixture::new("auto-commit");
    let (mut session, mut grid, sink) = fixture.start(auto());

    edit(&mut session, &mut grid, "B3", "bb".into());

    assert_eq!(fixture.names(), vec!["a", "bb"]);
    assert_eq!(session.state(), SessionState::Clean);
    assert!(session.ledger().is_empty());
    assert!(!session.commit_enabled());
    assert!(!session.revert_enabled());
    assert_eq!(grid.color(cell("B3")), RegionColor::Committed);
    assert!(sink.reports().is_empty());

    session.close();
    fixture.cleanup();
}

#[test]
fn auto_commit_conflict_is_suppressed() {
    let fixture = Fixture::new("auto-conflict");
    let (mut session, mut grid, sink) = fixture.start(auto());
    fixture
        .conn()
        .execute("UPDATE people SET name = 'changed' WHERE id = 1", [])
        .expect("concurrent update should succeed");

    let outcome = edit(&mut session, &mut grid, "B2", "aa".into());

    assert_eq!(outcome, MutationOutcome::Applied(ChangeKind::CellEdit));
    assert_eq!(grid.value(cell("B2")), CellValue::Text("aa".to_string()));
    assert_eq!(grid.color(cell("B2")), RegionColor::Committed);
    assert_eq!(fixture.names(), vec!["changed", "b"]);
    assert!(sink.reports().is_empty());

    session.close();
    fixture.cleanup();
}

#[test]
fn manual_conflict_keeps_the_session_dirty() {
    let fixture = Fixture::new("manual-conflict");
    let (mut session, mut grid, sink) = fixture.start(manual());
    edit(&mut session, &mut grid, "B2", "aa".into());
    fixture
        .conn()
        .execute("UPDATE people SET name = 'changed' WHERE id = 1", [])
        .expect("concurrent update should succeed");

    let result = session.commit(&mut grid);

    assert_eq!(
        result,
        Err(SessionError::CommitConflict {
            rows_attempted: 1,
            row: 0
        })
    );
    assert_eq!(session.state(), SessionState::Dirty);
    assert!(session.commit_enabled());
    assert_eq!(session.ledger().len(), 1);
    assert!(session.table().has_changes());
    assert_eq!(fixture.names(), vec!["changed", "b"]);

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].success);
    assert_eq!(
        reports[0].summary,
        "Edited data for table people could not be committed."
    );
    assert!(reports[0].details.contains("1 rows were attempted."));

    session.close();
    fixture.cleanup();
}

#[test]
fn failed_row_rolls_back_the_whole_commit() {
    let fixture = Fixture::new("rollback");
    let (mut session, mut grid, sink) = fixture.start(manual());
    edit(&mut session, &mut grid, "B2", "aa".into());
    edit(&mut session, &mut grid, "B3", CellValue::Null);

    let err = session
        .commit(&mut grid)
        .err()
        .expect("NOT NULL violation should fail the commit");

    assert!(matches!(
        err,
        SessionError::CommitFailure {
            rows_attempted: 2,
            code: Some(_),
            ..
        }
    ));
    assert_eq!(fixture.names(), vec!["a", "b"]);
    assert_eq!(session.state(), SessionState::Dirty);
    assert!(sink.reports()[0].details.contains("2 rows were attempted."));

    session.close();
    fixture.cleanup();
}

#[test]
fn revert_restores_buffered_values_and_headers() {
    let fixture = Fixture::new("revert");
    let (mut session, mut grid, _sink) = fixture.start(manual());
    edit(&mut session, &mut grid, "B2", "aa".into());
    edit(&mut session, &mut grid, "B1", "label".into());

    session.revert(&mut grid, false).expect("revert should succeed");

    assert_eq!(grid.value(cell("B2")), CellValue::Text("a".to_string()));
    assert_eq!(grid.value(cell("B1")), CellValue::Text("name".to_string()));
    assert_eq!(grid.color(cell("B2")), RegionColor::Default);
    assert_eq!(session.state(), SessionState::Clean);
    assert!(session.ledger().is_empty());
    assert!(!session.table().has_changes());

    session.close();
    fixture.cleanup();
}

#[test]
fn revert_with_refresh_rereads_the_source() {
    let fixture = Fixture::new("refresh");
    let (mut session, mut grid, _sink) = fixture.start(manual());
    edit(&mut session, &mut grid, "B2", "aa".into());
    fixture
        .conn()
        .execute("INSERT INTO people (id, name) VALUES (3, 'c')", [])
        .expect("should insert row");

    session.revert(&mut grid, true).expect("refresh should succeed");

    assert_eq!(session.table().row_count(), 3);
    assert_eq!(session.region(), range("A1:B4"));
    assert_eq!(grid.value(cell("B2")), CellValue::Text("a".to_string()));
    assert_eq!(grid.value(cell("B4")), CellValue::Text("c".to_string()));

    session.close();
    fixture.cleanup();
}

#[test]
fn failed_refresh_leaves_the_buffer_alone() {
    let fixture = Fixture::new("refresh-failure");
    let (mut session, mut grid, _sink) = fixture.start(manual());
    edit(&mut session, &mut grid, "B2", "aa".into());
    fixture
        .conn()
        .execute_batch("DROP TABLE people")
        .expect("should drop table");

    let result = session.revert(&mut grid, true);

    assert!(matches!(result, Err(SessionError::RefreshFailure(_))));
    assert_eq!(session.table().row_count(), 2);
    assert_eq!(
        session.table().value(0, 1),
        Some(&CellValue::Text("aa".to_string()))
    );
    assert_eq!(session.state(), SessionState::Dirty);

    session.close();
    fixture.cleanup();
}

#[test]
fn start_reports_missing_table() {
    let fixture = Fixture::new("missing");
    let sink = RecordingSink::default();
    let mut grid = MemoryGrid::new("Sheet1");

    let err = start_session(&fixture.db_path, SessionConfig::new("nope"), &sink, &mut grid)
        .err()
        .expect("missing table should fail");

    assert_eq!(err, SessionError::SchemaNotFound("nope".to_string()));
    fixture.cleanup();
}

#[test]
fn start_rejects_schema_without_columns() {
    let mut grid = MemoryGrid::new("Sheet1");
    let repo = SchemaOnlyRepo(SchemaDescriptor::new("ghost", Vec::new()));

    let err = EditSession::start(
        SessionConfig::new("ghost"),
        Box::new(repo),
        Box::new(RecordingSink::default()),
        &mut grid,
    )
    .err()
    .expect("empty schema should fail");

    assert_eq!(
        err,
        SessionError::SchemaInvalid {
            table: "ghost".to_string()
        }
    );
}

#[test]
fn host_script_edits_and_commits() {
    let fixture = Fixture::new("host");
    let (session, mut grid, _sink) = fixture.start(manual());
    let mut registry = SessionRegistry::new();
    registry
        .open("people", grid.name(), session)
        .expect("session should register");

    let script = "set B2 aa\ncommit\nshow\nbogus\nquit\nset B3 ignored\n";
    let mut out = Vec::new();
    run_host(&mut registry, &mut grid, script.as_bytes(), &mut out).expect("host should run");
    let out = String::from_utf8(out).expect("utf8");

    assert!(out.contains("CellEdit"));
    assert!(out.contains("id,name\n1,aa\n2,b\n"));
    assert!(out.contains("error: unknown command: bogus"));
    assert_eq!(fixture.names(), vec!["aa", "b"]);

    let session = registry
        .close_table("people")
        .expect("session should still be registered");
    assert_eq!(session.state(), SessionState::Clean);
    session.close();
    fixture.cleanup();
}

#[test]
fn auto_commit_conflict_does_not_block_other_rows() {
    let fixture = Fixture::new("auto-independent");
    let (mut session, mut grid, _sink) = fixture.start(auto());
    fixture
        .conn()
        .execute("UPDATE people SET name = 'changed' WHERE id = 1", [])
        .expect("concurrent update should succeed");

    edit(&mut session, &mut grid, "B2", "aa".into());
    edit(&mut session, &mut grid, "B3", "bb".into());

    assert_eq!(fixture.names(), vec!["changed", "bb"]);
    assert!(session.table().is_row_changed(0), "conflicted row stays buffered");
    assert!(!session.table().is_row_changed(1));

    session.close();
    fixture.cleanup();
}

#[test]
fn failed_commit_statement_rolls_back_so_retry_works() {
    let dir = unique_test_dir("deferred-fk");
    fs::create_dir_all(&dir).expect("should create temp dir");
    let db_path = dir.join("app.sqlite");
    let conn = Connection::open(&db_path).expect("should open sqlite db");
    conn.execute_batch(
        "CREATE TABLE parent (id INTEGER PRIMARY KEY);
         CREATE TABLE child (
             id INTEGER PRIMARY KEY,
             pid INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED,
             note TEXT
         );
         INSERT INTO parent (id) VALUES (1);
         INSERT INTO child (id, pid, note) VALUES (1, 1, 'x');",
    )
    .expect("should seed tables");

    let sink = RecordingSink::default();
    let mut grid = MemoryGrid::new("Sheet1");
    let mut session = start_session(&db_path, SessionConfig::new("child"), &sink, &mut grid)
        .expect("session should start");

    edit(&mut session, &mut grid, "B2", CellValue::Integer(99));
    let err = session
        .commit(&mut grid)
        .err()
        .expect("deferred foreign key should fail at COMMIT");
    assert!(matches!(err, SessionError::CommitFailure { code: Some(787), .. }));
    assert_eq!(session.state(), SessionState::Dirty);

    session.revert(&mut grid, false).expect("revert should succeed");
    edit(&mut session, &mut grid, "C2", "y".into());
    let committed = session.commit(&mut grid).expect("retry should succeed");
    assert_eq!(committed, CommitOutcome::Committed { rows: 1 });

    let (pid, note): (i64, String) = conn
        .query_row("SELECT pid, note FROM child WHERE id = 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .expect("should read child row");
    assert_eq!((pid, note.as_str()), (1, "y"));

    session.close();
    drop(conn);
    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn null_original_value_reports_a_conflict() {
    let fixture = Fixture::new("null-original");
    fixture
        .conn()
        .execute_batch(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, tag TEXT);
             INSERT INTO notes (id, body, tag) VALUES (1, 'draft', NULL);",
        )
        .expect("should seed notes table");
    let sink = RecordingSink::default();
    let mut grid = MemoryGrid::new("Sheet1");
    let mut session = start_session(&fixture.db_path, SessionConfig::new("notes"), &sink, &mut grid)
        .expect("session should start");

    edit(&mut session, &mut grid, "B2", "final".into());
    let result = session.commit(&mut grid);

    assert_eq!(
        result,
        Err(SessionError::CommitConflict {
            rows_attempted: 1,
            row: 0
        })
    );

    session.close();
    fixture.cleanup();
}

/// Grid whose intersection hands back the whole target, so hits can reach
/// past the buffered table.
struct UnclippedGrid(MemoryGrid);

impl GridSurface for UnclippedGrid {
    fn used_extent(&self) -> crate::domain::entities::address::Extent {
        self.0.used_extent()
    }

    fn intersect(&self, _a: &AddressRange, b: &AddressRange) -> Option<AddressRange> {
        Some(*b)
    }

    fn values(&self, range: &AddressRange) -> Vec<Vec<CellValue>> {
        self.0.values(range)
    }

    fn set_region_color(&mut self, range: &AddressRange, color: RegionColor) {
        self.0.set_region_color(range, color);
    }

    fn clear_region(&mut self, range: &AddressRange) {
        self.0.clear_region(range);
    }

    fn redraw(
        &mut self,
        table: &crate::domain::entities::table::BufferedTable,
        header_row: bool,
        at: CellRef,
    ) {
        self.0.redraw(table, header_row, at);
    }
}

#[test]
fn out_of_bounds_edit_has_no_side_effects() {
    let fixture = Fixture::new("out-of-bounds");
    let sink = RecordingSink::default();
    let mut grid = UnclippedGrid(MemoryGrid::new("Sheet1"));
    let repo = SqliteRepo::open(&fixture.db_path).expect("should open repo");
    let mut session = EditSession::start(
        SessionConfig::new("people"),
        Box::new(repo),
        Box::new(sink.clone()),
        &mut grid,
    )
    .expect("session should start");
    grid.0.set_value(cell("B2"), "aa".into());

    let result = session.on_region_changed(&mut grid, &range("B2:C2"));

    assert_eq!(
        result,
        Err(SessionError::CellOutOfBounds { cell: cell("C2") })
    );
    assert!(session.ledger().is_empty());
    assert_eq!(session.state(), SessionState::Clean);
    assert_eq!(grid.0.color(cell("B2")), RegionColor::Default);
    assert!(!session.table().has_changes());

    session.close();
    fixture.cleanup();
}
