//! SQLite-backed persistence service.
//!
//! # Responsibility
//! - Serve the `tasks` collection from a local SQLite database opened via
//!   `db::open_db*`.
//! - Keep SQL details inside this module.
//!
//! # Invariants
//! - Ids are `INTEGER PRIMARY KEY` values assigned by SQLite.
//! - An id that is not an integer cannot exist, so it selects/updates
//!   nothing and deletes trivially.

use crate::model::task::TaskId;
use crate::store::{
    NewTaskRow, PersistenceError, PersistenceResult, PersistenceService, TaskRow, TaskRowPatch,
    TaskSelect,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    is_completed
FROM tasks";

/// SQLite task persistence over a borrowed, migrated connection.
pub struct SqlitePersistence<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersistence<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn select_by_rowid(&self, rowid: i64) -> PersistenceResult<Vec<TaskRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![rowid])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_task_row(row)?);
        }
        Ok(out)
    }
}

impl PersistenceService for SqlitePersistence<'_> {
    fn select(&self, query: &TaskSelect) -> PersistenceResult<Vec<TaskRow>> {
        if let Some(id) = &query.id {
            return match parse_rowid(id) {
                Some(rowid) => self.select_by_rowid(rowid),
                None => Ok(Vec::new()),
            };
        }

        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY due_date ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_task_row(row)?);
        }
        Ok(out)
    }

    fn insert(&self, row: &NewTaskRow) -> PersistenceResult<TaskRow> {
        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                due_date,
                is_completed
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                row.title.as_str(),
                row.description.as_str(),
                row.due_date.as_str(),
                bool_to_int(row.is_completed),
            ],
        )?;

        let rowid = self.conn.last_insert_rowid();
        self.select_by_rowid(rowid)?.into_iter().next().ok_or_else(|| {
            PersistenceError::MalformedRecord(format!("inserted row {rowid} is not readable"))
        })
    }

    fn update(&self, id: &TaskId, patch: &TaskRowPatch) -> PersistenceResult<Vec<TaskRow>> {
        let Some(rowid) = parse_rowid(id) else {
            return Ok(Vec::new());
        };
        if patch.is_empty() {
            return self.select_by_rowid(rowid);
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            assignments.push("description = ?");
            bind_values.push(Value::Text(description.clone()));
        }
        if let Some(due_date) = &patch.due_date {
            assignments.push("due_date = ?");
            bind_values.push(Value::Text(due_date.clone()));
        }
        if let Some(is_completed) = patch.is_completed {
            assignments.push("is_completed = ?");
            bind_values.push(Value::Integer(bool_to_int(is_completed)));
        }
        bind_values.push(Value::Integer(rowid));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Ok(Vec::new());
        }

        self.select_by_rowid(rowid)
    }

    fn delete(&self, id: &TaskId) -> PersistenceResult<()> {
        if let Some(rowid) = parse_rowid(id) {
            self.conn
                .execute("DELETE FROM tasks WHERE id = ?1;", params![rowid])?;
        }
        Ok(())
    }
}

fn parse_rowid(id: &TaskId) -> Option<i64> {
    id.as_str().parse::<i64>().ok()
}

fn parse_task_row(row: &Row<'_>) -> PersistenceResult<TaskRow> {
    let id: i64 = row.get("id")?;
    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(PersistenceError::MalformedRecord(format!(
                "invalid is_completed value `{other}` in tasks.is_completed for id {id}"
            )));
        }
    };

    Ok(TaskRow {
        id: TaskId::from(id),
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        is_completed,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::SqlitePersistence;
    use crate::db::open_db_in_memory;
    use crate::model::task::TaskId;
    use crate::store::{NewTaskRow, PersistenceService, TaskRowPatch, TaskSelect};

    fn row(title: &str, due_date: &str) -> NewTaskRow {
        NewTaskRow {
            title: title.to_string(),
            description: "d".to_string(),
            due_date: due_date.to_string(),
            is_completed: false,
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePersistence::new(&conn);

        let first = store.insert(&row("a", "2026-01-01T00:00:00.000000Z")).unwrap();
        let second = store.insert(&row("b", "2026-01-01T00:00:00.000000Z")).unwrap();
        assert_eq!(first.id, TaskId::from(1));
        assert_eq!(second.id, TaskId::from(2));
    }

    #[test]
    fn non_integer_ids_match_nothing() {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePersistence::new(&conn);
        store.insert(&row("a", "2026-01-01T00:00:00.000000Z")).unwrap();

        let bogus = TaskId::from("not-a-number");
        assert!(store.select(&TaskSelect::by_id(&bogus)).unwrap().is_empty());
        let patch = TaskRowPatch {
            is_completed: Some(true),
            ..TaskRowPatch::default()
        };
        assert!(store.update(&bogus, &patch).unwrap().is_empty());
        store.delete(&bogus).unwrap();
        assert_eq!(store.select(&TaskSelect::all()).unwrap().len(), 1);
    }

    #[test]
    fn corrupt_completion_flag_is_reported() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
            .unwrap();
        conn.execute(
            "INSERT INTO tasks (title, description, due_date, is_completed)
             VALUES ('a', 'b', '2026-01-01T00:00:00.000000Z', 7);",
            [],
        )
        .unwrap();

        let store = SqlitePersistence::new(&conn);
        let err = store.select(&TaskSelect::all()).unwrap_err();
        assert!(err.to_string().contains("is_completed"), "unexpected: {err}");
    }
}
