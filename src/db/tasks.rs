//! Task CRUD, filtering, reorder, and soft-delete operations.

use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{NewTask, Priority, StatusFilter, Task, TaskPatch, has_tag};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

/// Spacing between sort_order values assigned by reorder, leaving room to
/// splice a task between two others without rewriting the whole table.
const SORT_ORDER_STEP: i64 = 100;

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get("priority")?;
    let is_completed: i64 = row.get("is_completed")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        priority: Priority::parse(&priority),
        due_date: row.get("due_date")?,
        tags: row.get("tags")?,
        is_completed: is_completed != 0,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Clean a due-date input: trimmed, with blank treated as absent.
fn clean_due_date(due_date: Option<String>) -> Option<String> {
    due_date.and_then(|d| {
        let d = d.trim();
        if d.is_empty() { None } else { Some(d.to_string()) }
    })
}

impl Database {
    /// Create a new task.
    ///
    /// The title is required and must be non-blank after trimming. All other
    /// fields default per the data model; `sort_order` starts at the creation
    /// timestamp so new tasks sort after everything previously reordered.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let title = input.title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(ApiError::missing_field("title").into());
        }

        let now = now_ms();
        let notes = input.notes.unwrap_or_default();
        let priority = input.priority.unwrap_or_default();
        let due_date = clean_due_date(input.due_date);
        let tags = input.tags.map(|t| t.normalize()).unwrap_or_default();
        let is_completed = input.is_completed.unwrap_or(false);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (
                    title, notes, priority, due_date, tags, is_completed,
                    sort_order, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    title,
                    notes,
                    priority.as_str(),
                    due_date,
                    tags,
                    is_completed,
                    now,
                    now,
                    now,
                ],
            )?;

            let id = conn.last_insert_rowid();

            Ok(Task {
                id,
                title,
                notes,
                priority,
                due_date,
                tags,
                is_completed,
                sort_order: now,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
        })
    }

    /// Get a task by ID, regardless of soft-delete state.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Update a task, merging only the fields present in the patch.
    ///
    /// A supplied title is trimmed but may be blank; create is the only
    /// operation that rejects blank titles.
    pub fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<Task> {
        let now = now_ms();

        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            let new_title = patch
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or(task.title.clone());
            let new_notes = patch.notes.unwrap_or(task.notes.clone());
            let new_priority = patch.priority.unwrap_or(task.priority);
            let new_due_date = match patch.due_date {
                None => task.due_date.clone(),
                Some(d) => clean_due_date(d),
            };
            let new_tags = patch
                .tags
                .map(|t| t.normalize())
                .unwrap_or(task.tags.clone());
            let new_completed = patch.is_completed.unwrap_or(task.is_completed);
            let new_sort_order = patch.sort_order.unwrap_or(task.sort_order);

            conn.execute(
                "UPDATE tasks SET
                    title = ?1, notes = ?2, priority = ?3, due_date = ?4,
                    tags = ?5, is_completed = ?6, sort_order = ?7, updated_at = ?8
                WHERE id = ?9",
                params![
                    new_title,
                    new_notes,
                    new_priority.as_str(),
                    new_due_date,
                    new_tags,
                    new_completed,
                    new_sort_order,
                    now,
                    task_id,
                ],
            )?;

            Ok(Task {
                title: new_title,
                notes: new_notes,
                priority: new_priority,
                due_date: new_due_date,
                tags: new_tags,
                is_completed: new_completed,
                sort_order: new_sort_order,
                updated_at: now,
                ..task
            })
        })
    }

    /// List tasks with optional filters, combined with AND.
    /// Excludes soft-deleted tasks.
    ///
    /// Ordering: incomplete before completed, then ascending sort_order,
    /// then tasks with a due date before those without, then ascending
    /// due date, with id as the final tiebreak.
    pub fn list_tasks(
        &self,
        q: Option<&str>,
        status: StatusFilter,
        priority: Option<Priority>,
        tag: Option<&str>,
    ) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE deleted_at IS NULL");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(text) = q {
                sql.push_str(" AND (title LIKE '%' || ? || '%' OR notes LIKE '%' || ? || '%')");
                params_vec.push(Box::new(text.to_string()));
                params_vec.push(Box::new(text.to_string()));
            }

            match status {
                StatusFilter::Active => sql.push_str(" AND is_completed = 0"),
                StatusFilter::Completed => sql.push_str(" AND is_completed = 1"),
                StatusFilter::All => {}
            }

            if let Some(p) = priority {
                sql.push_str(" AND priority = ?");
                params_vec.push(Box::new(p.as_str().to_string()));
            }

            sql.push_str(
                " ORDER BY is_completed ASC, sort_order ASC,
                  (due_date IS NULL) ASC, due_date ASC, id ASC",
            );

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let mut results: Vec<Task> = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            // Token-boundary matching on the comma-joined tag list; SQL
            // substring search would also match "homework" for tag=work.
            if let Some(tag) = tag {
                results.retain(|t| has_tag(&t.tags, tag));
            }

            Ok(results)
        })
    }

    /// Rewrite sort_order for the given ids, following sequence position.
    ///
    /// Runs in a single transaction: either every listed id gets its new
    /// sort_order or none does. Ids missing from the sequence keep their
    /// prior sort_order; unknown ids match zero rows and are ignored.
    pub fn reorder_tasks(&self, ids: &[i64]) -> Result<()> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt =
                    tx.prepare("UPDATE tasks SET sort_order = ?1, updated_at = ?2 WHERE id = ?3")?;
                for (position, task_id) in ids.iter().enumerate() {
                    let sort_order = (position as i64 + 1) * SORT_ORDER_STEP;
                    stmt.execute(params![sort_order, now, task_id])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Soft-delete a task by stamping deleted_at.
    ///
    /// Idempotent: already-deleted and unknown ids are no-ops.
    pub fn soft_delete_task(&self, task_id: i64) -> Result<()> {
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks SET deleted_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND deleted_at IS NULL",
                params![now, task_id],
            )?;
            Ok(())
        })
    }

    /// Permanently remove every soft-deleted task. Returns the count removed.
    pub fn purge_tasks(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM tasks WHERE deleted_at IS NOT NULL", [])?;
            Ok(removed)
        })
    }
}
