use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use scpe_shared::{ProjectId, TaskId, TaskStatus, UserId};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{NewTask, Task, TaskFilter};
use crate::projects::reference_error;
use crate::row;
use crate::users::require_text;

pub(crate) const TASK_SELECT: &str = "SELECT t.id, t.project_id, p.name, t.description, t.start_date, t.end_date,
        t.status, t.assigned_to, u.full_name, t.dependency_id, t.hours_worked, t.created_at
 FROM tasks t
 JOIN projects p ON p.id = t.project_id
 LEFT JOIN users u ON u.id = t.assigned_to";

impl Database {
    /// Create a task.  Rejected inputs create no row.
    pub fn create_task(&self, task: &NewTask) -> Result<TaskId> {
        require_text("task description", &task.description)?;
        if task.start_date > task.end_date {
            return Err(StoreError::InvalidDateRange {
                start: task.start_date,
                end: task.end_date,
            });
        }
        check_hours(task.hours_worked)?;

        let id = self.write(|conn| {
            if let Some(dependency) = task.dependency_id {
                let owner: Option<i64> = conn
                    .query_row(
                        "SELECT project_id FROM tasks WHERE id = ?1",
                        params![dependency.0],
                        |row| row.get(0),
                    )
                    .optional()?;
                match owner {
                    None => return Err(StoreError::UnknownReference),
                    Some(owner) if owner != task.project_id.0 => {
                        return Err(StoreError::Validation(format!(
                            "dependency {dependency} belongs to another project"
                        )));
                    }
                    Some(_) => {}
                }
            }

            conn.execute(
                "INSERT INTO tasks (project_id, description, start_date, end_date, status,
                                    assigned_to, dependency_id, hours_worked, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    task.project_id.0,
                    task.description,
                    row::date(&task.start_date),
                    row::date(&task.end_date),
                    task.status.as_str(),
                    task.assigned_to.map(|u| u.0),
                    task.dependency_id.map(|t| t.0),
                    task.hours_worked,
                    row::timestamp(&Utc::now()),
                ],
            )
            .map_err(reference_error)?;
            Ok(TaskId(conn.last_insert_rowid()))
        })?;

        tracing::debug!(task_id = %id, project_id = %task.project_id, "task created");
        Ok(id)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        self.read(|conn| {
            conn.query_row(
                &format!("{TASK_SELECT} WHERE t.id = ?1"),
                params![id.0],
                row_to_task,
            )
            .map_err(not_found)
        })
    }

    /// List tasks with their project and assignee names, ordered by id.
    pub fn list_tasks(&self, project: Option<ProjectId>) -> Result<Vec<Task>> {
        self.find_tasks(&TaskFilter {
            project,
            ..TaskFilter::default()
        })
    }

    /// Like [`list_tasks`](Self::list_tasks), narrowed by status and assignee
    /// as well.
    pub fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.read(|conn| query_tasks(conn, filter))
    }

    /// Set a task's status and worked hours.
    pub fn update_task(&self, id: TaskId, status: TaskStatus, hours_worked: f64) -> Result<()> {
        check_hours(hours_worked)?;

        let affected = self.write(|conn| {
            conn.execute(
                "UPDATE tasks SET status = ?1, hours_worked = ?2 WHERE id = ?3",
                params![status.as_str(), hours_worked, id.0],
            )
            .map_err(StoreError::Unavailable)
        })?;

        if affected == 0 {
            tracing::warn!(task_id = %id, "update of unknown task");
            return Err(StoreError::NotFound);
        }
        tracing::debug!(task_id = %id, status = %status, hours_worked, "task updated");
        Ok(())
    }
}

pub(crate) fn query_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut clauses = Vec::new();
    let mut args: Vec<Value> = Vec::new();
    if let Some(project) = filter.project {
        args.push(Value::Integer(project.0));
        clauses.push(format!("t.project_id = ?{}", args.len()));
    }
    if let Some(status) = filter.status {
        args.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("t.status = ?{}", args.len()));
    }
    if let Some(user) = filter.assigned_to {
        args.push(Value::Integer(user.0));
        clauses.push(format!("t.assigned_to = ?{}", args.len()));
    }
    let filter = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let mut stmt = conn.prepare(&format!("{TASK_SELECT} {filter} ORDER BY t.id ASC"))?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_task)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StoreError::Unavailable)
}

fn check_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(StoreError::Validation(
            "hours worked must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// Map the columns of [`TASK_SELECT`] to a [`Task`].
pub(crate) fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId(row.get(0)?),
        project_id: ProjectId(row.get(1)?),
        project_name: row.get(2)?,
        description: row.get(3)?,
        start_date: row::get_date(row, 4)?,
        end_date: row::get_date(row, 5)?,
        status: row::get_parsed(row, 6)?,
        assigned_to: row.get::<_, Option<i64>>(7)?.map(UserId),
        assignee_name: row.get(8)?,
        dependency_id: row.get::<_, Option<i64>>(9)?.map(TaskId),
        hours_worked: row.get(10)?,
        created_at: row::get_timestamp(row, 11)?,
    })
}
