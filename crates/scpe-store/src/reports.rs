//! Aggregate views: per-project reports, the dashboard, due-soon tasks and
//! the global overview.
//!
//! Each report is computed inside a single read transaction so its numbers
//! are consistent with each other.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use rusqlite::params;
use scpe_shared::{ProjectId, ProjectStatus, Role, TaskStatus, UserId};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::members::query_members;
use crate::models::{Project, Task, TaskFilter, UserSummary};
use crate::projects::fetch_project;
use crate::row;
use crate::session::{visible_projects, Session};
use crate::tasks::{query_tasks, row_to_task, TASK_SELECT};

/// Fraction of `tasks` that are done, in `0.0..=1.0`.  An empty set is `0.0`.
pub fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let done = tasks.iter().filter(|t| t.status.is_done()).count();
    done as f64 / tasks.len() as f64
}

/// [`completion_rate`] as a percentage.
pub fn completion_percent(tasks: &[Task]) -> f64 {
    completion_rate(tasks) * 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

/// How many of a project's tasks one member holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberWorkload {
    pub user: UserSummary,
    pub project_role: String,
    pub assigned: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectReport {
    pub project: Project,
    pub total_tasks: usize,
    pub done_tasks: usize,
    pub completion_rate: f64,
    pub total_hours: f64,
    pub by_status: Vec<StatusCount>,
    pub members: Vec<MemberWorkload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub total_projects: usize,
    pub active_projects: usize,
    pub total_tasks: usize,
    pub done_tasks: usize,
    pub completion_rate: f64,
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Overview {
    pub users: usize,
    pub managers: usize,
    pub members: usize,
    pub projects: usize,
    pub active_projects: usize,
    pub total_budget: f64,
    pub tasks: usize,
    pub done_tasks: usize,
    pub completion_rate: f64,
}

impl Database {
    /// Task statistics and per-member workload for one project.
    pub fn project_report(&self, project: ProjectId) -> Result<ProjectReport> {
        self.read(|conn| {
            let project = fetch_project(conn, project)?;
            let tasks = query_tasks(conn, &TaskFilter::project(project.id))?;
            let members = query_members(conn, project.id)?;

            let members = members
                .into_iter()
                .map(|m| {
                    let theirs = tasks.iter().filter(|t| t.assigned_to == Some(m.user.id));
                    let (assigned, done) = theirs.fold((0, 0), |(assigned, done), t| {
                        (assigned + 1, done + usize::from(t.status.is_done()))
                    });
                    MemberWorkload {
                        user: m.user,
                        project_role: m.role,
                        assigned,
                        done,
                    }
                })
                .collect();

            Ok(ProjectReport {
                project,
                total_tasks: tasks.len(),
                done_tasks: count_done(&tasks),
                completion_rate: completion_rate(&tasks),
                total_hours: tasks.iter().map(|t| t.hours_worked).sum(),
                by_status: count_by_status(&tasks),
                members,
            })
        })
    }

    /// Headline numbers over the projects visible to `session`.
    pub fn dashboard(&self, session: &Session) -> Result<Dashboard> {
        self.read(|conn| {
            let projects = visible_projects(conn, session)?;
            let ids: HashSet<ProjectId> = projects.iter().map(|p| p.id).collect();
            let tasks: Vec<Task> = query_tasks(conn, &TaskFilter::default())?
                .into_iter()
                .filter(|t| ids.contains(&t.project_id))
                .collect();

            Ok(Dashboard {
                total_projects: projects.len(),
                active_projects: projects
                    .iter()
                    .filter(|p| p.status == ProjectStatus::Active)
                    .count(),
                total_tasks: tasks.len(),
                done_tasks: count_done(&tasks),
                completion_rate: completion_rate(&tasks),
                by_status: count_by_status(&tasks),
            })
        })
    }

    /// Unfinished tasks due on or before `today + horizon_days`, overdue ones
    /// included, earliest deadline first.
    ///
    /// With `Some(user)` only tasks of projects the user manages or belongs
    /// to are considered.
    pub fn upcoming_tasks(
        &self,
        user: Option<UserId>,
        today: NaiveDate,
        horizon_days: i64,
    ) -> Result<Vec<Task>> {
        let cutoff = Duration::try_days(horizon_days)
            .and_then(|horizon| today.checked_add_signed(horizon))
            .ok_or_else(|| StoreError::Validation("horizon out of range".to_string()))?;

        self.read(|conn| {
            let visibility = match user {
                Some(_) => {
                    "AND (p.manager_id = ?3
                          OR t.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?3))"
                }
                None => "",
            };
            let sql = format!(
                "{TASK_SELECT}
                 WHERE t.status != ?1 AND t.end_date <= ?2 {visibility}
                 ORDER BY t.end_date ASC, t.id ASC"
            );

            let mut stmt = conn.prepare(&sql)?;
            let done = TaskStatus::Done.as_str();
            let cutoff = row::date(&cutoff);
            let rows = match user {
                Some(user) => stmt.query_map(params![done, cutoff, user.0], row_to_task)?,
                None => stmt.query_map(params![done, cutoff], row_to_task)?,
            };
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(StoreError::Unavailable)
        })
    }

    /// Global counts for the administration screen.
    pub fn overview(&self) -> Result<Overview> {
        self.read(|conn| {
            let (users, managers): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(CASE WHEN role = ?1 THEN 1 END) FROM users",
                params![Role::Manager.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let (projects, active_projects, total_budget): (i64, i64, f64) = conn.query_row(
                "SELECT COUNT(*), COUNT(CASE WHEN status = ?1 THEN 1 END), COALESCE(SUM(budget), 0.0)
                 FROM projects",
                params![ProjectStatus::Active.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            let (tasks, done_tasks): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(CASE WHEN status = ?1 THEN 1 END) FROM tasks",
                params![TaskStatus::Done.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let completion_rate = if tasks == 0 {
                0.0
            } else {
                done_tasks as f64 / tasks as f64
            };

            Ok(Overview {
                users: users as usize,
                managers: managers as usize,
                members: (users - managers) as usize,
                projects: projects as usize,
                active_projects: active_projects as usize,
                total_budget,
                tasks: tasks as usize,
                done_tasks: done_tasks as usize,
                completion_rate,
            })
        })
    }
}

fn count_done(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.status.is_done()).count()
}

fn count_by_status(tasks: &[Task]) -> Vec<StatusCount> {
    TaskStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: tasks.iter().filter(|t| t.status == status).count(),
        })
        .collect()
}
