//! Subcommands: one per store operation.
//!
//! Every command except `register` and `login` first authenticates the
//! caller and then runs with that explicit [`Session`].  Results are returned
//! as JSON values for `main` to print.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use scpe_shared::constants::UPCOMING_TASK_HORIZON_DAYS;
use scpe_shared::password::hash_password;
use scpe_shared::{ProjectId, ProjectStatus, Role, TaskId, TaskStatus, UserId};
use scpe_store::{Database, NewProject, NewTask, NewUser, Session, StoreError, TaskFilter};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Args, Debug)]
pub struct Credentials {
    /// Username to act as
    #[arg(long, short = 'u', value_name = "USERNAME")]
    pub username: String,

    /// Password of that user
    #[arg(
        long,
        short = 'p',
        value_name = "PASSWORD",
        env = "SCPE_PASSWORD",
        hide_env_values = true
    )]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SCPE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        /// manager or member
        #[arg(long, default_value = "member")]
        role: Role,
        #[arg(long)]
        full_name: String,
    },

    /// Check credentials and print the account
    Login(Credentials),

    /// List all users (managers only)
    Users(Credentials),

    /// List the projects visible to the caller
    Projects(Credentials),

    /// Create a project managed by the caller (managers only)
    CreateProject {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        client: String,
        #[arg(long, default_value_t = 0.0)]
        budget: f64,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: NaiveDate,
    },

    /// Change a project's status (managers only)
    SetProjectStatus {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
        /// active, on_hold or completed
        #[arg(long)]
        status: ProjectStatus,
    },

    /// Delete a project (managers only)
    DeleteProject {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
    },

    /// List the members of a project
    Members {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
    },

    /// Add a user to a project (managers only)
    AddMember {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
        #[arg(long)]
        user: i64,
        /// Free-text role label, e.g. "Developer"
        #[arg(long)]
        role: String,
    },

    /// Remove a user from a project (managers only)
    RemoveMember {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
        #[arg(long)]
        user: i64,
    },

    /// List tasks, optionally narrowed by project, status and assignee
    Tasks {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: Option<i64>,
        /// pending, in_progress or done
        #[arg(long)]
        status: Option<TaskStatus>,
        /// User id of the assignee
        #[arg(long)]
        assignee: Option<i64>,
    },

    /// Create a task in a project the caller takes part in
    CreateTask {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "pending")]
        status: TaskStatus,
        #[arg(long)]
        assign_to: Option<i64>,
        #[arg(long)]
        depends_on: Option<i64>,
        #[arg(long, default_value_t = 0.0)]
        hours: f64,
    },

    /// Set a task's status and worked hours
    UpdateTask {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        task: i64,
        #[arg(long)]
        status: TaskStatus,
        #[arg(long)]
        hours: f64,
    },

    /// Post a message to a project
    Post {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
        #[arg(long)]
        text: String,
    },

    /// Show a project's messages, newest first
    Messages {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
    },

    /// Task statistics and workload for one project
    Report {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        project: i64,
    },

    /// Headline numbers over the caller's projects
    Dashboard(Credentials),

    /// Unfinished tasks due soon, overdue ones included
    Upcoming {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long, default_value_t = UPCOMING_TASK_HORIZON_DAYS)]
        days: i64,
    },

    /// Global statistics (managers only)
    Overview(Credentials),
}

pub fn run(db: &Database, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Register {
            username,
            password,
            email,
            role,
            full_name,
        } => {
            let password_hash = hash_password(&password).context("failed to hash password")?;
            let id = db.create_user(&NewUser {
                username,
                password_hash,
                email,
                role,
                full_name,
            })?;
            info!(user_id = %id, "Account registered");
            Ok(json!({ "id": id }))
        }

        Command::Login(auth) => to_json(&login(db, &auth)?.user),

        Command::Users(auth) => {
            login(db, &auth)?.require_manager()?;
            to_json(&db.list_users()?)
        }

        Command::Projects(auth) => {
            let session = login(db, &auth)?;
            to_json(&db.visible_projects(&session)?)
        }

        Command::CreateProject {
            auth,
            name,
            description,
            client,
            budget,
            deadline,
        } => {
            let session = login(db, &auth)?;
            session.require_manager()?;
            let id = db.create_project(&NewProject {
                name,
                description,
                client,
                budget,
                deadline,
                manager_id: session.user_id(),
            })?;
            Ok(json!({ "id": id }))
        }

        Command::SetProjectStatus {
            auth,
            project,
            status,
        } => {
            login(db, &auth)?.require_manager()?;
            db.set_project_status(ProjectId(project), status)?;
            Ok(json!({ "id": project, "status": status }))
        }

        Command::DeleteProject { auth, project } => {
            login(db, &auth)?.require_manager()?;
            db.delete_project(ProjectId(project))?;
            Ok(json!({ "deleted": project }))
        }

        Command::Members { auth, project } => {
            let project = ProjectId(project);
            require_access(db, &login(db, &auth)?, project)?;
            to_json(&db.get_project_members(project)?)
        }

        Command::AddMember {
            auth,
            project,
            user,
            role,
        } => {
            login(db, &auth)?.require_manager()?;
            match db.add_member(ProjectId(project), UserId(user), &role) {
                Ok(()) => Ok(json!({ "project": project, "user": user, "role": role })),
                Err(StoreError::AlreadyMember { .. }) => {
                    bail!("user {user} is already a member of project {project}")
                }
                Err(e) => Err(e.into()),
            }
        }

        Command::RemoveMember {
            auth,
            project,
            user,
        } => {
            login(db, &auth)?.require_manager()?;
            let removed = db.remove_member(ProjectId(project), UserId(user))?;
            Ok(json!({ "removed": removed }))
        }

        Command::Tasks {
            auth,
            project,
            status,
            assignee,
        } => {
            let session = login(db, &auth)?;
            let filter = TaskFilter {
                project: project.map(ProjectId),
                status,
                assigned_to: assignee.map(UserId),
            };
            match filter.project {
                Some(project) => {
                    require_access(db, &session, project)?;
                    to_json(&db.find_tasks(&filter)?)
                }
                None => {
                    let visible: Vec<ProjectId> = db
                        .visible_projects(&session)?
                        .into_iter()
                        .map(|p| p.id)
                        .collect();
                    let tasks: Vec<_> = db
                        .find_tasks(&filter)?
                        .into_iter()
                        .filter(|t| visible.contains(&t.project_id))
                        .collect();
                    to_json(&tasks)
                }
            }
        }

        Command::CreateTask {
            auth,
            project,
            description,
            start,
            end,
            status,
            assign_to,
            depends_on,
            hours,
        } => {
            let project = ProjectId(project);
            require_access(db, &login(db, &auth)?, project)?;
            let id = db.create_task(&NewTask {
                project_id: project,
                description,
                start_date: start,
                end_date: end,
                status,
                assigned_to: assign_to.map(UserId),
                dependency_id: depends_on.map(TaskId),
                hours_worked: hours,
            })?;
            Ok(json!({ "id": id }))
        }

        Command::UpdateTask {
            auth,
            task,
            status,
            hours,
        } => {
            let session = login(db, &auth)?;
            let task = db.get_task(TaskId(task))?;
            require_access(db, &session, task.project_id)?;
            db.update_task(task.id, status, hours)?;
            to_json(&db.get_task(task.id)?)
        }

        Command::Post {
            auth,
            project,
            text,
        } => {
            let project = ProjectId(project);
            let session = login(db, &auth)?;
            require_access(db, &session, project)?;
            let id = db.post_message(project, session.user_id(), &text)?;
            Ok(json!({ "id": id }))
        }

        Command::Messages { auth, project } => {
            let project = ProjectId(project);
            require_access(db, &login(db, &auth)?, project)?;
            to_json(&db.list_messages(project)?)
        }

        Command::Report { auth, project } => {
            let project = ProjectId(project);
            require_access(db, &login(db, &auth)?, project)?;
            to_json(&db.project_report(project)?)
        }

        Command::Dashboard(auth) => {
            let session = login(db, &auth)?;
            to_json(&db.dashboard(&session)?)
        }

        Command::Upcoming { auth, days } => {
            let session = login(db, &auth)?;
            let today = chrono::Local::now().date_naive();
            let user = (!session.is_manager()).then(|| session.user_id());
            to_json(&db.upcoming_tasks(user, today, days)?)
        }

        Command::Overview(auth) => {
            login(db, &auth)?.require_manager()?;
            to_json(&db.overview()?)
        }
    }
}

fn login(db: &Database, auth: &Credentials) -> anyhow::Result<Session> {
    db.login(&auth.username, &auth.password)?
        .ok_or_else(|| anyhow!("invalid username or password"))
}

/// Managers may look at every project; members only at the ones they take
/// part in.
fn require_access(db: &Database, session: &Session, project: ProjectId) -> anyhow::Result<()> {
    if session.is_manager() || db.can_access_project(project, session.user_id())? {
        Ok(())
    } else {
        Err(StoreError::Forbidden.into())
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}
