use std::collections::HashMap;
use std::future::Future;

use anyhow::{bail, Context, Result};
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{query, Executor, PgPool, Row};
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use stoa_auth::{AuthStorage, AuthenticationInfo};
use stoa_campus::data_access::DataAccess;
use stoa_campus::{
    AlumniProfile, Event, EventId, FacultyProfile, Job, JobId, Notification, NotificationId,
    Profile, ProfileId, Role, StudentProfile, User, UserId,
};
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::{Message, MessageId};

pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
const DB_VERSION: i64 = 3;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options: PgConnectOptions = connection_string.parse()?;
        let pool = PgPool::connect_with(options).await?;

        Ok(Db { pool })
    }

    pub fn graceful_shutdown(&self, cancellation_token: CancellationToken) -> impl Future<Output = Result<(), JoinError>> {
        let pool_cloned = self.pool.clone();
        tokio::spawn(async move {
            cancellation_token.cancelled().await;
            tracing::info!("Shutting down database connection...");
            pool_cloned.close().await;
            tracing::info!("Shutting down database connection...Success");
        })
    }

    pub async fn check_migrations(&self) -> Result<()> {
        let migrations_table_exists: bool = self.pool
            .acquire().await?
            .fetch_one(query("select exists (select from pg_tables where (schemaname = 'public') and (tablename = '_sqlx_migrations'))"))
            .await?
            .get(0);

        if !migrations_table_exists {
            bail!("Database uninitialized. Please migrate database using the 'migrate' tool");
        }

        let latest_version: i64 = self.pool
            .acquire().await?
            .fetch_optional(query("select version from _sqlx_migrations order by version desc limit 1"))
            .await?
            .map(|row| row.get(0))
            .unwrap_or(-1);

        if latest_version < DB_VERSION {
            bail!("Database schema not up to date. Please migrate database using the 'migrate' tool")
        } else if latest_version > DB_VERSION {
            bail!("Application not up to date with the database. Please use a newer version of the app or undo database migrations until version {}", DB_VERSION)
        };

        Ok(())
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.context("Couldn't migrate")
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Db { pool }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Postgres error: {0}")]
    PgError(#[from] sqlx::Error),
    #[error("Auth info parsing error: {0}")]
    AuthInfoParsingError(#[from] stoa_auth::AuthenticationInfoParsingError),
    #[error("Role parsing error: {0}")]
    RoleParsingError(#[from] stoa_campus::RoleParseError),
}

impl DataAccess for Db {
    type Error = Error;

    async fn fetch_users(&self) -> Result<Vec<User>, Self::Error> {
        let res: Result<Vec<User>, Error> = self.pool.acquire().await?
            .fetch_all("select user_id, name, email, role, profile_id from users").await?
            .iter()
            .map(user_from_row)
            .collect();

        res
    }

    async fn create_user(&self, name: &str, email: &str, role: Role) -> Result<Option<UserId>, Self::Error> {
        let user_id = Uuid::new_v4();
        let mut transaction = self.pool.begin().await?;

        transaction.execute("lock table users in exclusive mode;").await?;

        let email_exists: bool = transaction
            .fetch_one(query(r#"
                select exists(select 1 from users where lower(email) = $1)
            "#).bind(email.to_lowercase())).await?.get(0);

        if email_exists {
            return Ok(None);
        };

        transaction.execute(query(r#"
                insert into users(user_id, name, email, role) values ($1, $2, $3, $4);
            "#).bind(user_id).bind(name).bind(email).bind(role.as_str())).await?;

        transaction.commit().await?;

        Ok(Some(user_id))
    }

    async fn fetch_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_optional(query(r#"
                select user_id, name, email, role, profile_id from users where user_id = $1
            "#).bind(user_id)).await?;

        match res {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_optional(query(r#"
            select user_id, name, email, role, profile_id from users where lower(email) = $1
        "#).bind(email.to_lowercase())).await?;

        match res {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_users_by_name(&self, substring: &str) -> Result<Vec<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res: Result<Vec<User>, Error> = conn.fetch_all(query(r#"
                select user_id, name, email, role, profile_id from users where lower(name) like $1
            "#).bind(format!("%{}%", substring.to_lowercase()))).await?
            .iter()
            .map(user_from_row)
            .collect();

        res
    }

    async fn fetch_users_by_role(&self, role: Role) -> Result<Vec<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        let res: Result<Vec<User>, Error> = conn.fetch_all(query(r#"
                select user_id, name, email, role, profile_id from users where role = $1
            "#).bind(role.as_str())).await?
            .iter()
            .map(user_from_row)
            .collect();

        res
    }

    async fn set_user_profile(&self, user_id: &UserId, profile_id: &ProfileId) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(query(r#"
                update users set profile_id = $1 where user_id = $2
            "#).bind(profile_id).bind(user_id)).await?;
        Ok(())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        match profile {
            Profile::Student(p) => {
                conn.execute(query(r#"
                        insert into student_profiles (profile_id, user_id, department, enrollment_year, bio, skills)
                        values ($1, $2, $3, $4, $5, $6)
                        on conflict (profile_id) do update set
                            department = excluded.department,
                            enrollment_year = excluded.enrollment_year,
                            bio = excluded.bio,
                            skills = excluded.skills
                    "#)
                    .bind(p.id).bind(p.user_id).bind(&p.department)
                    .bind(p.enrollment_year).bind(&p.bio).bind(&p.skills))
                    .await?;
            }
            Profile::Alumni(p) => {
                conn.execute(query(r#"
                        insert into alumni_profiles (profile_id, user_id, graduation_year, company, "position", bio)
                        values ($1, $2, $3, $4, $5, $6)
                        on conflict (profile_id) do update set
                            graduation_year = excluded.graduation_year,
                            company = excluded.company,
                            "position" = excluded."position",
                            bio = excluded.bio
                    "#)
                    .bind(p.id).bind(p.user_id).bind(p.graduation_year)
                    .bind(&p.company).bind(&p.position).bind(&p.bio))
                    .await?;
            }
            Profile::Faculty(p) => {
                conn.execute(query(r#"
                        insert into faculty_profiles (profile_id, user_id, department, designation, bio)
                        values ($1, $2, $3, $4, $5)
                        on conflict (profile_id) do update set
                            department = excluded.department,
                            designation = excluded.designation,
                            bio = excluded.bio
                    "#)
                    .bind(p.id).bind(p.user_id).bind(&p.department)
                    .bind(&p.designation).bind(&p.bio))
                    .await?;
            }
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &UserId, role: Role) -> Result<Option<Profile>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = match role {
            Role::Admin => None,
            Role::Student => conn
                .fetch_optional(query(r#"
                    select profile_id, user_id, department, enrollment_year, bio, skills
                    from student_profiles where user_id = $1
                "#).bind(user_id)).await?
                .map(|row| Profile::Student(StudentProfile {
                    id: row.get(0),
                    user_id: row.get(1),
                    department: row.get(2),
                    enrollment_year: row.get(3),
                    bio: row.get(4),
                    skills: row.get(5),
                })),
            Role::Alumni => conn
                .fetch_optional(query(r#"
                    select profile_id, user_id, graduation_year, company, "position", bio
                    from alumni_profiles where user_id = $1
                "#).bind(user_id)).await?
                .map(|row| Profile::Alumni(AlumniProfile {
                    id: row.get(0),
                    user_id: row.get(1),
                    graduation_year: row.get(2),
                    company: row.get(3),
                    position: row.get(4),
                    bio: row.get(5),
                })),
            Role::Faculty => conn
                .fetch_optional(query(r#"
                    select profile_id, user_id, department, designation, bio
                    from faculty_profiles where user_id = $1
                "#).bind(user_id)).await?
                .map(|row| Profile::Faculty(FacultyProfile {
                    id: row.get(0),
                    user_id: row.get(1),
                    department: row.get(2),
                    designation: row.get(3),
                    bio: row.get(4),
                })),
        };
        Ok(res)
    }

    async fn create_event(&self, event: &Event) -> Result<(), Self::Error> {
        let mut transaction = self.pool.begin().await?;
        transaction.execute(query(r#"
                insert into events (event_id, title, description, venue, starts_at, created_by)
                values ($1, $2, $3, $4, $5, $6)
            "#)
            .bind(event.id).bind(&event.title).bind(&event.description)
            .bind(&event.venue).bind(event.starts_at).bind(event.created_by))
            .await?;

        for attendee in &event.attendees {
            transaction.execute(query(r#"
                    insert into event_attendees (event_id, user_id) values ($1, $2)
                "#).bind(event.id).bind(attendee)).await?;
        }

        transaction.commit().await?;
        Ok(())
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let row = match conn.fetch_optional(query(r#"
                select event_id, title, description, venue, starts_at, created_by
                from events where event_id = $1
            "#).bind(event_id)).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let attendees = conn.fetch_all(query(r#"
                select user_id from event_attendees where event_id = $1 order by user_id
            "#).bind(event_id)).await?
            .iter()
            .map(|row| row.get(0))
            .collect();

        Ok(Some(event_from_row(&row, attendees)))
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = conn
            .fetch_all("select event_id, title, description, venue, starts_at, created_by from events order by starts_at")
            .await?;

        let mut attendees: HashMap<EventId, Vec<UserId>> = HashMap::new();
        for row in conn.fetch_all("select event_id, user_id from event_attendees order by user_id").await? {
            attendees.entry(row.get(0)).or_default().push(row.get(1));
        }

        let res = rows.iter()
            .map(|row| {
                let id: EventId = row.get(0);
                let event_attendees = attendees.remove(&id).unwrap_or_default();
                event_from_row(row, event_attendees)
            })
            .collect();

        Ok(res)
    }

    async fn update_event(&self, event: &Event) -> Result<bool, Self::Error> {
        let mut transaction = self.pool.begin().await?;

        let updated = transaction.execute(query(r#"
                update events set title = $2, description = $3, venue = $4, starts_at = $5
                where event_id = $1
            "#)
            .bind(event.id).bind(&event.title).bind(&event.description)
            .bind(&event.venue).bind(event.starts_at))
            .await?
            .rows_affected();

        if updated == 0 {
            return Ok(false);
        }

        transaction.execute(query(r#"
                delete from event_attendees where event_id = $1
            "#).bind(event.id)).await?;

        for attendee in &event.attendees {
            transaction.execute(query(r#"
                    insert into event_attendees (event_id, user_id) values ($1, $2)
                "#).bind(event.id).bind(attendee)).await?;
        }

        transaction.commit().await?;
        Ok(true)
    }

    async fn delete_event(&self, event_id: &EventId) -> Result<bool, Self::Error> {
        let mut transaction = self.pool.begin().await?;

        transaction.execute(query(r#"
                delete from event_attendees where event_id = $1
            "#).bind(event_id)).await?;

        let deleted = transaction.execute(query(r#"
                delete from events where event_id = $1
            "#).bind(event_id)).await?.rows_affected();

        transaction.commit().await?;
        Ok(deleted > 0)
    }

    async fn create_job(&self, job: &Job) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(query(r#"
                insert into jobs (job_id, title, company, description, posted_by, posted_at)
                values ($1, $2, $3, $4, $5, $6)
            "#)
            .bind(job.id).bind(&job.title).bind(&job.company)
            .bind(&job.description).bind(job.posted_by).bind(job.posted_at))
            .await?;
        Ok(())
    }

    async fn fetch_job(&self, job_id: &JobId) -> Result<Option<Job>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_optional(query(r#"
                select job_id, title, company, description, posted_by, posted_at
                from jobs where job_id = $1
            "#).bind(job_id)).await?;

        Ok(res.map(|row| job_from_row(&row)))
    }

    async fn fetch_jobs(&self) -> Result<Vec<Job>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn
            .fetch_all("select job_id, title, company, description, posted_by, posted_at from jobs order by posted_at desc")
            .await?
            .iter()
            .map(job_from_row)
            .collect();

        Ok(res)
    }

    async fn update_job(&self, job: &Job) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let updated = conn.execute(query(r#"
                update jobs set title = $2, company = $3, description = $4
                where job_id = $1
            "#)
            .bind(job.id).bind(&job.title).bind(&job.company).bind(&job.description))
            .await?
            .rows_affected();

        Ok(updated > 0)
    }

    async fn delete_job(&self, job_id: &JobId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let deleted = conn.execute(query(r#"
                delete from jobs where job_id = $1
            "#).bind(job_id)).await?.rows_affected();

        Ok(deleted > 0)
    }

    async fn create_notification(&self, notification: &Notification) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(query(r#"
                insert into notifications (notification_id, recipient, body, is_read, created_at)
                values ($1, $2, $3, $4, $5)
            "#)
            .bind(notification.id).bind(notification.recipient).bind(&notification.body)
            .bind(notification.read).bind(notification.created_at))
            .await?;
        Ok(())
    }

    async fn fetch_notification(&self, id: &NotificationId) -> Result<Option<Notification>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_optional(query(r#"
                select notification_id, recipient, body, is_read, created_at
                from notifications where notification_id = $1
            "#).bind(id)).await?;

        Ok(res.map(|row| notification_from_row(&row)))
    }

    async fn fetch_users_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_all(query(r#"
                select notification_id, recipient, body, is_read, created_at
                from notifications where recipient = $1 order by created_at desc
            "#).bind(user_id)).await?
            .iter()
            .map(notification_from_row)
            .collect();

        Ok(res)
    }

    async fn mark_notification_read(&self, id: &NotificationId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let updated = conn.execute(query(r#"
                update notifications set is_read = true where notification_id = $1
            "#).bind(id)).await?.rows_affected();

        Ok(updated > 0)
    }
}

impl MessageStore for Db {
    type Error = Error;

    async fn create_message(&self, message: &Message) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(query(r#"
                insert into messages(id, sender, receiver, content, is_read, sent_at)
                values ($1, $2, $3, $4, $5, $6)
            "#)
            .bind(message.id)
            .bind(message.from)
            .bind(message.to)
            .bind(&message.content)
            .bind(message.read)
            .bind(message.sent_at))
            .await?;
        Ok(())
    }

    async fn conversation(&self, user_a: &UserId, user_b: &UserId) -> Result<Vec<Message>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_all(query(r#"
                select id, sender, receiver, content, is_read, sent_at
                from messages
                where ((receiver = $1 and sender = $2) or (receiver = $2 and sender = $1))
                order by sent_at, id
            "#).bind(user_a).bind(user_b)).await?
            .iter()
            .map(message_from_row)
            .collect();

        Ok(res)
    }

    async fn latest_message_between(&self, user_a: &UserId, user_b: &UserId) -> Result<Option<Message>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let res = conn.fetch_optional(query(r#"
                select id, sender, receiver, content, is_read, sent_at
                from messages
                where ((receiver = $1 and sender = $2) or (receiver = $2 and sender = $1))
                order by sent_at desc, id desc
                limit 1
            "#).bind(user_a).bind(user_b)).await?;

        Ok(res.map(|row| message_from_row(&row)))
    }

    async fn mark_read(&self, message_id: &MessageId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let updated = conn.execute(query(r#"
                update messages set is_read = true where id = $1
            "#).bind(message_id)).await?.rows_affected();

        Ok(updated > 0)
    }
}

impl AuthStorage for Db {
    type Error = Error;

    async fn fetch_authentication(&self, user_id: &UserId) -> Result<Option<AuthenticationInfo>, Self::Error> {
        let res = self.pool.acquire().await?
            .fetch_optional(query(r#"
            select phc_string from auth where user_id = $1
            "#).bind(user_id)).await?;

        match res {
            Some(row) => {
                let phc_string: &str = row.get(0);
                let auth_info = phc_string.parse()?;
                Ok(Some(auth_info))
            },
            None => Ok(None),
        }
    }

    async fn update_authentication(&self, user_id: &UserId, auth_info: AuthenticationInfo) -> Result<Option<AuthenticationInfo>, Self::Error> {
        let mut transaction = self.pool.begin().await?;
        transaction.execute(query("lock table auth in exclusive mode")).await?;
        let old_auth = transaction.fetch_optional(query(
            "select phc_string from auth where user_id = $1"
        ).bind(user_id)).await?;

        match old_auth {
            Some(row) => {
                let old_phc_string: &str = row.get(0);
                let old_auth: AuthenticationInfo = old_phc_string.parse()?;
                transaction.execute(query(
                    "update auth set phc_string = $1 where user_id = $2"
                ).bind(auth_info.phc_string().to_string()).bind(user_id)).await?;
                transaction.commit().await?;
                Ok(Some(old_auth))
            },
            None => {
                transaction.execute(query(r#"
                    insert into auth (user_id, phc_string) values ($1, $2)
                    "#).bind(user_id).bind(auth_info.phc_string().to_string())).await?;
                transaction.commit().await?;
                Ok(None)
            },
        }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, Error> {
    let role: &str = row.get(3);
    Ok(User {
        id: row.get(0),
        name: row.get(1),
        email: row.get(2),
        role: role.parse()?,
        profile_id: row.get(4),
    })
}

fn event_from_row(row: &PgRow, attendees: Vec<UserId>) -> Event {
    Event {
        id: row.get(0),
        title: row.get(1),
        description: row.get(2),
        venue: row.get(3),
        starts_at: row.get(4),
        created_by: row.get(5),
        attendees,
    }
}

fn job_from_row(row: &PgRow) -> Job {
    Job {
        id: row.get(0),
        title: row.get(1),
        company: row.get(2),
        description: row.get(3),
        posted_by: row.get(4),
        posted_at: row.get(5),
    }
}

fn notification_from_row(row: &PgRow) -> Notification {
    Notification {
        id: row.get(0),
        recipient: row.get(1),
        body: row.get(2),
        read: row.get(3),
        created_at: row.get(4),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get(0),
        from: row.get(1),
        to: row.get(2),
        content: row.get(3),
        read: row.get(4),
        sent_at: row.get(5),
    }
}
