use anyhow::{Context, Result};

use crate::authorization::AuthService;
use crate::data_access::DataAccess;
use crate::{
    Event, EventId, Job, JobId, Notification, NotificationId, Profile, Role, User, UserId,
    UserOverview,
};

/// Application service for everything outside messaging: accounts, role
/// profiles, events, job postings and notifications.
#[derive(Clone)]
pub struct Campus<D, A> {
    data_access: D,
    auth_service: A,
}

impl<D: DataAccess, A> Campus<D, A> {
    pub fn new(data_access: D, auth_service: A) -> Self {
        Campus { data_access, auth_service }
    }

    pub async fn fetch_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let user = self.data_access
            .fetch_user(user_id).await
            .with_context(|| format!("Couldn't fetch user with id {user_id}"))?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.data_access.find_user_by_email(email).await
            .with_context(|| format!("Couldn't fetch user for email {email}"))
    }

    pub async fn find_users_by_name(&self, substring: &str) -> Result<Vec<User>> {
        let users = self.data_access
            .find_users_by_name(substring).await
            .with_context(|| format!("Couldn't process users search request by substring: {substring}"))?;
        Ok(users)
    }

    /// A user together with the profile matching their role. Admins carry no
    /// profile, so the overview comes back without one.
    pub async fn user_overview(&self, user_id: &UserId) -> Result<Option<UserOverview>> {
        let user = match self.fetch_user(user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let profile = match user.role {
            Role::Admin => None,
            role => self.data_access
                .fetch_profile(user_id, role).await
                .with_context(|| format!("Couldn't fetch {role} profile for user {user_id}"))?,
        };

        Ok(Some(UserOverview { user, profile }))
    }

    /// Creates or replaces the caller's own profile. Returns `None` when the
    /// profile shape doesn't match the caller's role, which also covers
    /// admins since no profile shape maps to them.
    pub async fn update_own_profile(&self, user: &User, profile: Profile) -> Result<Option<Profile>> {
        if profile.role() != user.role || profile.user_id() != user.id {
            return Ok(None);
        }

        self.data_access
            .upsert_profile(&profile).await
            .with_context(|| format!("Couldn't save profile for user {}", user.id))?;

        if user.profile_id.is_none() {
            self.data_access
                .set_user_profile(&user.id, &profile.id()).await
                .with_context(|| format!("Couldn't link profile to user {}", user.id))?;
        }

        Ok(Some(profile))
    }

    pub async fn create_event(
        &self,
        title: String,
        description: String,
        venue: String,
        starts_at: chrono::DateTime<chrono::Utc>,
        created_by: UserId,
    ) -> Result<Event> {
        let event = Event {
            id: uuid::Uuid::new_v4(),
            title,
            description,
            venue,
            starts_at,
            created_by,
            attendees: vec![],
        };

        self.data_access
            .create_event(&event).await
            .with_context(|| format!("Couldn't create event for user {created_by}"))?;

        Ok(event)
    }

    pub async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        self.data_access.fetch_event(event_id).await
            .with_context(|| format!("Couldn't fetch event {event_id}"))
    }

    pub async fn fetch_events(&self) -> Result<Vec<Event>> {
        self.data_access.fetch_events().await.context("Couldn't fetch events")
    }

    pub async fn update_event(&self, event: &Event) -> Result<bool> {
        self.data_access.update_event(event).await
            .with_context(|| format!("Couldn't update event {}", event.id))
    }

    pub async fn delete_event(&self, event_id: &EventId) -> Result<bool> {
        self.data_access.delete_event(event_id).await
            .with_context(|| format!("Couldn't delete event {event_id}"))
    }

    /// Adds the user to the attendee list. Registering twice is a no-op.
    pub async fn register_for_event(&self, event_id: &EventId, user_id: &UserId) -> Result<Option<Event>> {
        let mut event = match self.fetch_event(event_id).await? {
            Some(event) => event,
            None => return Ok(None),
        };

        if !event.attendees.contains(user_id) {
            event.attendees.push(*user_id);
            self.data_access
                .update_event(&event).await
                .with_context(|| format!("Couldn't register user {user_id} for event {event_id}"))?;
        }

        Ok(Some(event))
    }

    pub async fn create_job(
        &self,
        title: String,
        company: String,
        description: String,
        posted_by: UserId,
    ) -> Result<Job> {
        let job = Job {
            id: uuid::Uuid::new_v4(),
            title,
            company,
            description,
            posted_by,
            posted_at: chrono::Utc::now(),
        };

        self.data_access
            .create_job(&job).await
            .with_context(|| format!("Couldn't create job posting for user {posted_by}"))?;

        Ok(job)
    }

    pub async fn fetch_job(&self, job_id: &JobId) -> Result<Option<Job>> {
        self.data_access.fetch_job(job_id).await
            .with_context(|| format!("Couldn't fetch job posting {job_id}"))
    }

    pub async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        self.data_access.fetch_jobs().await.context("Couldn't fetch job postings")
    }

    pub async fn update_job(&self, job: &Job) -> Result<bool> {
        self.data_access.update_job(job).await
            .with_context(|| format!("Couldn't update job posting {}", job.id))
    }

    pub async fn delete_job(&self, job_id: &JobId) -> Result<bool> {
        self.data_access.delete_job(job_id).await
            .with_context(|| format!("Couldn't delete job posting {job_id}"))
    }

    pub async fn notify_user(&self, recipient: UserId, body: &str) -> Result<Notification> {
        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            recipient,
            body: body.to_owned(),
            read: false,
            created_at: chrono::Utc::now(),
        };

        self.data_access
            .create_notification(&notification).await
            .with_context(|| format!("Couldn't create notification for user {recipient}"))?;

        Ok(notification)
    }

    /// Fans a notification out to every user holding one of the given roles.
    /// Returns how many notifications were created.
    pub async fn notify_roles(&self, roles: &[Role], body: &str) -> Result<usize> {
        let mut created = 0;
        for role in roles {
            let users = self.data_access
                .fetch_users_by_role(*role).await
                .with_context(|| format!("Couldn't fetch {role} users for notification fan-out"))?;
            for user in users {
                self.notify_user(user.id, body).await?;
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn users_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        self.data_access.fetch_users_notifications(user_id).await
            .with_context(|| format!("Couldn't fetch notifications for user {user_id}"))
    }

    /// Marks a notification read on behalf of `caller`. Returns false when
    /// the notification doesn't exist or belongs to someone else.
    pub async fn mark_notification_read(&self, caller: &UserId, id: &NotificationId) -> Result<bool> {
        let notification = match self.data_access
            .fetch_notification(id).await
            .with_context(|| format!("Couldn't fetch notification {id}"))? {
            Some(notification) => notification,
            None => return Ok(false),
        };

        if &notification.recipient != caller {
            return Ok(false);
        }

        self.data_access.mark_notification_read(id).await
            .with_context(|| format!("Couldn't mark notification {id} as read"))
    }
}

impl<D: DataAccess, A: AuthService> Campus<D, A> {
    /// Returns `None` when the email is already registered.
    pub async fn register(&self, name: &str, email: &str, role: Role, password: String) -> Result<Option<UserId>> {
        let user_id = match self.data_access
            .create_user(name, email, role).await
            .with_context(|| format!("Couldn't create user {email}"))? {
            Some(user_id) => user_id,
            None => return Ok(None),
        };

        self.auth_service.set_password(&user_id, password).await.with_context(
            || format!("Authorization error: couldn't set password for {email}"))?;

        Ok(Some(user_id))
    }

    pub async fn verify_login(&self, email: &str, password: String) -> Result<Option<UserId>> {
        let user = match self.find_user_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let res = self.auth_service
            .verify_password(&user.id, password).await
            .with_context(|| format!("Authorization error: couldn't verify user {}", &user.id))?;

        if res {
            Ok(Some(user.id))
        } else {
            Ok(None)
        }
    }
}
