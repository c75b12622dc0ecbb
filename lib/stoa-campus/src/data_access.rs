use std::future::Future;

use crate::{Event, EventId, Job, JobId, Notification, NotificationId, Profile, ProfileId, Role, User, UserId};

// written as a macro to use Self::Error
macro_rules! async_result {
    ($t:ty) => {
        impl Future<Output = Result<$t, Self::Error>> + Send
    };
}

/// Storage seam for every campus collection. Sort orders are part of the
/// contract: events ascend by start time, jobs and notifications return
/// newest first.
pub trait DataAccess: 'static + Send + Sync + Clone {
    type Error: 'static + std::error::Error + Send + Sync;

    // accounts
    fn fetch_users(&self) -> async_result!(Vec<User>);
    /// Returns `None` when the email is already taken.
    fn create_user(&self, name: &str, email: &str, role: Role) -> async_result!(Option<UserId>);
    fn fetch_user(&self, user_id: &UserId) -> async_result!(Option<User>) {
        async move {
            let user = self
                .fetch_users()
                .await?
                .into_iter()
                .find(|user| &user.id == user_id);
            Ok(user)
        }
    }
    fn find_user_by_email(&self, email: &str) -> async_result!(Option<User>) {
        async move {
            let email = email.to_lowercase();
            let user = self
                .fetch_users()
                .await?
                .into_iter()
                .find(|user| user.email.to_lowercase() == email);
            Ok(user)
        }
    }
    fn find_users_by_name(&self, substring: &str) -> async_result!(Vec<User>) {
        async move {
            let search_query = substring.to_lowercase();
            let res = self
                .fetch_users()
                .await?
                .into_iter()
                .filter(|user| user.name.to_lowercase().contains(&search_query))
                .collect();
            Ok(res)
        }
    }
    fn fetch_users_by_role(&self, role: Role) -> async_result!(Vec<User>) {
        async move {
            let res = self
                .fetch_users()
                .await?
                .into_iter()
                .filter(|user| user.role == role)
                .collect();
            Ok(res)
        }
    }
    fn set_user_profile(&self, user_id: &UserId, profile_id: &ProfileId) -> async_result!(());

    // role profiles, one collection per shape
    fn upsert_profile(&self, profile: &Profile) -> async_result!(());
    fn fetch_profile(&self, user_id: &UserId, role: Role) -> async_result!(Option<Profile>);

    // events
    fn create_event(&self, event: &Event) -> async_result!(());
    fn fetch_event(&self, event_id: &EventId) -> async_result!(Option<Event>);
    fn fetch_events(&self) -> async_result!(Vec<Event>);
    fn update_event(&self, event: &Event) -> async_result!(bool);
    fn delete_event(&self, event_id: &EventId) -> async_result!(bool);

    // job postings
    fn create_job(&self, job: &Job) -> async_result!(());
    fn fetch_job(&self, job_id: &JobId) -> async_result!(Option<Job>);
    fn fetch_jobs(&self) -> async_result!(Vec<Job>);
    fn update_job(&self, job: &Job) -> async_result!(bool);
    fn delete_job(&self, job_id: &JobId) -> async_result!(bool);

    // notifications
    fn create_notification(&self, notification: &Notification) -> async_result!(());
    fn fetch_notification(&self, id: &NotificationId) -> async_result!(Option<Notification>);
    fn fetch_users_notifications(&self, user_id: &UserId) -> async_result!(Vec<Notification>);
    fn mark_notification_read(&self, id: &NotificationId) -> async_result!(bool);
}
