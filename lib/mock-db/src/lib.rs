use std::sync::{Arc, Mutex, PoisonError};

use stoa_auth::{AuthStorage, AuthenticationInfo, Credentials};
use stoa_campus::authorization::AuthService;
use stoa_campus::data_access::DataAccess;
use stoa_campus::{
    Event, EventId, Job, JobId, Notification, NotificationId, Profile, ProfileId, Role, User,
    UserId,
};
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::{Message, MessageId};

#[derive(Debug)]
pub enum Error {
    ThreadPoisonError,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThreadPoisonError => write!(f, "Thread poisoning error"),
        }
    }
}

impl std::error::Error for Error {}

impl<T> From<PoisonError<T>> for Error {
    fn from(_value: PoisonError<T>) -> Self {
        Self::ThreadPoisonError
    }
}

struct AuthRecord {
    user_id: UserId,
    phc_string: password_hash::PasswordHashString,
}

/// In-memory storage with the same contracts as the Postgres backend.
#[derive(Clone)]
pub struct Db {
    users: Arc<Mutex<Vec<User>>>,
    profiles: Arc<Mutex<Vec<Profile>>>,
    events: Arc<Mutex<Vec<Event>>>,
    jobs: Arc<Mutex<Vec<Job>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    messages: Arc<Mutex<Vec<Message>>>,
    auth: Arc<Mutex<Vec<AuthRecord>>>,
}

impl Db {
    pub fn new() -> Self {
        Db {
            users: Arc::new(Mutex::new(vec![])),
            profiles: Arc::new(Mutex::new(vec![])),
            events: Arc::new(Mutex::new(vec![])),
            jobs: Arc::new(Mutex::new(vec![])),
            notifications: Arc::new(Mutex::new(vec![])),
            messages: Arc::new(Mutex::new(vec![])),
            auth: Arc::new(Mutex::new(vec![])),
        }
    }

    /// A pre-populated instance for running the server without Postgres.
    /// Passwords are the part of each email before the '@'.
    pub async fn demo() -> Self {
        let db = Db::new();

        let accounts = [
            ("Priya Nair", "priya@stoa.edu", Role::Student),
            ("Marcus Webb", "marcus@alumni.stoa.edu", Role::Alumni),
            ("Elena Petrova", "petrova@stoa.edu", Role::Faculty),
            ("Sam Okafor", "admin@stoa.edu", Role::Admin),
        ];

        let mut user_ids = vec![];
        for (name, email, role) in accounts {
            let user_id = db
                .create_user(name, email, role)
                .await
                .expect("Unable to seed mock db")
                .expect("Demo emails are unique");
            user_ids.push(user_id);
        }
        let (student, alumni, faculty, admin) = (user_ids[0], user_ids[1], user_ids[2], user_ids[3]);

        let credentials = Credentials::new(db.clone());
        let passwords = [
            (student, "priya"),
            (alumni, "marcus"),
            (faculty, "petrova"),
            (admin, "admin"),
        ];
        for (user_id, password) in passwords {
            credentials
                .set_password(&user_id, password.to_owned())
                .await
                .expect("Unable to create authentication while making mock db");
        }

        let conversation = [
            (faculty, alumni, "Welcome back to campus, Marcus."),
            (alumni, faculty, "Happy to be here!"),
            (alumni, student, "Hi Priya, saw your project at the fair. Impressive work."),
            (student, alumni, "Thank you! Would love to hear about your internship."),
        ];
        for (from, to, content) in conversation {
            let message = Message {
                id: uuid::Uuid::new_v4(),
                from,
                to,
                content: content.to_owned(),
                read: false,
                sent_at: chrono::Utc::now(),
            };
            db.create_message(&message).await.expect("Unable to seed mock db");
        }

        let event = Event {
            id: uuid::Uuid::new_v4(),
            title: "Alumni mentorship kickoff".to_owned(),
            description: "Meet mentors from recent graduating classes".to_owned(),
            venue: "Main hall".to_owned(),
            starts_at: chrono::Utc::now() + chrono::Duration::days(7),
            created_by: faculty,
            attendees: vec![student],
        };
        db.create_event(&event).await.expect("Unable to seed mock db");

        let job = Job {
            id: uuid::Uuid::new_v4(),
            title: "Junior data engineer".to_owned(),
            company: "Northwind Analytics".to_owned(),
            description: "Entry level role, campus referrals welcome.".to_owned(),
            posted_by: alumni,
            posted_at: chrono::Utc::now(),
        };
        db.create_job(&job).await.expect("Unable to seed mock db");

        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            recipient: student,
            body: "Your account was approved".to_owned(),
            read: false,
            created_at: chrono::Utc::now(),
        };
        db.create_notification(&notification).await.expect("Unable to seed mock db");

        db
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl DataAccess for Db {
    type Error = Error;

    async fn fetch_users(&self) -> Result<Vec<User>, Error> {
        Ok(self.users.lock()?.clone())
    }

    async fn create_user(&self, name: &str, email: &str, role: Role) -> Result<Option<UserId>, Error> {
        let mut table_locked = self.users.lock()?;

        if table_locked.iter().any(|user| user.email.to_lowercase() == email.to_lowercase()) {
            return Ok(None);
        };

        let user_id = uuid::Uuid::new_v4();
        table_locked.push(User {
            id: user_id,
            name: name.to_owned(),
            email: email.to_owned(),
            role,
            profile_id: None,
        });
        Ok(Some(user_id))
    }

    async fn set_user_profile(&self, user_id: &UserId, profile_id: &ProfileId) -> Result<(), Error> {
        let mut table_locked = self.users.lock()?;
        if let Some(user) = table_locked.iter_mut().find(|user| user.id == *user_id) {
            user.profile_id = Some(*profile_id);
        }
        Ok(())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), Error> {
        let mut table_locked = self.profiles.lock()?;
        match table_locked.iter_mut().find(|existing| existing.id() == profile.id()) {
            Some(existing) => *existing = profile.clone(),
            None => table_locked.push(profile.clone()),
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &UserId, role: Role) -> Result<Option<Profile>, Error> {
        let res = self
            .profiles
            .lock()?
            .iter()
            .find(|profile| profile.user_id() == *user_id && profile.role() == role)
            .cloned();
        Ok(res)
    }

    async fn create_event(&self, event: &Event) -> Result<(), Error> {
        self.events.lock()?.push(event.clone());
        Ok(())
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>, Error> {
        Ok(self.events.lock()?.iter().find(|event| event.id == *event_id).cloned())
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, Error> {
        let mut res = self.events.lock()?.clone();
        res.sort_by_key(|event| event.starts_at);
        Ok(res)
    }

    async fn update_event(&self, event: &Event) -> Result<bool, Error> {
        let mut table_locked = self.events.lock()?;
        match table_locked.iter_mut().find(|existing| existing.id == event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, event_id: &EventId) -> Result<bool, Error> {
        let mut table_locked = self.events.lock()?;
        let len_before = table_locked.len();
        table_locked.retain(|event| event.id != *event_id);
        Ok(table_locked.len() < len_before)
    }

    async fn create_job(&self, job: &Job) -> Result<(), Error> {
        self.jobs.lock()?.push(job.clone());
        Ok(())
    }

    async fn fetch_job(&self, job_id: &JobId) -> Result<Option<Job>, Error> {
        Ok(self.jobs.lock()?.iter().find(|job| job.id == *job_id).cloned())
    }

    async fn fetch_jobs(&self) -> Result<Vec<Job>, Error> {
        let mut res = self.jobs.lock()?.clone();
        res.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(res)
    }

    async fn update_job(&self, job: &Job) -> Result<bool, Error> {
        let mut table_locked = self.jobs.lock()?;
        match table_locked.iter_mut().find(|existing| existing.id == job.id) {
            Some(existing) => {
                *existing = job.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_job(&self, job_id: &JobId) -> Result<bool, Error> {
        let mut table_locked = self.jobs.lock()?;
        let len_before = table_locked.len();
        table_locked.retain(|job| job.id != *job_id);
        Ok(table_locked.len() < len_before)
    }

    async fn create_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.notifications.lock()?.push(notification.clone());
        Ok(())
    }

    async fn fetch_notification(&self, id: &NotificationId) -> Result<Option<Notification>, Error> {
        let res = self
            .notifications
            .lock()?
            .iter()
            .find(|notification| notification.id == *id)
            .cloned();
        Ok(res)
    }

    async fn fetch_users_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>, Error> {
        let mut res: Vec<_> = self
            .notifications
            .lock()?
            .iter()
            .filter(|notification| notification.recipient == *user_id)
            .cloned()
            .collect();
        res.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(res)
    }

    async fn mark_notification_read(&self, id: &NotificationId) -> Result<bool, Error> {
        let mut table_locked = self.notifications.lock()?;
        match table_locked.iter_mut().find(|notification| notification.id == *id) {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl MessageStore for Db {
    type Error = Error;

    async fn create_message(&self, message: &Message) -> Result<(), Error> {
        self.messages.lock()?.push(message.clone());
        Ok(())
    }

    async fn conversation(&self, user_a: &UserId, user_b: &UserId) -> Result<Vec<Message>, Error> {
        let mut res: Vec<_> = self
            .messages
            .lock()?
            .iter()
            .filter(|message| {
                (message.from == *user_a && message.to == *user_b)
                    || (message.from == *user_b && message.to == *user_a)
            })
            .cloned()
            .collect();
        res.sort_by_key(|message| (message.sent_at, message.id));
        Ok(res)
    }

    async fn latest_message_between(&self, user_a: &UserId, user_b: &UserId) -> Result<Option<Message>, Error> {
        let res = self
            .messages
            .lock()?
            .iter()
            .filter(|message| {
                (message.from == *user_a && message.to == *user_b)
                    || (message.from == *user_b && message.to == *user_a)
            })
            .max_by_key(|message| (message.sent_at, message.id))
            .cloned();
        Ok(res)
    }

    async fn mark_read(&self, message_id: &MessageId) -> Result<bool, Error> {
        let mut table_locked = self.messages.lock()?;
        match table_locked.iter_mut().find(|message| message.id == *message_id) {
            Some(message) => {
                message.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl AuthStorage for Db {
    type Error = Error;

    async fn fetch_authentication(&self, user_id: &UserId) -> Result<Option<AuthenticationInfo>, Error> {
        let res = self
            .auth
            .lock()?
            .iter()
            .filter_map(|record| {
                if record.user_id == *user_id {
                    Some(AuthenticationInfo::from(record.phc_string.clone()))
                } else {
                    None
                }
            })
            .next();
        Ok(res)
    }

    async fn update_authentication(&self, user_id: &UserId, auth_info: AuthenticationInfo) -> Result<Option<AuthenticationInfo>, Error> {
        let mut table_locked = self.auth.lock()?;
        for record in table_locked.iter_mut() {
            if record.user_id == *user_id {
                let old_auth = record.phc_string.clone();
                record.phc_string = auth_info.phc_string().clone();
                return Ok(Some(old_auth.into()));
            };
        }
        table_locked.push(AuthRecord {
            user_id: *user_id,
            phc_string: auth_info.phc_string().clone(),
        });
        Ok(None)
    }
}
