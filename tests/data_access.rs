use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use mock_db::Db;
use stoa_auth::{AuthStorage, AuthenticationInfo};
use stoa_campus::data_access::DataAccess;
use stoa_campus::{Event, Job, Notification, Profile, Role, StudentProfile};
use stoa_messenger::data_access::MessageStore;
use stoa_messenger::Message;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn emails_are_unique_ignoring_case() {
    let db = Db::new();

    let created = db.create_user("Ada Lovelace", "ada@stoa.edu", Role::Student).await.unwrap();
    assert!(created.is_some());

    let duplicate = db.create_user("Impostor", "ADA@stoa.edu", Role::Alumni).await.unwrap();
    assert!(duplicate.is_none());

    assert_eq!(db.fetch_users().await.unwrap().len(), 1);

    let found = db.find_user_by_email("Ada@STOA.edu").await.unwrap().unwrap();
    assert_eq!(found.name, "Ada Lovelace");
}

#[tokio::test]
async fn events_come_back_ordered_by_start_time() {
    let db = Db::new();
    let organizer = Uuid::new_v4();

    let event = |title: &str, starts_at| Event {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        description: String::new(),
        venue: "Main hall".to_owned(),
        starts_at,
        created_by: organizer,
        attendees: vec![],
    };

    db.create_event(&event("Late", at(20, 10))).await.unwrap();
    db.create_event(&event("Early", at(5, 10))).await.unwrap();
    db.create_event(&event("Middle", at(12, 10))).await.unwrap();

    let titles: Vec<_> = db
        .fetch_events()
        .await
        .unwrap()
        .into_iter()
        .map(|event| event.title)
        .collect();
    assert_eq!(titles, vec!["Early", "Middle", "Late"]);
}

#[tokio::test]
async fn jobs_come_back_newest_first() {
    let db = Db::new();
    let poster = Uuid::new_v4();

    let job = |title: &str, posted_at| Job {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        company: "Northwind".to_owned(),
        description: String::new(),
        posted_by: poster,
        posted_at,
    };

    db.create_job(&job("January", at(1, 9))).await.unwrap();
    db.create_job(&job("March", at(27, 9))).await.unwrap();
    db.create_job(&job("February", at(14, 9))).await.unwrap();

    let titles: Vec<_> = db
        .fetch_jobs()
        .await
        .unwrap()
        .into_iter()
        .map(|job| job.title)
        .collect();
    assert_eq!(titles, vec!["March", "February", "January"]);
}

#[tokio::test]
async fn notifications_are_per_recipient_and_newest_first() {
    let db = Db::new();
    let recipient = Uuid::new_v4();
    let someone_else = Uuid::new_v4();

    let notification = |recipient, body: &str, created_at| Notification {
        id: Uuid::new_v4(),
        recipient,
        body: body.to_owned(),
        read: false,
        created_at,
    };

    db.create_notification(&notification(recipient, "old", at(2, 8))).await.unwrap();
    db.create_notification(&notification(someone_else, "not yours", at(3, 8))).await.unwrap();
    db.create_notification(&notification(recipient, "new", at(9, 8))).await.unwrap();

    let bodies: Vec<_> = db
        .fetch_users_notifications(&recipient)
        .await
        .unwrap()
        .into_iter()
        .map(|notification| notification.body)
        .collect();
    assert_eq!(bodies, vec!["new", "old"]);
}

#[tokio::test]
async fn marking_a_notification_read_flips_the_stored_flag() {
    let db = Db::new();
    let notification = Notification {
        id: Uuid::new_v4(),
        recipient: Uuid::new_v4(),
        body: "Transcript ready".to_owned(),
        read: false,
        created_at: at(4, 12),
    };
    db.create_notification(&notification).await.unwrap();

    assert!(db.mark_notification_read(&notification.id).await.unwrap());
    let stored = db.fetch_notification(&notification.id).await.unwrap().unwrap();
    assert!(stored.read);

    assert!(!db.mark_notification_read(&Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn conversations_sort_by_time_not_insertion() {
    let db = Db::new();
    let (a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let message = |from, to, content: &str, sent_at| Message {
        id: Uuid::new_v4(),
        from,
        to,
        content: content.to_owned(),
        read: false,
        sent_at,
    };

    db.create_message(&message(a, b, "second", at(10, 12))).await.unwrap();
    db.create_message(&message(b, a, "third", at(10, 13))).await.unwrap();
    db.create_message(&message(a, outsider, "elsewhere", at(10, 11))).await.unwrap();
    db.create_message(&message(a, b, "first", at(10, 9))).await.unwrap();

    let contents: Vec<_> = db
        .conversation(&a, &b)
        .await
        .unwrap()
        .into_iter()
        .map(|message| message.content)
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn the_latest_message_is_scoped_to_the_pair() {
    let db = Db::new();
    let (a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let message = |from, to, content: &str, sent_at| Message {
        id: Uuid::new_v4(),
        from,
        to,
        content: content.to_owned(),
        read: false,
        sent_at,
    };

    assert!(db.latest_message_between(&a, &b).await.unwrap().is_none());

    db.create_message(&message(b, a, "latest in pair", at(18, 16))).await.unwrap();
    db.create_message(&message(a, b, "earlier", at(18, 15))).await.unwrap();
    db.create_message(&message(a, outsider, "newer but elsewhere", at(18, 17))).await.unwrap();

    let latest = db.latest_message_between(&a, &b).await.unwrap().unwrap();
    assert_eq!(latest.content, "latest in pair");
    assert_eq!(latest.from, b);
}

#[tokio::test]
async fn profiles_replace_by_id_and_link_to_the_account() {
    let db = Db::new();
    let user_id = db.create_user("Noor Haddad", "noor@stoa.edu", Role::Student).await.unwrap().unwrap();
    let profile_id = Uuid::new_v4();

    let profile = |department: &str| {
        Profile::Student(StudentProfile {
            id: profile_id,
            user_id,
            department: department.to_owned(),
            enrollment_year: 2024,
            bio: String::new(),
            skills: vec![],
        })
    };

    db.upsert_profile(&profile("Mathematics")).await.unwrap();
    db.set_user_profile(&user_id, &profile_id).await.unwrap();

    let user = db.fetch_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.profile_id, Some(profile_id));

    db.upsert_profile(&profile("Physics")).await.unwrap();
    let stored = db.fetch_profile(&user_id, Role::Student).await.unwrap().unwrap();
    assert_eq!(stored, profile("Physics"));
}

// well-formed PHC strings; never verified against, only stored
const FIRST_HASH: &str = "$argon2id$v=19$m=16,t=2,p=1$c29tZXNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";
const SECOND_HASH: &str = "$argon2id$v=19$m=16,t=2,p=1$b3RoZXJzYWx0$aGFzaGhhc2hoYXNoaGFzaA";

#[tokio::test]
async fn authentication_updates_return_the_previous_info() {
    let db = Db::new();
    let user_id = Uuid::new_v4();

    assert!(db.fetch_authentication(&user_id).await.unwrap().is_none());

    let first: AuthenticationInfo = FIRST_HASH.parse().unwrap();
    let previous = db.update_authentication(&user_id, first).await.unwrap();
    assert!(previous.is_none());

    let second: AuthenticationInfo = SECOND_HASH.parse().unwrap();
    let previous = db.update_authentication(&user_id, second).await.unwrap().unwrap();
    assert_eq!(previous.phc_string().as_str(), FIRST_HASH);

    let stored = db.fetch_authentication(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.phc_string().as_str(), SECOND_HASH);
}
