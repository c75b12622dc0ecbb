use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use mock_db::Db;
use stoa_campus::data_access::DataAccess;
use stoa_campus::Role;
use stoa_messenger::messenger::Messenger;
use stoa_messenger::UserId;

async fn account(db: &Db, name: &str, role: Role) -> UserId {
    let email = format!("{}@stoa.edu", name.to_lowercase().replace(' ', "."));
    db.create_user(name, &email, role)
        .await
        .expect("mock db does not fail")
        .expect("test emails are unique")
}

#[tokio::test]
async fn sending_persists_exactly_one_unread_message() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let delivery = messenger
        .send_message(faculty, alumni, "Grades are posted".into())
        .await
        .unwrap();

    assert_eq!(delivery.message.from, faculty);
    assert_eq!(delivery.message.to, alumni);
    assert_eq!(delivery.message.content, "Grades are posted");
    assert!(!delivery.message.read);
    assert_eq!(delivery.sender.name, "Prof Vasquez");
    assert_eq!(delivery.sender.role, Role::Faculty);
    assert_eq!(delivery.receiver.name, "Dana Whitfield");
    assert_eq!(delivery.receiver.role, Role::Alumni);

    let stored = messenger.conversation(&faculty, &alumni).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], delivery.message);
}

#[tokio::test]
async fn the_receiver_gets_a_live_copy_and_the_sender_does_not() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let (alumni_sender, mut alumni_deliveries) = mpsc::unbounded_channel();
    messenger.registry().register(alumni, alumni_sender).unwrap();
    let (faculty_sender, mut faculty_deliveries) = mpsc::unbounded_channel();
    messenger.registry().register(faculty, faculty_sender).unwrap();

    let delivery = messenger
        .send_message(faculty, alumni, "Are you coming to the talk?".into())
        .await
        .unwrap();

    let pushed = alumni_deliveries.recv().await.unwrap();
    assert_eq!(pushed.message, delivery.message);
    assert_eq!(pushed.sender.name, "Prof Vasquez");

    assert!(matches!(faculty_deliveries.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn offline_receivers_still_get_the_message_stored() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    messenger
        .send_message(faculty, alumni, "Sent while you were away".into())
        .await
        .unwrap();

    let stored = messenger.conversation(&alumni, &faculty).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "Sent while you were away");

    // connecting later starts with an empty channel, history stays in the store
    let (alumni_sender, mut alumni_deliveries) = mpsc::unbounded_channel();
    messenger.registry().register(alumni, alumni_sender).unwrap();
    assert!(matches!(alumni_deliveries.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn a_dead_delivery_channel_does_not_fail_the_send() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let (alumni_sender, alumni_deliveries) = mpsc::unbounded_channel();
    messenger.registry().register(alumni, alumni_sender).unwrap();
    drop(alumni_deliveries);

    let sent = messenger.send_message(faculty, alumni, "Still works".into()).await;
    assert!(sent.is_ok());

    let stored = messenger.conversation(&faculty, &alumni).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn conversations_read_oldest_first_from_both_sides() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    messenger.send_message(faculty, alumni, "First".into()).await.unwrap();
    messenger.send_message(alumni, faculty, "Second".into()).await.unwrap();
    messenger.send_message(faculty, alumni, "Third".into()).await.unwrap();

    let contents = |messages: Vec<stoa_messenger::Message>| {
        messages.into_iter().map(|m| m.content).collect::<Vec<_>>()
    };

    let seen_by_faculty = messenger.conversation(&faculty, &alumni).await.unwrap();
    assert_eq!(contents(seen_by_faculty), vec!["First", "Second", "Third"]);

    let seen_by_alumni = messenger.conversation(&alumni, &faculty).await.unwrap();
    assert_eq!(contents(seen_by_alumni), vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn marking_read_flips_the_flag_and_reports_missing_ids() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let delivery = messenger.send_message(faculty, alumni, "Read me".into()).await.unwrap();

    assert!(messenger.mark_read(&delivery.message.id).await.unwrap());
    let stored = messenger.conversation(&faculty, &alumni).await.unwrap();
    assert!(stored[0].read);

    // marking again still succeeds, a missing id does not
    assert!(messenger.mark_read(&delivery.message.id).await.unwrap());
    assert!(!messenger.mark_read(&uuid::Uuid::new_v4()).await.unwrap());
}
