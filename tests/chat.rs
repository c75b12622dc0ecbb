use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use chat_socket::session::handle_connection;
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

struct ChatClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    write: WriteHalf<DuplexStream>,
    session: JoinHandle<anyhow::Result<()>>,
}

impl ChatClient {
    fn connect(messenger: &Messenger<Db>) -> Self {
        let (client, server) = tokio::io::duplex(4096);
        let session = tokio::spawn(handle_connection(messenger.clone(), server));
        let (read, write) = tokio::io::split(client);
        let lines = BufReader::new(read).lines();
        ChatClient { lines, write, session }
    }

    async fn send_raw(&mut self, line: &str) {
        self.write.write_all(format!("{line}\n").as_bytes()).await.unwrap();
    }

    async fn send(&mut self, event: Value) {
        self.send_raw(&event.to_string()).await;
    }

    /// Announces an identity and waits until its delivery channel is live.
    async fn login(&mut self, messenger: &Messenger<Db>, user_id: UserId) {
        self.send(json!({ "event": "login", "data": user_id.to_string() })).await;
        for _ in 0..500 {
            if messenger.registry().lookup(&user_id).unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("login was never registered");
    }

    async fn next_event(&mut self) -> Value {
        let line = self.lines.next_line().await.unwrap().expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn disconnect(self) {
        drop(self.lines);
        drop(self.write);
        self.session.await.unwrap().unwrap();
    }
}

fn private_message(from: UserId, to: UserId, content: &str) -> Value {
    json!({
        "event": "private message",
        "data": { "from": from.to_string(), "to": to.to_string(), "content": content }
    })
}

#[tokio::test]
async fn logged_in_connections_receive_pushed_messages() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut client = ChatClient::connect(&messenger);
    client.login(&messenger, alumni).await;

    messenger.send_message(faculty, alumni, "Semester dates are out".into()).await.unwrap();

    let event = client.next_event().await;
    assert_eq!(event["event"], "new message");
    assert_eq!(event["data"]["message"]["content"], "Semester dates are out");
    assert_eq!(event["data"]["sender"]["name"], "Prof Vasquez");
    assert_eq!(event["data"]["sender"]["role"], "faculty");
    assert_eq!(event["data"]["receiver"]["role"], "alumni");

    client.disconnect().await;
}

#[tokio::test]
async fn the_submitter_gets_a_receipt_and_the_receiver_a_copy() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut receiver = ChatClient::connect(&messenger);
    receiver.login(&messenger, alumni).await;

    // the sending connection never announced itself, the submission names the sender
    let mut sender = ChatClient::connect(&messenger);
    sender.send(private_message(faculty, alumni, "Lab is moved to room 204")).await;

    let receipt = sender.next_event().await;
    assert_eq!(receipt["event"], "message sent");
    assert_eq!(receipt["data"]["message"]["content"], "Lab is moved to room 204");
    assert_eq!(receipt["data"]["message"]["read"], false);

    let copy = receiver.next_event().await;
    assert_eq!(copy["event"], "new message");
    assert_eq!(copy["data"]["message"]["content"], "Lab is moved to room 204");

    sender.disconnect().await;
    receiver.disconnect().await;
}

#[tokio::test]
async fn invalid_submissions_get_a_message_error() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut client = ChatClient::connect(&messenger);

    client.send(private_message(faculty, alumni, "")).await;
    assert_eq!(
        client.next_event().await,
        json!({ "event": "message error", "data": "Invalid message data" })
    );

    client.send(json!({
        "event": "private message",
        "data": { "from": faculty.to_string(), "to": "not-an-id", "content": "hello" }
    })).await;
    assert_eq!(
        client.next_event().await,
        json!({ "event": "message error", "data": "Invalid message data" })
    );

    client.disconnect().await;
}

#[tokio::test]
async fn forbidden_sends_report_the_permission_error() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let student = account(&db, "Noor Haddad", Role::Student).await;
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;

    let mut client = ChatClient::connect(&messenger);
    client.send(private_message(student, faculty, "Hi professor")).await;

    assert_eq!(
        client.next_event().await,
        json!({
            "event": "message error",
            "data": "You do not have permission to send messages to this user"
        })
    );

    // nothing was stored for the denied send
    let history = messenger.conversation(&student, &faculty).await.unwrap();
    assert!(history.is_empty());

    client.disconnect().await;
}

#[tokio::test]
async fn garbage_lines_are_ignored_without_a_response() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut client = ChatClient::connect(&messenger);
    client.send_raw("this is not json").await;
    client.send(json!({ "event": "login", "data": "not-a-uuid" })).await;
    client.send(private_message(faculty, alumni, "Still here")).await;

    // the first event on the wire answers the one valid submission
    let event = client.next_event().await;
    assert_eq!(event["event"], "message sent");
    assert_eq!(event["data"]["message"]["content"], "Still here");

    client.disconnect().await;
}

#[tokio::test]
async fn disconnecting_retires_the_delivery_channel() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut client = ChatClient::connect(&messenger);
    client.login(&messenger, alumni).await;
    assert!(messenger.registry().lookup(&alumni).unwrap().is_some());

    client.disconnect().await;
    assert!(messenger.registry().lookup(&alumni).unwrap().is_none());
}

#[tokio::test]
async fn reannouncing_moves_delivery_to_the_newest_connection() {
    let db = Db::new();
    let messenger = Messenger::new(db.clone());
    let faculty = account(&db, "Prof Vasquez", Role::Faculty).await;
    let alumni = account(&db, "Dana Whitfield", Role::Alumni).await;

    let mut stale = ChatClient::connect(&messenger);
    stale.login(&messenger, alumni).await;
    let first_channel = messenger.registry().lookup(&alumni).unwrap().unwrap();

    let mut current = ChatClient::connect(&messenger);
    current.send(json!({ "event": "login", "data": alumni.to_string() })).await;
    for _ in 0..500 {
        let channel = messenger.registry().lookup(&alumni).unwrap().unwrap();
        if !channel.same_channel(&first_channel) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(!messenger.registry().lookup(&alumni).unwrap().unwrap().same_channel(&first_channel));

    messenger.send_message(faculty, alumni, "Who gets this?".into()).await.unwrap();

    let event = current.next_event().await;
    assert_eq!(event["event"], "new message");
    assert_eq!(event["data"]["message"]["content"], "Who gets this?");

    // the stale connection saw nothing: its next event answers its own submission
    stale.send(private_message(faculty, alumni, "Checking in")).await;
    let event = stale.next_event().await;
    assert_eq!(event["event"], "message sent");

    current.disconnect().await;
    assert!(messenger.registry().lookup(&alumni).unwrap().is_none());
    stale.disconnect().await;
}
