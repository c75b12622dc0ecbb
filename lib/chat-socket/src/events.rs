use serde::{Deserialize, Serialize};

use stoa_messenger::MessageDelivery;

/// One line from the client. `login` announces which user this connection
/// delivers for, `private message` submits a send.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "login")]
    Login(String),
    #[serde(rename = "private message")]
    PrivateMessage(PrivateMessage),
}

// ids arrive as strings and are parsed by the session, so a malformed id
// is a client error rather than a dead connection
#[derive(Deserialize, Debug, PartialEq)]
pub struct PrivateMessage {
    pub from: String,
    pub to: String,
    pub content: String,
}

/// One line to the client.
#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "new message")]
    NewMessage(MessageDelivery),
    #[serde(rename = "message sent")]
    MessageSent(MessageDelivery),
    #[serde(rename = "message error")]
    MessageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    use stoa_messenger::{Message, Role, UserSummary};

    fn delivery() -> MessageDelivery {
        let (from, to) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        MessageDelivery {
            message: Message {
                id: uuid::Uuid::new_v4(),
                from,
                to,
                content: "hello there".to_owned(),
                read: false,
                sent_at: chrono::Utc::now(),
            },
            sender: UserSummary { id: from, name: "Hypatia".to_owned(), role: Role::Faculty },
            receiver: UserSummary { id: to, name: "Proclus".to_owned(), role: Role::Alumni },
        }
    }

    #[test]
    fn parses_login_event() {
        let line = r#"{"event":"login","data":"8bc17915-33b3-4f75-af1e-1e07d2dbc8ec"}"#;
        let event: ClientEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event, ClientEvent::Login("8bc17915-33b3-4f75-af1e-1e07d2dbc8ec".to_owned()));
    }

    #[test]
    fn parses_private_message_event() {
        let line = r#"{"event":"private message","data":{"from":"a","to":"b","content":"hi"}}"#;
        let event: ClientEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event, ClientEvent::PrivateMessage(PrivateMessage {
            from: "a".to_owned(),
            to: "b".to_owned(),
            content: "hi".to_owned(),
        }));
    }

    #[test]
    fn rejects_unknown_event() {
        let line = r#"{"event":"typing","data":"a"}"#;
        assert!(serde_json::from_str::<ClientEvent>(line).is_err());
    }

    #[test]
    fn message_error_wire_shape() {
        let event = ServerEvent::MessageError("Invalid message data".to_owned());
        let line = serde_json::to_string(&event).unwrap();
        assert_eq!(line, r#"{"event":"message error","data":"Invalid message data"}"#);
    }

    #[test]
    fn new_message_carries_names_and_roles() {
        let event = ServerEvent::NewMessage(delivery());
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "new message");
        assert_eq!(value["data"]["message"]["content"], "hello there");
        assert_eq!(value["data"]["sender"]["name"], "Hypatia");
        assert_eq!(value["data"]["sender"]["role"], "faculty");
        assert_eq!(value["data"]["receiver"]["name"], "Proclus");
    }
}
