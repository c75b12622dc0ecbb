use stoa_campus::{Role, User};
use stoa_utils::utils::log_internal_error;

use crate::data_access::MessageStore;

/// Who may open a conversation with whom. Total over every role pair so
/// adding a role forces a decision here.
pub fn roles_may_message(sender: Role, receiver: Role) -> bool {
    match (sender, receiver) {
        (Role::Faculty, Role::Alumni) => true,
        (Role::Faculty, Role::Faculty) => true,
        (Role::Faculty, Role::Student) => false,
        (Role::Alumni, Role::Faculty) => true,
        (Role::Alumni, Role::Student) => true,
        (Role::Alumni, Role::Alumni) => false,
        (Role::Student, Role::Alumni) => true,
        (Role::Student, Role::Student) => false,
        (Role::Student, Role::Faculty) => false,
        (Role::Admin, _) => false,
        (_, Role::Admin) => false,
    }
}

/// Decides whether `sender` may message `receiver`.
///
/// A student writing an alumni is the one conditional case: the latest
/// message between the two must exist and be the alumni's, so students
/// reply rather than initiate. Every other pair is settled by
/// [`roles_may_message`]. A store failure during the history lookup denies
/// the send instead of propagating.
pub async fn can_send<S: MessageStore>(store: &S, sender: &User, receiver: &User) -> bool {
    if sender.role == Role::Student && receiver.role == Role::Alumni {
        let latest = match store.latest_message_between(&sender.id, &receiver.id).await {
            Ok(latest) => latest,
            Err(e) => {
                log_internal_error(e);
                return false;
            }
        };

        return match latest {
            Some(message) => message.from == receiver.id,
            None => false,
        };
    }

    roles_may_message(sender.role, receiver.role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faculty_reach_alumni_and_faculty_only() {
        assert!(roles_may_message(Role::Faculty, Role::Alumni));
        assert!(roles_may_message(Role::Faculty, Role::Faculty));
        assert!(!roles_may_message(Role::Faculty, Role::Student));
        assert!(!roles_may_message(Role::Faculty, Role::Admin));
    }

    #[test]
    fn alumni_reach_faculty_and_students() {
        assert!(roles_may_message(Role::Alumni, Role::Faculty));
        assert!(roles_may_message(Role::Alumni, Role::Student));
        assert!(!roles_may_message(Role::Alumni, Role::Alumni));
        assert!(!roles_may_message(Role::Alumni, Role::Admin));
    }

    #[test]
    fn students_reach_alumni_only() {
        assert!(roles_may_message(Role::Student, Role::Alumni));
        assert!(!roles_may_message(Role::Student, Role::Student));
        assert!(!roles_may_message(Role::Student, Role::Faculty));
        assert!(!roles_may_message(Role::Student, Role::Admin));
    }

    #[test]
    fn admins_are_outside_messaging() {
        for role in [Role::Admin, Role::Faculty, Role::Alumni, Role::Student] {
            assert!(!roles_may_message(Role::Admin, role));
            assert!(!roles_may_message(role, Role::Admin));
        }
    }
}
