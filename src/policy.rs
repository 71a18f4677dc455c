use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of user roles. Stored as a string in the database,
/// matched exhaustively everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    UserAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// The authenticated caller as seen by the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: i32,
    pub role: Role,
    pub is_superuser: bool,
}

impl Requester {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Pure policy function: (action, resource kind, requester, owner) -> decision.
///
/// `owner` is the author of the resource being written, when one exists.
/// Anonymous requesters are `None`.
pub fn decide(
    action: Action,
    kind: ResourceKind,
    requester: Option<&Requester>,
    owner: Option<i32>,
) -> Decision {
    // Arbitrary user records are admin-only for reads AND writes; the "me"
    // endpoint never consults the evaluator for its own record.
    if kind == ResourceKind::UserAccount {
        return match requester {
            Some(r) if r.is_admin() => Decision::Allow,
            _ => Decision::Deny,
        };
    }

    // Reads are open to everyone, anonymous included.
    if action == Action::Read {
        return Decision::Allow;
    }

    let Some(requester) = requester else {
        return Decision::Deny;
    };

    if requester.is_admin() {
        return Decision::Allow;
    }

    match kind {
        // Catalog resources: admin only (handled above).
        ResourceKind::Category | ResourceKind::Genre | ResourceKind::Title => Decision::Deny,
        // Content resources: the author, or a moderator.
        ResourceKind::Review | ResourceKind::Comment => {
            if requester.role == Role::Moderator {
                return Decision::Allow;
            }
            match owner {
                Some(owner_id) if owner_id == requester.user_id => Decision::Allow,
                _ => Decision::Deny,
            }
        }
        ResourceKind::UserAccount => Decision::Deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32) -> Requester {
        Requester {
            user_id: id,
            role: Role::User,
            is_superuser: false,
        }
    }

    fn moderator(id: i32) -> Requester {
        Requester {
            user_id: id,
            role: Role::Moderator,
            is_superuser: false,
        }
    }

    fn admin(id: i32) -> Requester {
        Requester {
            user_id: id,
            role: Role::Admin,
            is_superuser: false,
        }
    }

    fn superuser(id: i32) -> Requester {
        Requester {
            user_id: id,
            role: Role::User,
            is_superuser: true,
        }
    }

    #[test]
    fn anonymous_can_read_everything() {
        for kind in [
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Title,
            ResourceKind::Review,
            ResourceKind::Comment,
        ] {
            assert_eq!(decide(Action::Read, kind, None, None), Decision::Allow);
        }
    }

    #[test]
    fn anonymous_cannot_write_anything() {
        for kind in [
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Title,
            ResourceKind::Review,
            ResourceKind::Comment,
            ResourceKind::UserAccount,
        ] {
            assert_eq!(decide(Action::Write, kind, None, None), Decision::Deny);
        }
    }

    #[test]
    fn plain_user_cannot_write_catalog() {
        let u = user(1);
        for kind in [
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Title,
        ] {
            assert_eq!(
                decide(Action::Write, kind, Some(&u), None),
                Decision::Deny
            );
        }
    }

    #[test]
    fn admin_and_superuser_can_write_catalog() {
        for requester in [admin(1), superuser(2)] {
            for kind in [
                ResourceKind::Category,
                ResourceKind::Genre,
                ResourceKind::Title,
            ] {
                assert_eq!(
                    decide(Action::Write, kind, Some(&requester), None),
                    Decision::Allow
                );
            }
        }
    }

    #[test]
    fn author_can_write_own_review() {
        let u = user(7);
        assert_eq!(
            decide(Action::Write, ResourceKind::Review, Some(&u), Some(7)),
            Decision::Allow
        );
    }

    #[test]
    fn user_cannot_write_someone_elses_review() {
        let u = user(7);
        assert_eq!(
            decide(Action::Write, ResourceKind::Review, Some(&u), Some(8)),
            Decision::Deny
        );
    }

    #[test]
    fn moderator_can_write_any_review_or_comment() {
        let m = moderator(3);
        assert_eq!(
            decide(Action::Write, ResourceKind::Review, Some(&m), Some(99)),
            Decision::Allow
        );
        assert_eq!(
            decide(Action::Write, ResourceKind::Comment, Some(&m), Some(99)),
            Decision::Allow
        );
    }

    #[test]
    fn moderator_cannot_write_catalog() {
        let m = moderator(3);
        assert_eq!(
            decide(Action::Write, ResourceKind::Title, Some(&m), None),
            Decision::Deny
        );
        assert_eq!(
            decide(Action::Write, ResourceKind::Category, Some(&m), None),
            Decision::Deny
        );
    }

    #[test]
    fn user_listing_requires_admin() {
        assert_eq!(
            decide(Action::Read, ResourceKind::UserAccount, None, None),
            Decision::Deny
        );
        let u = user(5);
        assert_eq!(
            decide(Action::Read, ResourceKind::UserAccount, Some(&u), None),
            Decision::Deny
        );
        let a = admin(1);
        assert_eq!(
            decide(Action::Read, ResourceKind::UserAccount, Some(&a), None),
            Decision::Allow
        );
    }

    #[test]
    fn moderator_cannot_manage_users() {
        let m = moderator(3);
        assert_eq!(
            decide(Action::Write, ResourceKind::UserAccount, Some(&m), Some(4)),
            Decision::Deny
        );
    }

    #[test]
    fn admin_can_write_any_content() {
        let a = admin(1);
        assert_eq!(
            decide(Action::Write, ResourceKind::Comment, Some(&a), Some(50)),
            Decision::Allow
        );
        assert_eq!(
            decide(Action::Write, ResourceKind::UserAccount, Some(&a), Some(50)),
            Decision::Allow
        );
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("banned"), None);
        assert_eq!(Role::parse(""), None);
    }
}
