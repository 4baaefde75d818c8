//! Principal matching
//!
//! Decides whether a statement's principal list applies to a session.

use super::{PatternMatcher, PrincipalKind, PrincipalRef};
use crate::request::Session;

pub struct PrincipalMatcher;

impl PrincipalMatcher {
    /// Check if any principal reference applies to the session
    ///
    /// An empty list applies to everyone. An account reference applies to
    /// account sessions and to any session with administrative privilege,
    /// matched against the account id. A user reference applies to user
    /// sessions, matched against the user id.
    pub fn matches(principals: &[PrincipalRef], session: &Session) -> bool {
        if principals.is_empty() {
            return true;
        }

        principals.iter().any(|p| Self::matches_one(p, session))
    }

    fn matches_one(principal: &PrincipalRef, session: &Session) -> bool {
        match principal.kind {
            PrincipalKind::Account => {
                (session.is_account_session() || session.has_admin_privilege())
                    && PatternMatcher::matches(principal.pattern(), &session.account_id)
            }
            PrincipalKind::User => {
                session.is_user_session()
                    && session
                        .user_id
                        .as_deref()
                        .is_some_and(|id| PatternMatcher::matches(principal.pattern(), id))
            }
        }
    }
}
