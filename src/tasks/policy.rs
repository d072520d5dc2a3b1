//! Task access policy.
//!
//! A task is visible to a user iff that user is its creator or its
//! assignee. No other grant exists: team membership in particular does not
//! confer access. Every read, mutation, and comment operation goes through
//! this rule, and the store applies it inside the query itself so an
//! inaccessible task is indistinguishable from a missing one.

use uuid::Uuid;

/// SQL form of the visibility rule. Bind the requesting user's id twice
/// (see [`visibility_params`]).
pub const VISIBILITY_SQL: &str = "(creator_id = ? OR assignee_id = ?)";

/// Parameters matching the two placeholders in [`VISIBILITY_SQL`].
pub fn visibility_params(user_id: Uuid) -> [String; 2] {
    let id = user_id.to_string();
    [id.clone(), id]
}

/// Pure form of the visibility rule.
pub fn can_access(creator_id: Uuid, assignee_id: Option<Uuid>, user_id: Uuid) -> bool {
    creator_id == user_id || assignee_id == Some(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_has_access() {
        let creator = Uuid::new_v4();
        assert!(can_access(creator, None, creator));
        assert!(can_access(creator, Some(Uuid::new_v4()), creator));
    }

    #[test]
    fn test_assignee_has_access() {
        let assignee = Uuid::new_v4();
        assert!(can_access(Uuid::new_v4(), Some(assignee), assignee));
    }

    #[test]
    fn test_unrelated_user_has_no_access() {
        let user = Uuid::new_v4();
        assert!(!can_access(Uuid::new_v4(), Some(Uuid::new_v4()), user));
        assert!(!can_access(Uuid::new_v4(), None, user));
    }

    #[test]
    fn test_visibility_params_bind_user_twice() {
        let user = Uuid::new_v4();
        let params = visibility_params(user);
        assert_eq!(params[0], user.to_string());
        assert_eq!(params[0], params[1]);
        assert_eq!(VISIBILITY_SQL.matches('?').count(), params.len());
    }
}
