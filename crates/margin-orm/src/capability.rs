//! The authorization boundary.
//!
//! The ORM never decides who may do what. Loaders that attach per-row
//! permission flags ask a [`Capability`] supplied by the caller.

/// Answers "may `actor` perform `action` on `subject`?".
pub trait Capability {
    /// Returns whether the action is allowed.
    fn can(&self, actor: i64, action: &str, subject: Option<i64>) -> bool;
}

impl<F> Capability for F
where
    F: Fn(i64, &str, Option<i64>) -> bool,
{
    fn can(&self, actor: i64, action: &str, subject: Option<i64>) -> bool {
        self(actor, action, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_capability() {
        let only_own = |actor: i64, _action: &str, subject: Option<i64>| subject == Some(actor);
        assert!(only_own.can(3, "edit", Some(3)));
        assert!(!only_own.can(3, "edit", Some(4)));
        assert!(!only_own.can(3, "edit", None));
    }
}
