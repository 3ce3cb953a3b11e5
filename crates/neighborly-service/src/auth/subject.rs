//! Relations a caller holds to the resource being acted on.
//!
//! The Casbin policy is written in terms of relations rather than user ids.
//! Before each check the service expands the caller into the set of
//! relations that apply: every signed-in user is a resident, administrators
//! add `admin`, and ownership or club membership add `creator` and `member`
//! for the resource at hand.

use std::fmt;

use neighborly_db::model::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Resident,
    Admin,
    Creator,
    Member,
}

impl Relation {
    #[must_use]
    pub const fn casbin_subject(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Admin => "admin",
            Self::Creator => "creator",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.casbin_subject())
    }
}

/// Expanded relation set for one authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subjects(Vec<Relation>);

impl Subjects {
    /// Relations every check starts from: resident, plus admin if flagged.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        let mut relations = vec![Relation::Resident];
        if user.is_admin {
            relations.push(Relation::Admin);
        }
        Self(relations)
    }

    /// Adds `creator` when `owner` is the caller.
    #[must_use]
    pub fn with_owner(mut self, user: &User, owner: uuid::Uuid) -> Self {
        if user.id == owner {
            self.0.push(Relation::Creator);
        }
        self
    }

    /// Adds `member` when the caller belongs to the club.
    #[must_use]
    pub fn with_membership(mut self, is_member: bool) -> Self {
        if is_member {
            self.0.push(Relation::Member);
        }
        self
    }

    #[must_use]
    pub fn contains(&self, relation: Relation) -> bool {
        self.0.contains(&relation)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Subjects {
    type Item = &'a Relation;
    type IntoIter = std::slice::Iter<'a, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
