//! Views a mutation leaves stale.
//!
//! Every mutating operation reports which rendered pages now show outdated
//! data. The HTTP layer turns the set into the `x-revalidate` response header
//! so clients know what to refetch.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

/// A page whose data can go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    Calendar,
    Directory,
    Profile,
    Clubs,
    Club(Uuid),
    Community,
    Admin,
}

impl View {
    /// Path of the page this view renders at.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Calendar => "/calendar".to_string(),
            Self::Directory => "/directory".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::Clubs => "/clubs".to_string(),
            Self::Club(id) => format!("/clubs/{id}"),
            Self::Community => "/community".to_string(),
            Self::Admin => "/admin".to_string(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Ordered, de-duplicated set of stale views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleViews(BTreeSet<View>);

impl StaleViews {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, view: View) {
        self.0.insert(view);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, view: View) -> bool {
        self.0.contains(&view)
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.0.iter()
    }

    /// Comma separated paths, as sent in the revalidate header.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.0
            .iter()
            .map(View::path)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a StaleViews {
    type Item = &'a View;
    type IntoIter = std::collections::btree_set::Iter<'a, View>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<View> for StaleViews {
    fn from_iter<I: IntoIterator<Item = View>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of a mutating operation: the written value plus the views it
/// made stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub value: T,
    pub stale: StaleViews,
}

impl<T> Mutation<T> {
    #[must_use]
    pub fn new(value: T, views: impl IntoIterator<Item = View>) -> Self {
        Self {
            value,
            stale: views.into_iter().collect(),
        }
    }

    /// A no-op mutation: nothing was written, nothing is stale.
    #[must_use]
    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            stale: StaleViews::new(),
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Mutation<U> {
        Mutation {
            value: f(self.value),
            stale: self.stale,
        }
    }
}
