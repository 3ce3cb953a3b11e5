//! Database enum types with Diesel serialization.
//!
//! Each enum maps to a `TEXT` column guarded by a CHECK constraint and
//! implements `ToSql`/`FromSql` so queries bind and load it directly. The
//! serde representation is the same string stored in the database.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// A string did not name any variant of a database enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! db_text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            AsExpression,
            FromSqlRow,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the database string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                raw.parse::<Self>().map_err(|e| e.to_string().into())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

db_text_enum! {
    /// One of the five streets in the neighborhood.
    ///
    /// Maps to `residences.street_name`.
    pub enum Street as "street" {
        SymorDr => "Symor Dr",
        BrothersPl => "Brothers Pl",
        FanokRd => "Fanok Rd",
        HadleyWay => "Hadley Way",
        HermsPl => "Herms Pl",
    }
}

db_text_enum! {
    /// Maps to `calendar_events.category`.
    pub enum EventCategory as "event category" {
        Social => "Social",
        Maintenance => "Maintenance",
        Emergency => "Emergency",
        Meeting => "Meeting",
    }
}

db_text_enum! {
    /// Maps to `club_posts.post_type`.
    pub enum PostType as "post type" {
        Discussion => "discussion",
        Announcement => "announcement",
        Question => "question",
        Resource => "resource",
    }
}

db_text_enum! {
    /// Whether a charitable posting collects for a drive or states a need.
    ///
    /// Maps to `charitable_items.item_type`.
    pub enum CharitableItemType as "charitable item type" {
        Drive => "drive",
        Need => "need",
    }
}

db_text_enum! {
    /// Maps to `help_requests.request_type`.
    pub enum HelpRequestType as "help request type" {
        Advice => "advice",
        Help => "help",
    }
}

db_text_enum! {
    /// Maps to `giveaways.status`.
    pub enum GiveawayStatus as "giveaway status" {
        Available => "available",
        Claimed => "claimed",
    }
}

db_text_enum! {
    /// Which community posting table a comment belongs to.
    ///
    /// Maps to `community_comments.item_type`.
    pub enum CommunityItemKind as "community item type" {
        HelpRequest => "help_request",
        Giveaway => "giveaway",
        Charitable => "charitable",
    }
}

db_text_enum! {
    /// Maps to `audit_logs.action`.
    pub enum AuditAction as "audit action" {
        Create => "create",
        Update => "update",
        Delete => "delete",
        /// A resident linked themselves to a residence.
        Claim => "claim",
        /// An administrator unlinked residents from a residence.
        Release => "release",
    }
}
