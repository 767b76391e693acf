//! Type-safe integer IDs
//!
//! Every stored entity is addressed by a positive integer that doubles as the
//! key of its SurrealDB record (`post:12`, `author:3`). The marker type keeps
//! a `PostId` from being handed to a function that expects a `SeriesId`.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;
use surrealdb::RecordId;

use crate::db::strip_brackets;

/// A typed integer ID whose table is named by `T::PREFIX`
pub struct Id<T> {
    value: i64,
    _phantom: PhantomData<T>,
}

/// Trait for types that can be used as ID markers
pub trait IdType: Send + Sync + 'static {
    /// The table this ID points into (e.g., "post", "author")
    const PREFIX: &'static str;
}

/// Errors that can occur when working with IDs
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum IdError {
    #[error("Invalid ID format: {0}")]
    #[diagnostic(help("IDs are positive integers"))]
    InvalidFormat(String),

    #[error("Record {record} does not belong to table '{expected}'")]
    #[diagnostic(help("The record ID was read from the wrong table"))]
    WrongTable { expected: String, record: String },
}

impl<T: IdType> Id<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Parse an ID from user input such as a form field
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| IdError::InvalidFormat(s.to_string()))?;

        if value < 1 {
            return Err(IdError::InvalidFormat(s.to_string()));
        }

        Ok(Self::new(value))
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn prefix(&self) -> &'static str {
        T::PREFIX
    }

    /// Recover the ID from a SurrealDB record pointing into this table
    pub fn from_record(record: &RecordId) -> Result<Self, IdError> {
        if record.table() != T::PREFIX {
            return Err(IdError::WrongTable {
                expected: T::PREFIX.to_string(),
                record: record.to_string(),
            });
        }

        let key = record.key().to_string();
        Self::parse(strip_brackets(&key))
    }
}

// Manual impls so the marker type needs no derives of its own
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdType> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", T::PREFIX, self.value)
    }
}

impl<T: IdType> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T: IdType> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdType> From<Id<T>> for RecordId {
    fn from(id: Id<T>) -> Self {
        RecordId::from_table_key(T::PREFIX, id.value)
    }
}

impl<T: IdType> From<&Id<T>> for RecordId {
    fn from(id: &Id<T>) -> Self {
        RecordId::from_table_key(T::PREFIX, id.value)
    }
}

impl<T: IdType> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.value)
    }
}

impl<'de, T: IdType> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

impl<T: IdType> JsonSchema for Id<T> {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Owned(format!("{}Id", T::PREFIX))
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        i64::json_schema(generator)
    }
}

/// Macro to define new ID types with minimal boilerplate
#[macro_export]
macro_rules! define_id_type {
    ($type_name:ident, $prefix:expr) => {
        /// Marker type for the ID
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub struct $type_name;

        impl $crate::id::IdType for $type_name {
            const PREFIX: &'static str = $prefix;
        }
    };
}

define_id_type!(AuthorIdType, "author");
define_id_type!(PostIdType, "post");
define_id_type!(TutorialIdType, "tutorial");
define_id_type!(SeriesIdType, "series");

/// Type alias for Author IDs
pub type AuthorId = Id<AuthorIdType>;

/// Type alias for Post IDs
pub type PostId = Id<PostIdType>;

/// Type alias for Tutorial IDs
pub type TutorialId = Id<TutorialIdType>;

/// Type alias for Series IDs
pub type SeriesId = Id<SeriesIdType>;
