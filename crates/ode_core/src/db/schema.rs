//! Database schema definitions for Ode

use crate::engagement::{ContentKind, EngagementKind};
use crate::id::{AuthorIdType, IdType, PostIdType, SeriesIdType, TutorialIdType};

/// SQL schema definitions for the database
pub struct Schema;

/// Table holding the per-table integer id counters
pub const COUNTER_TABLE: &str = "counter";

/// Table holding bearer tokens
pub const TOKEN_TABLE: &str = "token";

/// Table holding likes and bookmarks
pub const ENGAGEMENT_TABLE: &str = "engagement";

impl Schema {
    /// Get all table definitions
    pub fn tables() -> Vec<TableDefinition> {
        vec![
            Self::system_metadata(),
            Self::counters(),
            Self::authors(),
            Self::tokens(),
            Self::series(),
            Self::posts(),
            Self::tutorials(),
            Self::engagements(),
        ]
    }

    /// System metadata table
    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: "system_metadata".to_string(),
            schema: r#"
                DEFINE TABLE system_metadata SCHEMAFULL;
                DEFINE FIELD schema_version ON system_metadata TYPE int;
                DEFINE FIELD created_at ON system_metadata TYPE datetime;
                DEFINE FIELD updated_at ON system_metadata TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Monotonic id counters, one record per table
    pub fn counters() -> TableDefinition {
        TableDefinition {
            name: COUNTER_TABLE.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD last_id ON {t} TYPE int;
            "#,
                t = COUNTER_TABLE
            ),
            indexes: vec![],
        }
    }

    /// Authors table (account and profile in one record)
    pub fn authors() -> TableDefinition {
        let t = AuthorIdType::PREFIX;
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD username ON {t} TYPE string;
                DEFINE FIELD first_name ON {t} TYPE string;
                DEFINE FIELD last_name ON {t} TYPE string;
                DEFINE FIELD email ON {t} TYPE string;
                DEFINE FIELD password_hash ON {t} TYPE string;
                DEFINE FIELD is_staff ON {t} TYPE bool;
                DEFINE FIELD bio ON {t} TYPE string;
                DEFINE FIELD authenticated ON {t} TYPE bool;
                DEFINE FIELD secret_key ON {t} TYPE string;
                DEFINE FIELD date_joined ON {t} TYPE datetime;
            "#
            ),
            indexes: vec![
                format!("DEFINE INDEX {t}_username ON {t} FIELDS username UNIQUE"),
                format!("DEFINE INDEX {t}_secret_key ON {t} FIELDS secret_key UNIQUE"),
            ],
        }
    }

    /// Bearer tokens, exactly one per author
    pub fn tokens() -> TableDefinition {
        let t = TOKEN_TABLE;
        let a = AuthorIdType::PREFIX;
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD key ON {t} TYPE string;
                DEFINE FIELD author ON {t} TYPE record<{a}>;
                DEFINE FIELD created ON {t} TYPE datetime;
            "#
            ),
            indexes: vec![
                format!("DEFINE INDEX {t}_key ON {t} FIELDS key UNIQUE"),
                format!("DEFINE INDEX {t}_author ON {t} FIELDS author UNIQUE"),
            ],
        }
    }

    /// Series table
    pub fn series() -> TableDefinition {
        let t = SeriesIdType::PREFIX;
        let a = AuthorIdType::PREFIX;
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD name ON {t} TYPE string;
                DEFINE FIELD slug ON {t} TYPE string;
                DEFINE FIELD description ON {t} TYPE string;
                DEFINE FIELD type_of ON {t} TYPE string;
                DEFINE FIELD timestamp ON {t} TYPE datetime;
                DEFINE FIELD creator ON {t} TYPE record<{a}>;
            "#
            ),
            indexes: vec![
                format!("DEFINE INDEX {t}_slug ON {t} FIELDS slug UNIQUE"),
                format!("DEFINE INDEX {t}_creator ON {t} FIELDS creator"),
            ],
        }
    }

    /// Blog posts table
    pub fn posts() -> TableDefinition {
        let t = PostIdType::PREFIX;
        let a = AuthorIdType::PREFIX;
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD title ON {t} TYPE string;
                DEFINE FIELD slug ON {t} TYPE string;
                DEFINE FIELD body ON {t} TYPE string;
                DEFINE FIELD description ON {t} TYPE string;
                DEFINE FIELD thumbnail ON {t} TYPE option<string>;
                DEFINE FIELD draft ON {t} TYPE bool;
                DEFINE FIELD uuid ON {t} TYPE string;
                DEFINE FIELD timestamp ON {t} TYPE datetime;
                DEFINE FIELD author ON {t} TYPE record<{a}>;
            "#
            ),
            indexes: vec![
                format!("DEFINE INDEX {t}_slug ON {t} FIELDS slug UNIQUE"),
                format!("DEFINE INDEX {t}_author ON {t} FIELDS author"),
            ],
        }
    }

    /// Tutorials table
    pub fn tutorials() -> TableDefinition {
        let t = TutorialIdType::PREFIX;
        let a = AuthorIdType::PREFIX;
        let s = SeriesIdType::PREFIX;
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD title ON {t} TYPE string;
                DEFINE FIELD slug ON {t} TYPE string;
                DEFINE FIELD content ON {t} TYPE string;
                DEFINE FIELD description ON {t} TYPE string;
                DEFINE FIELD draft ON {t} TYPE bool;
                DEFINE FIELD number ON {t} TYPE int;
                DEFINE FIELD uuid ON {t} TYPE string;
                DEFINE FIELD timestamp ON {t} TYPE datetime;
                DEFINE FIELD series ON {t} TYPE option<record<{s}>>;
                DEFINE FIELD author ON {t} TYPE record<{a}>;
            "#
            ),
            indexes: vec![
                format!("DEFINE INDEX {t}_slug ON {t} FIELDS slug UNIQUE"),
                format!("DEFINE INDEX {t}_author ON {t} FIELDS author"),
                format!("DEFINE INDEX {t}_series ON {t} FIELDS series"),
            ],
        }
    }

    /// Likes and bookmarks
    ///
    /// Records are keyed by `[author, kind, content_kind, content_id]` so a
    /// second insert of the same tuple collides on the record id itself; the
    /// UNIQUE index guards writers that go through a generated id.
    pub fn engagements() -> TableDefinition {
        let t = ENGAGEMENT_TABLE;
        let a = AuthorIdType::PREFIX;
        let kinds = EngagementKind::ALL
            .iter()
            .map(|k| format!("'{}'", k.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let content_kinds = ContentKind::ALL
            .iter()
            .map(|k| format!("'{}'", k.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        TableDefinition {
            name: t.to_string(),
            schema: format!(
                r#"
                DEFINE TABLE {t} SCHEMAFULL;
                DEFINE FIELD author ON {t} TYPE record<{a}>;
                DEFINE FIELD kind ON {t} TYPE string ASSERT $value IN [{kinds}];
                DEFINE FIELD content_kind ON {t} TYPE string ASSERT $value IN [{content_kinds}];
                DEFINE FIELD content_id ON {t} TYPE int;
                DEFINE FIELD created_at ON {t} TYPE datetime;
            "#
            ),
            indexes: vec![
                format!(
                    "DEFINE INDEX {t}_tuple ON {t} FIELDS author, kind, content_kind, content_id UNIQUE"
                ),
                format!("DEFINE INDEX {t}_target ON {t} FIELDS content_kind, content_id, kind"),
            ],
        }
    }
}

/// Table definition with schema and indexes
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}
