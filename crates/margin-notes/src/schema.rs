//! Tables owned by the notes feature.
//!
//! `users` and `documents` belong to the host application and are not
//! declared here.

use margin_migrate::{SchemaManifest, TableDefinition};

use crate::models::{NOTES_TABLE, NOTES_USERS_TABLE};

/// The `notes` table: threads and replies.
#[must_use]
pub fn notes_table() -> TableDefinition {
    TableDefinition::new(NOTES_TABLE)
        .column("id", "bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY")
        .column("document_id", "bigint(20) unsigned NOT NULL DEFAULT 0")
        .column("parent_id", "bigint(20) unsigned NOT NULL DEFAULT 0")
        .column("user_id", "bigint(20) unsigned NOT NULL DEFAULT 0")
        .column("content", "longtext NOT NULL")
        .column("is_resolved", "tinyint(1) NOT NULL DEFAULT 0")
        .column("created_at", "datetime NULL DEFAULT NULL")
        .column("updated_at", "datetime NULL DEFAULT NULL")
        .column("trashed_at", "datetime NULL DEFAULT NULL")
        .index(["document_id", "parent_id", "user_id"])
}

/// The `notes_users` pivot.
#[must_use]
pub fn notes_users_table() -> TableDefinition {
    TableDefinition::new(NOTES_USERS_TABLE)
        .column("note_id", "bigint(20) unsigned NOT NULL")
        .column("user_id", "bigint(20) unsigned NOT NULL")
        .column("type", "varchar(32) NOT NULL")
        .column("created_at", "datetime NULL DEFAULT NULL")
        .column("updated_at", "datetime NULL DEFAULT NULL")
        .index(["note_id", "user_id", "type"])
}

/// Both tables, in creation order.
#[must_use]
pub fn manifest() -> SchemaManifest {
    SchemaManifest::new(vec![notes_table(), notes_users_table()])
}
