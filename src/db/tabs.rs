//! Tab repository for start pages.
//!
//! Gadgets live in numbered zones of a tab. Within a (tab, zone) the
//! non-deleted gadgets always have contiguous `zone_index` values starting at
//! zero; deleting closes the gap and undeleting reopens it.

use super::DbError;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

/// Name given to the tab created for people without one.
const DEFAULT_TAB_NAME: &str = "Welcome";

/// A gadget placed on a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gadget {
    pub id: i64,
    pub tab_id: i64,
    pub definition_url: String,
    pub zone_number: i64,
    pub zone_index: i64,
}

/// A start page tab with its live gadgets, ordered by zone then index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    pub owner_person_id: i64,
    pub name: String,
    pub tab_index: i64,
    pub gadgets: Vec<Gadget>,
}

/// Reasons a gadget cannot be restored.
#[derive(Debug, Error)]
pub enum GadgetUndeletionError {
    #[error("gadget {0} does not exist")]
    NotFound(i64),
    #[error("gadget {0} is not deleted")]
    NotDeleted(i64),
    #[error("tab {tab_id} holding gadget {gadget_id} has been deleted")]
    TabDeleted { gadget_id: i64, tab_id: i64 },
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for GadgetUndeletionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(DbError::from(err))
    }
}

/// Repository for tab and gadget operations.
pub struct TabRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TabRepository<'a> {
    /// Create a new tab repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All live tabs of a person, by tab index.
    pub async fn tabs_for_person(&self, owner_person_id: i64) -> Result<Vec<Tab>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, i64)>(
            r#"
            SELECT id, owner_person_id, name, tab_index
            FROM tabs
            WHERE owner_person_id = ? AND deleted = 0
            ORDER BY tab_index, id
            "#,
        )
        .bind(owner_person_id)
        .fetch_all(self.pool)
        .await?;

        let mut tabs = Vec::with_capacity(rows.len());
        for (id, owner_person_id, name, tab_index) in rows {
            tabs.push(Tab {
                id,
                owner_person_id,
                name,
                tab_index,
                gadgets: self.live_gadgets(id).await?,
            });
        }
        Ok(tabs)
    }

    /// The person's first tab, created on demand.
    pub async fn start_tab(&self, owner_person_id: i64) -> Result<Tab, DbError> {
        if let Some(tab) = self.tabs_for_person(owner_person_id).await?.into_iter().next() {
            return Ok(tab);
        }

        let result = sqlx::query(
            "INSERT INTO tabs (owner_person_id, name, tab_index, deleted) VALUES (?, ?, 0, 0)",
        )
        .bind(owner_person_id)
        .bind(DEFAULT_TAB_NAME)
        .execute(self.pool)
        .await?;

        Ok(Tab {
            id: result.last_insert_rowid(),
            owner_person_id,
            name: DEFAULT_TAB_NAME.to_string(),
            tab_index: 0,
            gadgets: Vec::new(),
        })
    }

    /// Load a live tab by id.
    pub async fn find_tab(&self, tab_id: i64) -> Result<Option<Tab>, DbError> {
        let row = sqlx::query_as::<_, (i64, i64, String, i64)>(
            "SELECT id, owner_person_id, name, tab_index FROM tabs WHERE id = ? AND deleted = 0",
        )
        .bind(tab_id)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, owner_person_id, name, tab_index)) = row else {
            return Ok(None);
        };

        Ok(Some(Tab {
            id,
            owner_person_id,
            name,
            tab_index,
            gadgets: self.live_gadgets(id).await?,
        }))
    }

    /// Owner of the tab holding a gadget, deleted or not.
    pub async fn gadget_owner(&self, gadget_id: i64) -> Result<Option<i64>, DbError> {
        let owner = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT t.owner_person_id
            FROM gadgets g
            JOIN tabs t ON t.id = g.tab_id
            WHERE g.id = ?
            "#,
        )
        .bind(gadget_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(owner)
    }

    /// Place a gadget at the top of a zone, pushing the others down.
    pub async fn add_gadget(
        &self,
        tab_id: i64,
        definition_url: &str,
        zone_number: i64,
    ) -> Result<Gadget, DbError> {
        let mut tx = self.pool.begin().await?;

        shift_zone(&mut tx, tab_id, zone_number, 0, 1).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO gadgets (tab_id, definition_url, zone_number, zone_index, deleted)
            VALUES (?, ?, ?, 0, 0)
            "#,
        )
        .bind(tab_id)
        .bind(definition_url)
        .bind(zone_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Gadget {
            id: result.last_insert_rowid(),
            tab_id,
            definition_url: definition_url.to_string(),
            zone_number,
            zone_index: 0,
        })
    }

    /// Soft-delete a gadget and close the gap it leaves. Returns the tab.
    pub async fn delete_gadget(&self, gadget_id: i64) -> Result<Tab, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT tab_id, zone_number, zone_index FROM gadgets WHERE id = ? AND deleted = 0",
        )
        .bind(gadget_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((tab_id, zone_number, zone_index)) = row else {
            return Err(DbError::GadgetNotFound(gadget_id));
        };

        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE gadgets SET deleted = 1, date_deleted = ? WHERE id = ?")
            .bind(now)
            .bind(gadget_id)
            .execute(&mut *tx)
            .await?;

        shift_zone(&mut tx, tab_id, zone_number, zone_index + 1, -1).await?;

        tx.commit().await?;

        self.find_tab(tab_id)
            .await?
            .ok_or(DbError::GadgetNotFound(gadget_id))
    }

    /// Restore a deleted gadget to its zone and index and return its tab.
    ///
    /// If the zone shrank since the delete, the gadget goes to the end of it.
    pub async fn undelete_gadget(&self, gadget_id: i64) -> Result<Tab, GadgetUndeletionError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (i64, i64, i64, bool, bool)>(
            r#"
            SELECT g.tab_id, g.zone_number, g.zone_index, g.deleted, t.deleted
            FROM gadgets g
            JOIN tabs t ON t.id = g.tab_id
            WHERE g.id = ?
            "#,
        )
        .bind(gadget_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((tab_id, zone_number, zone_index, deleted, tab_deleted)) = row else {
            return Err(GadgetUndeletionError::NotFound(gadget_id));
        };
        if !deleted {
            return Err(GadgetUndeletionError::NotDeleted(gadget_id));
        }
        if tab_deleted {
            return Err(GadgetUndeletionError::TabDeleted { gadget_id, tab_id });
        }

        let live_in_zone = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM gadgets WHERE tab_id = ? AND zone_number = ? AND deleted = 0",
        )
        .bind(tab_id)
        .bind(zone_number)
        .fetch_one(&mut *tx)
        .await?;
        let target_index = zone_index.min(live_in_zone);

        shift_zone(&mut tx, tab_id, zone_number, target_index, 1).await?;

        sqlx::query(
            "UPDATE gadgets SET deleted = 0, date_deleted = NULL, zone_index = ? WHERE id = ?",
        )
        .bind(target_index)
        .bind(gadget_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_tab(tab_id)
            .await?
            .ok_or(GadgetUndeletionError::TabDeleted { gadget_id, tab_id })
    }

    /// Permanently remove gadgets deleted before `cutoff` (Unix seconds).
    pub async fn purge_deleted_gadgets(&self, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM gadgets WHERE deleted = 1 AND date_deleted < ?")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn live_gadgets(&self, tab_id: i64) -> Result<Vec<Gadget>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, i64, i64)>(
            r#"
            SELECT id, tab_id, definition_url, zone_number, zone_index
            FROM gadgets
            WHERE tab_id = ? AND deleted = 0
            ORDER BY zone_number, zone_index
            "#,
        )
        .bind(tab_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, tab_id, definition_url, zone_number, zone_index)| Gadget {
                id,
                tab_id,
                definition_url,
                zone_number,
                zone_index,
            })
            .collect())
    }
}

/// Move live gadgets in a zone at or after `from_index` by `delta` positions.
async fn shift_zone(
    tx: &mut Transaction<'_, Sqlite>,
    tab_id: i64,
    zone_number: i64,
    from_index: i64,
    delta: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE gadgets SET zone_index = zone_index + ?
        WHERE tab_id = ? AND zone_number = ? AND zone_index >= ? AND deleted = 0
        "#,
    )
    .bind(delta)
    .bind(tab_id)
    .bind(zone_number)
    .bind(from_index)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn urls(tab: &Tab) -> Vec<(&str, i64)> {
        tab.gadgets
            .iter()
            .map(|g| (g.definition_url.as_str(), g.zone_index))
            .collect()
    }

    async fn tab_with_three(db: &Database) -> (Tab, Vec<Gadget>) {
        let person = db.people().create("jdoe", "Jane", false).await.unwrap();
        let tab = db.tabs().start_tab(person.id).await.unwrap();
        let c = db.tabs().add_gadget(tab.id, "c", 0).await.unwrap();
        let b = db.tabs().add_gadget(tab.id, "b", 0).await.unwrap();
        let a = db.tabs().add_gadget(tab.id, "a", 0).await.unwrap();
        (tab, vec![a, b, c])
    }

    #[tokio::test]
    async fn start_tab_is_created_once() {
        let db = Database::new(":memory:").await.unwrap();
        let person = db.people().create("jdoe", "Jane", false).await.unwrap();

        let first = db.tabs().start_tab(person.id).await.unwrap();
        let second = db.tabs().start_tab(person.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "Welcome");
    }

    #[tokio::test]
    async fn add_gadget_pushes_zone_down() {
        let db = Database::new(":memory:").await.unwrap();
        let (tab, _) = tab_with_three(&db).await;

        let tab = db.tabs().find_tab(tab.id).await.unwrap().unwrap();
        assert_eq!(urls(&tab), vec![("a", 0), ("b", 1), ("c", 2)]);
    }

    #[tokio::test]
    async fn delete_then_undelete_restores_position() {
        let db = Database::new(":memory:").await.unwrap();
        let (_, gadgets) = tab_with_three(&db).await;
        let b = &gadgets[1];

        let tab = db.tabs().delete_gadget(b.id).await.unwrap();
        assert_eq!(urls(&tab), vec![("a", 0), ("c", 1)]);

        let tab = db.tabs().undelete_gadget(b.id).await.unwrap();
        assert_eq!(urls(&tab), vec![("a", 0), ("b", 1), ("c", 2)]);
    }

    #[tokio::test]
    async fn undelete_clamps_to_end_of_shrunk_zone() {
        let db = Database::new(":memory:").await.unwrap();
        let (_, gadgets) = tab_with_three(&db).await;

        db.tabs().delete_gadget(gadgets[2].id).await.unwrap();
        db.tabs().delete_gadget(gadgets[1].id).await.unwrap();

        let tab = db.tabs().undelete_gadget(gadgets[2].id).await.unwrap();
        assert_eq!(urls(&tab), vec![("a", 0), ("c", 1)]);
    }

    #[tokio::test]
    async fn undelete_rejects_live_and_missing_gadgets() {
        let db = Database::new(":memory:").await.unwrap();
        let (_, gadgets) = tab_with_three(&db).await;

        let err = db.tabs().undelete_gadget(gadgets[0].id).await.unwrap_err();
        assert!(matches!(err, GadgetUndeletionError::NotDeleted(_)));

        let err = db.tabs().undelete_gadget(9999).await.unwrap_err();
        assert!(matches!(err, GadgetUndeletionError::NotFound(9999)));
    }

    #[tokio::test]
    async fn delete_missing_gadget_fails() {
        let db = Database::new(":memory:").await.unwrap();
        let err = db.tabs().delete_gadget(5).await.unwrap_err();
        assert!(matches!(err, DbError::GadgetNotFound(5)));
    }

    #[tokio::test]
    async fn purge_removes_only_old_deleted_gadgets() {
        let db = Database::new(":memory:").await.unwrap();
        let (_, gadgets) = tab_with_three(&db).await;
        db.tabs().delete_gadget(gadgets[0].id).await.unwrap();

        assert_eq!(db.tabs().purge_deleted_gadgets(0).await.unwrap(), 0);
        let future = chrono::Utc::now().timestamp() + 60;
        assert_eq!(db.tabs().purge_deleted_gadgets(future).await.unwrap(), 1);

        let err = db.tabs().undelete_gadget(gadgets[0].id).await.unwrap_err();
        assert!(matches!(err, GadgetUndeletionError::NotFound(_)));
    }

    #[tokio::test]
    async fn gadget_owner_survives_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let (tab, gadgets) = tab_with_three(&db).await;
        db.tabs().delete_gadget(gadgets[0].id).await.unwrap();

        let owner = db.tabs().gadget_owner(gadgets[0].id).await.unwrap();
        assert_eq!(owner, Some(tab.owner_person_id));
        assert_eq!(db.tabs().gadget_owner(12345).await.unwrap(), None);
    }
}
