use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{DatabaseError, NewSubscription, Subscription, SubscriptionRow};

impl Database {
    // ========================================================================
    // Subscription Operations
    // ========================================================================

    /// Insert a new subscription, keyed by title.
    ///
    /// Returns [`DatabaseError::DuplicateSubscription`] if a subscription
    /// with this title already exists; it is not updated.
    pub async fn add_subscription(
        &self,
        title: &str,
        xml_url: &str,
        html_url: Option<&str>,
    ) -> Result<Subscription, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO subscriptions (title, xml_url, html_url, updated_at)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(xml_url)
        .bind(html_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok((id,)) => Ok(Subscription {
                id,
                title: title.to_owned(),
                xml_url: xml_url.to_owned(),
                html_url: html_url.map(str::to_owned),
                updated_at: now,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DatabaseError::DuplicateSubscription(title.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sync subscriptions from an OPML import, upserting on title.
    ///
    /// Batched in chunks of 100 so large subscription lists stay a
    /// handful of statements instead of one round-trip per feed.
    pub async fn sync_subscriptions(
        &self,
        subscriptions: &[NewSubscription],
    ) -> Result<(), DatabaseError> {
        if subscriptions.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for chunk in subscriptions.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT INTO subscriptions (title, xml_url, html_url, updated_at) ",
            );

            builder.push_values(chunk, |mut b, sub| {
                b.push_bind(&sub.title)
                    .push_bind(&sub.xml_url)
                    .push_bind(&sub.html_url)
                    .push_bind(now);
            });

            builder.push(
                " ON CONFLICT(title) DO UPDATE SET xml_url = excluded.xml_url, \
                 html_url = excluded.html_url, updated_at = excluded.updated_at",
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// All subscriptions, ordered by title.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, DatabaseError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            "SELECT id, title, xml_url, html_url, updated_at
             FROM subscriptions ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::from_row).collect())
    }

    /// Look up one subscription by its title.
    pub async fn get_subscription(
        &self,
        title: &str,
    ) -> Result<Option<Subscription>, DatabaseError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT id, title, xml_url, html_url, updated_at
             FROM subscriptions WHERE title = ?",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subscription::from_row))
    }

    /// Delete a subscription by title. Returns whether a row was removed.
    pub async fn delete_subscription(&self, title: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, DatabaseError, NewSubscription};

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn test_sub(i: i64) -> NewSubscription {
        NewSubscription {
            title: format!("Feed {}", i),
            xml_url: format!("https://feed{}.example.com/rss", i),
            html_url: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let db = test_db().await;
        let sub = db
            .add_subscription("Example", "https://example.com/rss", Some("https://example.com"))
            .await
            .unwrap();
        assert!(sub.id > 0);
        assert!(sub.updated_at > 0);

        let subs = db.list_subscriptions().await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].title, "Example");
        assert_eq!(subs[0].html_url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_add_duplicate_title_rejected() {
        let db = test_db().await;
        db.add_subscription("Example", "https://example.com/rss", None)
            .await
            .unwrap();

        let result = db
            .add_subscription("Example", "https://other.com/rss", None)
            .await;
        match result {
            Err(DatabaseError::DuplicateSubscription(title)) => assert_eq!(title, "Example"),
            other => panic!("expected DuplicateSubscription, got {:?}", other),
        }

        // The original row is untouched
        let sub = db.get_subscription("Example").await.unwrap().unwrap();
        assert_eq!(sub.xml_url, "https://example.com/rss");
    }

    #[tokio::test]
    async fn test_list_ordered_by_title() {
        let db = test_db().await;
        for title in ["zebra", "alpha", "middle"] {
            db.add_subscription(title, "https://example.com/rss", None)
                .await
                .unwrap();
        }
        let titles: Vec<_> = db
            .list_subscriptions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["alpha", "middle", "zebra"]);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = test_db().await;
        assert!(db.get_subscription("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        db.add_subscription("Example", "https://example.com/rss", None)
            .await
            .unwrap();

        assert!(db.delete_subscription("Example").await.unwrap());
        assert!(!db.delete_subscription("Example").await.unwrap());
        assert!(db.list_subscriptions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_empty() {
        let db = test_db().await;
        db.sync_subscriptions(&[]).await.unwrap();
        assert!(db.list_subscriptions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_upserts_on_title() {
        let db = test_db().await;
        db.sync_subscriptions(&[test_sub(1)]).await.unwrap();

        let updated = NewSubscription {
            title: "Feed 1".to_string(),
            xml_url: "https://moved.example.com/rss".to_string(),
            html_url: Some("https://moved.example.com".to_string()),
        };
        db.sync_subscriptions(&[updated]).await.unwrap();

        let subs = db.list_subscriptions().await.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].xml_url, "https://moved.example.com/rss");
        assert_eq!(
            subs[0].html_url.as_deref(),
            Some("https://moved.example.com")
        );
    }

    #[tokio::test]
    async fn test_sync_batch_chunking() {
        let db = test_db().await;
        let subs: Vec<NewSubscription> = (0..250).map(test_sub).collect();
        db.sync_subscriptions(&subs).await.unwrap();

        let stored = db.list_subscriptions().await.unwrap();
        assert_eq!(stored.len(), 250);
        assert!(stored.iter().any(|s| s.title == "Feed 0"));
        assert!(stored.iter().any(|s| s.title == "Feed 249"));
    }
}
