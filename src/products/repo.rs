use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Product record in the database. The owner is fixed at creation; update
/// and delete never reassign `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
}

/// Product joined with its owner's username, for listing and detail views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductWithOwner {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub user_id: i64,
    pub owner_username: String,
}

const WITH_OWNER: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.user_id, u.username AS owner_username
    FROM products p
    JOIN users u ON u.id = p.user_id
"#;

/// Wrap a search term in wildcards so it matches anywhere in the name.
fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

impl ProductWithOwner {
    /// Substring search on the product name. `ILIKE` keeps the match
    /// case-insensitive; an empty term matches everything.
    pub async fn search_by_name(db: &PgPool, term: &str) -> sqlx::Result<Vec<ProductWithOwner>> {
        sqlx::query_as::<_, ProductWithOwner>(&format!(
            "{WITH_OWNER} WHERE p.name ILIKE $1 ORDER BY p.id"
        ))
        .bind(like_pattern(term))
        .fetch_all(db)
        .await
    }

    pub async fn list_by_owner(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<ProductWithOwner>> {
        sqlx::query_as::<_, ProductWithOwner>(&format!(
            "{WITH_OWNER} WHERE p.user_id = $1 ORDER BY p.id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<ProductWithOwner>> {
        sqlx::query_as::<_, ProductWithOwner>(&format!("{WITH_OWNER} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

impl Product {
    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, user_id, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// All products system-wide, for the CSV export.
    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, user_id, created_at
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        price: Option<f64>,
    ) -> sqlx::Result<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, user_id, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    /// Owner-filtered update. A non-owner's request matches zero rows and
    /// changes nothing; the returned count says which happened.
    pub async fn update_owned(
        db: &PgPool,
        id: i64,
        user_id: i64,
        name: &str,
        description: Option<&str>,
        price: Option<f64>,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $3, description = $4, price = $5
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Owner-filtered physical delete, same zero-row semantics as
    /// [`Product::update_owned`].
    pub async fn delete_owned(db: &PgPool, id: i64, user_id: i64) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_term() {
        assert_eq!(like_pattern("chair"), "%chair%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn product_with_owner_serializes_owner_username() {
        let p = ProductWithOwner {
            id: 3,
            name: "desk".into(),
            description: None,
            price: Some(120.0),
            user_id: 1,
            owner_username: "alice".into(),
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("owner_username"));
        assert!(json.contains("alice"));
    }
}
