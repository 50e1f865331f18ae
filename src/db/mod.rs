use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    config::ClientConfig,
    error::{AppError, Result},
    models::StoredImage,
    storage::ImageStore,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ImageRow {
    id: String,
    base64: String,
    indices: Vec<i32>,
    created_at: DateTime<Utc>,
    price: Decimal,
}

impl ImageRow {
    fn into_image(self) -> Result<StoredImage> {
        let indices = self
            .indices
            .into_iter()
            .map(|i| {
                u8::try_from(i)
                    .map_err(|_| AppError::Internal(format!("Stored index {} out of range", i)))
            })
            .collect::<Result<Vec<u8>>>()?;

        Ok(StoredImage {
            id: self.id,
            base64: self.base64,
            indices,
            created_at: self.created_at,
            price: self.price,
        })
    }
}

// ==================== IMAGE QUERIES ====================
#[async_trait]
impl ImageStore for Database {
    async fn put(&self, image: &StoredImage) -> Result<()> {
        let indices: Vec<i32> = image.indices.iter().map(|i| i32::from(*i)).collect();
        sqlx::query(
            r#"
            INSERT INTO images (id, base64, indices, created_at, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET base64     = EXCLUDED.base64,
                indices    = EXCLUDED.indices,
                created_at = EXCLUDED.created_at,
                price      = EXCLUDED.price
            "#,
        )
        .bind(&image.id)
        .bind(&image.base64)
        .bind(&indices)
        .bind(image.created_at)
        .bind(image.price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredImage>> {
        let row = sqlx::query_as::<_, ImageRow>(
            "SELECT id, base64, indices, created_at, price FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ImageRow::into_image).transpose()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredImage>> {
        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT id, base64, indices, created_at, price FROM images ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ImageRow::into_image).collect()
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM images")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM images").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(database_url: &str) -> ClientConfig {
        ClientConfig {
            api_url: "http://localhost:3000".to_string(),
            database_url: database_url.to_string(),
            database_max_connections: 1,
            redis_url: "redis://localhost:6379".to_string(),
            bip39_wordlist_url: None,
            payment_signature: None,
        }
    }

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let config = test_config("not-a-url");
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }

    #[test]
    fn image_row_converts_indices() {
        let row = ImageRow {
            id: "image_1_1_2".to_string(),
            base64: "aGk=".to_string(),
            indices: vec![1, 2],
            created_at: Utc::now(),
            price: Decimal::new(7, 0),
        };
        let image = row.into_image().expect("valid row");
        assert_eq!(image.indices, vec![1, 2]);
    }

    #[test]
    fn image_row_rejects_negative_index() {
        let row = ImageRow {
            id: "image_1_1".to_string(),
            base64: "aGk=".to_string(),
            indices: vec![-1],
            created_at: Utc::now(),
            price: Decimal::ONE,
        };
        assert!(row.into_image().is_err());
    }
}
