use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{
    CatalogError, CatalogStore, ChannelFields, ChannelRecord, MovieFields, MovieRecord,
    PlaylistFields, PlaylistRecord,
};

/// [`CatalogStore`] backed by a single Postgres transaction.
pub struct PgCatalog {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgCatalog {
    pub async fn begin(pool: &PgPool) -> Result<Self, CatalogError> {
        let tx = pool.begin().await?;
        Ok(PgCatalog { tx: Some(tx) })
    }

    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, CatalogError> {
        self.tx.as_mut().ok_or(CatalogError::Finished)
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn channel_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<ChannelRecord>, CatalogError> {
        let tx = self.tx()?;
        let record = sqlx::query_as::<_, ChannelRecord>(
            "SELECT id, rutube_id, title FROM channels WHERE rutube_id = $1",
        )
        .bind(rutube_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(record)
    }

    async fn insert_channel(&mut self, fields: &ChannelFields) -> Result<i64, CatalogError> {
        let tx = self.tx()?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO channels (rutube_id, title, description, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&fields.rutube_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.avatar_url)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn update_channel_meta(
        &mut self,
        id: i64,
        fields: &ChannelFields,
    ) -> Result<(), CatalogError> {
        let tx = self.tx()?;
        sqlx::query("UPDATE channels SET title = $2, description = $3, avatar_url = $4 WHERE id = $1")
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(&fields.avatar_url)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn playlist_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<PlaylistRecord>, CatalogError> {
        let tx = self.tx()?;
        let record = sqlx::query_as::<_, PlaylistRecord>(
            "SELECT id, rutube_id, title FROM playlists WHERE rutube_id = $1",
        )
        .bind(rutube_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(record)
    }

    async fn insert_playlist(&mut self, fields: &PlaylistFields) -> Result<i64, CatalogError> {
        let tx = self.tx()?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO playlists (rutube_id, title, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&fields.rutube_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.image_url)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn update_playlist_meta(
        &mut self,
        id: i64,
        fields: &PlaylistFields,
    ) -> Result<(), CatalogError> {
        let tx = self.tx()?;
        sqlx::query("UPDATE playlists SET title = $2, description = $3, image_url = $4 WHERE id = $1")
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(&fields.image_url)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn movie_by_rutube_video_id(
        &mut self,
        rutube_video_id: &str,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        let tx = self.tx()?;
        let record = sqlx::query_as::<_, MovieRecord>(
            "SELECT id, title, rutube_video_id FROM movies WHERE rutube_video_id = $1",
        )
        .bind(rutube_video_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(record)
    }

    async fn movie_by_source_url(
        &mut self,
        source_url: &str,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        let tx = self.tx()?;
        let record = sqlx::query_as::<_, MovieRecord>(
            "SELECT id, title, rutube_video_id FROM movies WHERE source_url = $1 LIMIT 1",
        )
        .bind(source_url)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(record)
    }

    async fn insert_movie(&mut self, fields: &MovieFields) -> Result<i64, CatalogError> {
        let tx = self.tx()?;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO movies (
                title, year, image_url, thumbnail_url, views, duration,
                description, genre, source_url, channel_added_at, channel_id,
                rutube_video_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(fields.year)
        .bind(&fields.image_url)
        .bind(&fields.thumbnail_url)
        .bind(fields.views)
        .bind(&fields.duration)
        .bind(&fields.description)
        .bind(&fields.genre)
        .bind(&fields.source_url)
        .bind(fields.channel_added_at)
        .bind(fields.channel_id)
        .bind(&fields.rutube_video_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn update_movie(&mut self, id: i64, fields: &MovieFields) -> Result<(), CatalogError> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            UPDATE movies SET
                title = $2, image_url = $3, thumbnail_url = $4, views = $5,
                duration = $6, description = $7, genre = $8, source_url = $9,
                channel_added_at = $10, channel_id = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.image_url)
        .bind(&fields.thumbnail_url)
        .bind(fields.views)
        .bind(&fields.duration)
        .bind(&fields.description)
        .bind(&fields.genre)
        .bind(&fields.source_url)
        .bind(fields.channel_added_at)
        .bind(fields.channel_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn movie_linked_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<bool, CatalogError> {
        let tx = self.tx()?;
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM playlist_movies WHERE playlist_id = $1 AND movie_id = $2)",
        )
        .bind(playlist_id)
        .bind(movie_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(linked)
    }

    async fn link_movie_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<(), CatalogError> {
        let tx = self.tx()?;
        sqlx::query("INSERT INTO playlist_movies (playlist_id, movie_id) VALUES ($1, $2)")
            .bind(playlist_id)
            .bind(movie_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), CatalogError> {
        let tx = self.tx.take().ok_or(CatalogError::Finished)?;
        tx.commit().await?;
        Ok(())
    }
}
