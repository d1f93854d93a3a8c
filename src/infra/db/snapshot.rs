use async_trait::async_trait;

use crate::{
    application::repos::{CacheSource, IconRow, LivestreamTagRow, RepoError, TotalRow},
    domain::entities::{LivestreamModel, Tag, ThemeModel, UserModel},
};

use super::{MysqlRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct IconWithUserRow {
    user_id: i64,
    username: String,
    image: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct GroupTotalRow {
    group_id: i64,
    total: i64,
}

#[derive(sqlx::FromRow)]
struct LivestreamRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    playlist_url: String,
    thumbnail_url: String,
    start_at: i64,
    end_at: i64,
}

#[derive(sqlx::FromRow)]
struct ThemeRow {
    id: i64,
    user_id: i64,
    dark_mode: bool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    display_name: String,
    description: String,
    password: String,
}

#[derive(sqlx::FromRow)]
struct LivestreamTagJoinRow {
    livestream_id: i64,
    tag_id: i64,
    tag_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<IconWithUserRow> for IconRow {
    fn from(row: IconWithUserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            image: row.image,
        }
    }
}

impl From<GroupTotalRow> for TotalRow {
    fn from(row: GroupTotalRow) -> Self {
        Self {
            key: row.group_id,
            total: row.total,
        }
    }
}

impl From<LivestreamRow> for LivestreamModel {
    fn from(row: LivestreamRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            playlist_url: row.playlist_url,
            thumbnail_url: row.thumbnail_url,
            start_at: row.start_at,
            end_at: row.end_at,
        }
    }
}

impl From<ThemeRow> for ThemeModel {
    fn from(row: ThemeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            dark_mode: row.dark_mode,
        }
    }
}

impl From<UserRow> for UserModel {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
            password: row.password,
        }
    }
}

impl From<LivestreamTagJoinRow> for LivestreamTagRow {
    fn from(row: LivestreamTagJoinRow) -> Self {
        Self {
            livestream_id: row.livestream_id,
            tag_id: row.tag_id,
            // A dangling tag_id survives the LEFT JOIN with a NULL name.
            tag_name: row.tag_name.unwrap_or_default(),
        }
    }
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl MysqlRepositories {
    async fn fetch_totals(&self, sql: &'static str) -> Result<Vec<TotalRow>, RepoError> {
        let rows = sqlx::query_as::<_, GroupTotalRow>(sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TotalRow::from).collect())
    }
}

#[async_trait]
impl CacheSource for MysqlRepositories {
    async fn icons(&self) -> Result<Vec<IconRow>, RepoError> {
        let rows = sqlx::query_as::<_, IconWithUserRow>(
            r#"
            SELECT icons.user_id AS user_id, users.name AS username, icons.image AS image
            FROM icons
            INNER JOIN users ON icons.user_id = users.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(IconRow::from).collect())
    }

    async fn user_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.fetch_totals(
            r#"
            SELECT u.id AS group_id, COUNT(*) AS total
            FROM users u
            INNER JOIN livestreams l ON l.user_id = u.id
            INNER JOIN reactions r ON r.livestream_id = l.id
            GROUP BY u.id
            "#,
        )
        .await
    }

    async fn livestream_reaction_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.fetch_totals(
            r#"
            SELECT l.id AS group_id, COUNT(*) AS total
            FROM livestreams l
            INNER JOIN reactions r ON l.id = r.livestream_id
            GROUP BY l.id
            "#,
        )
        .await
    }

    async fn user_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.fetch_totals(
            r#"
            SELECT u.id AS group_id, CAST(IFNULL(SUM(lc.tip), 0) AS SIGNED) AS total
            FROM users u
            INNER JOIN livestreams l ON l.user_id = u.id
            INNER JOIN livecomments lc ON lc.livestream_id = l.id
            GROUP BY u.id
            "#,
        )
        .await
    }

    async fn livestream_tip_totals(&self) -> Result<Vec<TotalRow>, RepoError> {
        self.fetch_totals(
            r#"
            SELECT l.id AS group_id, CAST(IFNULL(SUM(lc.tip), 0) AS SIGNED) AS total
            FROM livestreams l
            INNER JOIN livecomments lc ON l.id = lc.livestream_id
            GROUP BY l.id
            "#,
        )
        .await
    }

    async fn livestreams(&self) -> Result<Vec<LivestreamModel>, RepoError> {
        let rows = sqlx::query_as::<_, LivestreamRow>(
            r#"
            SELECT id, user_id, title, description, playlist_url, thumbnail_url, start_at, end_at
            FROM livestreams
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LivestreamModel::from).collect())
    }

    async fn themes(&self) -> Result<Vec<ThemeModel>, RepoError> {
        let rows = sqlx::query_as::<_, ThemeRow>("SELECT id, user_id, dark_mode FROM themes")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ThemeModel::from).collect())
    }

    async fn users(&self) -> Result<Vec<UserModel>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, display_name, description, password FROM users",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserModel::from).collect())
    }

    async fn livestream_tags(&self) -> Result<Vec<LivestreamTagRow>, RepoError> {
        let rows = sqlx::query_as::<_, LivestreamTagJoinRow>(
            r#"
            SELECT lt.livestream_id AS livestream_id, lt.tag_id AS tag_id, t.name AS tag_name
            FROM livestream_tags lt
            LEFT JOIN tags t ON lt.tag_id = t.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LivestreamTagRow::from).collect())
    }

    async fn tags(&self) -> Result<Vec<Tag>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
