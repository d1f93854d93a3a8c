use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) if db.message().contains("Query execution was interrupted") => {
            RepoError::Timeout
        }
        sqlx::Error::ColumnDecode { index, source } => RepoError::Decode {
            column: index,
            message: source.to_string(),
        },
        sqlx::Error::ColumnNotFound(column) => RepoError::Decode {
            column,
            message: "column missing from result set".to_string(),
        },
        other => RepoError::from_persistence(other),
    }
}
