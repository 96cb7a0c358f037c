use std::sync::Arc;

use jh_core::{Error, ModerationStore, Result};

pub mod backends;
pub mod moderation;

pub use backends::*;
pub use moderation::{
    LikeState, Moderator, Resolution, SuppressionDecision, SuppressionSignal,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSpec {
    Memory,
    Sqlite(String),
}

impl std::str::FromStr for StorageSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }
        match s.strip_prefix("sqlite:") {
            Some(path) if !path.trim().is_empty() => Ok(Self::Sqlite(path.trim().to_string())),
            _ => Err(Error::config(format!(
                "unknown storage {:?}, expected \"memory\" or \"sqlite:<path>\"",
                s
            ))),
        }
    }
}

pub async fn create_store(spec: &StorageSpec) -> Result<Arc<dyn ModerationStore>> {
    match spec {
        StorageSpec::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        StorageSpec::Sqlite(path) => Ok(Arc::new(SQLiteStorage::new_with_path(path).await?)),
        #[cfg(not(feature = "sqlite"))]
        StorageSpec::Sqlite(_) => Err(Error::config(
            "SQLite storage requires building with the `sqlite` feature",
        )),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::moderation::Moderator;
    pub use super::{create_store, StorageSpec};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_spec() {
        assert_eq!("memory".parse::<StorageSpec>().unwrap(), StorageSpec::Memory);
        assert_eq!(
            "sqlite:data/moderation.db".parse::<StorageSpec>().unwrap(),
            StorageSpec::Sqlite("data/moderation.db".to_string())
        );
        assert!("sqlite:".parse::<StorageSpec>().is_err());
        assert!("postgres://db".parse::<StorageSpec>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_store(&StorageSpec::Memory).await.unwrap();
        assert!(store.get_post("p1").await.unwrap().is_none());
    }
}
