use crate::models::User;
use crate::utils::{now_millis, AppError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Backend that holds the full user list
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load(&self) -> Result<Vec<User>, AppError>;
    async fn persist(&self, users: &[User]) -> Result<(), AppError>;
}

/// Users kept in a single pretty-printed JSON array on disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "users.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<User>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }

    async fn persist(&self, users: &[User]) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(users)?;
        let tmp = self.temp_path();

        // rename over the old file so readers never see a half-written array
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-process store (tests)
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    users: std::sync::Mutex<Vec<User>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: std::sync::Mutex::new(users),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemoryStore {
    async fn load(&self) -> Result<Vec<User>, AppError> {
        self.users
            .lock()
            .map(|users| users.clone())
            .map_err(|_| AppError::StorageError("Memory store poisoned".to_string()))
    }

    async fn persist(&self, users: &[User]) -> Result<(), AppError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|_| AppError::StorageError("Memory store poisoned".to_string()))?;
        *guard = users.to_vec();
        Ok(())
    }
}

/// Serialises every read-modify-write against the store
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
    lock: Arc<Mutex<()>>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let _guard = self.lock.lock().await;
        let users = self.store.load().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    /// Adds a new user; id is last id + 1
    pub async fn insert(&self, mut user: User) -> Result<User, AppError> {
        let _guard = self.lock.lock().await;
        let mut users = self.store.load().await?;

        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        user.id = users.last().map(|u| u.id + 1).unwrap_or(1);
        users.push(user.clone());
        self.store.persist(&users).await?;

        Ok(user)
    }

    /// Runs `f` on the matching user under the lock and persists only when
    /// it returns `Ok`
    pub async fn update<T, F>(&self, email: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut User) -> Result<T, AppError>,
    {
        let _guard = self.lock.lock().await;
        let mut users = self.store.load().await?;

        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        let value = f(user)?;
        user.updated_at = Some(now_millis());
        self.store.persist(&users).await?;

        Ok(value)
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        let _guard = self.lock.lock().await;
        Ok(self.store.load().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: 0,
            first_name: "First".into(),
            last_name: "Last".into(),
            email: email.into(),
            password: "pw".into(),
            email_verified: false,
            reset_code: None,
            reset_code_expiry: None,
            created_at: None,
            updated_at: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_no_temp_left() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));

        store.persist(&[user("a@example.com")]).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].email, "a@example.com");
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_update_keeps_fields_it_does_not_know() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"[{"id":1,"email":"a@example.com","password":"pw","phone":"123","avatar":"x.png"}]"#,
        )
        .unwrap();
        let repo = UserRepository::new(Arc::new(JsonFileStore::new(&path)));

        repo.update("a@example.com", |u| {
            u.first_name = "Z".into();
            Ok(())
        })
        .await
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let written: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(written[0]["firstName"], "Z");
        assert_eq!(written[0]["phone"], "123");
        assert_eq!(written[0]["avatar"], "x.png");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, AppError::StorageError(_)));
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_rejects_duplicates() {
        let repo = UserRepository::new(Arc::new(MemoryStore::default()));

        let first = repo.insert(user("a@example.com")).await.unwrap();
        let second = repo.insert(user("b@example.com")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let err = repo.insert(user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_persists_only_on_ok() {
        let repo = UserRepository::new(Arc::new(MemoryStore::default()));
        repo.insert(user("a@example.com")).await.unwrap();

        let failed: Result<(), AppError> = repo
            .update("a@example.com", |u| {
                u.first_name = "Changed".into();
                Err(AppError::InvalidRequest("nope".into()))
            })
            .await;
        assert!(failed.is_err());
        let unchanged = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(unchanged.first_name, "First");

        repo.update("a@example.com", |u| {
            u.first_name = "Changed".into();
            Ok(())
        })
        .await
        .unwrap();
        let changed = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(changed.first_name, "Changed");
        assert!(changed.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_email() {
        let repo = UserRepository::new(Arc::new(MemoryStore::default()));
        let err = repo.update("ghost@example.com", |_| Ok(())).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("users.json")));
        let repo = UserRepository::new(store);

        let mut handles = Vec::new();
        for i in 0..20 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(user(&format!("user{}@example.com", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 20);
    }
}
