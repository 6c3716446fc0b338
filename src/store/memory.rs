use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use super::{
    ChatRepository, QuestionRepository, RespondentRepository, RoundRepository, StorageError,
};
use crate::quiz::{ClosedQuestion, OpenQuestion, Points, Respondent};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    #[serde(default)]
    open: BTreeMap<u32, OpenQuestion>,
    #[serde(default)]
    closed: BTreeMap<u32, ClosedQuestion>,
    #[serde(default)]
    respondents: BTreeMap<i64, Respondent>,
    #[serde(default)]
    chats: BTreeSet<i64>,
    #[serde(default)]
    finalized: bool,
}

/// Ordered in-memory collections, optionally mirrored to a JSON file after
/// every write.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Snapshot>>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the snapshot at `path` if it exists; later writes go back to it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };
        Ok(Self {
            state: Arc::new(Mutex::new(snapshot)),
            path: Some(path),
        })
    }

    async fn persist(&self, snapshot: &MutexGuard<'_, Snapshot>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&**snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn get_open(&self, number: u32) -> Result<Option<OpenQuestion>, StorageError> {
        Ok(self.state.lock().await.open.get(&number).cloned())
    }

    async fn list_open(&self) -> Result<Vec<OpenQuestion>, StorageError> {
        Ok(self.state.lock().await.open.values().cloned().collect())
    }

    async fn upsert_open(&self, question: &OpenQuestion) -> Result<(), StorageError> {
        let mut guard = self.state.lock().await;
        guard.open.insert(question.number, question.clone());
        self.persist(&guard).await
    }

    async fn count_open(&self) -> Result<usize, StorageError> {
        Ok(self.state.lock().await.open.len())
    }

    async fn list_closed(&self) -> Result<Vec<ClosedQuestion>, StorageError> {
        Ok(self.state.lock().await.closed.values().cloned().collect())
    }

    async fn upsert_closed(&self, question: &ClosedQuestion) -> Result<(), StorageError> {
        let mut guard = self.state.lock().await;
        guard.closed.insert(question.number, question.clone());
        self.persist(&guard).await
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        let mut guard = self.state.lock().await;
        let removed = guard.open.len() + guard.closed.len();
        guard.open.clear();
        guard.closed.clear();
        guard.finalized = false;
        self.persist(&guard).await?;
        Ok(removed)
    }
}

#[async_trait]
impl RespondentRepository for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Respondent>, StorageError> {
        Ok(self.state.lock().await.respondents.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Respondent>, StorageError> {
        Ok(self.state.lock().await.respondents.values().cloned().collect())
    }

    async fn enroll(&self, id: i64) -> Result<bool, StorageError> {
        let mut guard = self.state.lock().await;
        if guard.respondents.contains_key(&id) {
            return Ok(false);
        }
        guard.respondents.insert(id, Respondent::new(id));
        self.persist(&guard).await?;
        Ok(true)
    }

    async fn save(&self, respondent: &Respondent) -> Result<(), StorageError> {
        let mut guard = self.state.lock().await;
        guard.respondents.insert(respondent.id, respondent.clone());
        self.persist(&guard).await
    }

    async fn increment_score(&self, id: i64, delta: Points) -> Result<(), StorageError> {
        let mut guard = self.state.lock().await;
        let respondent = guard.respondents.get_mut(&id).ok_or(StorageError::NotFound)?;
        respondent.score += delta;
        self.persist(&guard).await
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        let mut guard = self.state.lock().await;
        let removed = guard.respondents.len();
        guard.respondents.clear();
        guard.finalized = false;
        self.persist(&guard).await?;
        Ok(removed)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn register(&self, chat: i64) -> Result<bool, StorageError> {
        let mut guard = self.state.lock().await;
        if !guard.chats.insert(chat) {
            return Ok(false);
        }
        self.persist(&guard).await?;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<i64>, StorageError> {
        Ok(self.state.lock().await.chats.iter().copied().collect())
    }
}

#[async_trait]
impl RoundRepository for MemoryStore {
    async fn is_finalized(&self) -> Result<bool, StorageError> {
        Ok(self.state.lock().await.finalized)
    }

    async fn set_finalized(&self, finalized: bool) -> Result<(), StorageError> {
        let mut guard = self.state.lock().await;
        guard.finalized = finalized;
        self.persist(&guard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Storage;

    fn question(number: u32) -> OpenQuestion {
        OpenQuestion {
            number,
            text: format!("Question {number}"),
            image: None,
            options: vec!["A".into(), "B".into()],
            answer: "A".into(),
            points: Points::ONE,
        }
    }

    #[tokio::test]
    async fn questions_are_sorted_and_upserted_by_number() {
        let storage = Storage::in_memory();
        storage.questions.upsert_open(&question(3)).await.unwrap();
        storage.questions.upsert_open(&question(1)).await.unwrap();
        let mut replaced = question(3);
        replaced.answer = "B".into();
        storage.questions.upsert_open(&replaced).await.unwrap();

        let all = storage.questions.list_open().await.unwrap();
        assert_eq!(all.iter().map(|q| q.number).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(all[1].answer, "B");
        assert_eq!(storage.questions.count_open().await.unwrap(), 2);
        assert_eq!(storage.questions.clear().await.unwrap(), 2);
        assert!(storage.questions.get_open(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enrollment_is_idempotent() {
        let storage = Storage::in_memory();
        assert!(storage.respondents.enroll(5).await.unwrap());

        let mut r = storage.respondents.get(5).await.unwrap().unwrap();
        r.score = Points::whole(3);
        storage.respondents.save(&r).await.unwrap();

        assert!(!storage.respondents.enroll(5).await.unwrap());
        assert_eq!(storage.respondents.get(5).await.unwrap().unwrap().score, Points::whole(3));
    }

    #[tokio::test]
    async fn increment_requires_an_existing_respondent() {
        let storage = Storage::in_memory();
        storage.respondents.enroll(1).await.unwrap();
        storage.respondents.increment_score(1, Points::HALF).await.unwrap();
        storage.respondents.increment_score(1, Points::HALF).await.unwrap();
        assert_eq!(storage.respondents.get(1).await.unwrap().unwrap().score, Points::ONE);
        assert!(matches!(
            storage.respondents.increment_score(2, Points::HALF).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("quiz-bot-store-{}.json", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let storage = Storage::from_store(MemoryStore::open(&path).await.unwrap());
        storage.questions.upsert_open(&question(1)).await.unwrap();
        storage.respondents.enroll(42).await.unwrap();
        storage.chats.register(42).await.unwrap();

        storage.round.set_finalized(true).await.unwrap();

        let reopened = Storage::from_store(MemoryStore::open(&path).await.unwrap());
        assert!(reopened.round.is_finalized().await.unwrap());
        assert_eq!(reopened.questions.list_open().await.unwrap(), vec![question(1)]);
        assert!(reopened.respondents.get(42).await.unwrap().is_some());
        assert_eq!(reopened.chats.list().await.unwrap(), vec![42]);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn clearing_starts_a_new_round() {
        let storage = Storage::in_memory();
        assert!(!storage.round.is_finalized().await.unwrap());

        storage.round.set_finalized(true).await.unwrap();
        storage.respondents.clear().await.unwrap();
        assert!(!storage.round.is_finalized().await.unwrap());

        storage.round.set_finalized(true).await.unwrap();
        storage.questions.clear().await.unwrap();
        assert!(!storage.round.is_finalized().await.unwrap());
    }
}
