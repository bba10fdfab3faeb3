use super::types::{DebateMessage, DebateSession, DebateStatus, Participant};
use crate::axon::{MessageRole, Usage};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::str::FromStr;

type StoreResult<T> = Result<T, StoreError>;

/// One row of `axon debate list`.
#[derive(Debug, Clone, PartialEq)]
pub struct DebateSummary {
    pub id: String,
    pub title: String,
    pub status: DebateStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub message_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Async debate persistence contract.
pub trait DebateStore: Send + Sync {
    /// Insert or update the session row and append any messages not yet stored.
    fn save<'a>(
        &'a self,
        session: &'a DebateSession,
    ) -> Pin<Box<dyn Future<Output = StoreResult<()>> + Send + 'a>>;

    fn load<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<DebateSession>> + Send + 'a>>;

    fn list(&self) -> Pin<Box<dyn Future<Output = StoreResult<Vec<DebateSummary>>> + Send + '_>>;

    fn delete<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<bool>> + Send + 'a>>;
}

/// SQLite-backed debate store using an sqlx async pool.
pub struct SqliteDebateStore {
    pool: SqlitePool,
}

const DEBATE_SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS debate_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";
const DEBATE_SCHEMA_VERSION_KEY: &str = "debate_schema_version";
const DEBATE_SCHEMA_VERSION: u32 = 2;

async fn ensure_debate_schema_version(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(DEBATE_SCHEMA_META_TABLE).execute(pool).await?;

    let stored_version: Option<(String,)> =
        sqlx::query_as("SELECT value FROM debate_schema_meta WHERE key = $1")
            .bind(DEBATE_SCHEMA_VERSION_KEY)
            .fetch_optional(pool)
            .await?;

    if let Some((value,)) = stored_version {
        let parsed = value.parse::<u32>().map_err(|_| {
            StoreError::Schema(format!("invalid debate schema version value: {value}"))
        })?;
        if parsed != DEBATE_SCHEMA_VERSION {
            return Err(StoreError::Schema(format!(
                "incompatible debate schema version: stored={parsed}, expected={DEBATE_SCHEMA_VERSION}. \
remove the debate DB and restart."
            )));
        }
        return Ok(());
    }

    let legacy_table_count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM sqlite_master
         WHERE type = 'table'
           AND name IN ('debates', 'debate_messages')",
    )
    .fetch_one(pool)
    .await?;

    if legacy_table_count.0 > 0 {
        return Err(StoreError::Schema(
            "debate tables exist without schema version metadata. \
remove the debate DB and restart."
                .into(),
        ));
    }

    sqlx::query("INSERT INTO debate_schema_meta (key, value) VALUES ($1, $2)")
        .bind(DEBATE_SCHEMA_VERSION_KEY)
        .bind(DEBATE_SCHEMA_VERSION.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

impl SqliteDebateStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::new(pool).await
    }

    /// Wrap an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;

        ensure_debate_schema_version(&pool).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS debates (
                 id TEXT PRIMARY KEY,
                 title TEXT NOT NULL,
                 topic TEXT NOT NULL,
                 description TEXT NOT NULL,
                 participants TEXT NOT NULL,
                 max_rounds INTEGER NOT NULL,
                 current_round INTEGER NOT NULL,
                 turns_in_round INTEGER NOT NULL,
                 status TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS debate_messages (
                 id TEXT PRIMARY KEY,
                 debate_id TEXT NOT NULL REFERENCES debates(id) ON DELETE CASCADE,
                 seq INTEGER NOT NULL,
                 round INTEGER NOT NULL,
                 turn INTEGER NOT NULL,
                 speaker TEXT,
                 role TEXT NOT NULL,
                 content TEXT NOT NULL,
                 model TEXT,
                 prompt_tokens INTEGER,
                 completion_tokens INTEGER,
                 total_tokens INTEGER,
                 created_at TEXT NOT NULL,
                 UNIQUE(debate_id, seq)
             )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_time(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {raw:?}: {e}")))
}

fn parse_status(raw: &str) -> StoreResult<DebateStatus> {
    DebateStatus::from_str(raw).map_err(|_| StoreError::Corrupt(format!("unknown status: {raw}")))
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Refuse rows that would break round bookkeeping once loaded.
fn check_debate_shape(session: &DebateSession) -> StoreResult<()> {
    let corrupt = |what: String| Err(StoreError::Corrupt(format!("debate {}: {what}", session.id)));
    if session.participants.len() < 2 {
        return corrupt(format!("{} participants", session.participants.len()));
    }
    if session.max_rounds == 0 {
        return corrupt("max_rounds is 0".into());
    }
    if session.current_round > session.max_rounds {
        return corrupt(format!(
            "round {} beyond max {}",
            session.current_round, session.max_rounds
        ));
    }
    if session.turns_in_round > session.seats() {
        return corrupt(format!(
            "{} turns in a round of {} seats",
            session.turns_in_round,
            session.seats()
        ));
    }
    Ok(())
}

fn map_debate_row(row: &SqliteRow) -> StoreResult<DebateSession> {
    let participants_raw: String = row.try_get("participants")?;
    let participants: Vec<Participant> = serde_json::from_str(&participants_raw)
        .map_err(|e| StoreError::Corrupt(format!("participants: {e}")))?;
    let status_raw: String = row.try_get("status")?;
    let created_raw: String = row.try_get("created_at")?;
    let updated_raw: String = row.try_get("updated_at")?;

    let session = DebateSession {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        topic: row.try_get("topic")?,
        description: row.try_get("description")?,
        participants,
        max_rounds: to_u32(row.try_get("max_rounds")?),
        current_round: to_u32(row.try_get("current_round")?),
        turns_in_round: to_u32(row.try_get("turns_in_round")?),
        messages: Vec::new(),
        status: parse_status(&status_raw)?,
        created_at: parse_time(&created_raw)?,
        updated_at: parse_time(&updated_raw)?,
    };
    check_debate_shape(&session)?;
    Ok(session)
}

fn map_message_row(row: &SqliteRow) -> StoreResult<DebateMessage> {
    let role_raw: String = row.try_get("role")?;
    let role = MessageRole::from_str(&role_raw)
        .map_err(|_| StoreError::Corrupt(format!("unknown message role: {role_raw}")))?;
    let prompt_tokens: Option<i64> = row.try_get("prompt_tokens")?;
    let completion_tokens: Option<i64> = row.try_get("completion_tokens")?;
    let total_tokens: Option<i64> = row.try_get("total_tokens")?;
    let usage = match (prompt_tokens, completion_tokens) {
        (Some(p), Some(c)) => {
            let mut usage = Usage::new(to_u64(p), to_u64(c));
            if let Some(total) = total_tokens {
                usage.total_tokens = to_u64(total);
            }
            Some(usage)
        }
        _ => None,
    };
    let created_raw: String = row.try_get("created_at")?;

    Ok(DebateMessage {
        id: row.try_get("id")?,
        round: to_u32(row.try_get("round")?),
        turn: to_u32(row.try_get("turn")?),
        speaker: row.try_get("speaker")?,
        role,
        content: row.try_get("content")?,
        model: row.try_get("model")?,
        usage,
        created_at: parse_time(&created_raw)?,
    })
}

impl DebateStore for SqliteDebateStore {
    fn save<'a>(
        &'a self,
        session: &'a DebateSession,
    ) -> Pin<Box<dyn Future<Output = StoreResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let participants = serde_json::to_string(&session.participants)
                .map_err(|e| StoreError::Corrupt(format!("participants: {e}")))?;
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "INSERT INTO debates (id, title, topic, description, participants, max_rounds,
                                      current_round, turns_in_round, status, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 ON CONFLICT(id) DO UPDATE SET
                     current_round = excluded.current_round,
                     turns_in_round = excluded.turns_in_round,
                     status = excluded.status,
                     updated_at = excluded.updated_at",
            )
            .bind(&session.id)
            .bind(&session.title)
            .bind(&session.topic)
            .bind(&session.description)
            .bind(&participants)
            .bind(i64::from(session.max_rounds))
            .bind(i64::from(session.current_round))
            .bind(i64::from(session.turns_in_round))
            .bind(session.status.to_string())
            .bind(session.created_at.to_rfc3339())
            .bind(session.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            // The log is append-only: rows already stored are never rewritten.
            let (stored,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM debate_messages WHERE debate_id = $1")
                    .bind(&session.id)
                    .fetch_one(&mut *tx)
                    .await?;
            let stored = usize::try_from(stored).unwrap_or(0);
            if stored > session.messages.len() {
                return Err(StoreError::Corrupt(format!(
                    "debate {} has {stored} stored messages but only {} in memory",
                    session.id,
                    session.messages.len()
                )));
            }

            for (seq, message) in session.messages.iter().enumerate().skip(stored) {
                let usage = message.usage.as_ref();
                sqlx::query(
                    "INSERT INTO debate_messages (id, debate_id, seq, round, turn, speaker, role,
                                                  content, model, prompt_tokens, completion_tokens,
                                                  total_tokens, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                )
                .bind(&message.id)
                .bind(&session.id)
                .bind(i64::try_from(seq).unwrap_or(i64::MAX))
                .bind(i64::from(message.round))
                .bind(i64::from(message.turn))
                .bind(message.speaker.as_deref())
                .bind(message.role.to_string())
                .bind(&message.content)
                .bind(message.model.as_deref())
                .bind(usage.map(|u| to_sql_count(u.prompt_tokens)))
                .bind(usage.map(|u| to_sql_count(u.completion_tokens)))
                .bind(usage.map(|u| to_sql_count(u.total_tokens)))
                .bind(message.created_at.to_rfc3339())
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            tracing::debug!(
                debate = session.id.as_str(),
                appended = session.messages.len() - stored,
                status = %session.status,
                "Debate saved"
            );
            Ok(())
        })
    }

    fn load<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<DebateSession>> + Send + 'a>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, title, topic, description, participants, max_rounds, current_round,
                        turns_in_round, status, created_at, updated_at
                 FROM debates
                 WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            let mut session = map_debate_row(&row)?;

            let rows = sqlx::query(
                "SELECT id, round, turn, speaker, role, content, model, prompt_tokens,
                        completion_tokens, total_tokens, created_at
                 FROM debate_messages
                 WHERE debate_id = $1
                 ORDER BY seq ASC",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

            session.messages = rows
                .iter()
                .map(map_message_row)
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(session)
        })
    }

    fn list(&self) -> Pin<Box<dyn Future<Output = StoreResult<Vec<DebateSummary>>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT d.id, d.title, d.status, d.current_round, d.max_rounds, d.updated_at,
                        (SELECT COUNT(*) FROM debate_messages m WHERE m.debate_id = d.id)
                            AS message_count
                 FROM debates d
                 ORDER BY d.updated_at DESC",
            )
            .fetch_all(&self.pool)
            .await?;

            rows.iter()
                .map(|row| -> StoreResult<DebateSummary> {
                    let status_raw: String = row.try_get("status")?;
                    let updated_raw: String = row.try_get("updated_at")?;
                    let count: i64 = row.try_get("message_count")?;
                    Ok(DebateSummary {
                        id: row.try_get("id")?,
                        title: row.try_get("title")?,
                        status: parse_status(&status_raw)?,
                        current_round: to_u32(row.try_get("current_round")?),
                        max_rounds: to_u32(row.try_get("max_rounds")?),
                        message_count: u64::try_from(count).unwrap_or(0),
                        updated_at: parse_time(&updated_raw)?,
                    })
                })
                .collect()
        })
    }

    fn delete<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<bool>> + Send + 'a>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM debates WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axon::{ChatMessage, ChatResponse};
    use crate::debate::machine::{DebateEvent, Transition, apply};
    use crate::debate::types::DebateConfig;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn store() -> SqliteDebateStore {
        SqliteDebateStore::new(memory_pool().await).await.unwrap()
    }

    fn session() -> DebateSession {
        DebateSession::create(DebateConfig {
            title: "Open source funding".into(),
            topic: "Who should pay for open source?".into(),
            description: "Maintainers and companies".into(),
            participants: vec![
                Participant::new("Ada").with_stance("companies"),
                Participant::new("Grace"),
            ],
            max_rounds: 2,
        })
        .unwrap()
    }

    fn advance(session: &DebateSession, event: DebateEvent) -> DebateSession {
        match apply(session, event, Utc::now()) {
            Transition::Applied(next) => next,
            Transition::Ignored(reason) => panic!("ignored: {reason}"),
        }
    }

    fn speak(session: &DebateSession) -> DebateSession {
        let speaker = session.next_speaker().unwrap().name.clone();
        advance(
            session,
            DebateEvent::TurnCompleted {
                speaker,
                reply: ChatResponse {
                    id: "r".into(),
                    message: ChatMessage::assistant("a point"),
                    usage: Usage::new(10, 20),
                    model: Some("m".into()),
                },
            },
        )
    }

    #[tokio::test]
    async fn save_then_load_returns_the_same_session() {
        let store = store().await;
        let started = speak(&advance(&session(), DebateEvent::Start));
        store.save(&started).await.unwrap();

        let loaded = store.load(&started.id).await.unwrap();
        assert_eq!(loaded.id, started.id);
        assert_eq!(loaded.participants, started.participants);
        assert_eq!(loaded.status, DebateStatus::Active);
        assert_eq!(loaded.turns_in_round, 1);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[1].speaker.as_deref(), Some("Ada"));
        assert_eq!(loaded.messages[1].usage, Some(Usage::new(10, 20)));
        assert_eq!(loaded.messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn repeated_saves_only_append_new_messages() {
        let store = store().await;
        let mut s = advance(&session(), DebateEvent::Start);
        store.save(&s).await.unwrap();
        s = speak(&s);
        store.save(&s).await.unwrap();
        store.save(&s).await.unwrap();
        s = speak(&s);
        store.save(&s).await.unwrap();

        let loaded = store.load(&s.id).await.unwrap();
        assert_eq!(loaded.messages.len(), 3);
        assert_eq!(loaded.current_round, 2);
        assert_eq!(loaded.turns_in_round, 0);
    }

    #[tokio::test]
    async fn saving_a_truncated_log_is_rejected() {
        let store = store().await;
        let s = speak(&advance(&session(), DebateEvent::Start));
        store.save(&s).await.unwrap();

        let mut truncated = s.clone();
        truncated.messages.pop();
        assert!(matches!(
            store.save(&truncated).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn reported_token_totals_survive_a_round_trip() {
        let store = store().await;
        let mut s = speak(&advance(&session(), DebateEvent::Start));
        s.messages[1].usage = Some(Usage {
            prompt_tokens: 12,
            completion_tokens: 8,
            total_tokens: 25,
        });
        let mut huge = speak(&s);
        huge.messages[2].usage = Some(Usage::new(u64::MAX, 1));
        store.save(&huge).await.unwrap();

        let loaded = store.load(&huge.id).await.unwrap();
        assert_eq!(loaded.messages[1].usage.unwrap().total_tokens, 25);
        let saturated = loaded.messages[2].usage.unwrap();
        assert_eq!(saturated.prompt_tokens, i64::MAX.unsigned_abs());
        assert_eq!(saturated.total_tokens, i64::MAX.unsigned_abs());
    }

    #[tokio::test]
    async fn load_rejects_debate_without_participants() {
        let store = store().await;
        let s = advance(&session(), DebateEvent::Start);
        store.save(&s).await.unwrap();
        sqlx::query("UPDATE debates SET participants = '[]' WHERE id = $1")
            .bind(&s.id)
            .execute(store.pool())
            .await
            .unwrap();

        assert!(matches!(store.load(&s.id).await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn load_rejects_impossible_round_counters() {
        let store = store().await;
        let s = advance(&session(), DebateEvent::Start);
        store.save(&s).await.unwrap();

        for update in [
            "UPDATE debates SET max_rounds = 0 WHERE id = $1",
            "UPDATE debates SET max_rounds = 2, turns_in_round = 5 WHERE id = $1",
        ] {
            sqlx::query(update)
                .bind(&s.id)
                .execute(store.pool())
                .await
                .unwrap();
            assert!(matches!(store.load(&s.id).await, Err(StoreError::Corrupt(_))));
        }
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let store = store().await;
        assert!(matches!(
            store.load("nope").await,
            Err(StoreError::NotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn list_summarises_and_delete_removes() {
        let store = store().await;
        let a = session();
        let b = advance(&session(), DebateEvent::Start);
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        let summary_b = summaries.iter().find(|s| s.id == b.id).unwrap();
        assert_eq!(summary_b.status, DebateStatus::Active);
        assert_eq!(summary_b.message_count, 1);

        assert!(store.delete(&b.id).await.unwrap());
        assert!(!store.delete(&b.id).await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_creates_the_database_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("debates.db");
        let store = SqliteDebateStore::open(&path).await.unwrap();
        store.save(&session()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn new_rejects_unversioned_debate_tables() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE debates (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            SqliteDebateStore::new(pool).await,
            Err(StoreError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn new_rejects_schema_version_mismatch() {
        let pool = memory_pool().await;
        sqlx::query(DEBATE_SCHEMA_META_TABLE)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO debate_schema_meta (key, value) VALUES ($1, '99')")
            .bind(DEBATE_SCHEMA_VERSION_KEY)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            SqliteDebateStore::new(pool).await,
            Err(StoreError::Schema(_))
        ));
    }
}
