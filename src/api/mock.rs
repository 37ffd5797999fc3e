//! A recording in-memory [`Platform`] used across the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{BotComment, Platform};
use crate::config::RepoId;
use crate::reputation::ActivityRecord;

#[derive(Default)]
pub(crate) struct MockPlatform {
    pub records: HashMap<String, ActivityRecord>,
    pub participants: Vec<String>,
    /// The thread's current bot comment; writes keep it in sync so repeated
    /// reconciliations behave like they do against the real comment store.
    pub comment_store: Mutex<Option<BotComment>>,
    /// When non-empty, successive `find_bot_comment` calls pop from here
    /// instead, simulating a concurrent writer between two lookups.
    pub lookup_overrides: Mutex<VecDeque<Option<BotComment>>>,
    pub posted: Mutex<Vec<(u64, String)>>,
    pub updated: Mutex<Vec<(u64, String)>>,
    pub closed: Mutex<Vec<u64>>,
}

impl MockPlatform {
    pub fn with_records(records: &[(&str, ActivityRecord)]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(login, record)| (login.to_string(), record.clone()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn seed_comment(&self, comment: BotComment) {
        *self.comment_store.lock().unwrap() = Some(comment);
    }

    pub fn queue_lookup(&self, result: Option<BotComment>) {
        self.lookup_overrides.lock().unwrap().push_back(result);
    }

    pub fn write_count(&self) -> usize {
        self.posted.lock().unwrap().len() + self.updated.lock().unwrap().len()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn activity_record(
        &self,
        _repo: &RepoId,
        username: &str,
        _core_team: &HashSet<String>,
    ) -> ActivityRecord {
        self.records.get(username).cloned().unwrap_or_default()
    }

    async fn thread_participants(
        &self,
        _repo: &RepoId,
        _number: u64,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self.participants.clone())
    }

    async fn find_bot_comment(
        &self,
        _repo: &RepoId,
        _number: u64,
    ) -> anyhow::Result<Option<BotComment>> {
        if let Some(next) = self.lookup_overrides.lock().unwrap().pop_front() {
            return Ok(next);
        }
        Ok(self.comment_store.lock().unwrap().clone())
    }

    async fn post_comment(&self, _repo: &RepoId, number: u64, body: &str) -> anyhow::Result<()> {
        self.posted.lock().unwrap().push((number, body.to_string()));
        *self.comment_store.lock().unwrap() = Some(BotComment {
            id: 1,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn update_comment(
        &self,
        _repo: &RepoId,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        self.updated
            .lock()
            .unwrap()
            .push((comment_id, body.to_string()));
        *self.comment_store.lock().unwrap() = Some(BotComment {
            id: comment_id,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn close_pull_request(&self, _repo: &RepoId, number: u64) -> anyhow::Result<()> {
        self.closed.lock().unwrap().push(number);
        Ok(())
    }
}
