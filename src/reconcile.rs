//! Find-or-create maintenance of the single summary comment on a thread.

use std::collections::HashSet;

use tracing::debug;

use crate::api::Platform;
use crate::config::RepoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Skipped,
}

/// Writes `body` as the thread's bot comment, updating an existing one in
/// place. When the existing comment already mentions every candidate, the
/// re-trigger carries no new information and nothing is written.
///
/// There is no cross-request lock: two near-simultaneous events on one
/// thread can both pass the first lookup. The second lookup right before
/// posting narrows that duplicate-post window but does not close it.
pub async fn reconcile(
    github: &dyn Platform,
    repo: &RepoId,
    number: u64,
    body: &str,
    candidates: &[String],
) -> anyhow::Result<ReconcileOutcome> {
    if let Some(existing) = github.find_bot_comment(repo, number).await? {
        let covered = mentioned_logins(&existing.body);
        if candidates.iter().all(|c| covered.contains(c.as_str())) {
            debug!(
                "comment {} on #{number} already covers all {} participants",
                existing.id,
                candidates.len()
            );
            return Ok(ReconcileOutcome::Skipped);
        }

        github.update_comment(repo, existing.id, body).await?;
        return Ok(ReconcileOutcome::Updated);
    }

    match github.find_bot_comment(repo, number).await? {
        Some(existing) => {
            debug!(
                "comment {} appeared on #{number} since the first lookup, updating it",
                existing.id
            );
            github.update_comment(repo, existing.id, body).await?;
            Ok(ReconcileOutcome::Updated)
        }
        None => {
            github.post_comment(repo, number, body).await?;
            Ok(ReconcileOutcome::Created)
        }
    }
}

/// Logins mentioned as `@login` anywhere in a comment body.
pub fn mentioned_logins(body: &str) -> HashSet<&str> {
    let mut logins = HashSet::new();
    let bytes = body.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'@' {
            i += 1;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'-') {
            end += 1;
        }
        if end > start {
            logins.insert(&body[start..end]);
        }
        i = end.max(i + 1);
    }

    logins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockPlatform;
    use crate::api::BotComment;
    use crate::config::RepoId;

    fn repo() -> RepoId {
        "acme/widgets".parse().unwrap()
    }

    fn names(logins: &[&str]) -> Vec<String> {
        logins.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn extracts_mentions() {
        let body = "| **@alice** | ⚡ 5 |\n| **@London-Cat** | ⚡ 0 |\ncc @bob42.";
        let expected: HashSet<&str> = ["alice", "London-Cat", "bob42"].into_iter().collect();
        assert_eq!(mentioned_logins(body), expected);
    }

    #[test]
    fn ignores_bare_at_signs() {
        assert!(mentioned_logins("mail me @ home").is_empty());
        assert!(mentioned_logins("").is_empty());
    }

    #[tokio::test]
    async fn creates_comment_when_none_exists() {
        let github = MockPlatform::default();
        let outcome = reconcile(&github, &repo(), 42, "hi @alice", &names(&["alice"]))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Created);
        assert_eq!(github.posted.lock().unwrap().len(), 1);
        assert!(github.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_run_with_same_participants_writes_nothing() {
        let github = MockPlatform::default();
        let body = "summary over @alice and @bob";
        let candidates = names(&["alice", "bob"]);

        let first = reconcile(&github, &repo(), 42, body, &candidates)
            .await
            .unwrap();
        let second = reconcile(&github, &repo(), 42, body, &candidates)
            .await
            .unwrap();

        assert_eq!(first, ReconcileOutcome::Created);
        assert_eq!(second, ReconcileOutcome::Skipped);
        assert_eq!(github.posted.lock().unwrap().len(), 1);
        assert!(github.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_participant_updates_in_place() {
        let github = MockPlatform::default();
        github.seed_comment(BotComment {
            id: 7,
            body: "covers @alice only".to_string(),
        });

        let outcome = reconcile(
            &github,
            &repo(),
            42,
            "covers @alice and @bob",
            &names(&["alice", "bob"]),
        )
        .await
        .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        assert!(github.posted.lock().unwrap().is_empty());
        let updated = github.updated.lock().unwrap();
        assert_eq!(updated.as_slice(), &[(7, "covers @alice and @bob".to_string())]);
    }

    #[tokio::test]
    async fn double_check_catches_racing_writer() {
        let github = MockPlatform::default();
        // First lookup sees nothing, second sees a comment a concurrent
        // handler just created.
        github.queue_lookup(None);
        github.queue_lookup(Some(BotComment {
            id: 9,
            body: "covers @alice".to_string(),
        }));

        let outcome = reconcile(&github, &repo(), 42, "covers @bob", &names(&["bob"]))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        assert!(github.posted.lock().unwrap().is_empty());
        assert_eq!(github.updated.lock().unwrap().len(), 1);
    }
}
