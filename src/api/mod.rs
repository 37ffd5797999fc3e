//! The GitHub side of the bot: the capability interface the core consumes,
//! and its octocrab-backed implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use octocrab::models::IssueState;
use octocrab::params;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::config::RepoId;
use crate::consts::{
    ASSIGNED_ISSUES_LIMIT, COMMENTED_THREADS_LIMIT, CREATED_ISSUES_LIMIT, MAX_PARTICIPANTS,
    MUTED_ACCOUNTS, REACTION_ITEMS_LIMIT, SCANNED_PRS_LIMIT, SEARCHED_PRS_LIMIT,
    THREAD_COMMENTS_LIMIT,
};
use crate::messages;
use crate::reputation::{ActivityRecord, CoreReactions, Fetched, PrCounts};

#[cfg(test)]
pub(crate) mod mock;

/// An existing comment on a thread recognized as ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotComment {
    pub id: u64,
    pub body: String,
}

/// Everything the core needs from the hosting platform. Implemented by
/// [`GithubClient`]; tests substitute a recording mock.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Never fails: each sub-metric degrades to zero on its own.
    async fn activity_record(
        &self,
        repo: &RepoId,
        username: &str,
        core_team: &HashSet<String>,
    ) -> ActivityRecord;

    async fn thread_participants(&self, repo: &RepoId, number: u64)
        -> anyhow::Result<Vec<String>>;

    async fn find_bot_comment(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> anyhow::Result<Option<BotComment>>;

    async fn post_comment(&self, repo: &RepoId, number: u64, body: &str) -> anyhow::Result<()>;

    async fn update_comment(
        &self,
        repo: &RepoId,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<()>;

    async fn close_pull_request(&self, repo: &RepoId, number: u64) -> anyhow::Result<()>;
}

pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    /// Login of the authenticated bot identity, fetched once at startup.
    pub user_handle: String,
}

#[derive(Debug, Deserialize)]
struct ReactionRecord {
    user: Option<ReactionUser>,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReactionUser {
    login: String,
}

impl GithubClient {
    pub async fn new(github_token: String) -> anyhow::Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()?;
        let user_handle = octocrab.current().user().await?.login;

        Ok(Self {
            octocrab,
            user_handle,
        })
    }

    /// Classify the user's pull requests via the search API, capped at
    /// [`SEARCHED_PRS_LIMIT`] hits.
    async fn pr_counts(&self, repo: &RepoId, username: &str) -> anyhow::Result<PrCounts> {
        let query = format!("repo:{repo} author:{username} is:pr");
        let page = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .per_page(SEARCHED_PRS_LIMIT)
            .send()
            .await?;

        let mut counts = PrCounts::default();
        for item in page.items {
            // Search results do not carry the merged state, so each hit
            // needs its own fetch.
            match self.octocrab.pulls(&repo.owner, &repo.name).get(item.number).await {
                Ok(pr) => counts.record(
                    pr.merged_at.is_some(),
                    matches!(pr.state, Some(IssueState::Open)),
                ),
                Err(e) => warn!("failed to fetch PR #{} in {repo}: {e}", item.number),
            }
        }
        Ok(counts)
    }

    /// Fallback when search is unavailable: scan the most recent pull
    /// requests directly, matching by author. Replaces the search path
    /// entirely, never supplements it.
    async fn pr_counts_scan(&self, repo: &RepoId, username: &str) -> anyhow::Result<PrCounts> {
        let mut page = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(params::State::All)
            .sort(params::pulls::Sort::Created)
            .direction(params::Direction::Descending)
            .per_page(100)
            .send()
            .await?;

        let mut counts = PrCounts::default();
        let mut checked = 0usize;
        'scan: loop {
            for pr in page.take_items() {
                checked += 1;
                if checked > SCANNED_PRS_LIMIT {
                    break 'scan;
                }
                if pr.user.as_deref().map(|u| u.login.as_str()) != Some(username) {
                    continue;
                }
                counts.record(
                    pr.merged_at.is_some(),
                    matches!(pr.state, Some(IssueState::Open)),
                );
            }
            match self.octocrab.get_page(&page.next).await? {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(counts)
    }

    async fn issues_created(&self, repo: &RepoId, username: &str) -> anyhow::Result<u32> {
        let query = format!("repo:{repo} author:{username} is:issue");
        let page = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .per_page(1)
            .send()
            .await?;

        Ok(page.total_count.unwrap_or_default().min(CREATED_ISSUES_LIMIT) as u32)
    }

    async fn issues_created_scan(&self, repo: &RepoId, username: &str) -> anyhow::Result<u32> {
        let issues = self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .list()
            .state(params::State::All)
            .creator(username)
            .per_page(100)
            .send()
            .await?
            .take_items();

        Ok(issues.iter().filter(|i| i.pull_request.is_none()).count() as u32)
    }

    /// Approximate commented-thread count plus core-team reactions on a few
    /// of those threads. One search feeds both, so a failure degrades both.
    async fn comment_activity(
        &self,
        repo: &RepoId,
        username: &str,
        core_team: &HashSet<String>,
    ) -> anyhow::Result<(u32, CoreReactions)> {
        let query = format!("repo:{repo} commenter:{username}");
        let page = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .per_page(REACTION_ITEMS_LIMIT)
            .send()
            .await?;

        let comments = page.total_count.unwrap_or_default().min(COMMENTED_THREADS_LIMIT) as u32;

        let mut reactions = CoreReactions::default();
        for item in page.items.iter().take(REACTION_ITEMS_LIMIT as usize) {
            // Only reactions on the user's own items count towards them.
            if item.user.login != username {
                continue;
            }
            let fetched = match self.issue_reactions(repo, item.number).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("failed to fetch reactions on #{} in {repo}: {e}", item.number);
                    continue;
                }
            };
            for reaction in fetched {
                let Some(user) = reaction.user else { continue };
                if !core_team.contains(&user.login) {
                    continue;
                }
                match reaction.content.as_str() {
                    "+1" => reactions.thumbs_up += 1,
                    "-1" => reactions.thumbs_down += 1,
                    _ => {}
                }
            }
        }

        Ok((comments, reactions))
    }

    async fn issue_reactions(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> anyhow::Result<Vec<ReactionRecord>> {
        let route = format!(
            "/repos/{}/{}/issues/{}/reactions",
            repo.owner, repo.name, number
        );
        Ok(self.octocrab.get(route, None::<&()>).await?)
    }

    async fn assigned_open(&self, repo: &RepoId, username: &str) -> anyhow::Result<u32> {
        let query = format!("repo:{repo} assignee:{username} is:issue is:open");
        let page = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .per_page(1)
            .send()
            .await?;

        Ok(page.total_count.unwrap_or_default().min(ASSIGNED_ISSUES_LIMIT) as u32)
    }
}

#[async_trait]
impl Platform for GithubClient {
    #[instrument(skip(self, core_team), fields(repo = %repo))]
    async fn activity_record(
        &self,
        repo: &RepoId,
        username: &str,
        core_team: &HashSet<String>,
    ) -> ActivityRecord {
        let prs = match self.pr_counts(repo, username).await {
            Ok(counts) => Fetched::Value(counts),
            Err(search_err) => {
                warn!("PR search for @{username} failed ({search_err}), scanning directly");
                match self.pr_counts_scan(repo, username).await {
                    Ok(counts) => Fetched::Value(counts),
                    Err(scan_err) => {
                        warn!("PR scan for @{username} also failed: {scan_err}");
                        Fetched::degraded(scan_err)
                    }
                }
            }
        };

        let issues_created = match self.issues_created(repo, username).await {
            Ok(count) => Fetched::Value(count),
            Err(search_err) => {
                warn!("issue search for @{username} failed ({search_err}), listing directly");
                match self.issues_created_scan(repo, username).await {
                    Ok(count) => Fetched::Value(count),
                    Err(scan_err) => {
                        warn!("issue listing for @{username} also failed: {scan_err}");
                        Fetched::degraded(scan_err)
                    }
                }
            }
        };

        let (comments, reactions) = match self.comment_activity(repo, username, core_team).await {
            Ok((comments, reactions)) => (Fetched::Value(comments), Fetched::Value(reactions)),
            Err(e) => {
                warn!("comment search for @{username} failed: {e}");
                (Fetched::degraded(&e), Fetched::degraded(&e))
            }
        };

        let assigned_open = match self.assigned_open(repo, username).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("assigned-issue search for @{username} failed: {e}");
                None
            }
        };

        ActivityRecord {
            prs,
            issues_created,
            comments,
            reactions,
            assigned_open,
        }
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn thread_participants(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> anyhow::Result<Vec<String>> {
        let issues = self.octocrab.issues(&repo.owner, &repo.name);
        let issue = issues.get(number).await?;
        let comments = issues
            .list_comments(number)
            .per_page(THREAD_COMMENTS_LIMIT)
            .send()
            .await?
            .take_items();

        Ok(collect_participants(
            &issue.user.login,
            comments.into_iter().map(|c| c.user.login),
        ))
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn find_bot_comment(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> anyhow::Result<Option<BotComment>> {
        let mut page = self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .list_comments(number)
            .per_page(100)
            .send()
            .await?;

        loop {
            for comment in page.take_items() {
                let body = comment.body.unwrap_or_default();
                if comment.user.login == self.user_handle || messages::has_signature(&body) {
                    return Ok(Some(BotComment {
                        id: comment.id.0,
                        body,
                    }));
                }
            }

            match self.octocrab.get_page(&page.next).await? {
                Some(next) => page = next,
                None => return Ok(None),
            }
        }
    }

    #[instrument(skip(self, body), fields(repo = %repo))]
    async fn post_comment(&self, repo: &RepoId, number: u64, body: &str) -> anyhow::Result<()> {
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .create_comment(number, body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, body), fields(repo = %repo))]
    async fn update_comment(
        &self,
        repo: &RepoId,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .update_comment(octocrab::models::CommentId(comment_id), body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn close_pull_request(&self, repo: &RepoId, number: u64) -> anyhow::Result<()> {
        self.octocrab
            .pulls(&repo.owner, &repo.name)
            .update(number)
            .state(params::pulls::State::Closed)
            .send()
            .await?;
        Ok(())
    }
}

/// Thread author plus distinct non-bot commenters, in first-seen order,
/// capped at [`MAX_PARTICIPANTS`].
pub fn collect_participants<I>(author: &str, commenters: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut participants = Vec::new();
    for login in std::iter::once(author.to_owned()).chain(commenters) {
        if participants.len() >= MAX_PARTICIPANTS {
            break;
        }
        if is_excluded_account(&login) || participants.contains(&login) {
            continue;
        }
        participants.push(login);
    }
    participants
}

fn is_excluded_account(login: &str) -> bool {
    login.ends_with("[bot]") || MUTED_ACCOUNTS.iter().any(|muted| *muted == login)
}
