//! Classification and dispatch of inbound webhook deliveries.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::Platform;
use crate::config::Config;

mod common;
mod issue;
mod pull_request;

/// Shared handles passed into every handler. The configuration is immutable
/// for the process lifetime; the platform client is the only way out.
#[derive(Clone)]
pub struct Context {
    pub github: Arc<dyn Platform>,
    pub config: Arc<Config>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRef {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadRef {
    pub number: Option<u64>,
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRef {
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestPayload {
    pub action: Option<String>,
    pub pull_request: Option<ThreadRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuesPayload {
    pub action: Option<String>,
    pub issue: Option<ThreadRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueCommentPayload {
    pub action: Option<String>,
    pub issue: Option<ThreadRef>,
    pub comment: Option<CommentRef>,
}

/// An inbound delivery, tagged by kind with the fields each kind needs.
/// Every field is optional: a payload with missing pieces parses fine and
/// the handler no-ops on it instead of failing the delivery.
#[derive(Debug, Clone)]
pub enum Event {
    PullRequest(PullRequestPayload),
    Issue(IssuesPayload),
    IssueComment(IssueCommentPayload),
    Ping,
    Unsupported(String),
}

impl Event {
    pub fn parse(kind: &str, payload: serde_json::Value) -> Self {
        match kind {
            "ping" => Event::Ping,
            "pull_request" => serde_json::from_value(payload)
                .map(Event::PullRequest)
                .unwrap_or_else(|_| Event::Unsupported(kind.to_string())),
            "issues" => serde_json::from_value(payload)
                .map(Event::Issue)
                .unwrap_or_else(|_| Event::Unsupported(kind.to_string())),
            "issue_comment" => serde_json::from_value(payload)
                .map(Event::IssueComment)
                .unwrap_or_else(|_| Event::Unsupported(kind.to_string())),
            other => Event::Unsupported(other.to_string()),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Event::PullRequest(_) => "pull_request",
            Event::Issue(_) => "issues",
            Event::IssueComment(_) => "issue_comment",
            Event::Ping => "ping",
            Event::Unsupported(kind) => kind,
        }
    }

    /// Errors surface only for failed writes the sender expects (comment,
    /// close); everything else is absorbed as a logged no-op.
    #[instrument(skip_all, fields(event = self.kind()))]
    pub async fn execute(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Event::PullRequest(payload) => pull_request::handle(context, payload).await,
            Event::Issue(payload) => issue::handle_issue(context, payload).await,
            Event::IssueComment(payload) => issue::handle_comment(context, payload).await,
            Event::Ping => Ok(()),
            Event::Unsupported(kind) => {
                info!("ignoring {kind} event");
                Ok(())
            }
        }
    }
}
