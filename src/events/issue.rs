use tracing::{debug, info, warn};

use crate::messages;
use crate::reconcile::reconcile;

use super::{Context, IssueCommentPayload, IssuesPayload};

pub(super) async fn handle_issue(context: &Context, payload: IssuesPayload) -> anyhow::Result<()> {
    let action = payload.action.as_deref().unwrap_or_default();
    if !matches!(action, "opened" | "reopened") {
        debug!("ignoring issues action: {action}");
        return Ok(());
    }

    let Some(number) = payload.issue.and_then(|issue| issue.number) else {
        warn!("issues payload missing number, skipping");
        return Ok(());
    };

    refresh_summary(context, number).await
}

pub(super) async fn handle_comment(
    context: &Context,
    payload: IssueCommentPayload,
) -> anyhow::Result<()> {
    let action = payload.action.as_deref().unwrap_or_default();
    if action != "created" {
        debug!("ignoring issue_comment action: {action}");
        return Ok(());
    }

    let Some(number) = payload.issue.and_then(|issue| issue.number) else {
        warn!("issue_comment payload missing issue number, skipping");
        return Ok(());
    };

    let commenter = payload
        .comment
        .and_then(|comment| comment.user)
        .and_then(|user| user.login);
    debug!("comment on #{number} by {commenter:?}");

    refresh_summary(context, number).await
}

/// The multi-participant pipeline: resolve the thread's participants, rank
/// them, render the table, and reconcile it onto the thread.
async fn refresh_summary(context: &Context, number: u64) -> anyhow::Result<()> {
    let repo = &context.config.repo;
    let participants = context.github.thread_participants(repo, number).await?;
    if participants.is_empty() {
        warn!("no participants found on {repo}#{number}");
        return Ok(());
    }

    let ranked = context.aggregate_participants(&participants).await;
    let body = messages::summary_table(&ranked);
    let outcome = reconcile(context.github.as_ref(), repo, number, &body, &participants).await?;
    info!("summary for {repo}#{number}: {outcome:?}");
    Ok(())
}
