use tracing::{debug, info, warn};

use crate::messages;
use crate::reputation::score;

use super::{Context, PullRequestPayload};

/// Newly opened (or reopened) pull requests get the author's one-line
/// reputation comment, or are closed outright when the author scores below
/// the configured threshold.
pub(super) async fn handle(context: &Context, payload: PullRequestPayload) -> anyhow::Result<()> {
    let action = payload.action.as_deref().unwrap_or_default();
    if !matches!(action, "opened" | "reopened") {
        debug!("ignoring pull_request action: {action}");
        return Ok(());
    }

    let pr = payload.pull_request.unwrap_or_default();
    let author = pr.user.and_then(|user| user.login);
    let (Some(number), Some(author)) = (pr.number, author) else {
        warn!("pull_request payload missing number or author, skipping");
        return Ok(());
    };

    let repo = &context.config.repo;
    let record = context
        .github
        .activity_record(repo, &author, &context.config.core_team)
        .await;
    let score = score(&record);
    info!("@{author} scores {score} on {repo}#{number}");

    if score < context.config.threshold {
        let notice = messages::autoclose_notice(&author, score, context.config.threshold);
        context.github.post_comment(repo, number, &notice).await?;
        context.github.close_pull_request(repo, number).await?;
        info!("closed {repo}#{number}: score {score} is below {}", context.config.threshold);
        return Ok(());
    }

    let body = messages::pull_request_comment(score, &record);
    context.github.post_comment(repo, number, &body).await?;
    Ok(())
}
