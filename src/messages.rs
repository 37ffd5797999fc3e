//! The fixed comment texts the bot posts. Rendering is deterministic:
//! identical input always produces byte-identical output, which is what lets
//! the reconciler detect that an existing comment carries no new information.

use crate::reputation::{ActivityRecord, ParticipantScore};

pub const INLINE_SIGNATURE: &str = "_Generated by Reputation Bot_";
pub const SUMMARY_HEADER: &str = "## 📊 Reputation Summary";
const TABLE_SIGNATURE: &str =
    "_Generated by [Reputation Bot](https://github.com/archestra-ai/reputation-bot)_ 🤖";

/// Substrings recognizing our own comments even when the authenticated
/// identity changed across redeployments or token rotations.
const BOT_SIGNATURES: &[&str] = &[
    "Generated by Reputation Bot",
    "Generated by [Reputation Bot]",
    "📊 Reputation Summary",
];

pub fn has_signature(body: &str) -> bool {
    BOT_SIGNATURES.iter().any(|s| body.contains(s))
}

/// `+N👍 -M👎`, or `None` when there are no core-team reactions at all.
fn core_reactions(record: &ActivityRecord) -> Option<String> {
    let reactions = record.reactions.value();
    if reactions.is_empty() {
        return None;
    }

    let mut out = String::new();
    if reactions.thumbs_up > 0 {
        out.push_str(&format!("+{}👍", reactions.thumbs_up));
    }
    if reactions.thumbs_down > 0 {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("-{}👎", reactions.thumbs_down));
    }
    Some(out)
}

/// The compact one-line reputation summary used on pull requests.
pub fn reputation_line(score: i64, record: &ActivityRecord) -> String {
    let prs = record.prs.value();
    let core = core_reactions(record).unwrap_or_else(|| "No reactions".to_string());

    format!(
        "⚡ Rep: {score} | PRs: {}✅/{}🔄/{}❌ | Activity: {} issues, {} comments | Core: {core}",
        prs.merged,
        prs.open,
        prs.closed,
        record.issues_created.value(),
        record.comments.value(),
    )
}

pub fn pull_request_comment(score: i64, record: &ActivityRecord) -> String {
    format!(
        "{}\n\n{INLINE_SIGNATURE}",
        reputation_line(score, record)
    )
}

/// The multi-participant summary table, one row per participant in the
/// order given.
pub fn summary_table(participants: &[ParticipantScore]) -> String {
    let mut body = format!(
        "{SUMMARY_HEADER}\n\n\
         | User | Rep | Pull Requests | Activity | Core Reactions |\n\
         |------|-----|---------------|----------|----------------|\n"
    );

    for participant in participants {
        let record = &participant.record;
        let prs = record.prs.value();

        let mut activity = format!(
            "{} issues, {} comments",
            record.issues_created.value(),
            record.comments.value()
        );
        if let Some(assigned) = record.assigned_open {
            activity.push_str(&format!(", {assigned} assigned"));
        }

        let core = core_reactions(record).unwrap_or_else(|| "—".to_string());

        body.push_str(&format!(
            "| **@{}** | ⚡ {} | {}✅ {}🔄 {}❌ | {} | {} |\n",
            participant.login, participant.score, prs.merged, prs.open, prs.closed, activity, core,
        ));
    }

    body.push_str("\n---\n");
    body.push_str(TABLE_SIGNATURE);
    body
}

/// Explanatory comment left on pull requests closed for low reputation.
pub fn autoclose_notice(author: &str, score: i64, threshold: i64) -> String {
    format!(
        "🚫 @{author}'s reputation score is **{score}**, below the auto-close \
         threshold of **{threshold}**.\n\n\
         Scores count +20 per merged PR, +3 per open PR, -10 per closed PR, \
         +5 per issue created, and +15 / -50 per core-team 👍 / 👎.\n\n\
         This pull request is being closed automatically.\n\n\
         {INLINE_SIGNATURE}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::{score, CoreReactions, Fetched, ParticipantScore, PrCounts};

    fn record(merged: u32, open: u32, closed: u32, issues: u32, comments: u32) -> ActivityRecord {
        ActivityRecord {
            prs: Fetched::Value(PrCounts {
                merged,
                open,
                closed,
            }),
            issues_created: Fetched::Value(issues),
            comments: Fetched::Value(comments),
            reactions: Fetched::Value(CoreReactions::default()),
            assigned_open: None,
        }
    }

    fn participant(login: &str, record: ActivityRecord) -> ParticipantScore {
        ParticipantScore {
            login: login.to_string(),
            score: score(&record),
            record,
        }
    }

    #[test]
    fn line_without_reactions_says_so() {
        let line = reputation_line(43, &record(2, 1, 0, 0, 7));
        assert_eq!(
            line,
            "⚡ Rep: 43 | PRs: 2✅/1🔄/0❌ | Activity: 0 issues, 7 comments | Core: No reactions"
        );
    }

    #[test]
    fn line_with_reactions() {
        let mut rec = record(0, 0, 0, 0, 0);
        rec.reactions = Fetched::Value(CoreReactions {
            thumbs_up: 2,
            thumbs_down: 1,
        });
        let line = reputation_line(-20, &rec);
        assert!(line.contains("Core: +2👍 -1👎"), "{line}");
    }

    #[test]
    fn pull_request_comment_carries_signature() {
        let body = pull_request_comment(0, &record(0, 0, 0, 0, 0));
        assert!(has_signature(&body));
    }

    #[test]
    fn table_rows_follow_given_order() {
        let body = summary_table(&[
            participant("bob", record(1, 0, 0, 0, 0)),
            participant("alice", record(0, 1, 0, 0, 0)),
        ]);

        let bob = body.find("**@bob**").unwrap();
        let alice = body.find("**@alice**").unwrap();
        assert!(bob < alice);
        assert!(body.starts_with(SUMMARY_HEADER));
        assert!(has_signature(&body));
    }

    #[test]
    fn table_placeholder_for_missing_reactions() {
        let body = summary_table(&[participant("alice", record(0, 0, 0, 0, 0))]);
        assert!(body.contains("| — |"), "{body}");
    }

    #[test]
    fn table_shows_assigned_issues_when_tracked() {
        let mut rec = record(0, 0, 0, 2, 3);
        rec.assigned_open = Some(4);
        let body = summary_table(&[participant("alice", rec)]);
        assert!(body.contains("2 issues, 3 comments, 4 assigned"), "{body}");
    }

    #[test]
    fn rendering_is_byte_stable() {
        let rows = vec![
            participant("alice", record(3, 1, 1, 2, 9)),
            participant("bob", record(0, 0, 2, 0, 1)),
        ];
        assert_eq!(summary_table(&rows), summary_table(&rows));
    }

    #[test]
    fn autoclose_notice_embeds_numbers() {
        let notice = autoclose_notice("mallory", -85, -80);
        assert!(notice.contains("@mallory"));
        assert!(notice.contains("-85"));
        assert!(notice.contains("-80"));
        assert!(notice.contains("+20 per merged PR"));
        assert!(has_signature(&notice));
    }
}
