use std::cmp::Reverse;

use futures::future::join_all;

use crate::reputation::{score, ParticipantScore};

use super::Context;

impl Context {
    /// Scores every username and returns them ranked best-first. The sort is
    /// stable, so equal scores keep the order the usernames were supplied
    /// in, and the result is deterministic for a fixed input.
    pub async fn aggregate_participants(&self, usernames: &[String]) -> Vec<ParticipantScore> {
        let records = join_all(usernames.iter().map(|login| {
            self.github
                .activity_record(&self.config.repo, login, &self.config.core_team)
        }))
        .await;

        let mut ranked: Vec<ParticipantScore> = usernames
            .iter()
            .zip(records)
            .map(|(login, record)| ParticipantScore {
                login: login.clone(),
                score: score(&record),
                record,
            })
            .collect();
        ranked.sort_by_key(|participant| Reverse(participant.score));
        ranked
    }
}
