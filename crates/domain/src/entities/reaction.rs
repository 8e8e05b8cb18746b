//! Message reactions and their aggregated read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::ReactionValue;
use crate::{MemberId, MessageId, ReactionId, WorkspaceId};

/// One member's reaction on one message. Unique per (message, member, value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: ReactionId,
    pub workspace_id: WorkspaceId,
    pub message_id: MessageId,
    pub member_id: MemberId,
    pub value: ReactionValue,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(
        workspace_id: WorkspaceId,
        message_id: MessageId,
        member_id: MemberId,
        value: ReactionValue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReactionId::new(),
            workspace_id,
            message_id,
            member_id,
            value,
            created_at: now,
        }
    }
}

/// Reactions on a message grouped by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub value: ReactionValue,
    pub count: usize,
    pub member_ids: Vec<MemberId>,
}

/// Group reactions by value, keeping the order in which each value first
/// appears. `member_ids` holds each reacting member once.
pub fn summarize_reactions<'a, I>(reactions: I) -> Vec<ReactionSummary>
where
    I: IntoIterator<Item = &'a Reaction>,
{
    let mut summaries: Vec<ReactionSummary> = Vec::new();
    let mut slot_by_value: HashMap<&'a str, usize> = HashMap::new();

    for reaction in reactions {
        let slot = *slot_by_value
            .entry(reaction.value.as_str())
            .or_insert_with(|| {
                summaries.push(ReactionSummary {
                    value: reaction.value.clone(),
                    count: 0,
                    member_ids: Vec::new(),
                });
                summaries.len() - 1
            });

        let summary = &mut summaries[slot];
        summary.count += 1;
        if !summary.member_ids.contains(&reaction.member_id) {
            summary.member_ids.push(reaction.member_id);
        }
    }

    summaries
}
