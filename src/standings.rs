use std::cmp::Ordering;
use serde::Serialize;
use crate::identity::PlayerIdentity;
use crate::types::{PlayerNode, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    #[serde(rename = "playerID", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub placement: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub is_disqualified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl StandingEntry {
    pub fn from_node(player: &PlayerNode) -> Self {
        let identity = PlayerIdentity::from_node(player);
        StandingEntry {
            player_id: player.id.clone(),
            display_name: identity.display_name,
            name: identity.name,
            placement: player.placement,
            wins: player.wins,
            losses: player.losses,
            ties: player.ties,
            is_disqualified: player.is_disqualified,
            seed: player.seed,
            tag: identity.tag,
        }
    }
}

/// Best first. Placed entries precede unplaced ones and sort by placement;
/// unplaced entries sort by more wins, then fewer losses.
pub fn standing_order(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    match (a.placement, b.placement) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.wins.cmp(&a.wins).then(a.losses.cmp(&b.losses)),
    }
}

/// Ranks every non-bye participant. Entries that compare equal keep their
/// input order.
pub fn calculate_standings(players: &[Record<PlayerNode>]) -> Vec<StandingEntry> {
    let mut entries: Vec<StandingEntry> = players
        .iter()
        .filter(|player| !player.is_bye)
        .map(|player| StandingEntry::from_node(player))
        .collect();
    entries.sort_by(standing_order);
    entries
}
