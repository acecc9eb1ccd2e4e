use std::collections::HashMap;
use crate::types::{LocationNode, PlayerNode, Record};

/// Display data for one participant, keyed by player id in [`IdentityMaps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub name: Option<String>,
    /// Profile tag when set, otherwise the registered name.
    pub display_name: Option<String>,
    pub tag: Option<String>,
    pub seed: Option<u32>,
}

impl PlayerIdentity {
    pub fn from_node(player: &PlayerNode) -> Self {
        let tag = profile_tag(player);
        PlayerIdentity {
            name: non_empty(player.name.as_deref()),
            display_name: tag.clone().or_else(|| non_empty(player.name.as_deref())),
            tag,
            seed: player.seed,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }
}

/// Per-request lookup tables. Rebuilt from each snapshot, never shared.
#[derive(Debug, Clone, Default)]
pub struct IdentityMaps {
    pub players: HashMap<String, PlayerIdentity>,
    pub locations: HashMap<String, String>,
}

impl IdentityMaps {
    pub fn build(players: &[Record<PlayerNode>], locations: &[Record<LocationNode>]) -> Self {
        IdentityMaps {
            players: player_map(players),
            locations: location_map(locations),
        }
    }

    pub fn player(&self, player_id: Option<&str>) -> Option<&PlayerIdentity> {
        player_id.and_then(|id| self.players.get(id))
    }

    pub fn location_name(&self, location_id: Option<&str>) -> Option<&str> {
        location_id
            .and_then(|id| self.locations.get(id))
            .map(String::as_str)
    }
}

pub fn player_map(players: &[Record<PlayerNode>]) -> HashMap<String, PlayerIdentity> {
    players
        .iter()
        .filter_map(|player| {
            let id = player.id.clone()?;
            Some((id, PlayerIdentity::from_node(player)))
        })
        .collect()
}

pub fn location_map(locations: &[Record<LocationNode>]) -> HashMap<String, String> {
    locations
        .iter()
        .filter_map(|location| {
            let id = location.id.clone()?;
            let name = non_empty(location.name.as_deref())?;
            Some((id, name))
        })
        .collect()
}

pub fn profile_tag(player: &PlayerNode) -> Option<String> {
    player
        .profile_info
        .as_ref()
        .and_then(|profile| non_empty(profile.tag.as_deref()))
}

/// Name used for statistics lookups: the first non-empty of name, display
/// name and tag.
pub fn lookup_name(name: Option<&str>, display_name: Option<&str>, tag: Option<&str>) -> Option<String> {
    [name, display_name, tag]
        .into_iter()
        .find_map(non_empty)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_player(raw: serde_json::Value) -> Record<PlayerNode> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_display_name_prefers_tag() {
        let player = make_player(json!({ "id": "p1", "name": "Team Whyachi", "profileInfo": { "tag": "Whyachi" } }));
        let identity = PlayerIdentity::from_node(&player);
        assert_eq!(identity.display_name.as_deref(), Some("Whyachi"));
        assert_eq!(identity.name.as_deref(), Some("Team Whyachi"));
        assert_eq!(identity.tag.as_deref(), Some("Whyachi"));
    }

    #[test]
    fn test_empty_tag_falls_back_to_name() {
        let player = make_player(json!({ "id": "p1", "name": "Cobalt", "profileInfo": { "tag": "  " } }));
        let identity = PlayerIdentity::from_node(&player);
        assert_eq!(identity.display_name.as_deref(), Some("Cobalt"));
        assert_eq!(identity.tag, None);
    }

    #[test]
    fn test_records_without_ids_are_skipped() {
        let players = vec![
            make_player(json!({ "id": "p1", "name": "A", "seed": 4 })),
            make_player(json!({ "name": "ghost" })),
        ];
        let locations: Vec<Record<LocationNode>> = vec![
            serde_json::from_value(json!({ "id": 7, "name": "Cage 1" })).unwrap(),
            serde_json::from_value(json!({ "id": "l2" })).unwrap(),
        ];
        let maps = IdentityMaps::build(&players, &locations);
        assert_eq!(maps.players.len(), 1);
        assert_eq!(maps.player(Some("p1")).and_then(|p| p.seed), Some(4));
        assert_eq!(maps.location_name(Some("7")), Some("Cage 1"));
        assert_eq!(maps.location_name(Some("l2")), None);
        assert_eq!(maps.location_name(None), None);
    }

    #[test]
    fn test_lookup_name_order() {
        assert_eq!(lookup_name(Some("Bot"), Some("Tag"), Some("Tag")).as_deref(), Some("Bot"));
        assert_eq!(lookup_name(Some(""), Some("Display"), None).as_deref(), Some("Display"));
        assert_eq!(lookup_name(None, None, Some("T")).as_deref(), Some("T"));
        assert_eq!(lookup_name(None, Some(" "), None), None);
    }
}
