//! Proposed rooms and deterministic fallback batches

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::config::WorldOptions;
use crate::generation::{LayoutGenerator, RoomTemplate, RoomType, TowerGenerator, generator_for};
use crate::world::{Category, Direction, step3};

/// One room suggested by an external content source, before validation.
///
/// Wire shape: `{name, description, relative_coords: [x, y] | [x, y, z],
/// connections: {direction: name}, category}`. The remaining fields are
/// optional extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub relative_coords: Vec<i32>,
    #[serde(default)]
    pub connections: BTreeMap<String, String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_entry: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazards: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
}

impl Proposal {
    pub fn new(name: impl Into<String>, category: Category, relative_coords: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            relative_coords,
            connections: BTreeMap::new(),
            category,
            is_entry: false,
            hazards: Vec::new(),
            room_type: None,
        }
    }

    pub fn with_connection(mut self, direction: Direction, target: impl Into<String>) -> Self {
        self.connections.insert(direction.to_string(), target.into());
        self
    }

    /// Interior coordinates. A 2-int pair sits on level 0; any other length
    /// is malformed.
    pub fn coords3(&self) -> Option<(i32, i32, i32)> {
        match self.relative_coords.as_slice() {
            [x, y] => Some((*x, *y, 0)),
            [x, y, z] => Some((*x, *y, *z)),
            _ => None,
        }
    }

    /// Sits at the relative origin.
    pub fn at_origin(&self) -> bool {
        matches!(self.relative_coords.as_slice(), [0, 0] | [0, 0, 0])
    }

    /// Declared connections whose direction parses. Others are dropped with
    /// a warning.
    pub fn parsed_connections(&self) -> Vec<(Direction, &str)> {
        let mut parsed = Vec::new();
        for (raw, target) in &self.connections {
            match raw.trim().parse::<Direction>() {
                Ok(direction) => parsed.push((direction, target.as_str())),
                Err(_) => {
                    tracing::warn!(room = %self.name, direction = %raw, "Dropping connection with unknown direction");
                }
            }
        }
        parsed
    }
}

/// Index of the entry proposal: the one flagged `is_entry`, else the one at
/// the relative origin, else the first.
pub(crate) fn find_entry(proposals: &[Proposal]) -> Option<usize> {
    if proposals.is_empty() {
        return None;
    }
    if let Some(i) = proposals.iter().position(|p| p.is_entry) {
        return Some(i);
    }
    if let Some(i) = proposals.iter().position(Proposal::at_origin) {
        return Some(i);
    }
    tracing::warn!(room = %proposals[0].name, "No entry proposal at the origin; using the first");
    Some(0)
}

/// Cut `name` to at most `max` characters.
pub(crate) fn truncate_name(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

fn room_label(room_type: RoomType) -> &'static str {
    match room_type {
        RoomType::Entry => "Entrance",
        RoomType::Corridor => "Passage",
        RoomType::Chamber => "Chamber",
        RoomType::BossRoom => "Lair",
        RoomType::Treasure => "Vault",
        RoomType::Puzzle => "Puzzle Room",
    }
}

/// Deterministic proposals for `category`, built from the matching layout
/// generator, for when external content is unavailable. Categories without
/// an interior get a single entry proposal.
pub fn fallback_proposals(
    category: &Category,
    owner: &str,
    seed: u64,
    options: &WorldOptions,
) -> Vec<Proposal> {
    let bounds = options.subgrid_bounds(category);
    let templates: Vec<RoomTemplate> = if *category == Category::Tower {
        TowerGenerator::with_treasure_chance(options.tower_treasure_chance).generate(&bounds, seed)
    } else {
        match generator_for(category) {
            Some(generator) => generator.generate(&bounds, seed),
            None => vec![RoomTemplate::new((0, 0, 0), RoomType::Entry)],
        }
    };

    // Names are "<owner> <label> <n>", with the owner cut so the whole
    // name fits.
    let mut counters: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut by_coords: BTreeMap<(i32, i32, i32), String> = BTreeMap::new();
    for template in &templates {
        let label = room_label(template.room_type);
        let count = counters.entry(label).or_default();
        *count += 1;
        let suffix = if template.is_entry {
            format!(" {}", label)
        } else {
            format!(" {} {}", label, count)
        };
        let room_len = options.max_name_len.saturating_sub(suffix.chars().count());
        let name = format!("{}{}", truncate_name(owner.trim(), room_len), suffix);
        by_coords.insert(template.coords, name);
    }

    templates
        .iter()
        .filter_map(|template| {
            let name = by_coords.get(&template.coords)?.clone();
            let mut proposal = Proposal::new(
                name,
                category.clone(),
                vec![template.coords.0, template.coords.1, template.coords.2],
            );
            proposal.is_entry = template.is_entry;
            proposal.room_type = Some(template.room_type);
            proposal.hazards = template.suggested_hazards.clone();
            for direction in &template.connections {
                let neighbor = step3(template.coords, *direction);
                if let Some(target) = neighbor.and_then(|c| by_coords.get(&c)) {
                    proposal.connections.insert(direction.to_string(), target.clone());
                }
            }
            Some(proposal)
        })
        .collect()
}

/// Pass fetched proposals through, or substitute the fallback batch when
/// the fetch failed or came back empty.
pub fn proposals_or_fallback<E: Display>(
    fetched: Result<Vec<Proposal>, E>,
    category: &Category,
    owner: &str,
    seed: u64,
    options: &WorldOptions,
) -> Vec<Proposal> {
    match fetched {
        Ok(proposals) if !proposals.is_empty() => proposals,
        Ok(_) => {
            tracing::warn!(owner, "External generation returned nothing; using fallback layout");
            fallback_proposals(category, owner, seed, options)
        }
        Err(err) => {
            tracing::warn!(owner, error = %err, "External generation failed; using fallback layout");
            fallback_proposals(category, owner, seed, options)
        }
    }
}
