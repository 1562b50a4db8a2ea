//! Area reconciliation
//!
//! Turns a batch of proposed rooms into grid mutations that respect every
//! grid invariant. A batch either expands the overworld from an anchor in a
//! direction, or populates the interior of an existing overworld location.
//!
//! Validation happens before anything is touched: a bad name or a broken
//! caller contract fails the whole batch with nothing mutated. The interior
//! is assembled off to the side and committed in one step, and once the
//! entry is placed every per-room problem is skipped and logged instead.

mod depth;
mod proposal;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::WorldOptions;
use crate::error::{GridError, ReconcileError};
use crate::generation::RoomType;
use crate::rng::GameRng;
use crate::world::{
    CoordinateGrid, Coordinates, Direction, Location, SubGrid, SubGridBounds, check_name_length,
    step2,
};

pub use depth::{
    KeyPlacement, PlacementReport, apply_depth_scaling, danger_level, depth_score,
    lock_difficulty, secret_threshold, treasure_count,
};
pub use proposal::{Proposal, fallback_proposals, proposals_or_fallback};

use proposal::{find_entry, truncate_name};

/// What a batch does with its proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Grow the overworld into the empty cell next to `anchor`.
    Expansion { anchor: String, direction: Direction },
    /// Fill the interior of `owner`, which has none yet.
    PopulateInterior { owner: String },
}

/// Why a proposal was left out of an otherwise successful batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    OutOfBounds { coords: (i32, i32, i32) },
    MalformedCoordinates { len: usize },
    DuplicateName,
    OccupiedCoordinate { coords: (i32, i32, i32) },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutOfBounds { coords } => write!(f, "{:?} is outside the interior", coords),
            SkipReason::MalformedCoordinates { len } => {
                write!(f, "expected 2 or 3 coordinates, got {}", len)
            }
            SkipReason::DuplicateName => f.write_str("name already used in this area"),
            SkipReason::OccupiedCoordinate { coords } => write!(f, "{:?} is already occupied", coords),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProposal {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of a committed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    /// The entry location: on the overworld for expansions, inside the
    /// interior when populating.
    pub entry: String,
    pub entry_coordinates: Coordinates,
    /// Interior rooms committed, in placement order.
    pub placed: Vec<String>,
    pub skipped: Vec<SkippedProposal>,
    /// Interior room flagged as the way back out.
    pub exit_point: Option<String>,
    pub placement: Option<PlacementReport>,
    /// Placed rooms the exit point still cannot reach.
    pub unreachable: Vec<String>,
    /// Occupied interior levels, lowest first.
    pub levels: Vec<i32>,
    /// Consecutive occupied levels with no shared stair column.
    pub vertical_gaps: Vec<(i32, i32)>,
    /// Free in-bounds cells next to a placed room, counted per side.
    pub interior_frontier: usize,
}

impl ReconcileOutcome {
    fn overworld(entry: String, x: i32, y: i32) -> Self {
        Self {
            entry,
            entry_coordinates: Coordinates::Overworld(x, y),
            placed: Vec::new(),
            skipped: Vec::new(),
            exit_point: None,
            placement: None,
            unreachable: Vec::new(),
            levels: Vec::new(),
            vertical_gaps: Vec::new(),
            interior_frontier: 0,
        }
    }
}

/// An interior assembled but not yet attached to its owner.
struct InteriorBuild {
    sub: SubGrid,
    placed: Vec<String>,
    skipped: Vec<SkippedProposal>,
    exit_point: Option<String>,
    placement: Option<PlacementReport>,
    unreachable: Vec<String>,
    levels: Vec<i32>,
    vertical_gaps: Vec<(i32, i32)>,
    interior_frontier: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AreaReconciler {
    options: WorldOptions,
}

impl AreaReconciler {
    pub fn new(options: WorldOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WorldOptions {
        &self.options
    }

    pub fn reconcile(
        &self,
        grid: &mut CoordinateGrid,
        mode: &ReconcileMode,
        proposals: &[Proposal],
        seed: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        match mode {
            ReconcileMode::Expansion { anchor, direction } => {
                self.expand(grid, anchor, *direction, proposals, seed)
            }
            ReconcileMode::PopulateInterior { owner } => {
                self.populate_interior(grid, owner, proposals, seed)
            }
        }
    }

    /// Every name must have an acceptable length, or nothing happens.
    fn validate(&self, proposals: &[Proposal]) -> Result<(), ReconcileError> {
        if proposals.is_empty() {
            return Err(ReconcileError::contract("empty proposal batch"));
        }
        for proposal in proposals {
            check_name_length(
                &proposal.name,
                self.options.min_name_len,
                self.options.max_name_len,
            )
            .map_err(|problem| ReconcileError::Validation {
                name: proposal.name.clone(),
                reason: problem.to_string(),
            })?;
        }
        Ok(())
    }

    /// Add a new area next to `anchor`. One proposal makes a single
    /// overworld location; more make an overworld entry owning an interior.
    pub fn expand(
        &self,
        grid: &mut CoordinateGrid,
        anchor: &str,
        direction: Direction,
        proposals: &[Proposal],
        seed: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.validate(proposals)?;
        if !direction.is_horizontal() {
            return Err(ReconcileError::contract(format!(
                "cannot expand the overworld {}",
                direction
            )));
        }
        let anchor_cell = grid.coordinates_of(anchor).ok_or_else(|| {
            ReconcileError::contract(format!("anchor '{}' is not on the overworld", anchor))
        })?;
        let (tx, ty) = step2(anchor_cell, direction).ok_or_else(|| {
            ReconcileError::contract(format!("no cell {} of '{}'", direction, anchor))
        })?;
        let entry_index = find_entry(proposals)
            .ok_or_else(|| ReconcileError::contract("empty proposal batch"))?;
        let entry = &proposals[entry_index];

        if grid.is_occupied(tx, ty) {
            return Err(GridError::OccupiedCoordinate(format!("({}, {})", tx, ty)).into());
        }
        if grid.contains_name(&entry.name) {
            return Err(GridError::DuplicateName(entry.name.clone()).into());
        }

        if proposals.len() == 1 {
            return self.expand_single(grid, anchor, direction, entry, (tx, ty));
        }

        let back = direction.opposite();
        let mut location = room_from(entry);
        location.is_exit_point = true;
        location.room_type = Some(RoomType::Entry);
        location.connect(back, anchor);
        let batch_names: Vec<&str> = proposals.iter().map(|p| p.name.as_str()).collect();
        for (dir, target) in entry.parsed_connections() {
            if dir == back || !dir.is_horizontal() || batch_names.contains(&target) {
                continue;
            }
            if !grid.contains_name(target) {
                location.connect(dir, target);
            }
        }

        let others: Vec<&Proposal> = proposals
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != entry_index)
            .map(|(_, p)| p)
            .collect();
        let bounds = self.options.subgrid_bounds(&entry.category);
        let build = self.build_interior(&entry.name, bounds, None, &others, seed)?;

        location
            .attach_sub_grid(build.sub)
            .map_err(|_| ReconcileError::contract("fresh entry already owns an interior"))?;
        grid.add_location(location, tx, ty)?;
        grid.link(tx, ty, back);

        tracing::info!(
            entry = %entry.name,
            x = tx,
            y = ty,
            placed = build.placed.len(),
            skipped = build.skipped.len(),
            "Area expanded"
        );
        Ok(ReconcileOutcome {
            entry: entry.name.clone(),
            entry_coordinates: Coordinates::Overworld(tx, ty),
            placed: build.placed,
            skipped: build.skipped,
            exit_point: build.exit_point,
            placement: build.placement,
            unreachable: build.unreachable,
            levels: build.levels,
            vertical_gaps: build.vertical_gaps,
            interior_frontier: build.interior_frontier,
        })
    }

    /// One overworld location, no interior. The result always links back to
    /// the anchor and has at least one other way on.
    fn expand_single(
        &self,
        grid: &mut CoordinateGrid,
        anchor: &str,
        direction: Direction,
        proposal: &Proposal,
        (tx, ty): (i32, i32),
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let back = direction.opposite();
        let mut location = room_from(proposal);
        location.connect(back, anchor);

        // Existing neighbors are linked after insertion so both sides agree.
        let mut links = Vec::new();
        for (dir, target) in proposal.parsed_connections() {
            if dir == back {
                continue;
            }
            if !dir.is_horizontal() {
                tracing::warn!(room = %proposal.name, %dir, "Dropping vertical overworld connection");
                continue;
            }
            if target == proposal.name {
                continue;
            }
            match grid.coordinates_of(target) {
                None => location.connect(dir, target),
                Some(cell) if step2((tx, ty), dir) == Some(cell) => links.push(dir),
                Some(cell) => {
                    tracing::warn!(
                        room = %proposal.name,
                        %dir,
                        to = target,
                        ?cell,
                        "Dropping connection to a location that is not next door"
                    );
                }
            }
        }

        if location.connections.len() < 2 && links.is_empty() {
            self.synthesize_exit(grid, &mut location, &mut links, direction, (tx, ty));
        }

        let name = proposal.name.clone();
        grid.add_location(location, tx, ty)?;
        grid.link(tx, ty, back);
        for dir in links {
            grid.link(tx, ty, dir);
        }

        tracing::info!(entry = %name, x = tx, y = ty, "Overworld location added");
        Ok(ReconcileOutcome::overworld(name, tx, ty))
    }

    /// Give a dead-end expansion a way forward: a dangling exit into the
    /// first free cell ahead or to the side, else a link to whatever is
    /// already there.
    fn synthesize_exit(
        &self,
        grid: &CoordinateGrid,
        location: &mut Location,
        links: &mut Vec<Direction>,
        forward: Direction,
        (tx, ty): (i32, i32),
    ) {
        let [left, right] = forward.perpendicular();
        let cells: Vec<(Direction, (i32, i32))> = [forward, left, right]
            .into_iter()
            .filter_map(|dir| step2((tx, ty), dir).map(|cell| (dir, cell)))
            .collect();
        let free = cells
            .iter()
            .find(|(_, (x, y))| !grid.is_occupied(*x, *y))
            .map(|(dir, _)| *dir);
        match free {
            Some(dir) => {
                let target = truncate_name(
                    &format!("Unexplored {} of {}", dir, location.name()),
                    self.options.max_name_len,
                );
                tracing::debug!(room = %location.name(), %dir, exit = %target, "Synthesized dangling exit");
                location.connect(dir, target);
            }
            None => links.extend(cells.first().map(|(dir, _)| *dir)),
        }
    }

    /// Build the interior of `owner`, which must be on the overworld and not
    /// own one already.
    pub fn populate_interior(
        &self,
        grid: &mut CoordinateGrid,
        owner: &str,
        proposals: &[Proposal],
        seed: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        self.validate(proposals)?;
        let owner_location = grid.get_by_name(owner).ok_or_else(|| {
            ReconcileError::contract(format!("owner '{}' is not on the overworld", owner))
        })?;
        if owner_location.has_sub_grid() {
            return Err(ReconcileError::contract(format!(
                "'{}' already has an interior",
                owner
            )));
        }
        let bounds = self.options.subgrid_bounds(&owner_location.category);

        let entry_index = find_entry(proposals)
            .ok_or_else(|| ReconcileError::contract("empty proposal batch"))?;
        let entry = &proposals[entry_index];
        if entry.name == owner {
            return Err(GridError::DuplicateName(entry.name.clone()).into());
        }
        let entry_coords = entry
            .coords3()
            .filter(|c| bounds.contains(*c))
            .unwrap_or_else(|| bounds.clamp_origin());
        let others: Vec<&Proposal> = proposals
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != entry_index)
            .map(|(_, p)| p)
            .collect();

        let build = self.build_interior(owner, bounds, Some((entry, entry_coords)), &others, seed)?;
        grid.get_by_name_mut(owner)
            .ok_or_else(|| ReconcileError::contract(format!("owner '{}' vanished", owner)))?
            .attach_sub_grid(build.sub)
            .map_err(|_| ReconcileError::contract(format!("'{}' already has an interior", owner)))?;

        tracing::info!(
            owner,
            placed = build.placed.len(),
            skipped = build.skipped.len(),
            "Interior populated"
        );
        let (x, y, z) = entry_coords;
        Ok(ReconcileOutcome {
            entry: entry.name.clone(),
            entry_coordinates: Coordinates::Interior(x, y, z),
            placed: build.placed,
            skipped: build.skipped,
            exit_point: build.exit_point,
            placement: build.placement,
            unreachable: build.unreachable,
            levels: build.levels,
            vertical_gaps: build.vertical_gaps,
            interior_frontier: build.interior_frontier,
        })
    }

    /// Assemble an interior from `rooms`. With `entry`, that room goes in
    /// first as the exit point; otherwise the first room that fits is.
    fn build_interior(
        &self,
        parent: &str,
        bounds: SubGridBounds,
        entry: Option<(&Proposal, (i32, i32, i32))>,
        rooms: &[&Proposal],
        seed: u64,
    ) -> Result<InteriorBuild, ReconcileError> {
        let mut sub = SubGrid::new(parent, bounds);
        let mut placed: Vec<String> = Vec::new();
        let mut skipped = Vec::new();
        let mut exit_point: Option<String> = None;
        let mut by_name: BTreeMap<&str, &Proposal> = BTreeMap::new();

        if let Some((proposal, (x, y, z))) = entry {
            let mut location = room_from(proposal);
            location.is_exit_point = true;
            location.room_type = Some(RoomType::Entry);
            sub.add_location(location, x, y, z)?;
            exit_point = Some(proposal.name.clone());
            placed.push(proposal.name.clone());
            by_name.insert(&proposal.name, proposal);
        }

        for &proposal in rooms {
            let reason = match proposal.coords3() {
                None => Some(SkipReason::MalformedCoordinates {
                    len: proposal.relative_coords.len(),
                }),
                Some(coords) if !bounds.contains(coords) => Some(SkipReason::OutOfBounds { coords }),
                Some(_) if proposal.name == parent => Some(SkipReason::DuplicateName),
                Some((x, y, z)) => {
                    let mut location = room_from(proposal);
                    location.is_exit_point = exit_point.is_none();
                    match sub.add_location(location, x, y, z) {
                        Ok(_) => {
                            if exit_point.is_none() {
                                exit_point = Some(proposal.name.clone());
                            }
                            placed.push(proposal.name.clone());
                            by_name.insert(&proposal.name, proposal);
                            None
                        }
                        Err(GridError::DuplicateName(_)) => Some(SkipReason::DuplicateName),
                        Err(GridError::OccupiedCoordinate(_)) => {
                            Some(SkipReason::OccupiedCoordinate { coords: (x, y, z) })
                        }
                        Err(GridError::OutOfBounds { .. }) => {
                            Some(SkipReason::OutOfBounds { coords: (x, y, z) })
                        }
                    }
                }
            };
            if let Some(reason) = reason {
                tracing::warn!(room = %proposal.name, %reason, "Skipping proposed room");
                skipped.push(SkippedProposal {
                    name: proposal.name.clone(),
                    reason,
                });
            }
        }

        // Declared connections hold only between rooms that really are
        // neighbors; the direction comes from the coordinates.
        for name in &placed {
            let (Some(coords), Some(proposal)) = (sub.coordinates_of(name), by_name.get(name.as_str()))
            else {
                continue;
            };
            for (declared, target) in proposal.parsed_connections() {
                let actual = sub
                    .coordinates_of(target)
                    .and_then(|other| Direction::between(coords, other));
                match actual {
                    Some(dir) => {
                        if dir != declared {
                            tracing::debug!(room = %name, %declared, %dir, "Corrected connection direction");
                        }
                        sub.link(coords, dir);
                    }
                    None if target == parent => {}
                    None => {
                        tracing::warn!(room = %name, %declared, to = target, "Dropping interior connection");
                    }
                }
            }
        }

        // Rooms left without any connection join their neighbors.
        for name in &placed {
            let isolated = sub
                .get_by_name(name)
                .is_some_and(|loc| loc.connections.is_empty());
            let Some(coords) = sub.coordinates_of(name) else {
                continue;
            };
            if isolated {
                for dir in Direction::iter() {
                    sub.link(coords, dir);
                }
            }
        }

        let unreachable = match exit_point.as_deref() {
            Some(exit) => repair_reachability(&mut sub, exit, &placed),
            None => Vec::new(),
        };
        for room in &unreachable {
            tracing::warn!(room = %room, parent, "Room unreachable from the exit point");
        }
        let vertical_gaps = sub.vertical_gaps();
        if !vertical_gaps.is_empty() {
            tracing::warn!(parent, gaps = ?vertical_gaps, "Interior levels without a shared stair column");
        }
        let levels: Vec<i32> = sub.levels().into_iter().collect();
        let interior_frontier = sub.find_frontier_cells().len();

        let placement = exit_point.as_deref().map(|exit| {
            let mut rng = GameRng::new(seed);
            apply_depth_scaling(&mut sub, exit, &mut rng, &self.options)
        });

        Ok(InteriorBuild {
            sub,
            placed,
            skipped,
            exit_point,
            placement,
            unreachable,
            levels,
            vertical_gaps,
            interior_frontier,
        })
    }
}

fn room_from(proposal: &Proposal) -> Location {
    let mut location = Location::new(proposal.name.clone(), proposal.category.clone())
        .with_description(proposal.description.clone());
    location.is_named = true;
    location.room_type = proposal.room_type;
    location.hazards = proposal.hazards.clone();
    location
}

/// Link unreachable rooms to reachable neighbors until nothing changes.
/// Returns the rooms still cut off.
fn repair_reachability(sub: &mut SubGrid, exit: &str, placed: &[String]) -> Vec<String> {
    loop {
        let reached = sub.reachable_from(exit);
        let mut repaired = false;
        for name in placed.iter().filter(|n| !reached.contains(n.as_str())) {
            let Some(coords) = sub.coordinates_of(name) else {
                continue;
            };
            let (x, y, z) = coords;
            let bridge = Direction::iter().find(|dir| {
                sub.get_neighbor(x, y, z, *dir)
                    .is_some_and(|loc| reached.contains(loc.name()))
            });
            if let Some(dir) = bridge {
                // A blocked passage stays blocked; only missing links are added.
                let already = sub
                    .get_by_name(name)
                    .is_some_and(|loc| loc.connection(dir).is_some());
                if !already && sub.link(coords, dir) {
                    tracing::debug!(room = %name, %dir, "Linked unreachable room");
                    repaired = true;
                }
            }
        }
        if !repaired {
            return placed
                .iter()
                .filter(|n| !reached.contains(n.as_str()))
                .cloned()
                .collect();
        }
    }
}
