//! World structure
//!
//! The overworld coordinate grid, the bounded interiors nested inside
//! overworld locations, and the events that mutate interiors in play.

mod direction;
mod events;
mod grid;
mod location;
mod store;
mod subgrid;

pub use direction::{Direction, step2, step3};
pub use events::{clear_passage, collapse_passage, place_cave_in, rival_party_arrives};
pub use grid::{CoordinateGrid, FrontierExit};
pub use location::{
    Category, Coordinates, Location, NameProblem, Secret, Treasure, check_name_length,
};
pub use store::{LocationId, LocationStore};
pub use subgrid::{SubGrid, SubGridBounds, get_subgrid_bounds};
