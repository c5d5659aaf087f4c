//! Door-to-door itineraries built from search candidates.

mod assemble;
mod geometry;
mod types;

pub use assemble::{Assembler, AssemblerConfig};
pub use geometry::clip_shape;
pub use types::{BusLeg, IntermediateStop, Itinerary, Leg, WaitLeg, WalkLeg};
