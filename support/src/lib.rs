//! Generates the solid support material needed between the overhanging faces
//! of a mesh and the build plate. See [`supports::SupportGenerator`] for the
//! entry point.

use nalgebra::Vector3;

pub mod builder;
pub mod geometry;
pub mod mesh;
pub mod supports;

pub type Pos = Vector3<f32>;
