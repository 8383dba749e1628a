//! Scene core: entities, hierarchy and cameras

pub mod camera;
pub mod entity;
