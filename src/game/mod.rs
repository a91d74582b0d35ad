pub mod animation;
pub mod atlas;
pub mod camera;
pub mod components;
pub mod controller;
pub mod error;
pub mod physics;
pub mod tilemap;
pub mod town_scene;
