//! Energy yield simulation for floating photovoltaic (FPV) systems on lakes.

pub mod config;
pub mod domain;
pub mod portfolio;
pub mod simulation;
pub mod soiling;
pub mod telemetry;
pub mod weather;
