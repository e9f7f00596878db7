//! Core data models for the region hierarchy.

pub mod admin;

pub use admin::{
    AdminEntry, AdminHierarchy, AdminLevel, HierarchyColumns, LevelColumns, NodeInfo, LEVEL_COUNT,
};
