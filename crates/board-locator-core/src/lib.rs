//! Core types and geometry for locating a checkerboard target in 3D.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image type or line detector: it knows about organized
//! point clouds, the ideal board model, rigid transforms, and how to keep a
//! set of 3D points free of near-duplicates.

mod board;
mod cloud;
mod dedup;
mod frame;
mod logger;
mod rigid;

pub use board::{BoardModel, BoardModelError, ReferenceCorner};
pub use cloud::{CloudError, OrganizedCloud, PointLookup};
pub use dedup::{
    l1_distance, new_dedup_set, DedupStrategy, KdTreeDedup, LinearDedup, NearDuplicateSet,
};
pub use frame::FrameHeader;
pub use rigid::{fit_rigid_transform, RigidFitError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
