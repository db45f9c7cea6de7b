#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative hierarchy types for the rural-sanitation dashboard.
//!
//! The monitoring program organizes every data set by a four-level
//! hierarchy: State → District → Block → Gram Panchayat. The state is
//! implicit (one deployment per state); this crate models the three
//! selectable levels below it and the parent/child relationships
//! between them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Numeric identifier for a geography unit, as assigned by the backend.
pub type GeoId = i64;

/// Level of a node within the District → Block → Gram Panchayat
/// hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GeoLevel {
    /// Top selectable level; districts have no parent.
    District,
    /// Child of a district.
    Block,
    /// Gram Panchayat, the lowest administrative unit; child of a block.
    Gp,
}

impl GeoLevel {
    /// Returns the parent level, or `None` for [`GeoLevel::District`].
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::District => None,
            Self::Block => Some(Self::District),
            Self::Gp => Some(Self::Block),
        }
    }

    /// Returns the child level, or `None` for [`GeoLevel::Gp`].
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::District => Some(Self::Block),
            Self::Block => Some(Self::Gp),
            Self::Gp => None,
        }
    }

    /// Human-readable placeholder shown when no unit of this level has
    /// been selected yet.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::District => "Select District",
            Self::Block => "Select Block",
            Self::Gp => "Select GP",
        }
    }
}

/// A single node in the administrative hierarchy.
///
/// Children of a node are only meaningful once the parent has been
/// fetched; [`parent_id`](Self::parent_id) is `None` exactly for
/// districts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographyNode {
    /// Backend-assigned identifier.
    pub id: GeoId,
    /// Display name (e.g. "Ajmer", "Beawar").
    pub name: String,
    /// Parent unit id: the district for a block, the block for a GP.
    pub parent_id: Option<GeoId>,
    /// Hierarchy level of this node.
    pub level: GeoLevel,
}

impl GeographyNode {
    /// Creates a district node (no parent).
    #[must_use]
    pub const fn district(id: GeoId, name: String) -> Self {
        Self {
            id,
            name,
            parent_id: None,
            level: GeoLevel::District,
        }
    }

    /// Creates a block node under the given district.
    #[must_use]
    pub const fn block(id: GeoId, name: String, district_id: GeoId) -> Self {
        Self {
            id,
            name,
            parent_id: Some(district_id),
            level: GeoLevel::Block,
        }
    }

    /// Creates a Gram Panchayat node under the given block.
    #[must_use]
    pub const fn gp(id: GeoId, name: String, block_id: GeoId) -> Self {
        Self {
            id,
            name,
            parent_id: Some(block_id),
            level: GeoLevel::Gp,
        }
    }
}
