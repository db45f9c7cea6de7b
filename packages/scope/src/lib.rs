#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic scope selection state machine.
//!
//! A dashboard screen browses one of four scopes: the whole state, or
//! a single district, block, or GP. The drop-down that picks the unit
//! has two kinds of state: the **committed** path (click-confirmed,
//! drives every API query) and the **preview** path (hover-driven,
//! only populates the next drop-down column, discarded when the menu
//! closes without a commit).
//!
//! [`ScopeSelection`] is a plain value owned by the screen; every
//! transition here is a pure method on it. The async pieces (hover
//! prefetches and drop-down seeding against the shared
//! [`GeoCache`](swachh_monitor_geography::GeoCache)) live in [`seed`].

pub mod seed;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use swachh_monitor_analytics_models::AnalyticsLevel;
use swachh_monitor_geography_models::{GeoId, GeoLevel, GeographyNode};

/// Label shown while the whole state is the committed location.
pub const STATE_ROOT_LABEL: &str = "State";

/// The administrative level a screen is currently browsing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    /// Statewide overview; no drop-down.
    #[default]
    State,
    /// One district; drop-down shows the district column only.
    Districts,
    /// One block; drop-down shows district and block columns.
    Blocks,
    /// One GP; drop-down shows district, block and GP columns.
    Gps,
}

impl Scope {
    /// Number of drop-down columns this scope opens.
    #[must_use]
    pub const fn dropdown_depth(self) -> u8 {
        match self {
            Self::State => 0,
            Self::Districts => 1,
            Self::Blocks => 2,
            Self::Gps => 3,
        }
    }

    /// The level a click in this scope's last column commits, or
    /// `None` for the state root.
    #[must_use]
    pub const fn selection_level(self) -> Option<GeoLevel> {
        match self {
            Self::State => None,
            Self::Districts => Some(GeoLevel::District),
            Self::Blocks => Some(GeoLevel::Block),
            Self::Gps => Some(GeoLevel::Gp),
        }
    }

    /// Granularity of the analytics rows this scope queries: the state
    /// breaks down into districts, a district into blocks, and a block
    /// or GP view reads village rows.
    #[must_use]
    pub const fn analytics_level(self) -> AnalyticsLevel {
        match self {
            Self::State => AnalyticsLevel::District,
            Self::Districts => AnalyticsLevel::Block,
            Self::Blocks | Self::Gps => AnalyticsLevel::Village,
        }
    }
}

/// One selected unit: id plus the display name the label shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selected {
    /// Backend-assigned identifier.
    pub id: GeoId,
    /// Display name.
    pub name: String,
}

impl From<&GeographyNode> for Selected {
    fn from(node: &GeographyNode) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
        }
    }
}

/// The click-confirmed selection path. Drives API queries.
///
/// Fields are only populated down to the current scope's own level:
/// in `Blocks` scope `gp` is always `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedPath {
    /// Committed district.
    pub district: Option<Selected>,
    /// Committed block.
    pub block: Option<Selected>,
    /// Committed GP.
    pub gp: Option<Selected>,
}

impl CommittedPath {
    /// Id of the committed district, if any.
    #[must_use]
    pub fn district_id(&self) -> Option<GeoId> {
        self.district.as_ref().map(|s| s.id)
    }

    /// Id of the committed block, if any.
    #[must_use]
    pub fn block_id(&self) -> Option<GeoId> {
        self.block.as_ref().map(|s| s.id)
    }

    /// Id of the committed GP, if any.
    #[must_use]
    pub fn gp_id(&self) -> Option<GeoId> {
        self.gp.as_ref().map(|s| s.id)
    }
}

/// The hover-driven provisional path. Populates the next drop-down
/// column; never queried against, and discarded when the menu closes
/// without a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewPath {
    /// Previewed district (populates the block column).
    pub district: Option<Selected>,
    /// Previewed block (populates the GP column).
    pub block: Option<Selected>,
}

impl PreviewPath {
    /// Id of the previewed district, if any.
    #[must_use]
    pub fn district_id(&self) -> Option<GeoId> {
        self.district.as_ref().map(|s| s.id)
    }

    /// Id of the previewed block, if any.
    #[must_use]
    pub fn block_id(&self) -> Option<GeoId> {
        self.block.as_ref().map(|s| s.id)
    }
}

/// The full scope-selection state of one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelection {
    scope: Scope,
    committed: CommittedPath,
    preview: PreviewPath,
    menu_open: bool,
}

impl ScopeSelection {
    /// Fresh selection: state scope, nothing committed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope currently being browsed.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// The click-confirmed path.
    #[must_use]
    pub const fn committed(&self) -> &CommittedPath {
        &self.committed
    }

    /// The hover-driven preview path.
    #[must_use]
    pub const fn preview_path(&self) -> &PreviewPath {
        &self.preview
    }

    /// Whether the drop-down menu is open.
    #[must_use]
    pub const fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    /// The label the scope button displays: the committed unit's name,
    /// or a placeholder when this scope has no committed selection yet.
    #[must_use]
    pub fn label(&self) -> &str {
        let Some(level) = self.scope.selection_level() else {
            return STATE_ROOT_LABEL;
        };

        let selected = match level {
            GeoLevel::District => self.committed.district.as_ref(),
            GeoLevel::Block => self.committed.block.as_ref(),
            GeoLevel::Gp => self.committed.gp.as_ref(),
        };

        selected.map_or_else(|| level.placeholder(), |s| s.name.as_str())
    }

    /// Switches to a new scope. Clears the preview, closes the menu,
    /// and drops committed ids below the new scope's own level while
    /// keeping the ones that stay meaningful (switching from `Blocks`
    /// to `Gps` keeps the committed district and block). Returning to
    /// the state root clears the whole path.
    pub fn reset(&mut self, scope: Scope) {
        self.preview = PreviewPath::default();
        self.menu_open = false;
        self.scope = scope;

        match scope {
            Scope::State => self.committed = CommittedPath::default(),
            Scope::Districts => {
                self.committed.block = None;
                self.committed.gp = None;
            }
            Scope::Blocks => self.committed.gp = None,
            Scope::Gps => {}
        }
    }

    /// Records a hover on a drop-down entry. Previewing a district
    /// invalidates any previewed block under the old district. Hover
    /// has no meaning in scopes whose drop-down lacks a next column.
    pub fn preview(&mut self, level: GeoLevel, node: &GeographyNode) {
        match level {
            GeoLevel::District if self.scope.dropdown_depth() >= 2 => {
                self.set_preview_district(node.into());
            }
            GeoLevel::Block if self.scope == Scope::Gps => {
                self.set_preview_block(node.into());
            }
            _ => {}
        }
    }

    pub(crate) fn set_preview_district(&mut self, selected: Selected) {
        if self.preview.district.as_ref() != Some(&selected) {
            self.preview.block = None;
        }
        self.preview.district = Some(selected);
    }

    pub(crate) fn set_preview_block(&mut self, selected: Selected) {
        self.preview.block = Some(selected);
    }

    /// Records a click on a drop-down entry at the given level:
    /// commits that unit (together with the previewed ancestors for
    /// block and GP clicks) and closes the menu.
    pub fn commit(&mut self, level: GeoLevel, node: &GeographyNode) {
        match level {
            GeoLevel::District => {
                self.committed.district = Some(node.into());
                self.committed.block = None;
                self.committed.gp = None;
            }
            GeoLevel::Block => {
                if let Some(district) = self.preview.district.clone() {
                    self.committed.district = Some(district);
                }
                self.committed.block = Some(node.into());
                self.committed.gp = None;
            }
            GeoLevel::Gp => {
                if let Some(district) = self.preview.district.clone() {
                    self.committed.district = Some(district);
                }
                if let Some(block) = self.preview.block.clone() {
                    self.committed.block = Some(block);
                }
                self.committed.gp = Some(node.into());
            }
        }

        self.close_menu();
    }

    /// Opens the drop-down. Seeding the preview from the committed
    /// path is asynchronous; see [`seed::open_menu`].
    pub fn open_menu(&mut self) {
        self.menu_open = true;
    }

    /// Closes the drop-down and discards the preview.
    pub fn close_menu(&mut self) {
        self.menu_open = false;
        self.preview = PreviewPath::default();
    }
}
