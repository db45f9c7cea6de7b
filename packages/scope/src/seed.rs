//! Async edges of the scope state machine: hover prefetches, click
//! side effects, and drop-down seeding.
//!
//! The transitions in the crate root are pure; everything here wires
//! them to the shared [`GeoCache`]. Fetches resolve in no particular
//! order, so nothing below applies a fetched list to the selection.
//! Columns always re-read the cache through the *current* preview or
//! committed ids at render time, which makes a late-resolving fetch
//! harmless.

use swachh_monitor_geography::{GeoCache, GeographyApi};
use swachh_monitor_geography_models::{GeoLevel, GeographyNode};

use crate::{Scope, ScopeSelection, Selected};

/// Opens the drop-down and seeds the preview so the menu opens on the
/// current selection.
pub async fn open_menu<A>(selection: &mut ScopeSelection, cache: &GeoCache<A>)
where
    A: GeographyApi + 'static,
{
    selection.open_menu();
    seed_preview(selection, cache).await;
}

/// Seeds the preview path from the committed path (or the first
/// available node) and warms the child-list caches column by column:
/// seed the district preview, fetch its blocks if uncached, seed the
/// block preview, fetch its GPs if uncached.
///
/// Each step only runs when that level is not already seeded, so
/// repeated calls (every render while the menu is open) settle instead
/// of reseeding forever.
pub async fn seed_preview<A>(selection: &mut ScopeSelection, cache: &GeoCache<A>)
where
    A: GeographyApi + 'static,
{
    if selection.scope().dropdown_depth() < 2 {
        return;
    }

    let districts = cache.ensure_districts().await;

    if selection.preview_path().district.is_none() {
        let seed = selection
            .committed()
            .district
            .clone()
            .or_else(|| districts.first().map(Selected::from));
        if let Some(seed) = seed {
            log::debug!("Seeding district preview: {}", seed.name);
            selection.set_preview_district(seed);
        }
    }

    let district_id = selection.preview_path().district_id();
    let blocks = cache.ensure_blocks(district_id).await;

    if selection.scope() == Scope::Gps {
        if selection.preview_path().block.is_none() {
            let seed = selection
                .committed()
                .block
                .clone()
                .or_else(|| blocks.first().map(Selected::from));
            if let Some(seed) = seed {
                selection.set_preview_block(seed);
            }
        }

        let block_id = selection.preview_path().block_id();
        let _ = cache.ensure_gps(district_id, block_id).await;
    }
}

/// Hover on a district entry: preview it and fetch its block list so
/// the next column fills in. Side-effect only; nothing is committed.
pub async fn hover_district<A>(
    selection: &mut ScopeSelection,
    cache: &GeoCache<A>,
    node: &GeographyNode,
) where
    A: GeographyApi + 'static,
{
    selection.preview(GeoLevel::District, node);
    let _ = cache.fetch_blocks(selection.preview_path().district_id()).await;
}

/// Hover on a block entry: preview it and fetch its GP list.
pub async fn hover_block<A>(
    selection: &mut ScopeSelection,
    cache: &GeoCache<A>,
    node: &GeographyNode,
) where
    A: GeographyApi + 'static,
{
    selection.preview(GeoLevel::Block, node);
    let _ = cache
        .fetch_gps(
            selection.preview_path().district_id(),
            selection.preview_path().block_id(),
        )
        .await;
}

/// Click on a district entry: commit it and speculatively fetch its
/// blocks, since the next scope the user picks will want them.
pub async fn click_district<A>(
    selection: &mut ScopeSelection,
    cache: &GeoCache<A>,
    node: &GeographyNode,
) where
    A: GeographyApi + 'static,
{
    selection.commit(GeoLevel::District, node);
    let _ = cache.fetch_blocks(Some(node.id)).await;
}
