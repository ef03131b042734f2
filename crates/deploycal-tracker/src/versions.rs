//! Version filter
//!
//! Collects the ids of versions released inside the reporting window across
//! every participating project. A project participates when its type is
//! `software` and its key is not excluded. Versions whose release date does
//! not match `YYYY-MM-DD` are dropped without error.

use deploycal_core::{IssueTracker, ProjectExclusions, ReleaseWindow, TrackerError, VersionId};
use std::collections::HashSet;
use tracing::{debug, info};

/// Ids of versions released inside `window`, in discovery order without duplicates.
///
/// Projects are visited in the order the tracker lists them and their
/// versions are requested one project at a time. Any tracker error aborts the
/// whole lookup.
pub fn filter_released_versions<T: IssueTracker + ?Sized>(
    tracker: &T,
    window: &ReleaseWindow,
    excluded: &ProjectExclusions,
) -> Result<Vec<VersionId>, TrackerError> {
    info!("Requesting projects");
    let projects = tracker.list_projects()?;

    let participating: Vec<_> = projects
        .into_iter()
        .filter(|project| {
            let keep = project.is_software() && !excluded.contains(&project.key);
            if !keep {
                info!(project = %project.key, kind = %project.project_type, "Skipping project");
            }
            keep
        })
        .collect();
    info!("Obtained {} projects", participating.len());

    info!(
        start = %window.start,
        end = %window.end,
        "Requesting versions released inside the window"
    );

    let mut seen = HashSet::new();
    let mut released = Vec::new();

    for project in &participating {
        let versions = tracker.released_versions(&project.key)?;
        let mut kept = 0usize;

        for version in versions {
            let Some(date) = version.release_date() else {
                debug!(project = %project.key, version = %version.id, "Release date does not match, skipping");
                continue;
            };
            if !window.contains(date) {
                continue;
            }
            kept += 1;
            if seen.insert(version.id.clone()) {
                released.push(version.id);
            }
        }

        if kept > 0 {
            info!(project = %project.key, "Obtained {} versions", kept);
        }
    }

    info!("Obtained {} versions in total", released.len());
    Ok(released)
}
