//! Semantic checks that go beyond what a single node can verify while decoding.

use std::{collections::HashSet, fmt::Display};

use crate::error::{InvalidReason, MpdError, MpdResult};

use super::{
    adaptation_set::AdaptationSet,
    manifest::{Manifest, PresentationType},
    period::Period,
};

fn unique<T, I>(element: &str, scope: &str, ids: I) -> MpdResult<()>
where
    T: Display + Eq + std::hash::Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if seen.contains(&id) {
            return Err(MpdError::invalid(
                element,
                InvalidReason::DuplicateId {
                    scope: scope.to_string(),
                    id: id.to_string(),
                },
            ));
        }
        seen.insert(id);
    }
    Ok(())
}

pub(crate) fn validate(manifest: &Manifest) -> MpdResult<()> {
    if manifest.periods.is_empty() {
        return Err(MpdError::invalid(
            "MPD",
            InvalidReason::Constraint("an MPD needs at least one Period".to_string()),
        ));
    }
    match manifest.presentation_type() {
        PresentationType::Dynamic => {
            if manifest.availability_start_time.is_none() {
                return Err(MpdError::invalid(
                    "MPD",
                    InvalidReason::Constraint(
                        "a dynamic MPD requires @availabilityStartTime".to_string(),
                    ),
                ));
            }
        }
        PresentationType::Static => {
            if manifest.minimum_update_period.is_some() {
                return Err(MpdError::invalid(
                    "MPD",
                    InvalidReason::DynamicOnly {
                        attribute: "minimumUpdatePeriod".to_string(),
                    },
                ));
            }
        }
    }
    if let (Some(start), Some(end)) = (
        &manifest.availability_start_time,
        &manifest.availability_end_time,
    ) {
        if end < start {
            return Err(MpdError::invalid(
                "MPD",
                InvalidReason::Constraint(
                    "@availabilityEndTime precedes @availabilityStartTime".to_string(),
                ),
            ));
        }
    }

    unique("Period", "MPD", manifest.periods.iter().filter_map(|p| p.id.as_deref()))?;
    unique(
        "InitializationSet",
        "MPD",
        manifest.initialization_sets.iter().map(|s| s.id),
    )?;

    let mut previous_start = None;
    for period in &manifest.periods {
        validate_period(period)?;
        // explicit starts must not go backwards
        if let Some(start) = &period.start {
            if previous_start.is_some_and(|previous| start.seconds() < previous) {
                return Err(MpdError::invalid(
                    "Period",
                    InvalidReason::Constraint(format!(
                        "Period@start {start} precedes the start of an earlier period"
                    )),
                ));
            }
            previous_start = Some(start.seconds());
        }
    }
    Ok(())
}

fn validate_period(period: &Period) -> MpdResult<()> {
    period.addressing.validate("Period")?;

    unique(
        "AdaptationSet",
        "Period",
        period.adaptation_sets.iter().filter_map(|a| a.id),
    )?;
    unique(
        "Preselection",
        "Period",
        period.preselections.iter().map(|p| p.id()),
    )?;
    unique(
        "Subset",
        "Period",
        period.subsets.iter().filter_map(|s| s.id.as_deref()),
    )?;
    // representation ids are unique across the whole period
    unique(
        "Representation",
        "Period",
        period
            .adaptation_sets
            .iter()
            .flat_map(|a| a.representations.iter().map(|r| r.id.as_str())),
    )?;

    for event_stream in &period.event_streams {
        unique(
            "Event",
            "EventStream",
            event_stream.events.iter().filter_map(|e| e.id),
        )?;
    }

    for adaptation_set in &period.adaptation_sets {
        validate_adaptation_set(adaptation_set)?;
    }
    Ok(())
}

fn validate_adaptation_set(adaptation_set: &AdaptationSet) -> MpdResult<()> {
    adaptation_set.addressing.validate("AdaptationSet")?;
    unique(
        "ContentComponent",
        "AdaptationSet",
        adaptation_set.content_components.iter().filter_map(|c| c.id),
    )?;

    for representation in &adaptation_set.representations {
        representation.addressing.validate("Representation")?;
    }
    Ok(())
}
