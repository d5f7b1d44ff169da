//! Assembly of a base feature together with the features upgrading it.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::assembly::builder::assemble_feature;
use crate::assembly::cache::AssemblyCache;
use crate::assembly::context::{ArtifactMerge, BuilderContext};
use crate::assembly::merge::merge_feature;
use crate::assembly::removals::apply_removals;
use crate::errors::Result;
use crate::model::{ArtifactId, Feature};
use crate::{log_op_end, log_op_error, log_op_start};

/// Something worth reporting that did not stop assembly
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblyNotice {
    /// Two candidates shared a coordinate; only the higher version was applied
    DuplicateUpgradeDiscarded {
        kept: ArtifactId,
        discarded: ArtifactId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeResult {
    pub feature: Feature,
    pub notices: Vec<AssemblyNotice>,
}

/// Assemble `feature` and apply every candidate declaring it as prototype
///
/// Candidates for other bases are ignored. Among candidates sharing a
/// coordinate only the highest version is applied. Upgrades are applied in
/// identity order and always merge with [`ArtifactMerge::Latest`].
///
/// # Errors
///
/// Any error of [`assemble`](crate::assembly::assemble).
pub fn assemble_with_upgrades(
    feature: &Feature,
    upgrades: &[Feature],
    context: &BuilderContext<'_>,
) -> Result<UpgradeResult> {
    let request = context.request_context();
    log_op_start!(
        "assemble_with_upgrades",
        feature_id = %feature.id,
        request_id = %request.request_id,
        trace_id = request.trace_id_str()
    );
    let start = Instant::now();

    let result = assemble_with_upgrades_impl(feature, upgrades, context).map_err(|e| {
        log_op_error!(
            "assemble_with_upgrades",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            feature_id = %feature.id,
            request_id = %request.request_id,
            trace_id = request.trace_id_str()
        );
        e
    })?;

    log_op_end!(
        "assemble_with_upgrades",
        duration_ms = start.elapsed().as_millis() as u64,
        feature_id = %result.feature.id,
        upgrade_count = result.feature.upgrades.len()
    );

    Ok(result)
}

fn assemble_with_upgrades_impl(
    feature: &Feature,
    upgrades: &[Feature],
    context: &BuilderContext<'_>,
) -> Result<UpgradeResult> {
    let mut notices = Vec::new();
    let candidates = select_upgrades(feature, upgrades, &mut notices);

    let mut cache = AssemblyCache::new();
    let mut base = assemble_feature(feature, context, &mut cache)?;

    for upgrade in candidates {
        let mut working = upgrade.clone();

        match working.includes.iter().position(|i| i.id == base.id) {
            Some(index) => {
                let include = working.includes.remove(index);
                apply_removals(&mut base, &include.removals);
            }
            None => {
                if let Some(prototype) = &working.prototype {
                    apply_removals(&mut base, &prototype.removals);
                }
            }
        }
        working.prototype = None;
        base.upgrades.push(working.id.clone());

        tracing::debug!(
            feature_id = %base.id,
            upgrade_id = %working.id,
            "applying upgrade"
        );
        let assembled = assemble_feature(&working, context, &mut cache)?;
        merge_feature(
            &mut base,
            &assembled,
            ArtifactMerge::Latest,
            context.handlers(),
        )?;
    }

    Ok(UpgradeResult {
        feature: base,
        notices,
    })
}

/// Candidates targeting `feature`, one per coordinate, in identity order
fn select_upgrades<'a>(
    feature: &Feature,
    upgrades: &'a [Feature],
    notices: &mut Vec<AssemblyNotice>,
) -> Vec<&'a Feature> {
    let mut selected: Vec<&Feature> = Vec::new();

    for candidate in upgrades.iter().filter(|u| u.upgrade_of() == Some(&feature.id)) {
        let Some(slot) = selected.iter_mut().find(|s| s.id.is_same(&candidate.id)) else {
            selected.push(candidate);
            continue;
        };
        let (kept, discarded) = if candidate.id > slot.id {
            let previous = *slot;
            *slot = candidate;
            (candidate, previous)
        } else {
            (*slot, candidate)
        };
        tracing::info!(
            feature_id = %feature.id,
            kept = %kept.id,
            discarded = %discarded.id,
            "duplicate upgrade discarded"
        );
        notices.push(AssemblyNotice::DuplicateUpgradeDiscarded {
            kept: kept.id.clone(),
            discarded: discarded.id.clone(),
        });
    }

    selected.sort_by(|a, b| a.id.cmp(&b.id));
    selected
}
