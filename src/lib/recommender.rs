use log::{debug, info, warn};
use serde::Serialize;

use crate::Result;
use crate::lib::error::SizingError;
use crate::lib::ontap::OntapClient;
use crate::lib::volume::{VolumeSnapshot, VolumeStyle};

/// Bytes per GiB used for every display conversion
pub const GIB: u64 = 1 << 30;

/// Utilization ceiling used when `-target` is not given
pub const DEFAULT_TARGET_PERCENT: u8 = 90;

/// Which recommendations are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Always recommend growing by the compression-offset amount
    Recommend,
    /// Only recommend growth for volumes over the target utilization
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizingPolicy {
    pub mode: Mode,
    pub target_percent: u8,
}

impl SizingPolicy {
    pub fn new(mode: Mode, target_percent: u8) -> std::result::Result<Self, SizingError> {
        if target_percent == 0 || target_percent > 100 {
            return Err(SizingError::InvalidTarget(target_percent));
        }
        Ok(Self {
            mode,
            target_percent,
        })
    }
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            mode: Mode::Recommend,
            target_percent: DEFAULT_TARGET_PERCENT,
        }
    }
}

/// Size increase to put in a `volume size` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "amount", rename_all = "lowercase")]
pub enum Recommendation {
    /// Offset compression savings exactly, in bytes
    Bytes(u64),
    /// Whole GiB needed to bring utilization back to target
    Gigabytes(u64),
}

/// Active filesystem figures with compression savings added back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityFigures {
    pub afs_size: u64,
    pub used_without_compression: u64,
    pub used_percent_without_compression: u64,
    pub available_gb: u64,
    pub compression_saved_gb: u64,
    pub target_percent: u8,
    /// Set only when utilization without compression exceeds the target
    pub target_extra_bytes: Option<u64>,
    pub target_capacity_gb: Option<u64>,
}

impl CapacityFigures {
    pub fn over_target(&self) -> bool {
        self.target_extra_bytes.is_some()
    }
}

/// Outcome of sizing one volume that has compression savings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub volume: VolumeSnapshot,
    pub recommended_increase_bytes: u64,
    pub capacity: Option<CapacityFigures>,
    pub recommendation: Option<Recommendation>,
}

/// Grow-by amount that gives back `compression_saved` bytes of usable space
///
/// Only `(100 - reserve)%` of any growth is usable, so the result is
/// `ceil(compression_saved * 100 / (100 - reserve))`. Returns `None` when the
/// reserve leaves no usable space or the result overflows.
pub fn recommended_increase_bytes(compression_saved: u64, reserve_percent: u8) -> Option<u64> {
    if reserve_percent >= 100 {
        return None;
    }
    let usable_percent = u128::from(100 - reserve_percent);
    let increase = (u128::from(compression_saved) * 100).div_ceil(usable_percent);
    u64::try_from(increase).ok()
}

/// Whole GiB, rounded down
pub fn gib_floor(bytes: u64) -> u64 {
    bytes / GIB
}

/// Whole GiB, rounded up
pub fn gib_ceil(bytes: u64) -> u64 {
    bytes.div_ceil(GIB)
}

/// Compute utilization figures for `volume` against `target_percent`
pub fn capacity_figures(
    volume: &VolumeSnapshot,
    target_percent: u8,
) -> std::result::Result<CapacityFigures, SizingError> {
    if target_percent == 0 || target_percent > 100 {
        return Err(SizingError::InvalidTarget(target_percent));
    }

    let afs_size = u128::from(volume.used) + u128::from(volume.available);
    if afs_size == 0 {
        return Err(SizingError::EmptyActiveFilesystem(volume.label()));
    }
    let used_without_compression = u128::from(volume.used) + u128::from(volume.compression_saved);
    let used_percent = used_without_compression * 100 / afs_size;
    let target = u128::from(target_percent);

    // used_percent > target implies used_wo * 100 > afs * target
    let target_extra_bytes = if used_percent > target {
        let extra = (used_without_compression * 100 - afs_size * target).div_ceil(target);
        Some(saturate(extra))
    } else {
        None
    };

    Ok(CapacityFigures {
        afs_size: saturate(afs_size),
        used_without_compression: saturate(used_without_compression),
        used_percent_without_compression: saturate(used_percent),
        available_gb: gib_floor(volume.available),
        compression_saved_gb: gib_ceil(volume.compression_saved),
        target_percent,
        target_extra_bytes,
        target_capacity_gb: target_extra_bytes.map(gib_ceil),
    })
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Size one volume under `policy`
///
/// Volumes without compression savings yield `Ok(None)`.
pub fn assess(
    volume: &VolumeSnapshot,
    policy: &SizingPolicy,
) -> std::result::Result<Option<Assessment>, SizingError> {
    if volume.compression_saved == 0 {
        return Ok(None);
    }

    let recommended_increase_bytes =
        recommended_increase_bytes(volume.compression_saved, volume.snapshot_reserve_percent)
            .ok_or_else(|| SizingError::InvalidSnapshotReserve {
                volume: volume.label(),
                percent: volume.snapshot_reserve_percent,
            })?;

    let needs_capacity = policy.mode == Mode::Check || volume.style == VolumeStyle::FlexGroup;
    let capacity = if needs_capacity {
        Some(capacity_figures(volume, policy.target_percent)?)
    } else {
        None
    };

    let recommendation = match policy.mode {
        Mode::Recommend => Some(Recommendation::Bytes(recommended_increase_bytes)),
        Mode::Check => capacity
            .and_then(|c| c.target_capacity_gb)
            .map(Recommendation::Gigabytes),
    };

    Ok(Some(Assessment {
        volume: volume.clone(),
        recommended_increase_bytes,
        capacity,
        recommendation,
    }))
}

/// One assessed volume together with the record it was built from
#[derive(Debug, Clone)]
pub struct Finding {
    pub assessment: Assessment,
    pub raw: serde_json::Value,
}

/// Everything learned from one pass over an aggregate
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub volumes_scanned: usize,
    pub volumes_skipped: usize,
    pub findings: Vec<Finding>,
}

pub struct Recommender {
    client: OntapClient,
    policy: SizingPolicy,
}

impl Recommender {
    pub fn new(client: OntapClient, policy: SizingPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetch every volume on `aggregate` and size each one in API order
    pub async fn generate_recommendations(&self, aggregate: &str) -> Result<ScanOutcome> {
        let volumes = self.client.volumes_on_aggregate(aggregate).await?;
        info!(
            "Found {} volumes on aggregate {}",
            volumes.len(),
            aggregate
        );

        let mut outcome = ScanOutcome::default();

        for volume in volumes {
            debug!("Fetching details for volume {}", volume.display_name());
            let (record, raw) = self.client.volume_details(&volume.uuid).await?;
            outcome.volumes_scanned += 1;

            let style = record.style.clone().unwrap_or_default();
            let Some(snapshot) = record.into_snapshot()? else {
                warn!(
                    "Skipping volume {} with unsupported style '{}'",
                    volume.display_name(),
                    style
                );
                outcome.volumes_skipped += 1;
                continue;
            };

            match assess(&snapshot, &self.policy)? {
                Some(assessment) => outcome.findings.push(Finding { assessment, raw }),
                None => debug!("Volume {} has no compression savings", snapshot.label()),
            }
        }

        info!(
            "Assessed {} volumes, {} with compression savings",
            outcome.volumes_scanned,
            outcome.findings.len()
        );
        Ok(outcome)
    }
}
