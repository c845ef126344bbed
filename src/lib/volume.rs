use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::lib::error::SizingError;

/// Volume layout as reported by the `style` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeStyle {
    FlexVol,
    FlexGroup,
}

impl VolumeStyle {
    pub fn as_str(&self) -> &str {
        match self {
            VolumeStyle::FlexVol => "flexvol",
            VolumeStyle::FlexGroup => "flexgroup",
        }
    }
}

impl fmt::Display for VolumeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VolumeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flexvol" => Ok(VolumeStyle::FlexVol),
            "flexgroup" => Ok(VolumeStyle::FlexGroup),
            _ => Err(format!("Unsupported volume style: '{}'", s)),
        }
    }
}

/// Volume object as returned by `GET /api/storage/volumes/{uuid}`
///
/// Every field is optional on the wire; [`VolumeRecord::into_snapshot`]
/// decides which ones are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeRecord {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub svm: Option<NamedRef>,
    pub style: Option<String>,
    pub efficiency: Option<Efficiency>,
    pub space: Option<Space>,
    #[serde(default)]
    pub aggregates: Vec<NamedRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Efficiency {
    pub space_savings: Option<SpaceSavings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceSavings {
    pub compression: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Space {
    pub used: Option<u64>,
    pub available: Option<u64>,
    pub snapshot: Option<SnapshotSpace>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotSpace {
    pub reserve_percent: Option<u8>,
}

/// Flat, validated view of one volume used by the recommender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeSnapshot {
    pub name: String,
    pub svm: String,
    pub style: VolumeStyle,
    pub compression_saved: u64,
    pub snapshot_reserve_percent: u8,
    pub used: u64,
    pub available: u64,
    pub aggregates: Vec<String>,
}

impl VolumeSnapshot {
    /// `svm:volume` label used in report lines
    pub fn label(&self) -> String {
        format!("{}:{}", self.svm, self.name)
    }
}

impl VolumeRecord {
    /// Validate the record into a [`VolumeSnapshot`]
    ///
    /// Returns `Ok(None)` for styles the recommender does not handle, such
    /// as FlexGroup constituents.
    pub fn into_snapshot(self) -> Result<Option<VolumeSnapshot>, SizingError> {
        let volume = self
            .name
            .clone()
            .or_else(|| self.uuid.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());

        let missing = |field: &'static str| SizingError::MissingField {
            volume: volume.clone(),
            field,
        };

        let style = self.style.as_deref().ok_or_else(|| missing("style"))?;
        let Ok(style) = style.parse::<VolumeStyle>() else {
            return Ok(None);
        };

        let name = self.name.ok_or_else(|| missing("name"))?;
        let svm = self
            .svm
            .and_then(|svm| svm.name)
            .ok_or_else(|| missing("svm.name"))?;
        let compression_saved = self
            .efficiency
            .and_then(|e| e.space_savings)
            .and_then(|s| s.compression)
            .ok_or_else(|| missing("efficiency.space_savings.compression"))?;

        let space = self.space.ok_or_else(|| missing("space"))?;
        let snapshot_reserve_percent = space
            .snapshot
            .and_then(|s| s.reserve_percent)
            .ok_or_else(|| missing("space.snapshot.reserve_percent"))?;
        let used = space.used.ok_or_else(|| missing("space.used"))?;
        let available = space.available.ok_or_else(|| missing("space.available"))?;

        Ok(Some(VolumeSnapshot {
            name,
            svm,
            style,
            compression_saved,
            snapshot_reserve_percent,
            used,
            available,
            aggregates: self.aggregates.into_iter().filter_map(|a| a.name).collect(),
        }))
    }
}
