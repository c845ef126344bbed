use std::fmt::Write;

use serde::Serialize;

use crate::lib::recommender::{Assessment, Finding, Mode, Recommendation, SizingPolicy};
use crate::lib::volume::VolumeStyle;
use crate::Result;

/// Extra detail requested on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub debug: bool,
    pub details: bool,
}

/// `volume size` command that applies `recommendation`
pub fn resize_command(svm: &str, volume: &str, recommendation: &Recommendation) -> String {
    let size = match recommendation {
        Recommendation::Bytes(bytes) => bytes.to_string(),
        Recommendation::Gigabytes(gb) => format!("{}g", gb),
    };
    format!(
        "volume size -vserver {} -volume {} -new-size +{}",
        svm, volume, size
    )
}

/// Render findings as report lines, one volume after another
pub fn render_text(
    findings: &[Finding],
    policy: &SizingPolicy,
    options: &ReportOptions,
) -> Result<String> {
    let mut output = String::new();

    for finding in findings {
        write_assessment(&mut output, &finding.assessment, policy, options)?;

        if options.details {
            writeln!(output, "{}", serde_json::to_string_pretty(&finding.raw)?)?;
        }
    }

    Ok(output)
}

fn write_assessment(
    output: &mut String,
    assessment: &Assessment,
    policy: &SizingPolicy,
    options: &ReportOptions,
) -> std::fmt::Result {
    let volume = &assessment.volume;
    let label = volume.label();
    let is_flexgroup = volume.style == VolumeStyle::FlexGroup;

    if options.debug {
        writeln!(
            output,
            "{} {} {} Recommended Size Increase: {} bytes",
            label,
            volume.compression_saved,
            volume.snapshot_reserve_percent,
            assessment.recommended_increase_bytes
        )?;
        if let Some(capacity) = &assessment.capacity {
            writeln!(
                output,
                "{} afs_size={} used={} available={} used_without_compression={} used_percent_without_compression={}",
                label,
                capacity.afs_size,
                volume.used,
                volume.available,
                capacity.used_without_compression,
                capacity.used_percent_without_compression
            )?;
        }
    }

    match policy.mode {
        Mode::Recommend => {
            if let Some(capacity) = assessment.capacity.filter(|_| is_flexgroup) {
                writeln!(
                    output,
                    "FlexGroup {} available: {}GB, compression saved: {}GB",
                    label, capacity.available_gb, capacity.compression_saved_gb
                )?;
                writeln!(
                    output,
                    "FlexGroup {} used without compression: {}% (target {}%)",
                    label, capacity.used_percent_without_compression, capacity.target_percent
                )?;
                if let Some(gb) = capacity.target_capacity_gb {
                    writeln!(
                        output,
                        "FlexGroup {} needs {}GB more to reach {}% utilization",
                        label, gb, capacity.target_percent
                    )?;
                }
            }

            if let Some(recommendation) = &assessment.recommendation {
                let command = resize_command(&volume.svm, &volume.name, recommendation);
                if is_flexgroup {
                    writeln!(output, "Potential FlexGroup resize: {}", command)?;
                } else {
                    writeln!(output, "{}", command)?;
                }
            }
        }
        Mode::Check => {
            let (Some(capacity), Some(recommendation)) =
                (&assessment.capacity, &assessment.recommendation)
            else {
                return Ok(());
            };

            let prefix = if is_flexgroup { "FlexGroup " } else { "" };
            writeln!(
                output,
                "{}{} used without compression: {}% exceeds target {}%",
                prefix,
                label,
                capacity.used_percent_without_compression,
                capacity.target_percent
            )?;
            writeln!(
                output,
                "{}",
                resize_command(&volume.svm, &volume.name, recommendation)
            )?;
        }
    }

    Ok(())
}

/// Top-level JSON document
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub metadata: ReportMetadata,
    pub volumes: Vec<ReportEntry>,
}

/// Metadata about the run that produced the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub cluster: String,
    pub aggregate: String,
    pub policy: SizingPolicy,
    pub volumes_scanned: usize,
    pub volumes_with_savings: usize,
    pub recommendations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub resize_command: Option<String>,
}

impl ReportOutput {
    pub fn new(
        cluster: &str,
        aggregate: &str,
        policy: SizingPolicy,
        volumes_scanned: usize,
        findings: &[Finding],
    ) -> Self {
        let volumes: Vec<ReportEntry> = findings
            .iter()
            .map(|finding| {
                let assessment = finding.assessment.clone();
                let resize_command = assessment.recommendation.as_ref().map(|r| {
                    resize_command(&assessment.volume.svm, &assessment.volume.name, r)
                });
                ReportEntry {
                    assessment,
                    resize_command,
                }
            })
            .collect();

        let recommendations = volumes
            .iter()
            .filter(|v| v.resize_command.is_some())
            .count();

        Self {
            metadata: ReportMetadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                cluster: cluster.to_string(),
                aggregate: aggregate.to_string(),
                policy,
                volumes_scanned,
                volumes_with_savings: findings.len(),
                recommendations,
            },
            volumes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::recommender::{GIB, assess};
    use crate::lib::volume::VolumeSnapshot;
    use serde_json::json;

    fn finding(style: VolumeStyle, name: &str, used: u64, available: u64, saved: u64, policy: &SizingPolicy) -> Option<Finding> {
        let volume = VolumeSnapshot {
            name: name.into(),
            svm: "svm1".into(),
            style,
            compression_saved: saved,
            snapshot_reserve_percent: 5,
            used,
            available,
            aggregates: vec!["aggr1".into()],
        };
        assess(&volume, policy).unwrap().map(|assessment| Finding {
            assessment,
            raw: json!({ "name": name, "style": style.as_str() }),
        })
    }

    fn render(findings: &[Finding], policy: &SizingPolicy, options: ReportOptions) -> String {
        render_text(findings, policy, &options).unwrap()
    }

    #[test]
    fn resize_command_forms() {
        assert_eq!(
            resize_command("svm1", "vol1", &Recommendation::Bytes(1053)),
            "volume size -vserver svm1 -volume vol1 -new-size +1053"
        );
        assert_eq!(
            resize_command("svm1", "vol1", &Recommendation::Gigabytes(5)),
            "volume size -vserver svm1 -volume vol1 -new-size +5g"
        );
    }

    #[test]
    fn recommend_mode_text() {
        let policy = SizingPolicy::default();
        let findings: Vec<Finding> = [
            finding(VolumeStyle::FlexVol, "vol1", 10 * GIB, 90 * GIB, 1000, &policy),
            finding(VolumeStyle::FlexVol, "vol_empty", 10 * GIB, 90 * GIB, 0, &policy),
            finding(VolumeStyle::FlexGroup, "fg1", 80 * GIB, 10 * GIB, 5 * GIB, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        let text = render(&findings, &policy, ReportOptions::default());
        let expected = concat!(
            "volume size -vserver svm1 -volume vol1 -new-size +1053\n",
            "FlexGroup svm1:fg1 available: 10GB, compression saved: 5GB\n",
            "FlexGroup svm1:fg1 used without compression: 94% (target 90%)\n",
            "FlexGroup svm1:fg1 needs 5GB more to reach 90% utilization\n",
            "Potential FlexGroup resize: volume size -vserver svm1 -volume fg1 -new-size +5651272758\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn check_mode_text_skips_volumes_under_target() {
        let policy = SizingPolicy::new(Mode::Check, 90).unwrap();
        let findings: Vec<Finding> = [
            finding(VolumeStyle::FlexVol, "under", 10 * GIB, 80 * GIB, 5 * GIB, &policy),
            finding(VolumeStyle::FlexVol, "over", 80 * GIB, 10 * GIB, 5 * GIB, &policy),
            finding(VolumeStyle::FlexGroup, "fg1", 80 * GIB, 10 * GIB, 5 * GIB, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        let text = render(&findings, &policy, ReportOptions::default());
        let expected = concat!(
            "svm1:over used without compression: 94% exceeds target 90%\n",
            "volume size -vserver svm1 -volume over -new-size +5g\n",
            "FlexGroup svm1:fg1 used without compression: 94% exceeds target 90%\n",
            "volume size -vserver svm1 -volume fg1 -new-size +5g\n",
        );
        assert_eq!(text, expected);
        assert!(!text.contains("Potential"));
    }

    #[test]
    fn debug_and_details_lines() {
        let policy = SizingPolicy::default();
        let findings: Vec<Finding> =
            finding(VolumeStyle::FlexVol, "vol1", 10 * GIB, 90 * GIB, 1000, &policy)
                .into_iter()
                .collect();

        let text = render(
            &findings,
            &policy,
            ReportOptions {
                debug: true,
                details: true,
            },
        );
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("svm1:vol1 1000 5 Recommended Size Increase: 1053 bytes")
        );
        assert_eq!(
            lines.next(),
            Some("volume size -vserver svm1 -volume vol1 -new-size +1053")
        );
        assert_eq!(lines.next(), Some("{"));
        assert!(text.contains("\"style\": \"flexvol\""));
    }

    #[test]
    fn json_report_counts_recommendations() {
        let policy = SizingPolicy::new(Mode::Check, 90).unwrap();
        let findings: Vec<Finding> = [
            finding(VolumeStyle::FlexVol, "under", 10 * GIB, 80 * GIB, 5 * GIB, &policy),
            finding(VolumeStyle::FlexVol, "over", 80 * GIB, 10 * GIB, 5 * GIB, &policy),
        ]
        .into_iter()
        .flatten()
        .collect();

        let report = ReportOutput::new("cluster1", "aggr1", policy, 3, &findings);
        assert_eq!(report.metadata.volumes_scanned, 3);
        assert_eq!(report.metadata.volumes_with_savings, 2);
        assert_eq!(report.metadata.recommendations, 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metadata"]["policy"]["mode"], "check");
        assert_eq!(value["volumes"][0]["resize_command"], serde_json::Value::Null);
        assert_eq!(
            value["volumes"][1]["resize_command"],
            "volume size -vserver svm1 -volume over -new-size +5g"
        );
        assert_eq!(value["volumes"][1]["recommendation"]["unit"], "gigabytes");
        assert_eq!(value["volumes"][1]["volume"]["style"], "flexvol");
    }
}
