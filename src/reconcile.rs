//! Metric reconciliation: match a selected conversion rule to the dynamic
//! metric columns a fetch actually returned.
//!
//! The API's dynamic-metrics metadata is not always populated (some
//! endpoints omit it entirely), so resolution degrades from caption
//! matching to well-known flat fields instead of reporting "no data"
//! whenever metadata is absent.

use tracing::debug;

use crate::models::{ConversionRule, DynamicFieldCaptions, ReportRow};

/// Caption substrings identifying the two metrics a rule contributes.
const CONVERSIONS_MARKER: &str = ": conversions (clicks)";
const CPA_MARKER: &str = ": cpa (clicks)";

/// Flat-field fallbacks, in priority order, with the captions to display
/// for each.
const CONVERSION_FALLBACKS: &[(&str, &str)] = &[
    ("cpa_actions_num_from_clicks", "Conversions (Clicks)"),
    ("cpa_actions_num", "Conversions"),
    ("actions_num_from_clicks", "Actions (Clicks)"),
    ("actions", "Actions"),
];
const CPA_FALLBACKS: &[(&str, &str)] = &[("cpa_clicks", "CPA (Clicks)"), ("cpa", "CPA")];

/// A resolved metric: the id to look rows up by, and the caption to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetric {
    pub id: String,
    pub caption: String,
}

/// Outcome of reconciliation. Misses are warnings, never errors: the
/// report still renders, minus the affected column.
#[derive(Debug, Clone, Default)]
pub struct MetricResolution {
    pub conversions: Option<ResolvedMetric>,
    pub cpa: Option<ResolvedMetric>,
    pub conversion_warning: Option<String>,
    pub cpa_warning: Option<String>,
}

/// Resolve the conversion-count and CPA metric ids for `rule`.
///
/// Caption matching scans in the API's field order and stops at the first
/// caption that (case-insensitively) contains both the rule's display name
/// and the metric marker. Note the known ambiguity: a display name that is
/// a substring of another rule's name can match that rule's caption first.
///
/// The flat-field fallback runs only when caption matching yielded no
/// conversion metric; when it runs, it also (re)assigns the CPA metric
/// from the first row's flat fields.
pub fn resolve_metrics(
    rule: &ConversionRule,
    captions: &DynamicFieldCaptions,
    rows: &[ReportRow],
) -> MetricResolution {
    let mut resolution = MetricResolution::default();

    if !captions.is_empty() {
        let name = rule.display_name.to_lowercase();
        for (id, caption) in captions.iter() {
            let lowered = caption.to_lowercase();
            if lowered.contains(&name) && lowered.contains(CONVERSIONS_MARKER) {
                resolution.conversions = Some(ResolvedMetric {
                    id: id.to_owned(),
                    caption: caption.to_owned(),
                });
                break;
            }
        }
        for (id, caption) in captions.iter() {
            let lowered = caption.to_lowercase();
            if lowered.contains(&name) && lowered.contains(CPA_MARKER) {
                resolution.cpa = Some(ResolvedMetric {
                    id: id.to_owned(),
                    caption: caption.to_owned(),
                });
                break;
            }
        }
    }

    if resolution.conversions.is_none() {
        if let Some(first) = rows.first() {
            for (key, caption) in CONVERSION_FALLBACKS {
                if first.flat_f64(key).is_some() {
                    resolution.conversions = Some(ResolvedMetric {
                        id: (*key).to_owned(),
                        caption: (*caption).to_owned(),
                    });
                    break;
                }
            }
            for (key, caption) in CPA_FALLBACKS {
                if first.flat_f64(key).is_some() {
                    resolution.cpa = Some(ResolvedMetric {
                        id: (*key).to_owned(),
                        caption: (*caption).to_owned(),
                    });
                    break;
                }
            }
        }
    }

    if resolution.conversions.is_none() {
        resolution.conversion_warning = Some(format!(
            "no \"Conversions (Clicks)\" metric found for \"{}\"; check API mapping",
            rule.display_name
        ));
    }
    if resolution.cpa.is_none() {
        resolution.cpa_warning = Some(format!(
            "no \"CPA\" metric found for \"{}\"; check API mapping",
            rule.display_name
        ));
    }

    debug!(
        rule = %rule.display_name,
        conversions = ?resolution.conversions.as_ref().map(|m| &m.id),
        cpa = ?resolution.cpa.as_ref().map(|m| &m.id),
        "metric reconciliation"
    );

    resolution
}
