//! Report fetching and the fetch → reconcile → project pipeline.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config;
use crate::error::{RealizeError, Result};
use crate::export::{self, ExportOptions};
use crate::models::report::ReportApiResponse;
use crate::models::{
    Account, Breakdown, ConversionRule, DynamicFieldCaptions, ReportResult, ReportRow, SitePage,
    SubAccountSpendRow,
};
use crate::project::{self, Column, ProjectOptions, ProjectedRow, Totals};
use crate::reconcile::{resolve_metrics, MetricResolution};
use crate::render::{build_markdown, RenderConfig, RenderedReport};
use crate::stream;

// ---------------------------------------------------------------------------
// ReportRequest
// ---------------------------------------------------------------------------

/// Parameters of one report fetch.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Account slug used in API paths.
    pub account: String,
    pub breakdown: Breakdown,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub conversion_rule_id: Option<String>,
    /// Only sent alongside a conversion rule id.
    pub include_multi_conversions: bool,
}

impl ReportRequest {
    pub fn new(account: &str, breakdown: Breakdown, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            account: account.to_owned(),
            breakdown,
            start,
            end,
            conversion_rule_id: None,
            include_multi_conversions: false,
        }
    }

    pub fn with_conversion_rule(mut self, rule_id: &str, include_multi: bool) -> Self {
        self.conversion_rule_id = Some(rule_id.to_owned());
        self.include_multi_conversions = include_multi;
        self
    }

    /// Date-range validation, run before any network call. Invalid ranges
    /// error out; they are never silently corrected.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.start > self.end {
            return Err(RealizeError::InvalidArgument(
                "start date cannot be after end date".into(),
            ));
        }
        let yesterday = today.pred_opt().unwrap_or(today);
        if self.end > yesterday {
            return Err(RealizeError::InvalidArgument(
                "end date cannot be later than yesterday".into(),
            ));
        }
        Ok(())
    }

    /// The item breakdown reports at content level; everything else goes
    /// through the campaign summary.
    pub fn endpoint(&self) -> &'static str {
        if self.breakdown == Breakdown::Item {
            "top-campaign-content"
        } else {
            "campaign-summary"
        }
    }

    /// Request path relative to the API root, with the breakdown embedded.
    pub fn path(&self) -> String {
        format!(
            "{}/reports/{}/dimensions/{}",
            self.account,
            self.endpoint(),
            self.breakdown.as_str()
        )
    }

    /// Query parameters, matching the upstream contract bit for bit.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("start_date", self.start.format("%Y-%m-%d").to_string()),
            ("end_date", self.end.format("%Y-%m-%d").to_string()),
        ];
        if self.breakdown == Breakdown::Item {
            query.push(("dimensions", self.breakdown.as_str().to_owned()));
        }
        if let Some(rule_id) = &self.conversion_rule_id {
            query.push(("conversion_rule_id", rule_id.clone()));
            if self.include_multi_conversions {
                query.push(("include_multi_conversions", "true".to_owned()));
            }
        }
        query
    }
}

// ---------------------------------------------------------------------------
// ReportQuery
// ---------------------------------------------------------------------------

/// Query interface for spend/conversion reports.
pub struct ReportQuery<'a> {
    sdk: &'a crate::RealizeSdk,
}

impl<'a> ReportQuery<'a> {
    pub fn new(sdk: &'a crate::RealizeSdk) -> Self {
        Self { sdk }
    }

    // -- Buffered fetch ----------------------------------------------------

    /// Fetch and normalize one report.
    ///
    /// Bodies over the byte ceiling fail fast; row counts over the row
    /// ceiling are truncated and flagged. Rows without a numeric `spent`
    /// are dropped and counted.
    pub fn fetch(&self, request: &ReportRequest) -> Result<ReportResult> {
        request.validate(chrono::Local::now().date_naive())?;

        let response = self.sdk.client.get(&request.path(), &request.query())?;

        if let Some(length) = response.content_length() {
            if length > config::MAX_RESPONSE_BYTES {
                return Err(RealizeError::PayloadTooLarge {
                    limit_bytes: config::MAX_RESPONSE_BYTES,
                });
            }
        }

        let mut body = Vec::new();
        response
            .take(config::MAX_RESPONSE_BYTES + 1)
            .read_to_end(&mut body)?;
        if body.len() as u64 > config::MAX_RESPONSE_BYTES {
            return Err(RealizeError::PayloadTooLarge {
                limit_bytes: config::MAX_RESPONSE_BYTES,
            });
        }

        parse_report_body(&body, request.breakdown)
    }

    // -- Streamed site pages -----------------------------------------------

    /// Fixed-size page of the site breakdown, streamed.
    ///
    /// The response's `results` array is parsed incrementally and cut hard
    /// at the internal row cap: the deserializer is aborted and the
    /// response dropped rather than drained. Pages outside the supported
    /// range are an error; a page past the available rows is an empty page.
    pub fn site_breakdown_page(
        &self,
        account: &str,
        start: NaiveDate,
        end: NaiveDate,
        conversion_rule_id: Option<&str>,
        include_multi_conversions: bool,
        page: usize,
    ) -> Result<SitePage> {
        if !(1..=config::SITE_MAX_PAGE).contains(&page) {
            return Err(RealizeError::PageOutOfRange {
                page,
                max: config::SITE_MAX_PAGE,
            });
        }

        let mut request = ReportRequest::new(account, Breakdown::Site, start, end);
        if let Some(rule_id) = conversion_rule_id {
            request = request.with_conversion_rule(rule_id, include_multi_conversions);
        }
        request.validate(chrono::Local::now().date_naive())?;

        let response = self.sdk.client.get(&request.path(), &request.query())?;
        paginate_site_stream(response, page)
    }

    // -- Network sub-account spend -----------------------------------------

    /// Per-sub-account ("content provider") spend for a network.
    pub fn sub_account_breakdown(
        &self,
        network_account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SubAccountSpendRow>> {
        let request = ReportRequest::new(network_account_id, Breakdown::Day, start, end);
        request.validate(chrono::Local::now().date_naive())?;

        #[derive(Deserialize)]
        struct SubAccountReportResponse {
            #[serde(default)]
            results: Vec<SubAccountSpendRow>,
        }

        let path = format!(
            "{network_account_id}/reports/campaign-summary/dimensions/content_provider_breakdown"
        );
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("orderBy", "-spent".to_owned()),
        ];
        let response: SubAccountReportResponse = self.sdk.client.get_json(&path, &query)?;
        Ok(response.results)
    }

    // -- Full pipeline -----------------------------------------------------

    /// Run the whole pipeline for one breakdown: fetch, reconcile the
    /// selected rule's metrics, project, aggregate, render.
    ///
    /// The site breakdown goes through the streamed pager (first page) and
    /// therefore carries no dynamic-field metadata; reconciliation falls
    /// back to flat fields there.
    pub fn run(
        &self,
        account: &Account,
        breakdown: Breakdown,
        start: NaiveDate,
        end: NaiveDate,
        rule: Option<&ConversionRule>,
        include_multi_conversions: bool,
    ) -> Result<ReportArtifact> {
        let mut request = ReportRequest::new(&account.account_id, breakdown, start, end);
        if let Some(rule) = rule {
            request = request.with_conversion_rule(&rule.id, include_multi_conversions);
        }

        let result = if breakdown == Breakdown::Site {
            let page = self.site_breakdown_page(
                &account.account_id,
                start,
                end,
                rule.map(|r| r.id.as_str()),
                include_multi_conversions,
                1,
            )?;
            ReportResult {
                rows: page.rows,
                dynamic_field_captions: DynamicFieldCaptions::new(),
                truncated: page.capped,
                dropped_rows: 0,
            }
        } else {
            self.fetch(&request)?
        };

        let resolution =
            rule.map(|r| resolve_metrics(r, &result.dynamic_field_captions, &result.rows));

        let mut opts = ProjectOptions::default();
        if breakdown == Breakdown::Item {
            opts.clicks_metric_id = Some("clicks".to_owned());
            opts.impressions_metric_id = Some("impressions".to_owned());
        }
        if let Some(resolution) = &resolution {
            opts.conversions = resolution.conversions.clone();
            opts.cpa = resolution.cpa.clone();
        }
        opts.cpa_goal = rule.and_then(|r| r.cpa_goal);

        let columns = project::column_schema(breakdown, &opts);
        let rows = project::project_rows(&result.rows, breakdown, &opts);
        let totals = project::totals(
            &result.rows,
            breakdown,
            opts.conversions.as_ref().map(|m| m.id.as_str()),
        );

        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        let rendered = build_markdown(
            &RenderConfig {
                account_name: &account.name,
                account_id: account.id,
                currency: account.currency.as_deref().unwrap_or("USD"),
                breakdown,
                start_date: &start_str,
                end_date: &end_str,
                conversion_rule_name: rule.map(|r| r.display_name.as_str()),
                resolution: resolution.as_ref(),
                cpa_goal: opts.cpa_goal,
            },
            &columns,
            &rows,
            &totals,
        );

        Ok(ReportArtifact {
            result,
            resolution,
            columns,
            rows,
            totals,
            rendered,
        })
    }

    // -- Spreadsheet export ------------------------------------------------

    /// Export several breakdowns in one pass: for each breakdown, fetch →
    /// reconcile → project, accumulating per-breakdown sheets, then a
    /// single terminal write step. Returns the written paths.
    pub fn export_bundle(&self, job: &ExportJob<'_>) -> Result<Vec<PathBuf>> {
        let mut sheets: Vec<(Breakdown, Vec<Column>, Vec<ProjectedRow>)> = Vec::new();

        for &breakdown in job.breakdowns {
            let artifact = self.run(
                job.account,
                breakdown,
                job.start,
                job.end,
                job.rule,
                job.include_multi_conversions,
            )?;
            if artifact.result.truncated {
                warn!(%breakdown, "export sheet truncated at row ceiling");
            }
            sheets.push((breakdown, artifact.columns, artifact.rows));
        }

        let start_str = job.start.format("%Y-%m-%d").to_string();
        let end_str = job.end.format("%Y-%m-%d").to_string();
        export::write_bundle(
            job.dir,
            &sheets,
            &ExportOptions {
                account_name: Some(&job.account.name),
                start_date: Some(&start_str),
                end_date: Some(&end_str),
            },
        )
    }
}

/// Inputs of a multi-breakdown export.
#[derive(Debug, Clone)]
pub struct ExportJob<'a> {
    pub account: &'a Account,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub breakdowns: &'a [Breakdown],
    pub rule: Option<&'a ConversionRule>,
    pub include_multi_conversions: bool,
    pub dir: &'a Path,
}

/// Everything one pipeline run produces, from raw rows to rendered
/// markdown. The projector output (`columns` + `rows`) is what the
/// spreadsheet writer consumes.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub result: ReportResult,
    pub resolution: Option<MetricResolution>,
    pub columns: Vec<Column>,
    pub rows: Vec<ProjectedRow>,
    pub totals: Totals,
    pub rendered: RenderedReport,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Parse and normalize a buffered report body.
pub fn parse_report_body(body: &[u8], breakdown: Breakdown) -> Result<ReportResult> {
    let parsed: ReportApiResponse = serde_json::from_slice(body)?;
    Ok(normalize(parsed, breakdown))
}

/// Stream the `results` array out of a site-breakdown response, cut it at
/// the row cap, and slice out the requested page. The reader is dropped on
/// return, tearing the transport down when the cap aborted the parse.
pub fn paginate_site_stream<R: Read>(reader: R, page: usize) -> Result<SitePage> {
    if !(1..=config::SITE_MAX_PAGE).contains(&page) {
        return Err(RealizeError::PageOutOfRange {
            page,
            max: config::SITE_MAX_PAGE,
        });
    }

    let capped = stream::read_capped_results(reader, config::SITE_ROW_CAP)?;
    if capped.capped {
        debug!(cap = config::SITE_ROW_CAP, "site stream cut at cap");
    }

    let rows: Vec<ReportRow> = capped
        .rows
        .into_iter()
        .filter_map(|raw| ReportRow::from_raw(raw, Breakdown::Site))
        .collect();

    let start_index = (page - 1) * config::SITE_PAGE_SIZE;
    let page_rows: Vec<ReportRow> = rows
        .into_iter()
        .skip(start_index)
        .take(config::SITE_PAGE_SIZE)
        .collect();

    Ok(SitePage {
        page,
        rows: page_rows,
        capped: capped.capped,
    })
}

/// Flatten the raw API response: caption map in API order, dynamic fields
/// folded into each row, malformed rows dropped, row ceiling applied.
fn normalize(parsed: ReportApiResponse, breakdown: Breakdown) -> ReportResult {
    let mut captions = DynamicFieldCaptions::new();
    if let Some(fields) = parsed.metadata.and_then(|m| m.dynamic_fields) {
        for field in fields {
            captions.push(field.id, field.caption);
        }
    }

    let raw_count = parsed.results.len();
    let mut rows: Vec<ReportRow> = parsed
        .results
        .into_iter()
        .filter_map(|raw| ReportRow::from_raw(raw, breakdown))
        .collect();
    let dropped_rows = raw_count - rows.len();
    if dropped_rows > 0 {
        debug!(dropped_rows, "dropped rows failing shape validation");
    }

    let truncated = rows.len() > config::MAX_REPORT_ROWS;
    if truncated {
        warn!(
            total = rows.len(),
            ceiling = config::MAX_REPORT_ROWS,
            "report truncated at row ceiling"
        );
        rows.truncate(config::MAX_REPORT_ROWS);
    }

    ReportResult {
        rows,
        dynamic_field_captions: captions,
        truncated,
        dropped_rows,
    }
}
