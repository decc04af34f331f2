//! Query modules for the Realize SDK.
//!
//! Each module provides a query struct that borrows from the
//! [`RealizeSdk`](crate::RealizeSdk) (shared HTTP client, caches and local
//! store) and exposes methods returning `Result<T>` with typed payloads.

pub mod accounts;
pub mod campaigns;
pub mod conversion_rules;
pub mod reports;

pub use accounts::AccountQuery;
pub use campaigns::CampaignQuery;
pub use conversion_rules::ConversionRuleQuery;
pub use reports::{ExportJob, ReportArtifact, ReportQuery, ReportRequest};
