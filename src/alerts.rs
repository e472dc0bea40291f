use crate::attribution::ReviewChanges;
use crate::patch::{PatchError, PatchParser};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Vale's JSON output: file path to the alerts reported for it
pub type AlertReport = BTreeMap<String, Vec<Value>>;

/// Key of the 1-indexed line number in a Vale alert
const LINE_KEY: &str = "Line";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Invalid Vale report: {0}")]
    InvalidReport(#[from] serde_json::Error),
    #[error("Alert in {path} has no usable Line field")]
    MissingLine { path: String },
    #[error(transparent)]
    Patch(#[from] PatchError),
}

pub fn parse_report(json: &str) -> Result<AlertReport, AlertError> {
    Ok(serde_json::from_str(json)?)
}

/// Keep the alerts that sit on lines added by the review
///
/// Alerts are passed through untouched; files left without alerts are dropped.
pub fn filter_report<P: PatchParser>(
    report: AlertReport,
    changes: &ReviewChanges<P>,
) -> Result<AlertReport, AlertError> {
    let mut kept = AlertReport::new();
    let mut total = 0;
    let mut retained = 0;

    for (path, alerts) in report {
        let normalized = normalize_path(&path);
        if !changes.touches(normalized) {
            debug!("Dropping {} alerts for untouched file {}", alerts.len(), path);
            total += alerts.len();
            continue;
        }

        let mut file_alerts = Vec::new();
        for alert in alerts {
            total += 1;
            let line = alert_line(&alert).ok_or_else(|| AlertError::MissingLine { path: path.clone() })?;
            if changes.is_line_added(normalized, line)? {
                file_alerts.push(alert);
            } else {
                debug!("Dropping alert on pre-existing line {}:{}", path, line);
            }
        }

        retained += file_alerts.len();
        if !file_alerts.is_empty() {
            kept.insert(path, file_alerts);
        }
    }

    if total > 0 && retained == 0 {
        warn!("None of the {} alerts are on lines added by this review", total);
    }
    info!("Kept {} of {} alerts", retained, total);
    Ok(kept)
}

fn alert_line(alert: &Value) -> Option<u32> {
    alert.get(LINE_KEY)?.as_u64()?.try_into().ok()
}

/// Vale may report paths relative to the working directory with a `./` prefix
fn normalize_path(path: &str) -> &str {
    path.trim_start_matches("./")
}
