//! Default target browser selection

use crate::database::CompatDatabase;
use crate::types::{ReleaseStatus, TargetBrowser};

/// Browsers checked when the caller names none, in report order
pub const DEFAULT_BROWSER_IDS: [&str; 8] = [
    "firefox",
    "firefox_android",
    "chrome",
    "chrome_android",
    "safari",
    "safari_ios",
    "edge",
    "edge_mobile",
];

/// Release channels that are still shipped to users
pub const DEFAULT_RELEASE_STATUSES: [ReleaseStatus; 4] = [
    ReleaseStatus::Esr,
    ReleaseStatus::Current,
    ReleaseStatus::Beta,
    ReleaseStatus::Nightly,
];

/// Every maintained release of the default browsers known to `database`
pub fn default_target_browsers(database: &CompatDatabase) -> Vec<TargetBrowser> {
    let mut targets = Vec::new();

    for id in DEFAULT_BROWSER_IDS {
        let Some(browser) = database.browser(id) else {
            log::debug!("Default browser '{}' is not in the snapshot", id);
            continue;
        };

        for (version, release) in &browser.releases {
            if !DEFAULT_RELEASE_STATUSES.contains(&release.status) {
                continue;
            }
            let mut target = TargetBrowser::new(id, version.as_str()).with_name(&browser.name);
            target.status = Some(release.status);
            targets.push(target);
        }
    }

    targets
}
