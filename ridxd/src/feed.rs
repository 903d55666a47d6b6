//! Security feed ingestion.
//!
//! Reads the candidate universe from CSV. The header row is required and
//! names the columns:
//!
//! ```text
//! code,name,sector,region,market_cap,dividend_amt,occupancy_rate,debt_ratio
//! ```
//!
//! Bad rows are skipped and counted, never fatal. Only an unreadable file or
//! header fails the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ridx_domain::Security;
use tracing::{debug, warn};

use crate::error::{DaemonError, DaemonResult};

/// Result of loading a feed.
#[derive(Debug, Clone, Default)]
pub struct FeedLoad {
    /// Valid records, in feed order
    pub securities: Vec<Security>,
    /// Number of rows skipped
    pub rejected: usize,
}

/// Load securities from a CSV file.
pub fn load_securities(path: &Path) -> DaemonResult<FeedLoad> {
    let file = File::open(path)
        .map_err(|e| DaemonError::Feed(format!("cannot open {}: {}", path.display(), e)))?;

    let load = load_securities_from_reader(file)?;
    debug!(
        path = %path.display(),
        securities = load.securities.len(),
        rejected = load.rejected,
        "Loaded security feed"
    );
    Ok(load)
}

/// Load securities from any CSV source.
pub fn load_securities_from_reader<R: Read>(reader: R) -> DaemonResult<FeedLoad> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    rdr.headers()
        .map_err(|e| DaemonError::Feed(format!("cannot read header row: {}", e)))?;

    let mut load = FeedLoad::default();

    for result in rdr.deserialize::<Security>() {
        let security = match result {
            Ok(security) => security,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!(line, error = %e, "Skipping malformed feed row");
                load.rejected += 1;
                continue;
            }
        };

        if let Err(e) = security.validate() {
            warn!(code = %security.code, error = %e, "Skipping invalid feed row");
            load.rejected += 1;
            continue;
        }

        load.securities.push(security);
    }

    Ok(load)
}

// =============================================================================
// Tests
// =============================================================================
