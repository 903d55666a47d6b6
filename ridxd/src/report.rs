//! Compliance reports.
//!
//! - JSON snapshot per day: `ridx_report_YYYYMMDD.json`
//! - XBRL-style XML per day: `ridx_report_YYYYMMDD.xml`
//! - CSV export of the basket (run-once mode)

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use ridx_domain::Basket;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{DaemonError, DaemonResult};

/// Name reported as the filing entity in XBRL output
pub const REPORTING_ENTITY: &str = "ridx Index Fund Manager";

// =============================================================================
// Report Schema
// =============================================================================

/// JSON report document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Date the report covers (YYYY-MM-DD)
    pub report_date: String,
    /// Cycle that produced the basket
    pub cycle_id: Uuid,
    /// Published index value
    pub index_value: f64,
    /// Number of components
    pub component_count: usize,
    /// Components in basket order
    pub components: Vec<ReportComponent>,
}

/// One component line of the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportComponent {
    pub code: String,
    pub name: String,
    pub sector: String,
    pub weight: f64,
    pub market_cap: f64,
    pub dividend: f64,
}

impl IndexReport {
    /// Build the report document for a basket.
    pub fn new(basket: &Basket, index_value: f64, cycle_id: Uuid, date: NaiveDate) -> Self {
        let components = basket
            .iter()
            .map(|c| ReportComponent {
                code: c.security.code.clone(),
                name: c.security.name.clone(),
                sector: c.security.sector.clone(),
                weight: c.weight,
                market_cap: c.security.market_cap,
                dividend: c.security.dividend_amt,
            })
            .collect::<Vec<_>>();

        Self {
            report_date: date.format("%Y-%m-%d").to_string(),
            cycle_id,
            index_value,
            component_count: components.len(),
            components,
        }
    }
}

// =============================================================================
// Reporter
// =============================================================================

/// Writes reports into a directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    report_dir: PathBuf,
}

impl Reporter {
    /// Create a reporter writing into `report_dir`.
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    /// Directory reports are written into
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Path of the file for `date` with the given prefix and extension.
    pub fn dated_path(&self, prefix: &str, date: NaiveDate, extension: &str) -> PathBuf {
        self.report_dir
            .join(format!("{}_{}.{}", prefix, date.format("%Y%m%d"), extension))
    }

    /// Write today's JSON report. Returns the file written.
    pub fn write_json(&self, basket: &Basket, index_value: f64, cycle_id: Uuid) -> DaemonResult<PathBuf> {
        self.write_json_for_date(basket, index_value, cycle_id, Local::now().date_naive())
    }

    /// Write the JSON report for a specific date.
    pub fn write_json_for_date(
        &self,
        basket: &Basket,
        index_value: f64,
        cycle_id: Uuid,
        date: NaiveDate,
    ) -> DaemonResult<PathBuf> {
        fs::create_dir_all(&self.report_dir)?;
        let path = self.dated_path("ridx_report", date, "json");

        let report = IndexReport::new(basket, index_value, cycle_id, date);
        let document = serde_json::to_string_pretty(&report)
            .map_err(|e| DaemonError::Report(format!("cannot serialize report: {}", e)))?;
        fs::write(&path, document)?;

        info!(path = %path.display(), components = report.component_count, "JSON report written");
        Ok(path)
    }

    /// Write today's XBRL report. Returns the file written.
    pub fn write_xbrl(&self, basket: &Basket) -> DaemonResult<PathBuf> {
        let date = Local::now().date_naive();
        fs::create_dir_all(&self.report_dir)?;
        let path = self.dated_path("ridx_report", date, "xml");

        fs::write(&path, render_xbrl(basket, date))?;

        info!(path = %path.display(), "XBRL report written");
        Ok(path)
    }

    /// Export the basket as CSV to `path`.
    pub fn write_csv(&self, basket: &Basket, path: &Path) -> DaemonResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let csv_error = |e: csv::Error| DaemonError::Report(format!("CSV export to {} failed: {}", path.display(), e));

        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        wtr.write_record([
            "Code", "Name", "Sector", "Region", "Weight", "MarketCap", "Dividend", "Occupancy",
        ])
        .map_err(csv_error)?;

        for c in basket {
            let s = &c.security;
            wtr.write_record([
                s.code.clone(),
                s.name.clone(),
                s.sector.clone(),
                s.region.clone(),
                c.weight.to_string(),
                s.market_cap.to_string(),
                s.dividend_amt.to_string(),
                s.occupancy_rate.to_string(),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        info!(path = %path.display(), rows = basket.len(), "CSV export written");
        Ok(())
    }
}

// =============================================================================
// XBRL
// =============================================================================

/// Render an XBRL-style instance document for a basket.
pub fn render_xbrl(basket: &Basket, date: NaiveDate) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<xbrl xmlns=\"http://www.xbrl.org/2003/instance\">\n");
    xml.push_str("  <header>\n");
    xml.push_str(&format!("    <reportingEntity>{}</reportingEntity>\n", escape_xml(REPORTING_ENTITY)));
    xml.push_str(&format!("    <reportDate>{}</reportDate>\n", date.format("%Y-%m-%d")));
    xml.push_str("  </header>\n");
    xml.push_str("  <components>\n");

    for c in basket {
        xml.push_str("    <component>\n");
        xml.push_str(&format!("      <reitCode>{}</reitCode>\n", escape_xml(c.code())));
        xml.push_str(&format!("      <weight>{:.4}%</weight>\n", c.weight * 100.0));
        xml.push_str(&format!("      <sector>{}</sector>\n", escape_xml(c.sector())));
        xml.push_str(&format!("      <region>{}</region>\n", escape_xml(&c.security.region)));
        xml.push_str("    </component>\n");
    }

    xml.push_str("  </components>\n");
    xml.push_str("</xbrl>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ridx_domain::Component;
    use ridx_testkit::SecurityBuilder;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ridx-report-{}", Uuid::now_v7()))
    }

    fn sample_basket() -> Basket {
        Basket::new(vec![
            Component::new(
                SecurityBuilder::new("508001")
                    .name("Alpha Logistics")
                    .sector("Logistics & Warehousing")
                    .market_cap(1_200.0)
                    .dividend(60.0)
                    .build(),
                0.6,
            ),
            Component::new(SecurityBuilder::new("508002").sector("Expressway").build(), 0.4),
        ])
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_json_report_contents() {
        let dir = temp_dir();
        let reporter = Reporter::new(&dir);
        let cycle_id = Uuid::now_v7();

        let path = reporter
            .write_json_for_date(&sample_basket(), 1_120.0, cycle_id, date())
            .unwrap();

        assert_eq!(path, dir.join("ridx_report_20240307.json"));
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["report_date"], "2024-03-07");
        assert_eq!(value["cycle_id"], cycle_id.to_string());
        assert_eq!(value["component_count"], 2);
        assert_eq!(value["components"][0]["code"], "508001");
        assert_eq!(value["components"][0]["dividend"], 60.0);
        assert_eq!(value["components"][1]["sector"], "Expressway");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_csv_export() {
        let dir = temp_dir();
        let reporter = Reporter::new(&dir);
        let path = dir.join("export.csv");

        reporter.write_csv(&sample_basket(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Code,Name,Sector,Region,Weight,MarketCap,Dividend,Occupancy")
        );
        assert_eq!(
            lines.next(),
            Some("508001,Alpha Logistics,Logistics & Warehousing,Other,0.6,1200,60,0.95")
        );
        assert_eq!(lines.count(), 1);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_xbrl_escapes_and_formats() {
        let xml = render_xbrl(&sample_basket(), date());

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<reportDate>2024-03-07</reportDate>"));
        assert!(xml.contains("<sector>Logistics &amp; Warehousing</sector>"));
        assert!(xml.contains("<weight>60.0000%</weight>"));
        assert!(xml.contains("<reitCode>508001</reitCode>"));
        assert_eq!(xml.matches("<component>").count(), 2);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_empty_basket_report() {
        let xml = render_xbrl(&Basket::empty(), date());
        assert!(!xml.contains("<component>"));
    }
}
