use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use twin_numbers::*;

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::args::Args;
use crate::audit::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_results;
pub mod report_writer;

#[derive(Debug, Snafu)]
pub enum AuditError {
    #[snafu(display("Input directory {path} not found"))]
    MissingInputDir { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error rendering report {name}"))]
    RenderingJson {
        source: serde_json::Error,
        name: String,
    },
    #[snafu(display("Error writing report {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error listing directory {path}"))]
    ListingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    Analysis { source: AnalysisErrors },
    #[snafu(display("Difference detected between computed report and reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Runs the analyses selected on the command line.
pub fn run_audit(args: &Args) -> AuditResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);
    let written = run_with_settings(&settings)?;
    info!("{} reports written", written.len());
    Ok(())
}

/// Computes every selected report, then writes them all. Nothing is written
/// when an input directory is missing.
pub fn run_with_settings(settings: &AuditSettings) -> AuditResult<Vec<PathBuf>> {
    for dir in [&settings.mp_dir, &settings.pl_dir] {
        ensure!(
            dir.is_dir(),
            MissingInputDirSnafu {
                path: dir.display().to_string()
            }
        );
    }
    let rules = &settings.rules;

    let mut rendered: Vec<(String, String)> = Vec::new();
    let mut anomaly_report_js: Option<String> = None;

    if settings.mode.runs_anomalies() {
        let provinces = io_results::load_province_map(&settings.province_file);
        let report = detect_anomalies(&settings.mp_dir, &settings.pl_dir, &provinces, rules)?;
        let docs = report_writer::render_anomaly_reports(&report, rules)?;
        anomaly_report_js = docs
            .iter()
            .find(|(name, _)| name == report_writer::ANOMALY_FILE)
            .map(|(_, js)| js.clone());
        rendered.extend(docs);
        print_anomaly_summary(&report);
    }

    if settings.mode.runs_nationwide() {
        let tally = io_results::load_nationwide_tally(&settings.mp_dir, &settings.pl_dir)?;
        let summary = tally.summarize(rules);
        rendered.push(report_writer::render_nationwide(&summary)?);
        print_nationwide_summary(&summary);
    }

    let written = report_writer::write_reports(&settings.output_dir, &rendered)?;

    if let Some(reference) = &settings.reference {
        let computed = match &anomaly_report_js {
            Some(js) => js,
            None => whatever!("A reference was given but the anomaly report was not computed"),
        };
        check_reference(reference, computed)?;
    }

    Ok(written)
}

fn detect_anomalies(
    mp_dir: &Path,
    pl_dir: &Path,
    provinces: &ProvinceTable,
    rules: &AnalysisRules,
) -> AuditResult<AnomalyReport> {
    let area_codes = io_results::list_area_codes(mp_dir)?;
    info!(
        "Scanning {} areas from {} and {}",
        area_codes.len(),
        mp_dir.display(),
        pl_dir.display()
    );
    let mut detector = TwinDetector::new(rules, provinces);
    for area_code in area_codes.iter() {
        match io_results::load_area_pair(mp_dir, pl_dir, area_code) {
            Ok(Some(area)) => {
                detector.add_area(&area);
            }
            Ok(None) => {
                debug!("detect_anomalies: {}: no party-list document", area_code);
            }
            Err(e) => {
                warn!("Error reading area {}: {}", area_code, e);
                detector.skip_area(area_code);
            }
        }
    }
    Ok(aggregate(detector.finish()))
}

fn check_reference(reference: &Path, computed: &str) -> AuditResult<()> {
    let path = reference.display().to_string();
    let contents = fs::read_to_string(reference).context(OpeningJsonSnafu { path: &path })?;
    let reference_js: serde_json::Value =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path: &path })?;
    // Both sides go through the same value type, so key order does not matter.
    let computed_js: serde_json::Value =
        serde_json::from_str(computed).context(ParsingJsonSnafu {
            path: report_writer::ANOMALY_FILE,
        })?;
    if reference_js != computed_js {
        warn!("Found differences with the reference report");
        let pretty_reference = report_writer::to_pretty(&reference_js, "reference")?;
        let pretty_computed = report_writer::to_pretty(&computed_js, "computed")?;
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("The anomaly report matches the reference {}", path);
    Ok(())
}

fn print_anomaly_summary(report: &AnomalyReport) {
    println!(
        "\nAnalysis complete. Found {} anomalies in {} areas.",
        report.anomalies.len(),
        report.areas_processed
    );

    println!("\n=== Top 5 Provinces by Anomalies ===");
    for p in report.provinces.iter().take(5) {
        println!(
            "{}: {} areas, {} ghost votes",
            p.name, p.count, p.total_ghost_votes
        );
    }

    println!("\n=== Top 5 MP Parties involved ===");
    for p in report.parties.iter().take(5) {
        println!(
            "{}: {} areas, {} ghost votes",
            p.party_code, p.count, p.total_ghost_votes
        );
    }

    println!("\n=== Top 10 Anomalies (Sorted by Twin Party Votes) ===");
    println!(
        "{:<6} | {:<6} | {:<12} | {:<10} | {:<14} | {:<14}",
        "Area", "MP Num", "Twin Party", "Twin Rank", "Twin PL Votes", "Twin MP Votes"
    );
    println!("{}", "-".repeat(80));
    for a in report.anomalies.iter().take(10) {
        let r = &a.record;
        println!(
            "{:<6} | {:<6} | {:<12} | {:<10} | {:<14} | {:<14}",
            r.area_code,
            r.winner_number,
            r.twin_party,
            r.twin_rank,
            r.twin_votes,
            r.twin_candidate_votes
        );
    }
}

fn print_nationwide_summary(summary: &NationwideSummary) {
    println!("\n--- Nationwide Party Vote Analysis (MP vs PL) ---");
    for (label, g) in [
        ("Group A: Lucky Numbers", &summary.lucky),
        ("Group B: Excluded", &summary.excluded),
        ("Group C: Other Parties", &summary.other),
    ] {
        println!("\n{}:", label);
        println!("  Parties Included: {:?}", g.parties);
        println!("  Total Parties: {}", g.count);
        println!("  Total PL Votes: {}", g.pl_total);
        println!("  Total MP Votes: {}", g.mp_total);
        println!("  Average PL Votes/Party: {:.2}", g.average_pl);
        println!("  Group Ratio (PL/MP): {:.2}x", g.ratio);
    }
    for p in summary.parties.iter() {
        if let (Some(ratio), Some(v)) = (p.ratio, p.verdict) {
            if v != Verdict::Normal {
                println!(
                    "  {:<12} | PL {:<10} | MP {:<10} | {:.1}x | {}",
                    p.party_code,
                    p.pl_total,
                    p.mp_total,
                    ratio,
                    report_writer::verdict_label(v)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JSValue;

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn scratch_dir(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "twinaudit-{}-{}",
            test_name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn args(out: &Path) -> Args {
        Args {
            config: None,
            mp_dir: Some(testdata("basic/mp")),
            pl_dir: Some(testdata("basic/pl")),
            provinces: Some(testdata("basic/common-data.json")),
            out: Some(out.display().to_string()),
            exclude: None,
            max_rank: None,
            mode: None,
            reference: None,
            verbose: false,
        }
    }

    fn read_js(dir: &Path, name: &str) -> JSValue {
        let contents = fs::read_to_string(dir.join(name)).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[test]
    fn basic_reports() {
        let _ = env_logger::builder().is_test(true).try_init();
        let out = scratch_dir("basic_reports");
        let settings = resolve_settings(&args(&out)).unwrap();
        let written = run_with_settings(&settings).unwrap();
        assert_eq!(written.len(), 5);

        let report = read_js(&out, report_writer::ANOMALY_FILE);
        let anomalies = report["anomalies"].as_array().unwrap();
        assert_eq!(anomalies.len(), 2);
        assert_eq!(report["metadata"]["total_areas_flagged"], 2);
        // 400101 has no party-list document, 500101 is corrupt.
        assert_eq!(report["metadata"]["areas_processed"], 5);
        assert_eq!(report["metadata"]["areas_skipped"], 1);

        let first = &anomalies[0];
        assert_eq!(first["area_code"], "100101");
        assert_eq!(first["mp_winner_number"], 5);
        assert_eq!(first["pl_twin_party"], "PARTY-0005");
        assert_eq!(first["pl_twin_rank"], 3);
        assert_eq!(first["pl_twin_votes"], 4200);
        assert_eq!(first["mp_twin_candidate_votes"], 812);
        assert_eq!(first["ratio_pl_to_mp"], 0.14);
        assert_eq!(first["avg_non_twin_votes"], 55.0);
        assert_eq!(first["excess_votes"], 4145.0);
        assert_eq!(first["pct_increase"], 7536.4);
        assert_eq!(first["province_name"], "กรุงเทพมหานคร");
        assert_eq!(anomalies[1]["area_code"], "200101");

        let comparison = read_js(&out, report_writer::COMPARISON_FILE);
        let five = comparison["comparison_stats"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["party_number"] == 5)
            .unwrap()
            .clone();
        assert_eq!(five["avg_twin_votes"], 4050.0);
        assert_eq!(five["avg_non_twin_votes"], 55.0);
        assert_eq!(five["diff"], 3995.0);
        assert_eq!(five["twin_area_count"], 2);
        assert_eq!(five["non_twin_area_count"], 3);

        // Non-ASCII text is written as is.
        let raw = fs::read_to_string(out.join(report_writer::PROVINCE_FILE)).unwrap();
        assert!(raw.contains("ชลบุรี"));
        assert!(!raw.contains("\\u"));
    }

    #[test]
    fn ghost_votes_agree_across_rollups() {
        let out = scratch_dir("ghost_votes");
        let settings = resolve_settings(&args(&out)).unwrap();
        run_with_settings(&settings).unwrap();

        let sum = |js: &JSValue, list: &str, field: &str| -> u64 {
            js[list]
                .as_array()
                .unwrap()
                .iter()
                .map(|x| x[field].as_u64().unwrap())
                .sum()
        };
        let anomalies = sum(
            &read_js(&out, report_writer::ANOMALY_FILE),
            "anomalies",
            "pl_twin_votes",
        );
        let provinces = sum(
            &read_js(&out, report_writer::PROVINCE_FILE),
            "province_stats",
            "total_ghost_votes",
        );
        let parties = sum(
            &read_js(&out, report_writer::PARTY_FILE),
            "mp_party_stats",
            "total_ghost_votes",
        );
        assert_eq!(anomalies, 8100);
        assert_eq!(provinces, anomalies);
        assert_eq!(parties, anomalies);
    }

    #[test]
    fn nationwide_groups() {
        let out = scratch_dir("nationwide");
        let mut a = args(&out);
        a.mode = Some("nationwide".to_string());
        let settings = resolve_settings(&a).unwrap();
        let written = run_with_settings(&settings).unwrap();
        assert_eq!(written.len(), 1);

        let js = read_js(&out, report_writer::NATIONWIDE_FILE);
        assert_eq!(js["groups"]["B"]["parties"], serde_json::json!([9]));
        let parties = js["raw_parties"].as_array().unwrap();
        let numbers: Vec<u64> = parties
            .iter()
            .map(|p| p["party_number"].as_u64().unwrap())
            .collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
        // PARTY-0042 only appears in a party-list document.
        let p42 = parties.iter().find(|p| p["party_number"] == 42).unwrap();
        assert_eq!(p42["ratio"], JSValue::Null);
        assert_eq!(p42["mp_total_votes"], 0);
        assert_eq!(js["groups"]["C"]["parties"], serde_json::json!([42, 97, 98, 99]));
    }

    #[test]
    fn reruns_are_byte_identical() {
        let out1 = scratch_dir("rerun1");
        let out2 = scratch_dir("rerun2");
        let first = run_with_settings(&resolve_settings(&args(&out1)).unwrap()).unwrap();
        run_with_settings(&resolve_settings(&args(&out2)).unwrap()).unwrap();
        for p in first.iter() {
            let name = p.file_name().unwrap();
            assert_eq!(
                fs::read(p).unwrap(),
                fs::read(out2.join(name)).unwrap(),
                "{:?}",
                name
            );
        }
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        let out = scratch_dir("missing_input");
        let mut a = args(&out);
        a.mp_dir = Some(testdata("does-not-exist"));
        let settings = resolve_settings(&a).unwrap();
        let res = run_with_settings(&settings);
        assert!(matches!(res, Err(AuditError::MissingInputDir { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn reference_check() {
        let out = scratch_dir("reference");
        run_with_settings(&resolve_settings(&args(&out)).unwrap()).unwrap();
        let reference = out.join(report_writer::ANOMALY_FILE);

        let out2 = scratch_dir("reference_ok");
        let mut a = args(&out2);
        a.reference = Some(reference.display().to_string());
        assert!(run_with_settings(&resolve_settings(&a).unwrap()).is_ok());

        // A stricter rank cutoff drops 100101.
        let out3 = scratch_dir("reference_diff");
        let mut a = args(&out3);
        a.reference = Some(reference.display().to_string());
        a.max_rank = Some(2);
        let res = run_with_settings(&resolve_settings(&a).unwrap());
        assert!(matches!(res, Err(AuditError::ReferenceMismatch { .. })));
    }

    #[test]
    fn config_file() {
        let out = scratch_dir("config_file");
        let a = Args {
            config: Some(testdata("basic/config.json")),
            mp_dir: None,
            pl_dir: None,
            provinces: None,
            out: Some(out.display().to_string()),
            exclude: None,
            max_rank: None,
            mode: None,
            reference: None,
            verbose: false,
        };
        let settings = resolve_settings(&a).unwrap();
        assert_eq!(settings.mp_dir, PathBuf::from(testdata("basic/mp")));
        assert_eq!(settings.mode, Mode::Anomalies);
        assert!(settings.rules.is_excluded(5));
        assert!(!settings.rules.is_excluded(11));
        run_with_settings(&settings).unwrap();

        // 5 is excluded by the configuration: nothing is flagged.
        let report = read_js(&out, report_writer::ANOMALY_FILE);
        assert_eq!(report["anomalies"].as_array().unwrap().len(), 0);
        assert!(!out.join(report_writer::NATIONWIDE_FILE).exists());
    }
}
