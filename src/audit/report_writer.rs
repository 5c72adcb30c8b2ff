// The JSON documents written after a run. The field order of the structs
// below is the field order of the files.

use serde::Serialize;

use crate::audit::*;
use twin_numbers::aggregate::round_to;

pub const ANOMALY_FILE: &str = "anomaly_report.json";
pub const PROVINCE_FILE: &str = "province_stats.json";
pub const PARTY_FILE: &str = "mp_party_stats.json";
pub const COMPARISON_FILE: &str = "party_comparison_stats.json";
pub const NATIONWIDE_FILE: &str = "nationwide_party_stats.json";

const DESCRIPTION: &str =
    "Anomaly detection report based on the twin number hypothesis (buy 1 get 2)";

#[derive(Debug, Serialize)]
struct Metadata {
    description: String,
    criteria: String,
    total_areas_flagged: usize,
    areas_processed: u64,
    areas_skipped: u64,
}

#[derive(Debug, Serialize)]
struct AnomalyJS<'a> {
    area_code: &'a str,
    mp_winner_number: u32,
    mp_winner_party: &'a str,
    mp_votes: u64,
    pl_twin_party: &'a str,
    pl_twin_rank: u32,
    pl_twin_votes: u64,
    mp_twin_candidate_votes: u64,
    ratio_pl_to_mp: Option<f64>,
    anomaly_score: u64,
    province_id: &'a str,
    province_name: &'a str,
    avg_non_twin_votes: f64,
    excess_votes: f64,
    pct_increase: f64,
}

#[derive(Debug, Serialize)]
struct AnomalyReportJS<'a> {
    metadata: Metadata,
    anomalies: Vec<AnomalyJS<'a>>,
}

#[derive(Debug, Serialize)]
struct ProvinceAreaJS<'a> {
    area_code: &'a str,
    ghost_votes: u64,
    mp_winner_party: &'a str,
    mp_number: u32,
}

#[derive(Debug, Serialize)]
struct ProvinceJS<'a> {
    id: &'a str,
    name: &'a str,
    count: u64,
    total_ghost_votes: u64,
    areas: Vec<ProvinceAreaJS<'a>>,
}

#[derive(Debug, Serialize)]
struct ProvinceStatsJS<'a> {
    province_stats: Vec<ProvinceJS<'a>>,
}

#[derive(Debug, Serialize)]
struct BreakdownJS<'a> {
    name: &'a str,
    count: u64,
    votes: u64,
}

#[derive(Debug, Serialize)]
struct PartyJS<'a> {
    party_code: &'a str,
    count: u64,
    total_ghost_votes: u64,
    provinces: Vec<BreakdownJS<'a>>,
}

#[derive(Debug, Serialize)]
struct PartyStatsJS<'a> {
    mp_party_stats: Vec<PartyJS<'a>>,
}

#[derive(Debug, Serialize)]
struct ComparisonJS<'a> {
    party_code: &'a str,
    party_number: u32,
    avg_twin_votes: f64,
    avg_non_twin_votes: f64,
    diff: f64,
    twin_area_count: usize,
    non_twin_area_count: usize,
}

#[derive(Debug, Serialize)]
struct ComparisonStatsJS<'a> {
    comparison_stats: Vec<ComparisonJS<'a>>,
}

#[derive(Debug, Serialize)]
struct GroupJS<'a> {
    pl_total: u64,
    mp_total: u64,
    average_pl: f64,
    ratio: f64,
    count: u64,
    parties: &'a [u32],
}

#[derive(Debug, Serialize)]
struct GroupsJS<'a> {
    #[serde(rename = "A")]
    lucky: GroupJS<'a>,
    #[serde(rename = "B")]
    excluded: GroupJS<'a>,
    #[serde(rename = "C")]
    other: GroupJS<'a>,
}

#[derive(Debug, Serialize)]
struct PartyVotesJS<'a> {
    party_number: u32,
    party_code: &'a str,
    /// Same as `pl_total_votes`, kept for older readers.
    total_votes: u64,
    pl_total_votes: u64,
    mp_total_votes: u64,
    ratio: Option<f64>,
    verdict: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct NationwideJS<'a> {
    groups: GroupsJS<'a>,
    raw_parties: Vec<PartyVotesJS<'a>>,
}

pub fn verdict_label(v: Verdict) -> &'static str {
    match v {
        Verdict::Normal => "normal",
        Verdict::Suspicious => "suspicious",
        Verdict::Severe => "severe",
    }
}

/// Human-readable statement of the active detection rules.
pub fn criteria(rules: &AnalysisRules) -> String {
    let excluded: Vec<String> = rules
        .excluded_numbers
        .iter()
        .map(|n| n.to_string())
        .collect();
    let range = if excluded.is_empty() {
        format!("1-{}", rules.max_winner_number)
    } else {
        format!("1-{}, excl {}", rules.max_winner_number, excluded.join(", "))
    };
    format!(
        "Winner MP number ({}) matches a top {} party-list number (different party)",
        range, rules.max_twin_rank
    )
}

/// Pretty JSON, UTF-8 text as is, with a final newline.
pub fn to_pretty<T: Serialize + ?Sized>(value: &T, name: &str) -> AuditResult<String> {
    let mut s = serde_json::to_string_pretty(value).context(RenderingJsonSnafu { name })?;
    s.push('\n');
    Ok(s)
}

/// The four documents of the anomaly analysis, as (file name, contents).
pub fn render_anomaly_reports(
    report: &AnomalyReport,
    rules: &AnalysisRules,
) -> AuditResult<Vec<(String, String)>> {
    let anomalies: Vec<AnomalyJS> = report
        .anomalies
        .iter()
        .map(|a| {
            let r = &a.record;
            AnomalyJS {
                area_code: &r.area_code,
                mp_winner_number: r.winner_number,
                mp_winner_party: &r.winner_party,
                mp_votes: r.winner_votes,
                pl_twin_party: &r.twin_party,
                pl_twin_rank: r.twin_rank,
                pl_twin_votes: r.twin_votes,
                mp_twin_candidate_votes: r.twin_candidate_votes,
                ratio_pl_to_mp: r.ratio.map(|x| round_to(x, 4)),
                anomaly_score: r.twin_votes,
                province_id: &r.province_id,
                province_name: &r.province_name,
                avg_non_twin_votes: a.avg_non_twin_votes,
                excess_votes: a.excess_votes,
                pct_increase: a.pct_increase,
            }
        })
        .collect();
    let anomaly_js = AnomalyReportJS {
        metadata: Metadata {
            description: DESCRIPTION.to_string(),
            criteria: criteria(rules),
            total_areas_flagged: anomalies.len(),
            areas_processed: report.areas_processed,
            areas_skipped: report.areas_skipped,
        },
        anomalies,
    };

    let province_js = ProvinceStatsJS {
        province_stats: report
            .provinces
            .iter()
            .map(|p| ProvinceJS {
                id: &p.id,
                name: &p.name,
                count: p.count,
                total_ghost_votes: p.total_ghost_votes,
                areas: p
                    .areas
                    .iter()
                    .map(|a| ProvinceAreaJS {
                        area_code: &a.area_code,
                        ghost_votes: a.ghost_votes,
                        mp_winner_party: &a.winner_party,
                        mp_number: a.winner_number,
                    })
                    .collect(),
            })
            .collect(),
    };

    let party_js = PartyStatsJS {
        mp_party_stats: report
            .parties
            .iter()
            .map(|p| PartyJS {
                party_code: &p.party_code,
                count: p.count,
                total_ghost_votes: p.total_ghost_votes,
                provinces: p
                    .provinces
                    .iter()
                    .map(|b| BreakdownJS {
                        name: &b.name,
                        count: b.count,
                        votes: b.votes,
                    })
                    .collect(),
            })
            .collect(),
    };

    let comparison_js = ComparisonStatsJS {
        comparison_stats: report
            .comparison
            .iter()
            .map(|c| ComparisonJS {
                party_code: &c.party_code,
                party_number: c.party_number,
                avg_twin_votes: round_to(c.avg_twin(), 2),
                avg_non_twin_votes: round_to(c.avg_non_twin(), 2),
                diff: round_to(c.diff(), 2),
                twin_area_count: c.twin_votes.len(),
                non_twin_area_count: c.non_twin_votes.len(),
            })
            .collect(),
    };

    Ok(vec![
        (ANOMALY_FILE.to_string(), to_pretty(&anomaly_js, ANOMALY_FILE)?),
        (PROVINCE_FILE.to_string(), to_pretty(&province_js, PROVINCE_FILE)?),
        (PARTY_FILE.to_string(), to_pretty(&party_js, PARTY_FILE)?),
        (
            COMPARISON_FILE.to_string(),
            to_pretty(&comparison_js, COMPARISON_FILE)?,
        ),
    ])
}

fn group_js(g: &GroupStats) -> GroupJS {
    GroupJS {
        pl_total: g.pl_total,
        mp_total: g.mp_total,
        average_pl: g.average_pl,
        ratio: g.ratio,
        count: g.count,
        parties: &g.parties,
    }
}

pub fn render_nationwide(summary: &NationwideSummary) -> AuditResult<(String, String)> {
    let js = NationwideJS {
        groups: GroupsJS {
            lucky: group_js(&summary.lucky),
            excluded: group_js(&summary.excluded),
            other: group_js(&summary.other),
        },
        raw_parties: summary
            .parties
            .iter()
            .map(|p| PartyVotesJS {
                party_number: p.party_number,
                party_code: &p.party_code,
                total_votes: p.pl_total,
                pl_total_votes: p.pl_total,
                mp_total_votes: p.mp_total,
                ratio: p.ratio,
                verdict: p.verdict.map(verdict_label),
            })
            .collect(),
    };
    Ok((NATIONWIDE_FILE.to_string(), to_pretty(&js, NATIONWIDE_FILE)?))
}

/// Writes the rendered documents under `dir`, creating it if needed.
pub fn write_reports(dir: &Path, docs: &[(String, String)]) -> AuditResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).context(WritingReportSnafu {
        path: dir.display().to_string(),
    })?;
    let mut written: Vec<PathBuf> = Vec::new();
    for (name, contents) in docs.iter() {
        let path = dir.join(name);
        fs::write(&path, contents.as_bytes()).context(WritingReportSnafu {
            path: path.display().to_string(),
        })?;
        info!(
            "Saved: {} (sha256 {})",
            path.display(),
            sha256::digest(contents.as_str())
        );
        written.push(path);
    }
    Ok(written)
}
