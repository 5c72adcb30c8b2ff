//! Roll-ups of the flagged areas.
//!
//! Groups keep the order in which their key first shows up in the sorted
//! anomaly list, and are then stably sorted by their totals. This makes the
//! output independent of hash ordering.

use log::info;
use std::collections::HashMap;

use crate::config::*;

/// Sorts by twin party-list votes, highest first. Ties keep the area order.
pub fn sort_anomalies(anomalies: &mut [AnomalyRecord]) {
    anomalies.sort_by(|a, b| b.twin_votes.cmp(&a.twin_votes));
}

pub fn province_rollup(anomalies: &[AnomalyRecord]) -> Vec<ProvinceStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ProvinceStats> = Vec::new();
    for a in anomalies.iter() {
        let idx = match index.get(a.province_id.as_str()) {
            Some(idx) => *idx,
            None => {
                groups.push(ProvinceStats {
                    id: a.province_id.clone(),
                    name: a.province_name.clone(),
                    count: 0,
                    total_ghost_votes: 0,
                    areas: Vec::new(),
                });
                index.insert(a.province_id.as_str(), groups.len() - 1);
                groups.len() - 1
            }
        };
        let g = &mut groups[idx];
        g.count += 1;
        g.total_ghost_votes += a.twin_votes;
        g.areas.push(ProvinceArea {
            area_code: a.area_code.clone(),
            ghost_votes: a.twin_votes,
            winner_party: a.winner_party.clone(),
            winner_number: a.winner_number,
        });
    }
    for g in groups.iter_mut() {
        g.areas.sort_by(|x, y| y.ghost_votes.cmp(&x.ghost_votes));
    }
    groups.sort_by(|x, y| y.total_ghost_votes.cmp(&x.total_ghost_votes));
    groups
}

// Outer group of the party rollup. It owns the per-province breakdown.
struct PartyAccumulator {
    party_code: String,
    count: u64,
    total_ghost_votes: u64,
    provinces: Vec<ProvinceBreakdown>,
    province_index: HashMap<String, usize>,
}

impl PartyAccumulator {
    fn new(party_code: &str) -> PartyAccumulator {
        PartyAccumulator {
            party_code: party_code.to_string(),
            count: 0,
            total_ghost_votes: 0,
            provinces: Vec::new(),
            province_index: HashMap::new(),
        }
    }

    fn record(&mut self, province_name: &str, votes: u64) {
        self.count += 1;
        self.total_ghost_votes += votes;
        let idx = match self.province_index.get(province_name) {
            Some(idx) => *idx,
            None => {
                self.provinces.push(ProvinceBreakdown {
                    name: province_name.to_string(),
                    count: 0,
                    votes: 0,
                });
                self.province_index
                    .insert(province_name.to_string(), self.provinces.len() - 1);
                self.provinces.len() - 1
            }
        };
        let p = &mut self.provinces[idx];
        p.count += 1;
        p.votes += votes;
    }

    fn into_stats(self) -> PartyStats {
        let mut provinces = self.provinces;
        provinces.sort_by(|x, y| y.votes.cmp(&x.votes));
        PartyStats {
            party_code: self.party_code,
            count: self.count,
            total_ghost_votes: self.total_ghost_votes,
            provinces,
        }
    }
}

pub fn party_rollup(anomalies: &[AnomalyRecord]) -> Vec<PartyStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<PartyAccumulator> = Vec::new();
    for a in anomalies.iter() {
        let idx = match index.get(a.winner_party.as_str()) {
            Some(idx) => *idx,
            None => {
                accs.push(PartyAccumulator::new(&a.winner_party));
                index.insert(a.winner_party.as_str(), accs.len() - 1);
                accs.len() - 1
            }
        };
        accs[idx].record(&a.province_name, a.twin_votes);
    }
    let mut res: Vec<PartyStats> = accs.into_iter().map(|acc| acc.into_stats()).collect();
    res.sort_by(|x, y| y.count.cmp(&x.count));
    res
}

fn mean(samples: &[u64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<u64>() as f64 / samples.len() as f64
    }
}

impl ComparisonStat {
    pub fn avg_twin(&self) -> f64 {
        mean(&self.twin_votes)
    }

    pub fn avg_non_twin(&self) -> f64 {
        mean(&self.non_twin_votes)
    }

    pub fn diff(&self) -> f64 {
        self.avg_twin() - self.avg_non_twin()
    }
}

/// Attaches to each anomaly how far its twin votes are above the party's
/// average in areas where it was not a twin. The average is taken as
/// reported, at 2 decimals.
pub fn enrich_anomalies(
    anomalies: &[AnomalyRecord],
    comparison: &[ComparisonStat],
) -> Vec<EnrichedAnomaly> {
    let averages: HashMap<&str, f64> = comparison
        .iter()
        .map(|c| (c.party_code.as_str(), round_to(c.avg_non_twin(), 2)))
        .collect();
    anomalies
        .iter()
        .map(|a| {
            let avg = averages.get(a.twin_party.as_str()).cloned().unwrap_or(0.0);
            let excess = round_to(a.twin_votes as f64 - avg, 2);
            let pct_increase = if avg > 0.0 {
                round_to(excess / avg * 100.0, 1)
            } else {
                0.0
            };
            EnrichedAnomaly {
                record: a.clone(),
                avg_non_twin_votes: avg,
                excess_votes: excess,
                pct_increase,
            }
        })
        .collect()
}

/// Everything the reports are made of.
#[derive(PartialEq, Debug, Clone)]
pub struct AnomalyReport {
    pub anomalies: Vec<EnrichedAnomaly>,
    pub provinces: Vec<ProvinceStats>,
    pub parties: Vec<PartyStats>,
    pub comparison: Vec<ComparisonStat>,
    pub areas_processed: u64,
    pub areas_skipped: u64,
}

/// Runs all the roll-ups. Needs the complete detection output.
pub fn aggregate(detection: crate::detector::Detection) -> AnomalyReport {
    let mut anomalies = detection.anomalies;
    sort_anomalies(&mut anomalies);
    let provinces = province_rollup(&anomalies);
    let parties = party_rollup(&anomalies);
    let enriched = enrich_anomalies(&anomalies, &detection.comparison);
    info!(
        "aggregate: {} anomalies in {} provinces, {} winning parties",
        enriched.len(),
        provinces.len(),
        parties.len()
    );
    AnomalyReport {
        anomalies: enriched,
        provinces,
        parties,
        comparison: detection.comparison,
        areas_processed: detection.areas_processed,
        areas_skipped: detection.areas_skipped,
    }
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}
