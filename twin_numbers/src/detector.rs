use log::debug;

use crate::codes::{parse_candidate_number, party_code, province_prefix};
use crate::config::*;

/// What happened to an area fed to the detector.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AreaOutcome {
    /// No constituency rows, the area is ignored.
    NoEntries,
    /// The winner's candidate code does not belong to the area, the area is ignored.
    UnparsableWinner,
    /// The twin party has no party-list row in the area.
    NoTwin,
    /// The twin party was found but the area does not qualify.
    Ineligible,
    Anomaly,
}

impl AreaOutcome {
    /// Whether the area contributed comparison samples.
    pub fn is_processed(&self) -> bool {
        !matches!(self, AreaOutcome::NoEntries | AreaOutcome::UnparsableWinner)
    }
}

/// The result of a detection pass over all the areas.
#[derive(PartialEq, Debug, Clone)]
pub struct Detection {
    /// In area-processing order.
    pub anomalies: Vec<AnomalyRecord>,
    /// One entry per target number, ascending.
    pub comparison: Vec<ComparisonStat>,
    pub areas_processed: u64,
    pub areas_skipped: u64,
}

/// Joins every area's constituency winner to the party-list row of the party
/// carrying the same ballot number.
///
/// ```
/// use twin_numbers::*;
///
/// let rules = AnalysisRules::default_rules();
/// let provinces = ProvinceTable::default();
/// let mut detector = TwinDetector::new(&rules, &provinces);
/// let area = AreaResults {
///     area_code: "100101".to_string(),
///     mp_entries: vec![MpEntry {
///         candidate_code: "CANDIDATE-MP-10010105".to_string(),
///         party_code: "PARTY-0099".to_string(),
///         vote_total: 30000,
///     }],
///     pl_entries: vec![PlEntry {
///         party_code: "PARTY-0005".to_string(),
///         vote_total: 4200,
///         rank: Some(3),
///     }],
/// };
/// assert_eq!(detector.add_area(&area), AreaOutcome::Anomaly);
/// assert_eq!(detector.finish().anomalies.len(), 1);
/// ```
pub struct TwinDetector<'a> {
    rules: &'a AnalysisRules,
    provinces: &'a ProvinceTable,
    anomalies: Vec<AnomalyRecord>,
    comparison: Vec<ComparisonStat>,
    areas_processed: u64,
    areas_skipped: u64,
}

impl<'a> TwinDetector<'a> {
    pub fn new(rules: &'a AnalysisRules, provinces: &'a ProvinceTable) -> TwinDetector<'a> {
        let comparison = rules
            .target_numbers()
            .into_iter()
            .map(|n| ComparisonStat {
                party_number: n,
                party_code: party_code(n),
                twin_votes: Vec::new(),
                non_twin_votes: Vec::new(),
            })
            .collect();
        TwinDetector {
            rules,
            provinces,
            anomalies: Vec::new(),
            comparison,
            areas_processed: 0,
            areas_skipped: 0,
        }
    }

    pub fn add_area(&mut self, area: &AreaResults) -> AreaOutcome {
        let outcome = self.process_area(area);
        if outcome.is_processed() {
            self.areas_processed += 1;
        } else {
            self.areas_skipped += 1;
        }
        debug!("add_area: {}: {:?}", area.area_code, outcome);
        outcome
    }

    /// Records an area that could not even be loaded.
    pub fn skip_area(&mut self, area_code: &str) {
        debug!("skip_area: {}", area_code);
        self.areas_skipped += 1;
    }

    pub fn finish(self) -> Detection {
        Detection {
            anomalies: self.anomalies,
            comparison: self.comparison,
            areas_processed: self.areas_processed,
            areas_skipped: self.areas_skipped,
        }
    }

    fn process_area(&mut self, area: &AreaResults) -> AreaOutcome {
        let winner = match area.mp_entries.first() {
            Some(w) => w,
            None => return AreaOutcome::NoEntries,
        };
        let winner_number = match parse_candidate_number(&winner.candidate_code, &area.area_code)
        {
            Some(n) => n,
            None => return AreaOutcome::UnparsableWinner,
        };

        self.collect_samples(area, winner_number);

        let twin_party = party_code(winner_number);
        let twin = match pl_entry(&area.pl_entries, &twin_party) {
            Some(e) => e,
            None => return AreaOutcome::NoTwin,
        };

        let eligible_rank = match twin.rank {
            Some(r) => r <= self.rules.max_twin_rank,
            None => false,
        };
        let eligible = (1..=self.rules.max_winner_number).contains(&winner_number)
            && !self.rules.is_excluded(winner_number)
            && winner.party_code != twin_party
            && eligible_rank;
        if !eligible {
            return AreaOutcome::Ineligible;
        }

        let twin_candidate_votes = area
            .mp_entries
            .iter()
            .find(|e| e.party_code == twin_party)
            .map(|e| e.vote_total)
            .unwrap_or(0);
        let prefix = province_prefix(&area.area_code);
        self.anomalies.push(AnomalyRecord {
            area_code: area.area_code.clone(),
            winner_number,
            winner_party: winner.party_code.clone(),
            winner_votes: winner.vote_total,
            twin_party,
            twin_rank: twin.rank.unwrap_or_default(),
            twin_votes: twin.vote_total,
            twin_candidate_votes,
            ratio: vote_ratio(
                twin.vote_total,
                winner.vote_total,
                self.rules.area_ratio_policy,
            ),
            province_id: prefix.to_string(),
            province_name: self.provinces.name(prefix),
        });
        AreaOutcome::Anomaly
    }

    // Every processed area adds exactly one sample per target, on one side only.
    fn collect_samples(&mut self, area: &AreaResults, winner_number: u32) {
        for stat in self.comparison.iter_mut() {
            let votes = pl_entry(&area.pl_entries, &stat.party_code)
                .map(|e| e.vote_total)
                .unwrap_or(0);
            if stat.party_number == winner_number {
                stat.twin_votes.push(votes);
            } else {
                stat.non_twin_votes.push(votes);
            }
        }
    }
}

// First match wins when a party is listed twice.
fn pl_entry<'b>(entries: &'b [PlEntry], code: &str) -> Option<&'b PlEntry> {
    entries.iter().find(|e| e.party_code == code)
}

/// Divides two vote counts according to the zero-denominator policy.
pub fn vote_ratio(numerator: u64, denominator: u64, policy: ZeroVotePolicy) -> Option<f64> {
    match (denominator, policy) {
        (0, ZeroVotePolicy::FloorAtOne) => Some(numerator as f64),
        (0, ZeroVotePolicy::Null) => None,
        (d, _) => Some(numerator as f64 / d as f64),
    }
}
