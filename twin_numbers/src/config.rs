// ********* Input data structures ***********

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;

/// One row of a constituency (MP) result document.
///
/// The rows of an area are expected in descending order of votes, so that
/// the first row is the constituency winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MpEntry {
    /// Encodes the area code and the ballot number of the candidate,
    /// for example `CANDIDATE-MP-100105`.
    pub candidate_code: String,
    pub party_code: String,
    pub vote_total: u64,
}

/// One row of a party-list (PL) result document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PlEntry {
    pub party_code: String,
    pub vote_total: u64,
    /// 1-based rank of the party in the area. Missing ranks are never eligible.
    pub rank: Option<u32>,
}

/// The pair of result documents of a single area.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AreaResults {
    pub area_code: String,
    pub mp_entries: Vec<MpEntry>,
    pub pl_entries: Vec<PlEntry>,
}

/// Immutable lookup from a two-character province prefix to its display name.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ProvinceTable {
    names: HashMap<String, String>,
}

impl ProvinceTable {
    pub fn new(names: HashMap<String, String>) -> ProvinceTable {
        ProvinceTable { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The name of the province, or `Unknown (<prefix>)` when the table has no entry.
    pub fn name(&self, prefix: &str) -> String {
        match self.names.get(prefix) {
            Some(n) => n.clone(),
            None => format!("Unknown ({})", prefix),
        }
    }
}

// ******** Output data structures *********

/// A flagged area. Built once by the detector, enriched once by the aggregation.
#[derive(PartialEq, Debug, Clone)]
pub struct AnomalyRecord {
    pub area_code: String,
    pub winner_number: u32,
    pub winner_party: String,
    pub winner_votes: u64,
    pub twin_party: String,
    pub twin_rank: u32,
    pub twin_votes: u64,
    /// Votes of the twin party's own constituency candidate in the same area.
    pub twin_candidate_votes: u64,
    /// Twin party-list votes over the winner's votes.
    pub ratio: Option<f64>,
    pub province_id: String,
    pub province_name: String,
}

/// An anomaly together with the comparison context of its twin party.
#[derive(PartialEq, Debug, Clone)]
pub struct EnrichedAnomaly {
    pub record: AnomalyRecord,
    pub avg_non_twin_votes: f64,
    pub excess_votes: f64,
    pub pct_increase: f64,
}

/// Vote samples of one target party, split by whether the area winner carried
/// the same ballot number.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonStat {
    pub party_number: u32,
    pub party_code: String,
    pub twin_votes: Vec<u64>,
    pub non_twin_votes: Vec<u64>,
}

/// Per-area vote share of a single area inside a province rollup.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProvinceArea {
    pub area_code: String,
    pub ghost_votes: u64,
    pub winner_party: String,
    pub winner_number: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProvinceStats {
    pub id: String,
    pub name: String,
    pub count: u64,
    pub total_ghost_votes: u64,
    pub areas: Vec<ProvinceArea>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProvinceBreakdown {
    pub name: String,
    pub count: u64,
    pub votes: u64,
}

/// Anomalies grouped by the actual party of the constituency winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyStats {
    pub party_code: String,
    pub count: u64,
    pub total_ghost_votes: u64,
    pub provinces: Vec<ProvinceBreakdown>,
}

/// The three disjoint buckets of party numbers.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum PartyGroup {
    /// The configured exclusion set.
    Excluded,
    /// 1 up to the lucky bound, minus the excluded numbers.
    Lucky,
    /// Everything above the lucky bound.
    Other,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Verdict {
    Normal,
    Suspicious,
    Severe,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PartyVotes {
    pub party_number: u32,
    pub party_code: String,
    pub pl_total: u64,
    pub mp_total: u64,
    /// PL over MP, rounded to 2 decimals.
    pub ratio: Option<f64>,
    pub verdict: Option<Verdict>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GroupStats {
    pub group: PartyGroup,
    pub pl_total: u64,
    pub mp_total: u64,
    pub count: u64,
    pub average_pl: f64,
    pub ratio: f64,
    /// Party numbers in the group, ascending.
    pub parties: Vec<u32>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct NationwideSummary {
    pub lucky: GroupStats,
    pub excluded: GroupStats,
    pub other: GroupStats,
    pub parties: Vec<PartyVotes>,
}

/// Errors that prevent an analysis from running.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnalysisErrors {
    /// The identifier does not end with an integer.
    NotNumeric(String),
    InvalidRules(String),
}

impl Error for AnalysisErrors {}

impl Display for AnalysisErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrors::NotNumeric(code) => write!(f, "not a numeric identifier: {:?}", code),
            AnalysisErrors::InvalidRules(msg) => write!(f, "invalid analysis rules: {}", msg),
        }
    }
}

// ********* Configuration **********

/// What a vote ratio becomes when its denominator is zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ZeroVotePolicy {
    /// The denominator is raised to 1, the ratio is always defined.
    FloorAtOne,
    /// The ratio is left undefined.
    Null,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisRules {
    pub excluded_numbers: BTreeSet<u32>,
    /// Winners above this number are never flagged. Also bounds the comparison targets.
    pub max_winner_number: u32,
    /// Worst party-list rank at which a twin party still counts as an anomaly.
    pub max_twin_rank: u32,
    pub lucky_max_number: u32,
    pub area_ratio_policy: ZeroVotePolicy,
    pub nationwide_ratio_policy: ZeroVotePolicy,
    pub suspicious_ratio: f64,
    pub severe_ratio: f64,
}

impl AnalysisRules {
    pub const DEFAULT_EXCLUDED_NUMBERS: [u32; 3] = [6, 9, 11];

    pub fn default_rules() -> AnalysisRules {
        AnalysisRules {
            excluded_numbers: Self::DEFAULT_EXCLUDED_NUMBERS.iter().cloned().collect(),
            max_winner_number: 9,
            max_twin_rank: 7,
            lucky_max_number: 15,
            area_ratio_policy: ZeroVotePolicy::FloorAtOne,
            nationwide_ratio_policy: ZeroVotePolicy::Null,
            suspicious_ratio: 20.0,
            severe_ratio: 100.0,
        }
    }

    pub fn is_excluded(&self, number: u32) -> bool {
        self.excluded_numbers.contains(&number)
    }

    /// The ballot numbers for which twin and non-twin samples are collected.
    pub fn target_numbers(&self) -> Vec<u32> {
        (1..=self.max_winner_number)
            .filter(|n| !self.is_excluded(*n))
            .collect()
    }

    /// Classifies a party number. Zero belongs to no group.
    pub fn classify(&self, number: u32) -> Option<PartyGroup> {
        if number == 0 {
            None
        } else if self.is_excluded(number) {
            Some(PartyGroup::Excluded)
        } else if number <= self.lucky_max_number {
            Some(PartyGroup::Lucky)
        } else {
            Some(PartyGroup::Other)
        }
    }

    pub fn verdict(&self, ratio: f64) -> Verdict {
        if ratio > self.severe_ratio {
            Verdict::Severe
        } else if ratio > self.suspicious_ratio {
            Verdict::Suspicious
        } else {
            Verdict::Normal
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisErrors> {
        let fail = |msg: &str| Err(AnalysisErrors::InvalidRules(msg.to_string()));
        if self.max_winner_number == 0 {
            return fail("the maximum winner number must be positive");
        }
        if self.max_twin_rank == 0 {
            return fail("the party-list rank cutoff must be positive");
        }
        if self.lucky_max_number < self.max_winner_number {
            return fail("the lucky number bound may not be below the maximum winner number");
        }
        if self.excluded_numbers.contains(&0) {
            return fail("0 is not a party number");
        }
        if !(self.suspicious_ratio > 0.0 && self.severe_ratio >= self.suspicious_ratio) {
            return fail("verdict thresholds must satisfy 0 < suspicious <= severe");
        }
        Ok(())
    }
}

impl Default for AnalysisRules {
    fn default() -> Self {
        AnalysisRules::default_rules()
    }
}
