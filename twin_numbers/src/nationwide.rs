use log::{debug, info};
use std::collections::BTreeMap;

use crate::aggregate::round_to;
use crate::codes::parse_party_number;
use crate::config::*;
use crate::detector::vote_ratio;

/// Nationwide per-party vote sums. Independent from the per-area join: every
/// document of both directories is added in full.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NationwideTally {
    pl_votes: BTreeMap<String, u64>,
    mp_votes: BTreeMap<String, u64>,
}

impl NationwideTally {
    pub fn new() -> NationwideTally {
        NationwideTally::default()
    }

    pub fn add_pl_entries(&mut self, entries: &[PlEntry]) {
        for e in entries.iter() {
            add_votes(&mut self.pl_votes, &e.party_code, e.vote_total);
        }
    }

    pub fn add_mp_entries(&mut self, entries: &[MpEntry]) {
        for e in entries.iter() {
            add_votes(&mut self.mp_votes, &e.party_code, e.vote_total);
        }
    }

    pub fn summarize(&self, rules: &AnalysisRules) -> NationwideSummary {
        let mut lucky = empty_group(PartyGroup::Lucky);
        let mut excluded = empty_group(PartyGroup::Excluded);
        let mut other = empty_group(PartyGroup::Other);
        let mut parties: Vec<PartyVotes> = Vec::new();

        let mut codes: Vec<&String> = self.pl_votes.keys().chain(self.mp_votes.keys()).collect();
        codes.sort();
        codes.dedup();

        for code in codes {
            let number = match parse_party_number(code) {
                Ok(n) => n,
                Err(e) => {
                    debug!("summarize: skipping party code: {}", e);
                    continue;
                }
            };
            let pl_total = self.pl_votes.get(code).cloned().unwrap_or(0);
            let mp_total = self.mp_votes.get(code).cloned().unwrap_or(0);
            let ratio = vote_ratio(pl_total, mp_total, rules.nationwide_ratio_policy)
                .map(|r| round_to(r, 2));
            parties.push(PartyVotes {
                party_number: number,
                party_code: code.clone(),
                pl_total,
                mp_total,
                ratio,
                verdict: ratio.map(|r| rules.verdict(r)),
            });

            let group = match rules.classify(number) {
                Some(PartyGroup::Lucky) => &mut lucky,
                Some(PartyGroup::Excluded) => &mut excluded,
                Some(PartyGroup::Other) => &mut other,
                None => continue,
            };
            group.pl_total += pl_total;
            group.mp_total += mp_total;
            group.count += 1;
            group.parties.push(number);
        }

        for g in [&mut lucky, &mut excluded, &mut other] {
            finish_group(g);
            info!(
                "summarize: {:?}: {} parties, PL {}, MP {}, ratio {:.2}",
                g.group, g.count, g.pl_total, g.mp_total, g.ratio
            );
        }

        // Codes are already in order, so equal numbers stay sorted by code.
        parties.sort_by_key(|p| p.party_number);
        NationwideSummary {
            lucky,
            excluded,
            other,
            parties,
        }
    }
}

fn add_votes(tally: &mut BTreeMap<String, u64>, party_code: &str, votes: u64) {
    if party_code.is_empty() {
        return;
    }
    *tally.entry(party_code.to_string()).or_insert(0) += votes;
}

fn empty_group(group: PartyGroup) -> GroupStats {
    GroupStats {
        group,
        pl_total: 0,
        mp_total: 0,
        count: 0,
        average_pl: 0.0,
        ratio: 0.0,
        parties: Vec::new(),
    }
}

fn finish_group(g: &mut GroupStats) {
    g.parties.sort_unstable();
    g.average_pl = if g.count > 0 {
        g.pl_total as f64 / g.count as f64
    } else {
        0.0
    };
    g.ratio = if g.mp_total > 0 {
        g.pl_total as f64 / g.mp_total as f64
    } else {
        0.0
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(party: &str, votes: u64) -> PlEntry {
        PlEntry {
            party_code: party.to_string(),
            vote_total: votes,
            rank: None,
        }
    }

    fn mp(party: &str, votes: u64) -> MpEntry {
        MpEntry {
            candidate_code: String::new(),
            party_code: party.to_string(),
            vote_total: votes,
        }
    }

    fn tally() -> NationwideTally {
        let mut t = NationwideTally::new();
        t.add_pl_entries(&[pl("PARTY-0005", 4000), pl("PARTY-0009", 9000), pl("PARTY-0046", 300)]);
        t.add_pl_entries(&[pl("PARTY-0005", 2000), pl("PARTY-0011", 500), pl("", 77)]);
        t.add_mp_entries(&[mp("PARTY-0005", 100), mp("PARTY-0009", 8000), mp("PARTY-0046", 600)]);
        t.add_mp_entries(&[mp("PARTY-0011", 1000), mp("PARTY-0020", 50), mp("PARTY-XX", 1)]);
        t
    }

    #[test]
    fn groups_with_default_exclusions() {
        let s = tally().summarize(&AnalysisRules::default_rules());
        assert_eq!(s.lucky.parties, vec![5]);
        assert_eq!(s.lucky.pl_total, 6000);
        assert_eq!(s.lucky.mp_total, 100);
        assert_eq!(s.lucky.ratio, 60.0);
        assert_eq!(s.lucky.average_pl, 6000.0);
        assert_eq!(s.excluded.parties, vec![9, 11]);
        assert_eq!(s.excluded.pl_total, 9500);
        assert_eq!(s.excluded.mp_total, 9000);
        assert_eq!(s.other.parties, vec![20, 46]);
        assert_eq!(s.other.count, 2);
        assert_eq!(s.other.average_pl, 150.0);
        assert_eq!(s.other.mp_total, 650);
        assert_eq!(s.other.ratio, 300.0 / 650.0);
    }

    #[test]
    fn eleven_is_lucky_with_the_older_exclusions() {
        let rules = AnalysisRules {
            excluded_numbers: [6, 9].iter().cloned().collect(),
            ..AnalysisRules::default_rules()
        };
        let s = tally().summarize(&rules);
        assert_eq!(s.lucky.parties, vec![5, 11]);
        assert_eq!(s.excluded.parties, vec![9]);
    }

    #[test]
    fn party_ratio_is_null_without_mp_votes() {
        let mut t = NationwideTally::new();
        t.add_pl_entries(&[pl("PARTY-0003", 1234)]);
        let s = t.summarize(&AnalysisRules::default_rules());
        assert_eq!(s.parties.len(), 1);
        assert_eq!(s.parties[0].ratio, None);
        assert_eq!(s.parties[0].verdict, None);
        assert_eq!(s.lucky.ratio, 0.0);
        assert_eq!(s.lucky.average_pl, 1234.0);
    }

    #[test]
    fn parties_sorted_with_rounded_ratios() {
        let s = tally().summarize(&AnalysisRules::default_rules());
        let numbers: Vec<u32> = s.parties.iter().map(|p| p.party_number).collect();
        assert_eq!(numbers, vec![5, 9, 11, 20, 46]);
        assert_eq!(s.parties[0].ratio, Some(60.0));
        assert_eq!(s.parties[0].verdict, Some(Verdict::Suspicious));
        assert_eq!(s.parties[1].ratio, Some(1.13));
        assert_eq!(s.parties[1].verdict, Some(Verdict::Normal));
        assert_eq!(s.parties[3].ratio, Some(0.0));
        assert!(s.parties.iter().all(|p| p.party_code != "PARTY-XX"));
    }
}
