// Readers for the per-area result documents and the province table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audit::io_common::{area_code_of, json_files};
use crate::audit::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ResultRow {
    #[serde(rename = "candidateCode", default)]
    pub candidate_code: Option<String>,
    #[serde(rename = "partyCode", default)]
    pub party_code: Option<String>,
    #[serde(rename = "voteTotal", default)]
    pub vote_total: u64,
    #[serde(default)]
    pub rank: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ResultDocument {
    #[serde(default)]
    pub entries: Vec<ResultRow>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ProvinceRow {
    pub code: String,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct ProvinceDocument {
    #[serde(default)]
    pub provinces: Vec<ProvinceRow>,
}

const PROVINCE_CODE_PREFIX: &str = "PROVINCE-";

fn read_document(path: &Path) -> AuditResult<Vec<ResultRow>> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: &p })?;
    let doc: ResultDocument =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: &p })?;
    Ok(doc.entries)
}

fn mp_entries(rows: Vec<ResultRow>) -> Vec<MpEntry> {
    rows.into_iter()
        .map(|r| MpEntry {
            candidate_code: r.candidate_code.unwrap_or_default(),
            party_code: r.party_code.unwrap_or_default(),
            vote_total: r.vote_total,
        })
        .collect()
}

fn pl_entries(rows: Vec<ResultRow>) -> Vec<PlEntry> {
    rows.into_iter()
        .map(|r| PlEntry {
            party_code: r.party_code.unwrap_or_default(),
            vote_total: r.vote_total,
            rank: r.rank,
        })
        .collect()
}

/// The area codes with a constituency document, in file name order.
pub fn list_area_codes(mp_dir: &Path) -> AuditResult<Vec<String>> {
    Ok(json_files(mp_dir)?
        .iter()
        .filter_map(|p| area_code_of(p))
        .collect())
}

/// Reads both documents of an area. Returns `None` when the party-list
/// document does not exist.
pub fn load_area_pair(
    mp_dir: &Path,
    pl_dir: &Path,
    area_code: &str,
) -> AuditResult<Option<AreaResults>> {
    let file_name = format!("{}.json", area_code);
    let pl_path = pl_dir.join(&file_name);
    if !pl_path.exists() {
        return Ok(None);
    }
    let mp_rows = read_document(&mp_dir.join(&file_name))?;
    let pl_rows = read_document(&pl_path)?;
    Ok(Some(AreaResults {
        area_code: area_code.to_string(),
        mp_entries: mp_entries(mp_rows),
        pl_entries: pl_entries(pl_rows),
    }))
}

/// Reads the province table. An absent or unreadable table gives an empty one.
pub fn load_province_map(path: &Path) -> ProvinceTable {
    if !path.exists() {
        info!("No province table at {}", path.display());
        return ProvinceTable::default();
    }
    match read_province_map(path) {
        Ok(table) => {
            info!("Loaded {} provinces from {}", table.len(), path.display());
            table
        }
        Err(e) => {
            warn!("Could not load the province table: {}", e);
            ProvinceTable::default()
        }
    }
}

fn read_province_map(path: &Path) -> AuditResult<ProvinceTable> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: &p })?;
    let doc: ProvinceDocument =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: &p })?;
    let names: HashMap<String, String> = doc
        .provinces
        .into_iter()
        .map(|row| {
            let code = match row.code.strip_prefix(PROVINCE_CODE_PREFIX) {
                Some(c) => c.to_string(),
                None => row.code,
            };
            (code, row.name)
        })
        .collect();
    Ok(ProvinceTable::new(names))
}

/// Sums every document of both directories, whether or not the area has
/// a counterpart. Unreadable documents are skipped.
pub fn load_nationwide_tally(mp_dir: &Path, pl_dir: &Path) -> AuditResult<NationwideTally> {
    let mut tally = NationwideTally::new();

    let pl_files = json_files(pl_dir)?;
    info!("Processing PL data from {} files...", pl_files.len());
    for p in pl_files.iter() {
        match read_document(p) {
            Ok(rows) => tally.add_pl_entries(&pl_entries(rows)),
            Err(e) => warn!("Error processing PL {}: {}", p.display(), e),
        }
    }

    let mp_files = json_files(mp_dir)?;
    info!("Processing MP data from {} files...", mp_files.len());
    for p in mp_files.iter() {
        match read_document(p) {
            Ok(rows) => tally.add_mp_entries(&mp_entries(rows)),
            Err(e) => warn!("Error processing MP {}: {}", p.display(), e),
        }
    }
    Ok(tally)
}
