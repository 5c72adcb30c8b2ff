use crate::args::Args;
use crate::audit::io_common::resolve_path;
use crate::audit::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_MP_DIR: &str = "data/mp";
pub const DEFAULT_PL_DIR: &str = "data/pl";
pub const DEFAULT_PROVINCE_FILE: &str = "docs/data/common-data.json";
pub const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "mpDirectory")]
    pub mp_directory: Option<String>,
    #[serde(rename = "plDirectory")]
    pub pl_directory: Option<String>,
    #[serde(rename = "provinceFile")]
    pub province_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSettings {
    #[serde(rename = "excludedNumbers")]
    pub excluded_numbers: Option<Vec<u32>>,
    #[serde(rename = "maxWinnerNumber")]
    pub max_winner_number: Option<u32>,
    #[serde(rename = "maxTwinRank")]
    pub max_twin_rank: Option<u32>,
    #[serde(rename = "luckyMaxNumber")]
    pub lucky_max_number: Option<u32>,
    #[serde(rename = "areaRatioZeroPolicy")]
    pub area_ratio_zero_policy: Option<String>,
    #[serde(rename = "nationwideRatioZeroPolicy")]
    pub nationwide_ratio_zero_policy: Option<String>,
    #[serde(rename = "suspiciousRatio")]
    pub suspicious_ratio: Option<f64>,
    #[serde(rename = "severeRatio")]
    pub severe_ratio: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(rename = "inputSettings", default)]
    pub input_settings: InputSettings,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub rules: RulesSettings,
    pub mode: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Mode {
    All,
    Anomalies,
    Nationwide,
}

impl Mode {
    pub fn runs_anomalies(&self) -> bool {
        matches!(self, Mode::All | Mode::Anomalies)
    }

    pub fn runs_nationwide(&self) -> bool {
        matches!(self, Mode::All | Mode::Nationwide)
    }
}

/// Everything a run needs, after merging the configuration file and the flags.
#[derive(PartialEq, Debug, Clone)]
pub struct AuditSettings {
    pub mp_dir: PathBuf,
    pub pl_dir: PathBuf,
    /// May be absent: provinces then show as unknown.
    pub province_file: PathBuf,
    pub output_dir: PathBuf,
    pub rules: AnalysisRules,
    pub mode: Mode,
    pub reference: Option<PathBuf>,
}

pub fn read_config(path: &str) -> AuditResult<AuditConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AuditConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Flags win over the configuration file, which wins over the defaults.
pub fn resolve_settings(args: &Args) -> AuditResult<AuditSettings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let root = Path::new(p)
                .parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_default();
            (read_config(p)?, root)
        }
        None => (AuditConfig::default(), PathBuf::new()),
    };
    let input = &config.input_settings;

    let pick = |flag: &Option<String>, file: &Option<String>, default: &str| -> PathBuf {
        match (flag, file) {
            (Some(f), _) => PathBuf::from(f),
            (None, Some(f)) => resolve_path(&root, f),
            (None, None) => PathBuf::from(default),
        }
    };

    let mode_s = args.mode.as_ref().or(config.mode.as_ref());
    let mode = match mode_s.map(|s| s.as_str()) {
        None | Some("all") => Mode::All,
        Some("anomalies") => Mode::Anomalies,
        Some("nationwide") => Mode::Nationwide,
        Some(x) => whatever!("Unknown mode {:?}: expected all, anomalies or nationwide", x),
    };

    Ok(AuditSettings {
        mp_dir: pick(&args.mp_dir, &input.mp_directory, DEFAULT_MP_DIR),
        pl_dir: pick(&args.pl_dir, &input.pl_directory, DEFAULT_PL_DIR),
        province_file: pick(&args.provinces, &input.province_file, DEFAULT_PROVINCE_FILE),
        output_dir: pick(
            &args.out,
            &config.output_settings.output_directory,
            DEFAULT_OUTPUT_DIR,
        ),
        rules: validate_rules(&config.rules, args)?,
        mode,
        reference: args.reference.as_ref().map(PathBuf::from),
    })
}

fn read_zero_policy(s: &Option<String>, default: ZeroVotePolicy) -> AuditResult<ZeroVotePolicy> {
    match s.as_deref() {
        None => Ok(default),
        Some("floorAtOne") => Ok(ZeroVotePolicy::FloorAtOne),
        Some("null") => Ok(ZeroVotePolicy::Null),
        Some(x) => whatever!("Unknown zero vote policy {:?}: expected floorAtOne or null", x),
    }
}

fn validate_rules(rs: &RulesSettings, args: &Args) -> AuditResult<AnalysisRules> {
    let defaults = AnalysisRules::default_rules();
    let excluded: BTreeSet<u32> = match (&args.exclude, &rs.excluded_numbers) {
        (Some(l), _) | (None, Some(l)) => l.iter().cloned().collect(),
        (None, None) => defaults.excluded_numbers.clone(),
    };
    let rules = AnalysisRules {
        excluded_numbers: excluded,
        max_winner_number: rs.max_winner_number.unwrap_or(defaults.max_winner_number),
        max_twin_rank: args
            .max_rank
            .or(rs.max_twin_rank)
            .unwrap_or(defaults.max_twin_rank),
        lucky_max_number: rs.lucky_max_number.unwrap_or(defaults.lucky_max_number),
        area_ratio_policy: read_zero_policy(
            &rs.area_ratio_zero_policy,
            defaults.area_ratio_policy,
        )?,
        nationwide_ratio_policy: read_zero_policy(
            &rs.nationwide_ratio_zero_policy,
            defaults.nationwide_ratio_policy,
        )?,
        suspicious_ratio: rs.suspicious_ratio.unwrap_or(defaults.suspicious_ratio),
        severe_ratio: rs.severe_ratio.unwrap_or(defaults.severe_ratio),
    };
    rules.validate().context(AnalysisSnafu {})?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            config: None,
            mp_dir: None,
            pl_dir: None,
            provinces: None,
            out: None,
            exclude: None,
            max_rank: None,
            mode: None,
            reference: None,
            verbose: false,
        }
    }

    #[test]
    fn defaults_without_config() {
        let s = resolve_settings(&bare_args()).unwrap();
        assert_eq!(s.mp_dir, PathBuf::from(DEFAULT_MP_DIR));
        assert_eq!(s.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(s.mode, Mode::All);
        assert_eq!(s.rules, AnalysisRules::default_rules());
    }

    #[test]
    fn flags_override_rules() {
        let mut a = bare_args();
        a.exclude = Some(vec![6, 9]);
        a.max_rank = Some(20);
        let s = resolve_settings(&a).unwrap();
        assert!(!s.rules.is_excluded(11));
        assert_eq!(s.rules.max_twin_rank, 20);
    }

    #[test]
    fn rejects_unknown_values() {
        let mut a = bare_args();
        a.mode = Some("legacy".to_string());
        assert!(matches!(
            resolve_settings(&a),
            Err(AuditError::Whatever { .. })
        ));

        let mut a = bare_args();
        a.max_rank = Some(0);
        assert!(matches!(
            resolve_settings(&a),
            Err(AuditError::Analysis { .. })
        ));

        let rs = RulesSettings {
            area_ratio_zero_policy: Some("zero".to_string()),
            ..RulesSettings::default()
        };
        assert!(validate_rules(&rs, &bare_args()).is_err());
    }

    #[test]
    fn config_policies() {
        let js = r#"{
            "rules": {
                "excludedNumbers": [6, 9],
                "areaRatioZeroPolicy": "null",
                "nationwideRatioZeroPolicy": "floorAtOne"
            }
        }"#;
        let config: AuditConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.input_settings, InputSettings::default());
        let rules = validate_rules(&config.rules, &bare_args()).unwrap();
        assert_eq!(rules.area_ratio_policy, ZeroVotePolicy::Null);
        assert_eq!(rules.nationwide_ratio_policy, ZeroVotePolicy::FloorAtOne);
        assert_eq!(rules.excluded_numbers.len(), 2);
    }
}
