//! Console, text file and csv presentation of finished runs.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use pricing::PricingResult;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::orchestrator::RunOutcome;

const MODEL_PARAMETERS: &str = "Model Parameters";
const RESULTS: &str = "Simulation Results and Statistics";
const INPUT: &str = "Simulation input parameters";

/// Caps closer to zero than this are treated as unused.
const CAP_THRESHOLD: f64 = 0.1;

const FILE_PREFIX: &str = "Monte Carlo Option Pricing";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Csv,
    Text,
}

/// The formats written to files, one file per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Text,
}

impl OutputFormat {
    /// `None` for console output.
    pub fn file_format(self) -> Option<FileFormat> {
        match self {
            OutputFormat::Console => None,
            OutputFormat::Csv => Some(FileFormat::Csv),
            OutputFormat::Text => Some(FileFormat::Text),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub section: &'static str,
    pub field: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl ReportRow {
    fn new(section: &'static str, field: &'static str, value: impl ToString, unit: &'static str) -> Self {
        Self {
            section,
            field,
            value: value.to_string(),
            unit,
        }
    }
}

/// All reported figures of a run, grouped by section in display order.
pub fn report_rows(outcome: &RunOutcome) -> Vec<ReportRow> {
    let result = &outcome.result;
    let stats = &outcome.statistics;
    let dp = result.contract.params();

    let mut rows = vec![
        ReportRow::new(MODEL_PARAMETERS, "RNG variate", result.engine_name, ""),
        ReportRow::new(MODEL_PARAMETERS, "FDM Scheme", result.scheme_name, ""),
        ReportRow::new(MODEL_PARAMETERS, "Underlying derivative", &result.payoff_name, ""),
        ReportRow::new(RESULTS, "MCS Option Price", result.price, "[$]"),
        ReportRow::new(RESULTS, "Mean Stock Price", stats.mean_asset_value, "[$]"),
        ReportRow::new(RESULTS, "Max Stock Price", stats.max_asset_value, "[$]"),
        ReportRow::new(RESULTS, "Min Stock Price", stats.min_asset_value, "[$]"),
        ReportRow::new(RESULTS, "Standard Deviation", stats.standard_deviation, ""),
        ReportRow::new(RESULTS, "Standard Error", stats.standard_error, ""),
        ReportRow::new(RESULTS, "Exact Price", stats.exact_price, "[$]"),
        ReportRow::new(RESULTS, "Decision", stats.decision, ""),
        ReportRow::new(RESULTS, "Elapsed time of simulation", stats.elapsed_seconds, "[seconds]"),
        ReportRow::new(INPUT, "Rate of Return", dp.rfr, "[%]"),
        ReportRow::new(INPUT, "Strike Price", dp.strike, "[$]"),
        ReportRow::new(INPUT, "Expiry Time", dp.time_to_expiration, "[years]"),
        ReportRow::new(INPUT, "Stock Price", dp.asset_price, "[$]"),
        ReportRow::new(INPUT, "Volatility", dp.vola, "[%]"),
        ReportRow::new(INPUT, "NSIM", result.nr_paths(), ""),
    ];
    if result.nr_steps != 0 {
        rows.push(ReportRow::new(INPUT, "NSteps", result.nr_steps, ""));
    }
    if result.upper_cap.abs() > CAP_THRESHOLD {
        rows.push(ReportRow::new(INPUT, "Option Upper Cap", result.upper_cap, "[$]"));
    }
    if result.lower_cap.abs() > CAP_THRESHOLD {
        rows.push(ReportRow::new(INPUT, "Option Lower Cap", result.lower_cap, "[$]"));
    }
    rows
}

/// The plain text report shown on the console and written to text files.
pub fn render(outcome: &RunOutcome) -> String {
    let mut text = String::from("************************** OUTPUT **************************\n");
    let mut section = "";
    for row in report_rows(outcome) {
        if row.section != section {
            section = row.section;
            text.push_str(&format!("\n*** {section} ***\n\n"));
        }
        let label = format!("{}:", row.field);
        let line = format!("{label:<30}{} {}", row.value, row.unit);
        text.push_str(line.trim_end());
        text.push('\n');
    }
    text.push_str("\n*************************************************************\n");
    text
}

/// A, B, ..., Z, AA, AB, ... for the runs of a batch.
pub fn run_suffix(index: usize) -> String {
    let mut suffix = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        suffix.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    suffix.iter().rev().map(|&c| c as char).collect()
}

pub fn file_name(index: usize, format: FileFormat) -> String {
    let extension = match format {
        FileFormat::Csv => "csv",
        FileFormat::Text => "txt",
    };
    format!("{FILE_PREFIX} {}.{extension}", run_suffix(index))
}

pub fn write_csv<W: Write>(writer: W, outcome: &RunOutcome) -> RunnerResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in report_rows(outcome) {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn write_file(path: &Path, format: FileFormat, outcome: &RunOutcome) -> RunnerResult<()> {
    let file = File::create(path).map_err(|e| RunnerError::io(path, e))?;
    match format {
        FileFormat::Csv => write_csv(file, outcome),
        FileFormat::Text => {
            let mut file = io::BufWriter::new(file);
            file.write_all(render(outcome).as_bytes())
                .and_then(|_| file.flush())
                .map_err(|e| RunnerError::io(path, e))
        }
    }
}

/// Prints the outcomes or writes one file per successful run into `output_dir`.
/// Files keep the letter of their run, so a failed run leaves a gap.
pub fn publish(
    outcomes: &[PricingResult<RunOutcome>],
    format: OutputFormat,
    output_dir: &Path,
) -> RunnerResult<Vec<PathBuf>> {
    let file_format = format.file_format();
    if file_format.is_some() {
        fs::create_dir_all(output_dir).map_err(|e| RunnerError::io(output_dir, e))?;
    }

    let mut written = Vec::new();
    for (index, outcome) in outcomes.iter().enumerate() {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(run = index, error = %err, "nothing to report");
                eprintln!("Run {} failed: {err}\n", run_suffix(index));
                continue;
            }
        };
        match file_format {
            None => println!("{}\n", render(outcome)),
            Some(file_format) => {
                let path = output_dir.join(file_name(index, file_format));
                write_file(&path, file_format, outcome)?;
                info!(path = %path.display(), "report written");
                written.push(path);
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing::simulation::{RngEngine, StandardNormalSource};
    use pricing::{
        value_request, DerivativeParameter, ExerciseType, OptionContract, PayoffSelection,
        PricingError, PricingRequest, SchemeSelection,
    };

    fn outcome(scheme: SchemeSelection, payoff: PayoffSelection) -> RunOutcome {
        let dp = DerivativeParameter::new(60.0, 65.0, 0.25, 0.08, 0.3);
        let nr_steps = scheme.discretizes_time().then_some(10);
        let contract = OptionContract::new(dp, 500, nr_steps).unwrap();
        let request = PricingRequest::new(contract, scheme, payoff).unwrap();
        let mut source = StandardNormalSource::from_seed(RngEngine::Default, 3);
        value_request(&request, &mut source, None).unwrap()
    }

    fn field_names(rows: &[ReportRow]) -> Vec<&'static str> {
        rows.iter().map(|row| row.field).collect()
    }

    #[test]
    fn suffixes() {
        assert_eq!(run_suffix(0), "A");
        assert_eq!(run_suffix(1), "B");
        assert_eq!(run_suffix(25), "Z");
        assert_eq!(run_suffix(26), "AA");
        assert_eq!(run_suffix(27), "AB");
        assert_eq!(run_suffix(701), "ZZ");
        assert_eq!(run_suffix(702), "AAA");
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name(0, FileFormat::Text), "Monte Carlo Option Pricing A.txt");
        assert_eq!(file_name(2, FileFormat::Csv), "Monte Carlo Option Pricing C.csv");
    }

    #[test]
    fn only_csv_and_text_go_to_files() {
        assert_eq!(OutputFormat::Console.file_format(), None);
        assert_eq!(OutputFormat::Csv.file_format(), Some(FileFormat::Csv));
        assert_eq!(OutputFormat::Text.file_format(), Some(FileFormat::Text));

        let dir = std::env::temp_dir().join(format!("mcprice-console-{}", std::process::id()));
        let outcomes = vec![Ok(outcome(
            SchemeSelection::Gbm,
            PayoffSelection::european(ExerciseType::Call),
        ))];
        let written = publish(&outcomes, OutputFormat::Console, &dir).unwrap();
        assert!(written.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn csv_files_hold_csv() {
        let dir = std::env::temp_dir().join(format!("mcprice-csv-{}", std::process::id()));
        let outcomes = vec![Ok(outcome(
            SchemeSelection::Gbm,
            PayoffSelection::european(ExerciseType::Call),
        ))];
        let written = publish(&outcomes, OutputFormat::Csv, &dir).unwrap();
        assert_eq!(written, vec![dir.join("Monte Carlo Option Pricing A.csv")]);
        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.starts_with("section,field,value,unit"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn optional_rows() {
        let gbm = outcome(
            SchemeSelection::Gbm,
            PayoffSelection::european(ExerciseType::Call),
        );
        let fields = field_names(&report_rows(&gbm));
        assert_eq!(fields.len(), 18);
        assert!(!fields.contains(&"NSteps"));
        assert!(!fields.contains(&"Option Upper Cap"));

        let capped = outcome(
            SchemeSelection::Milstein,
            PayoffSelection::asian(ExerciseType::Put).with_caps(80.0, 0.05),
        );
        let rows = report_rows(&capped);
        let fields = field_names(&rows);
        assert!(fields.contains(&"NSteps"));
        assert!(fields.contains(&"Option Upper Cap"));
        assert!(!fields.contains(&"Option Lower Cap"));
        assert_eq!(rows[2].value, "Asian Put");
        assert_eq!(rows[1].value, "Milstein Method");
    }

    #[test]
    fn console_report() {
        let euler = outcome(
            SchemeSelection::ExplicitEuler,
            PayoffSelection::european(ExerciseType::Put),
        );
        let text = render(&euler);
        assert!(text.contains("*** Model Parameters ***"));
        assert!(text.contains("*** Simulation Results and Statistics ***"));
        assert!(text.contains("*** Simulation input parameters ***"));
        assert!(text.contains("Default Random Engine"));
        assert!(text.contains("European Put"));
        assert!(text.contains(&format!("{}", euler.result.price)));
        assert!(text.contains("NSteps:"));
        assert!(text.lines().all(|line| line == line.trim_end()));
    }

    #[test]
    fn csv_report() {
        let gbm = outcome(
            SchemeSelection::Gbm,
            PayoffSelection::european(ExerciseType::Call),
        );
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &gbm).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("section,field,value,unit"));
        assert_eq!(
            lines.next(),
            Some("Model Parameters,RNG variate,Default Random Engine,")
        );
        assert_eq!(text.lines().count(), 19);
    }

    #[test]
    fn published_files_keep_their_run_letter() {
        let dir = std::env::temp_dir().join(format!("mcprice-report-{}", std::process::id()));
        let outcomes = vec![
            Ok(outcome(
                SchemeSelection::Gbm,
                PayoffSelection::european(ExerciseType::Call),
            )),
            Err(PricingError::DeadlineExceeded {
                completed: 10_000,
                limit: std::time::Duration::ZERO,
            }),
            Ok(outcome(
                SchemeSelection::ExplicitEuler,
                PayoffSelection::european(ExerciseType::Put),
            )),
        ];

        let written = publish(&outcomes, OutputFormat::Text, &dir).unwrap();
        assert_eq!(
            written,
            vec![
                dir.join("Monte Carlo Option Pricing A.txt"),
                dir.join("Monte Carlo Option Pricing C.txt"),
            ]
        );
        let text = fs::read_to_string(&written[1]).unwrap();
        assert!(text.contains("Explicit Euler"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
