use chrono::NaiveDate;
use folio::{CellValue, FolioError, Record, ReportBuilder, TableInput, parse_column_widths};
use std::process::ExitCode;

const OUTPUT_PATH: &str = "example.pdf";

fn summary() -> Result<Record, FolioError> {
    let created = NaiveDate::from_ymd_opt(2019, 2, 1)
        .and_then(|d| d.and_hms_micro_opt(8, 42, 9, 63_747))
        .ok_or_else(|| FolioError::InvalidConfiguration("bad demo timestamp".to_string()))?;
    Ok(Record::new()
        .with("Report Name", "Ops samps_20181002_084133")
        .with("UserID", "venturf2")
        .with("User Email", "Franklin.Ventura@roche.com")
        .with("Report Created", created)
        .with("Analysis Version", "0.1.0")
        .with("Total Dispensers", 3)
        .with("Failing Dispensers", 2))
}

#[allow(clippy::too_many_arguments)]
fn dispenser(
    label: &str,
    stress: &str,
    kind: &str,
    reagent: &str,
    average: f64,
    std_dev: f64,
    pass_fail: &str,
    complete: i64,
    incomplete: i64,
    failing_reason: &str,
    first_fail: &str,
) -> Record {
    let first_fail: CellValue = match first_fail.parse::<i64>() {
        Ok(value) => value.into(),
        Err(_) => first_fail.into(),
    };
    Record::new()
        .with("Label", label)
        .with("Stress", stress)
        .with("Type", kind)
        .with("Reagent", reagent)
        .with("Average (uL)", average)
        .with("Std Dev (uL)", std_dev)
        .with("Pass/ Fail", pass_fail)
        .with("DFTM Complete", complete)
        .with("DFTM Incomplete", incomplete)
        .with("Failing Reason", failing_reason)
        .with("Drop First Fail", first_fail)
}

fn data() -> Vec<Record> {
    vec![
        dispenser(
            "S2L3S3",
            "Purple",
            "1695501 E90092",
            "water",
            91.9,
            1.01,
            "Fail",
            6,
            9,
            "12 drop(s) greater than 100",
            "301",
        ),
        dispenser(
            "S2SL7S4",
            "25-OCT-2018TG6",
            "1695501 E90092",
            "Avidin Diluent with B5 Blocker for Multimer",
            93.6,
            8.33,
            "Fail",
            3,
            3,
            "1 drop(s) greater than 175",
            "801",
        ),
        dispenser(
            "19-OCT-2018CTR3",
            "CONTROL",
            "W/O OIL ON BARREL TIP",
            "Avidin Diluent with B5 Blocker for Multimer",
            91.9,
            0.97,
            "Pass",
            2,
            3,
            "N/A",
            "N/A",
        ),
    ]
}

fn audit_entry(label: &str, reason: &str, description: &str) -> Record {
    Record::new()
        .with("Label", label)
        .with("Reason", reason)
        .with("User", "venturf2")
        .with("Date", "2019-12-09 23:12:00.93 0807+00:00")
        .with("Description", description)
}

fn audit() -> Vec<Record> {
    vec![
        audit_entry(
            "19-OCT-2018CTR3",
            "Insufficient Prime",
            "Drops excluded from analysis: 100 drops Run: 09-Nov-2018 testgroup8 100_20181109_142408",
        ),
        audit_entry(
            "19-OCT-2018CTR3",
            "Update Dispenser",
            "Dispenser information updated: reagent: water, stress: Purple",
        ),
        audit_entry(
            "S2SL7S4",
            "Rename Dispenser",
            "Dispenser renamed from D1 to 19-OCT-2018CTR3",
        ),
    ]
}

fn run() -> Result<(), FolioError> {
    let widths = parse_column_widths(&[
        "20%", "20%", "20%", "20%", "40", "40", "40", "45", "45", "20%", "47",
    ])?;
    ReportBuilder::new("Dispenser Functionality Tester Data Analysis")
        .landscape()
        .compose(
            &summary()?,
            &TableInput::Records(data()),
            &audit(),
            Some(&widths),
        )?
        .render(OUTPUT_PATH)?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => {
            println!("COMPLETE");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
