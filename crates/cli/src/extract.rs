//! `closetrack extract` — run tag extraction against an uploaded document.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use rust_decimal::Decimal;

use closetrack_engine::normalize::normalize;
use closetrack_engine::{run_bulk, run_single, MatchPolicy, MemoryStore, SingleRequest};

use crate::exit_codes::{
    extract_exit_code, grid_exit_code, EXIT_EXTRACTION, EXIT_MISMATCH, EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ExtractCommands {
    /// Extract every tag in a period from one document
    #[command(after_help = "\
Examples:
  closetrack extract bulk support.xlsx --trial-balance tb.csv --period 1
  closetrack extract bulk support.xlsx --trial-balance tb.csv --period 1 --json
  closetrack extract bulk q1.csv --trial-balance tb.csv --period 1 --policy close.toml
  closetrack extract bulk support.xlsx --trial-balance tb.csv --period 1 --output result.json")]
    Bulk {
        /// Supporting document (.xlsx, .xls, .csv, .tsv, .txt)
        document: PathBuf,

        /// Trial balance CSV with account_number, name, expected_balance columns
        #[arg(long)]
        trial_balance: PathBuf,

        /// Period the tags belong to
        #[arg(long)]
        period: u32,

        /// Match policy TOML (tolerance = "0.05"); default is exact match
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Evidence reference recorded on every created validation
        #[arg(long)]
        evidence: Option<String>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create one validation for a single account
    #[command(after_help = "\
Examples:
  closetrack extract account support.xlsx --trial-balance tb.csv --period 1 --account 1000
  closetrack extract account --trial-balance tb.csv --period 1 --account 1000 --amount 4800.00
  closetrack extract account support.xlsx --trial-balance tb.csv --period 1 --account 1000 --notes 'bank confirmed'")]
    Account {
        /// Supporting document (omit when passing --amount)
        document: Option<PathBuf>,

        /// Trial balance CSV with account_number, name, expected_balance columns
        #[arg(long)]
        trial_balance: PathBuf,

        /// Period the account belongs to
        #[arg(long)]
        period: u32,

        /// Account number to validate
        #[arg(long)]
        account: String,

        /// Manual amount; overrides anything extracted from the document
        #[arg(long)]
        amount: Option<Decimal>,

        /// Match policy TOML; default is exact match
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Notes recorded on the validation and its linked task
        #[arg(long)]
        notes: Option<String>,

        /// Evidence reference recorded on the validation
        #[arg(long)]
        evidence: Option<String>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_extract(cmd: ExtractCommands) -> Result<(), CliError> {
    match cmd {
        ExtractCommands::Bulk {
            document,
            trial_balance,
            period,
            policy,
            evidence,
            json,
            output,
        } => cmd_extract_bulk(document, trial_balance, period, policy, evidence, json, output),
        ExtractCommands::Account {
            document,
            trial_balance,
            period,
            account,
            amount,
            policy,
            notes,
            evidence,
            json,
        } => cmd_extract_account(
            document, trial_balance, period, &account, amount, policy, notes, evidence, json,
        ),
    }
}

fn load_policy(path: Option<&Path>) -> Result<MatchPolicy, CliError> {
    match path {
        None => Ok(MatchPolicy::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::usage(format!("cannot read policy: {e}")))?;
            MatchPolicy::from_toml(&text).map_err(CliError::from_engine)
        }
    }
}

fn load_grid(path: &Path) -> Result<closetrack_engine::Grid, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::usage(format!("bad document path: {}", path.display())))?;
    closetrack_io::load_document(&bytes, filename)
        .map_err(|e| CliError { code: grid_exit_code(&e), message: e.to_string(), hint: None })
}

/// Seed a store from a trial balance CSV. Expects a header row with
/// account_number, name, and expected_balance columns (case-insensitive,
/// any order); balances go through the same normalizer as extracted
/// values, so "$5,000.00" style exports work.
fn load_trial_balance(path: &Path, period_id: u32) -> Result<MemoryStore, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| CliError::usage(format!("bad trial balance header: {e}")))?
        .clone();

    let col = |name: &str| -> Result<usize, CliError> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                CliError::usage(format!("trial balance is missing a '{name}' column"))
            })
    };
    let number_col = col("account_number")?;
    let name_col = col("name")?;
    let balance_col = col("expected_balance")?;

    let mut store = MemoryStore::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| CliError::usage(format!("bad trial balance row: {e}")))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let account_number = field(number_col);
        if account_number.is_empty() {
            continue;
        }
        let balance = normalize(field(balance_col)).map_err(|e| {
            CliError::usage(format!(
                "trial balance row {} ({account_number}): bad expected_balance: {e}",
                line + 2,
            ))
        })?;

        store
            .add_account(period_id, account_number, field(name_col), balance)
            .map_err(CliError::from_engine)?;
    }

    Ok(store)
}

fn cmd_extract_bulk(
    document: PathBuf,
    trial_balance: PathBuf,
    period: u32,
    policy_path: Option<PathBuf>,
    evidence: Option<String>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let policy = load_policy(policy_path.as_deref())?;
    let mut store = load_trial_balance(&trial_balance, period)?;
    let grid = load_grid(&document)?;

    let result = run_bulk(&mut store, &grid, period, &policy, evidence.as_deref())
        .map_err(CliError::from_engine)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::general(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!("{}", result.summary());
    for err in &result.errors {
        match err.location {
            Some(at) => eprintln!("  {}: {} ({at})", err.tag, err.kind),
            None => eprintln!("  {}: {}", err.tag, err.kind),
        }
    }
    for tag in &result.missing_tags {
        eprintln!("  {tag}: not found in document");
    }

    if !result.errors.is_empty() {
        return Err(CliError {
            code: EXIT_EXTRACTION,
            message: format!("{} tag(s) failed extraction", result.errors.len()),
            hint: Some("fix the document or use `extract account --amount` per account".into()),
        });
    }
    let mismatched = result.created.iter().filter(|c| !c.validation.matches_balance).count();
    if mismatched > 0 {
        return Err(CliError {
            code: EXIT_MISMATCH,
            message: format!("{mismatched} validation(s) outside tolerance"),
            hint: None,
        });
    }
    if !result.missing_tags.is_empty() {
        return Err(CliError {
            code: EXIT_MISMATCH,
            message: format!("{} registered tag(s) absent from document", result.missing_tags.len()),
            hint: None,
        });
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_extract_account(
    document: Option<PathBuf>,
    trial_balance: PathBuf,
    period: u32,
    account: &str,
    amount: Option<Decimal>,
    policy_path: Option<PathBuf>,
    notes: Option<String>,
    evidence: Option<String>,
    json_output: bool,
) -> Result<(), CliError> {
    if document.is_none() && amount.is_none() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "no document and no --amount; nothing to validate".into(),
            hint: Some("pass a supporting document, or --amount for a manual validation".into()),
        });
    }

    let policy = load_policy(policy_path.as_deref())?;
    let mut store = load_trial_balance(&trial_balance, period)?;
    let grid = document.as_deref().map(load_grid).transpose()?;

    let request = SingleRequest {
        manual_amount: amount,
        task_id: None,
        notes,
        evidence_reference: evidence,
    };

    let outcome = run_single(&mut store, grid.as_ref(), period, account, request, &policy)
        .map_err(|e| {
            let mut err = CliError::from_engine(e);
            if err.code == EXIT_EXTRACTION {
                err.hint = Some("retry with --amount to enter the value manually".into());
            }
            err
        })?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    let v = &outcome.validation;
    eprintln!(
        "{}: amount {} vs expected, difference {}, {}{}",
        outcome.tag,
        v.supporting_amount,
        v.difference,
        if v.matches_balance { "matches" } else { "MISMATCH" },
        if v.auto_extracted { " (auto-extracted)" } else { "" },
    );

    if !v.matches_balance {
        return Err(CliError {
            code: EXIT_MISMATCH,
            message: format!("difference {} is outside tolerance", v.difference),
            hint: None,
        });
    }

    Ok(())
}

impl CliError {
    pub fn from_engine(err: closetrack_engine::ExtractError) -> Self {
        Self { code: extract_exit_code(&err), message: err.to_string(), hint: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tb_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn trial_balance_columns_in_any_order() {
        let f = tb_file("name,expected_balance,account_number\nCash,\"$5,000.00\",1000\n");
        let store = load_trial_balance(f.path(), 1).unwrap();
        let tag = closetrack_engine::ReconTag::generate(1, "1000").unwrap();
        use closetrack_engine::store::AccountStore;
        let account = store.account_by_tag(&tag).unwrap();
        assert_eq!(account.name, "Cash");
        assert_eq!(account.expected_balance, "5000.00".parse().unwrap());
    }

    #[test]
    fn trial_balance_missing_column_is_usage_error() {
        let f = tb_file("account_number,name\n1000,Cash\n");
        let err = load_trial_balance(f.path(), 1).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("expected_balance"));
    }

    #[test]
    fn trial_balance_bad_balance_names_the_row() {
        let f = tb_file("account_number,name,expected_balance\n1000,Cash,soon\n");
        let err = load_trial_balance(f.path(), 1).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("1000"));
    }

    #[test]
    fn trial_balance_blank_rows_skipped() {
        let f = tb_file("account_number,name,expected_balance\n1000,Cash,5000.00\n,,\n");
        let store = load_trial_balance(f.path(), 1).unwrap();
        use closetrack_engine::store::AccountStore;
        assert_eq!(store.accounts_in_period(1).len(), 1);
    }
}
