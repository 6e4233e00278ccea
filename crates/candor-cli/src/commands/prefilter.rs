//! `candor prefilter` -- audit the keyword dictionary offline.
//!
//! Scans a table with the configured dictionary and the regex baseline
//! classifier, without touching the network. The interesting number is
//! the last one: rows the baseline flags as non-answers that the
//! dictionary misses. Those rows would be silently resolved to 0 by a
//! real run, so the count estimates the prefilter's false-negative
//! exposure on this table.
//!
//! # Example
//!
//! ```text
//! candor prefilter calls.jsonl
//! candor prefilter calls.jsonl --dictionary base
//! ```

use std::path::PathBuf;

use clap::Args;

use candor_core::baseline::BaselineClassifier;
use candor_core::{table, KeywordDictionary};
use candor_types::DictionaryVariant;

/// Arguments for the `candor prefilter` subcommand.
#[derive(Args)]
pub struct PrefilterArgs {
    /// Input table (JSONL, one record per line).
    pub input: PathBuf,

    /// Dictionary variant to audit (base, with-future).
    #[arg(long, default_value = "with-future")]
    pub dictionary: String,

    /// Print each row the baseline flags but the dictionary misses.
    #[arg(long)]
    pub show_misses: bool,
}

fn parse_variant(name: &str) -> anyhow::Result<DictionaryVariant> {
    match name {
        "base" => Ok(DictionaryVariant::Base),
        "with-future" => Ok(DictionaryVariant::WithFuture),
        other => anyhow::bail!("unknown dictionary variant: {other} (expected base, with-future)"),
    }
}

/// Run the prefilter audit.
pub async fn run(args: PrefilterArgs) -> anyhow::Result<()> {
    let dictionary = KeywordDictionary::for_variant(parse_variant(&args.dictionary)?);
    let baseline = BaselineClassifier::new();
    let rows = table::load_records(&args.input).await?;

    let mut kw_hits = 0usize;
    let mut baseline_hits = 0usize;
    let mut misses = 0usize;
    for (i, row) in rows.iter().enumerate() {
        let scan = dictionary.find_matches(&row.answer);
        let verdict = baseline.classify(&row.answer);
        if scan.matched {
            kw_hits += 1;
        }
        if verdict.is_nonanswer {
            baseline_hits += 1;
        }
        if verdict.is_nonanswer && !scan.matched {
            misses += 1;
            if args.show_misses {
                println!("row {i} ({}): {}", row.transcriptid, row.answer);
            }
        }
    }

    println!(
        "dictionary:        {} ({} phrases)",
        dictionary.name(),
        dictionary.len()
    );
    println!("rows:              {}", rows.len());
    println!("keyword hits:      {kw_hits}");
    println!("baseline hits:     {baseline_hits}");
    println!("baseline-only:     {misses}  (flagged by baseline, missed by dictionary)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_parse() {
        assert_eq!(parse_variant("base").unwrap(), DictionaryVariant::Base);
        assert_eq!(
            parse_variant("with-future").unwrap(),
            DictionaryVariant::WithFuture
        );
        assert!(parse_variant("bogus").is_err());
    }
}
