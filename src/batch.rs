//! Batch matching driver.
//!
//! Reads a whole input file into memory, fans the matching out over the
//! rayon pool with one [`MatchContext`] per worker, then writes results
//! sequentially so output order follows input order.

use crate::config::EngineOptions;
use crate::error::Result;
use crate::index::PhraseIndex;
use crate::matcher::{MatchContext, MatchResult};
use crate::reader;
use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Counters from a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Input lines scanned.
    pub lines: usize,
    /// Total matches emitted.
    pub matches: usize,
}

/// Match every line of `lines` against the index in parallel.
///
/// Results are returned grouped per input line, in input order.
pub fn match_lines(
    index: &PhraseIndex,
    options: &EngineOptions,
    lines: &[String],
) -> Vec<Vec<MatchResult>> {
    lines
        .par_iter()
        .map_init(MatchContext::new, |ctx, line| {
            index.match_str(line, options, ctx)
        })
        .collect()
}

/// Write one TAB-separated output line per match.
///
/// Fields: `=`, xref, canonical pattern text, the matching substring (or
/// the 1-based input line number when substring extraction is off), and the
/// original input line.
pub fn write_results<W: Write>(
    out: &mut W,
    options: &EngineOptions,
    lines: &[String],
    all_results: &[Vec<MatchResult>],
) -> Result<usize> {
    let mut total = 0;
    for (i, results) in all_results.iter().enumerate() {
        for result in results {
            total += 1;
            if options.matching_substring {
                writeln!(
                    out,
                    "=\t{}\t{}\t{}\t{}",
                    result.xref, result.text, result.matched, lines[i]
                )?;
            } else {
                writeln!(
                    out,
                    "=\t{}\t{}\t{}\t{}",
                    result.xref,
                    result.text,
                    i + 1,
                    lines[i]
                )?;
            }
        }
    }
    Ok(total)
}

/// Run batch matching over a (possibly gzip-compressed) input file.
pub fn run_batch_file<W: Write>(
    index: &PhraseIndex,
    options: &EngineOptions,
    input: &Path,
    out: &mut W,
) -> Result<BatchStats> {
    let read_start = Instant::now();
    let lines = reader::read_all_lines(input)?;
    info!(
        "Read {} lines in {}ms",
        lines.len(),
        read_start.elapsed().as_millis()
    );

    let match_start = Instant::now();
    let all_results = match_lines(index, options, &lines);
    let elapsed = match_start.elapsed();

    let matches = write_results(out, options, &lines, &all_results)?;

    let stats = BatchStats {
        lines: lines.len(),
        matches,
    };
    info!(
        "Processed {} strings in {}ms, {} matches",
        stats.lines,
        elapsed.as_millis(),
        stats.matches
    );
    if !lines.is_empty() && elapsed.as_millis() > 0 {
        info!(
            "Throughput: {} strings/sec",
            (lines.len() as u128 * 1000) / elapsed.as_millis()
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index(patterns: &[&str]) -> PhraseIndex {
        let options = EngineOptions::default();
        let mut index = PhraseIndex::new();
        for pattern in patterns {
            index.add_pattern(pattern, &options).unwrap();
        }
        index.prepare_for_matching().unwrap();
        index
    }

    #[test]
    fn test_match_lines_preserves_input_order() {
        let index = build_index(&["alpha beta\tA", "gamma delta\tB"]);
        let options = EngineOptions::new().with_matching_substring(true);

        let lines: Vec<String> = vec![
            "gamma delta here".into(),
            "no hits".into(),
            "alpha beta there".into(),
        ];
        let results = match_lines(&index, &options, &lines);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0][0].xref, "B");
        assert!(results[1].is_empty());
        assert_eq!(results[2][0].xref, "A");
    }

    #[test]
    fn test_parallel_matches_equal_sequential() {
        let index = build_index(&["alpha beta\tA", "new york city\tB", "foo bar\tC"]);
        let options = EngineOptions::new().with_matching_substring(true);

        let lines: Vec<String> = (0..500)
            .map(|i| format!("line {i} alpha x beta and new york city foo-bar"))
            .collect();

        let parallel = match_lines(&index, &options, &lines);

        let mut ctx = MatchContext::new();
        let sequential: Vec<Vec<MatchResult>> = lines
            .iter()
            .map(|line| index.match_str(line, &options, &mut ctx))
            .collect();

        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_output_format_with_substring() {
        let index = build_index(&["alpha beta\tA\tcat"]);
        let options = EngineOptions::new().with_matching_substring(true);

        let lines: Vec<String> = vec!["see alpha beta go".into()];
        let results = match_lines(&index, &options, &lines);

        let mut out = Vec::new();
        let total = write_results(&mut out, &options, &lines, &results).unwrap();
        assert_eq!(total, 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "=\tA\tcat\talpha beta\talpha beta\tsee alpha beta go\n"
        );
    }

    #[test]
    fn test_output_format_with_line_numbers() {
        let index = build_index(&["alpha beta\tA"]);
        let options = EngineOptions::default();

        let lines: Vec<String> = vec!["nothing".into(), "alpha beta".into()];
        let results = match_lines(&index, &options, &lines);

        let mut out = Vec::new();
        write_results(&mut out, &options, &lines, &results).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "=\tA\talpha beta\t2\talpha beta\n");
    }
}
