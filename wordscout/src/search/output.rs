use serde::Serialize;
use std::io::{self, BufRead, Write};

use super::engine::{SearchOutcome, Searcher};
use super::query::Query;

/// How search results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `FOUND: <file> <line>` lines and plain error messages
    #[default]
    Text,
    /// One JSON object per query
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    #[serde(flatten)]
    outcome: &'a SearchOutcome,
}

/// Writes `outcome` in the plain-text format
pub fn write_text<W: Write>(out: &mut W, outcome: &SearchOutcome) -> io::Result<()> {
    match outcome {
        SearchOutcome::Found { occurrences } => {
            for o in occurrences {
                writeln!(out, "FOUND: {} {}", o.filename, o.line_number)?;
            }
        }
        SearchOutcome::WordNotFound => writeln!(out, "Word not found")?,
        SearchOutcome::FileNotIndexed { filename } => {
            writeln!(out, "ERROR: File <{}> not found", filename)?
        }
        SearchOutcome::TimedOut { filename } => {
            writeln!(out, "ERROR: Timed out waiting for <{}>", filename)?
        }
        SearchOutcome::BadInput => writeln!(out, "ERROR: Bad input")?,
        SearchOutcome::Empty => {}
    }
    Ok(())
}

/// Writes `outcome` as a single JSON line tagged with the raw query
pub fn write_json<W: Write>(out: &mut W, query: &str, outcome: &SearchOutcome) -> io::Result<()> {
    if *outcome == SearchOutcome::Empty {
        return Ok(());
    }
    let report = JsonReport {
        query: query.trim(),
        outcome,
    };
    serde_json::to_writer(&mut *out, &report)?;
    writeln!(out)
}

/// Answers queries from `input` line by line until end of input.
///
/// Output is flushed after every query so interactive callers see results
/// as soon as a blocking advanced search returns. Bytes that are not valid
/// UTF-8 are replaced rather than ending the loop; such a query is simply
/// not found. Returns the number of non-empty queries answered.
pub fn run_search_loop<R, W>(
    searcher: &Searcher<'_>,
    mut input: R,
    output: &mut W,
    format: OutputFormat,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut answered = 0;
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if input.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\n', '\r']);
        let query = Query::parse(line);
        let outcome = searcher.execute(&query);
        if outcome != SearchOutcome::Empty {
            answered += 1;
        }
        match format {
            OutputFormat::Text => write_text(output, &outcome)?,
            OutputFormat::Json => write_json(output, line, &outcome)?,
        }
        output.flush()?;
    }
    Ok(answered)
}
