//! The ingest pass: raw piped input in, persisted line map out.

use crate::ansi::FormattedText;
use crate::extract::{self, Runtime};
use crate::line::{Line, MatchedLine, SimpleLine};
use crate::state::LineMap;
use std::io::BufRead;

/// Read everything from the reader and build the line map.
pub fn line_map_from_reader(
    reader: impl BufRead,
    validate_file_exists: bool,
    all_input: bool,
    runtime: &Runtime,
) -> LineMap {
    let lines: Vec<String> = reader.lines().map_while(Result::ok).collect();
    line_map_from_lines(&lines, validate_file_exists, all_input, runtime)
}

/// Turn input lines into Simple or Match lines keyed by input order.
pub fn line_map_from_lines(
    input_lines: &[String],
    validate_file_exists: bool,
    all_input: bool,
    runtime: &Runtime,
) -> LineMap {
    let mut line_map = LineMap::new();
    for (index, raw) in input_lines.iter().enumerate() {
        // tabs render unpredictably under the cursor-addressed drawing, and
        // stray terminators would wrap rows, so both are normalized away
        let cleaned = raw.replace('\t', "    ").replace(['\n', '\r'], "");
        let formatted = FormattedText::parse(&cleaned);
        let result = extract::match_line(
            &formatted.plain(),
            validate_file_exists,
            all_input,
            runtime,
        );

        let line = match result {
            Some(result) => Line::Match(MatchedLine::new(
                formatted,
                result,
                index,
                validate_file_exists,
                all_input,
                runtime,
            )),
            None => Line::Simple(SimpleLine::new(formatted, index)),
        };
        line_map.insert(index, line);
    }
    line_map
}
