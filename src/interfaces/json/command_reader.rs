use crate::application::command::Command;
use crate::error::{Result, SimError};
use std::io::BufRead;

/// Reads scenario commands from a JSON-lines source.
///
/// Blank lines and lines starting with `#` are skipped. A line that fails to parse is
/// yielded as an error and does not stop the stream.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Lazily parses each line, tagging errors with their 1-based line number.
    pub fn commands(self) -> impl Iterator<Item = (usize, Result<Command>)> {
        self.source
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.map_err(SimError::from)))
            .filter(|(_, line)| match line {
                Ok(text) => {
                    let text = text.trim();
                    !text.is_empty() && !text.starts_with('#')
                }
                Err(_) => true,
            })
            .map(|(number, line)| {
                let command = line.and_then(|text| Ok(serde_json::from_str(&text)?));
                (number, command)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = r#"{"op":"create_payment","id":"p1"}

# pause a little
{"op":"sleep","ms":10}
"#;
        let results: Vec<_> = CommandReader::new(data.as_bytes()).commands().collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[0].1.as_ref().unwrap().op(), "create_payment");
        assert_eq!(results[1].0, 4);
        assert_eq!(results[1].1.as_ref().unwrap(), &Command::Sleep { ms: 10 });
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "{\"op\":\"sleep\",\"ms\":1}\nnot json\n{\"op\":\"sleep\",\"ms\":2}";
        let results: Vec<_> = CommandReader::new(data.as_bytes()).commands().collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1], (2, Err(SimError::Json(_)))));
        assert!(results[2].1.is_ok());
    }
}
