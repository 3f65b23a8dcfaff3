use crate::application::simulator::Snapshot;
use crate::error::Result;
use std::io::Write;

/// Writes the final simulator state as pretty-printed JSON.
pub struct SnapshotWriter<W: Write> {
    writer: W,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, snapshot)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Payment, PaymentAttributes};
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_snapshot() {
        let snapshot = Snapshot {
            payments: vec![Payment::new(
                "p1",
                "org",
                PaymentAttributes {
                    amount: dec!(3.10),
                    currency: "GBP".to_string(),
                    ..Default::default()
                },
            )],
            ..Default::default()
        };

        let mut buffer = Vec::new();
        SnapshotWriter::new(&mut buffer)
            .write_snapshot(&snapshot)
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["payments"][0]["id"], "p1");
        assert_eq!(parsed["payments"][0]["type"], "payments");
        assert_eq!(parsed["payments"][0]["attributes"]["amount"], "3.10");
        assert_eq!(parsed["subscriptions"], serde_json::json!([]));
    }
}
