//! Summary output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use vaxtrack_inventory::InventorySummary;

/// Buffered writer of one summary line per processed event.
#[derive(Debug)]
pub struct SummarySink<W: Write> {
    writer: BufWriter<W>,
    lines: u64,
}

impl SummarySink<File> {
    /// Create (truncating) the output file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> SummarySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            lines: 0,
        }
    }

    pub fn write(&mut self, summary: &InventorySummary) -> io::Result<()> {
        self.writer.write_all(summary.to_line().as_bytes())?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_summary() {
        let mut sink = SummarySink::new(Vec::new());
        sink.write(&InventorySummary {
            total_inventory: 15,
            total_demand: 20,
            total_received: 5,
            total_sent: 0,
        })
        .unwrap();
        sink.write(&InventorySummary {
            total_inventory: 7,
            total_demand: 12,
            total_received: 5,
            total_sent: 8,
        })
        .unwrap();

        assert_eq!(sink.lines_written(), 2);
        let out = sink.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "15,20,5,0\n7,12,5,8\n");
    }
}
