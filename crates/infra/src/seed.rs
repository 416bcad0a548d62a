//! Seed input: the initial suppliers, clinics, logistics providers and lots.
//!
//! Layout:
//!
//! ```text
//! V,S,C,L                              counts, in this order
//! id,date,supplier_id,quantity         x V   vaccine lots
//! id,name,logistics_id                 x S   suppliers
//! id,location,demand,logistics_id      x C   clinics
//! id,name,count_sent,count_received    x L   logistics providers
//! ```
//!
//! Blank lines are ignored. Records past the announced counts are ignored with a warning.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use vaxtrack_core::{ClinicId, Entity, LogisticsId, LotId, Quantity, ReceivedDate, SupplierId};
use vaxtrack_inventory::{Clinic, LogisticsProvider, Supplier, VaccineLot};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed input: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("seed integrity violation: {0}")]
    Integrity(String),
}

/// Everything the store starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    pub lots: Vec<VaccineLot>,
    pub suppliers: Vec<Supplier>,
    pub clinics: Vec<Clinic>,
    pub logistics: Vec<LogisticsProvider>,
}

impl SeedData {
    /// Read and parse a seed file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse(reader: impl BufRead) -> Result<Self, SeedError> {
        let mut records = RecordReader::new(reader);

        let (line, header) = records.next_record("header", 4)?;
        let counts = header
            .iter()
            .map(|raw| field::<usize>(line, "count", raw))
            .collect::<Result<Vec<_>, _>>()?;
        let [lot_count, supplier_count, clinic_count, logistics_count] = counts[..] else {
            return Err(SeedError::Malformed {
                line,
                reason: "header must hold four counts".to_string(),
            });
        };

        let mut seed = SeedData::default();

        for _ in 0..lot_count {
            let (line, f) = records.next_record("vaccine", 4)?;
            seed.lots.push(VaccineLot {
                id: field::<LotId>(line, "vaccine id", &f[0])?,
                received_date: ReceivedDate::new(f[1].as_str()),
                supplier_id: field::<SupplierId>(line, "supplier id", &f[2])?,
                quantity: field::<Quantity>(line, "quantity", &f[3])?,
            });
        }

        for _ in 0..supplier_count {
            let (line, f) = records.next_record("supplier", 3)?;
            seed.suppliers.push(Supplier {
                id: field::<SupplierId>(line, "supplier id", &f[0])?,
                name: f[1].clone(),
                logistics_id: field::<LogisticsId>(line, "logistics id", &f[2])?,
            });
        }

        for _ in 0..clinic_count {
            let (line, f) = records.next_record("clinic", 4)?;
            seed.clinics.push(Clinic {
                id: field::<ClinicId>(line, "clinic id", &f[0])?,
                location: f[1].clone(),
                demand: field::<i64>(line, "demand", &f[2])?,
                logistics_id: field::<LogisticsId>(line, "logistics id", &f[3])?,
            });
        }

        for _ in 0..logistics_count {
            let (line, f) = records.next_record("logistics", 4)?;
            seed.logistics.push(LogisticsProvider {
                id: field::<LogisticsId>(line, "logistics id", &f[0])?,
                name: f[1].clone(),
                count_sent: field::<Quantity>(line, "count_sent", &f[2])?,
                count_received: field::<Quantity>(line, "count_received", &f[3])?,
            });
        }

        let leftover = records.count_remaining()?;
        if leftover > 0 {
            tracing::warn!(leftover, "seed input has records past the announced counts; ignoring them");
        }

        Ok(seed)
    }

    /// Check ids are unique per table and every reference resolves.
    pub fn validate(&self) -> Result<(), SeedError> {
        let logistics = unique_ids("logistics provider", &self.logistics)?;
        let suppliers = unique_ids("supplier", &self.suppliers)?;
        unique_ids("clinic", &self.clinics)?;
        unique_ids("vaccine lot", &self.lots)?;

        for supplier in &self.suppliers {
            if !logistics.contains(&supplier.logistics_id) {
                return Err(SeedError::Integrity(format!(
                    "supplier {} references missing logistics provider {}",
                    supplier.id, supplier.logistics_id
                )));
            }
        }
        for clinic in &self.clinics {
            if !logistics.contains(&clinic.logistics_id) {
                return Err(SeedError::Integrity(format!(
                    "clinic {} references missing logistics provider {}",
                    clinic.id, clinic.logistics_id
                )));
            }
        }
        for lot in &self.lots {
            if !suppliers.contains(&lot.supplier_id) {
                return Err(SeedError::Integrity(format!(
                    "vaccine lot {} references missing supplier {}",
                    lot.id, lot.supplier_id
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for SeedData {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

fn unique_ids<E: Entity>(entity: &str, rows: &[E]) -> Result<HashSet<E::Id>, SeedError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id()) {
            return Err(SeedError::Integrity(format!(
                "duplicate {entity} id {}",
                row.id()
            )));
        }
    }
    Ok(seen)
}

fn field<T>(line: usize, name: &str, raw: &str) -> Result<T, SeedError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| SeedError::Malformed {
        line,
        reason: format!("invalid {name} {raw:?}: {e}"),
    })
}

/// Non-blank, comma-split lines with 1-based line numbers.
struct RecordReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_record(
        &mut self,
        kind: &'static str,
        arity: usize,
    ) -> Result<(usize, Vec<String>), SeedError> {
        loop {
            let Some(line) = self.lines.next() else {
                return Err(SeedError::Malformed {
                    line: self.line_no + 1,
                    reason: format!("unexpected end of input, expected a {kind} record"),
                });
            };
            let line = line?;
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
            if fields.len() != arity {
                return Err(SeedError::Malformed {
                    line: self.line_no,
                    reason: format!(
                        "{kind} record has {} fields, expected {arity}",
                        fields.len()
                    ),
                });
            }
            return Ok((self.line_no, fields));
        }
    }

    fn count_remaining(&mut self) -> Result<usize, SeedError> {
        let mut count = 0;
        for line in self.lines.by_ref() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}
