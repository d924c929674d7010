//src/reads.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};
use crate::types::{ClassId, MatchBlock, ReadBlock, ReadRecord};

/// Records that parsed, plus how many were skipped as malformed.
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// Opens a file for line reading, transparently decompressing `.gz`.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    Ok(if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    })
}

/// True for a non-empty sequence made of IUPAC nucleotide codes.
pub fn is_valid_sequence(seq: &str) -> bool {
    !seq.is_empty()
        && seq.bytes().all(|b| {
            matches!(
                b.to_ascii_uppercase(),
                b'A' | b'C' | b'G' | b'T' | b'U' | b'N' | b'R' | b'Y' | b'K' | b'M' | b'S' | b'W'
                    | b'B' | b'D' | b'H' | b'V'
            )
        })
}

struct ErrorBudget {
    skipped: usize,
    limit: usize,
}

impl ErrorBudget {
    fn new(limit: usize) -> Self {
        Self { skipped: 0, limit }
    }

    fn skip(&mut self, line: usize, what: &str) -> Result<()> {
        self.skipped += 1;
        log::debug!("Skipping malformed {} at line {}", what, line);
        if self.skipped > self.limit {
            return Err(Error::TooManyParseErrors {
                count: self.skipped,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

/// Reads a FASTA or FASTQ file (optionally gzipped). The format is taken
/// from the first non-empty line.
pub fn read_sequences<P: AsRef<Path>>(path: P, max_parse_errors: usize) -> Result<Loaded<ReadRecord>> {
    read_sequences_from(open_reader(path)?, max_parse_errors)
}

pub fn read_sequences_from<R: BufRead>(reader: R, max_parse_errors: usize) -> Result<Loaded<ReadRecord>> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, l)| l.map(|l| (i + 1, l.trim_end().to_string())))
        .peekable();

    let mut budget = ErrorBudget::new(max_parse_errors);
    let mut records = Vec::new();

    while let Some(Ok((_, line))) = lines.peek() {
        if !line.is_empty() {
            break;
        }
        lines.next();
    }
    let fastq = match lines.peek() {
        Some(Ok((_, first))) => first.starts_with('@'),
        // the loop below surfaces the io error
        Some(Err(_)) => false,
        None => return Ok(Loaded::default()),
    };

    if fastq {
        while let Some(header) = lines.next() {
            let (line_no, header) = header?;
            if header.is_empty() {
                continue;
            }
            let Some(name) = header.strip_prefix('@') else {
                budget.skip(line_no, "FASTQ header")?;
                continue;
            };
            let seq = lines.next().transpose()?;
            let plus = lines.next().transpose()?;
            let qual = lines.next().transpose()?;
            match (seq, plus, qual) {
                (Some((_, seq)), Some((_, plus)), Some(_)) if plus.starts_with('+') => {
                    push_record(&mut records, &mut budget, line_no, name, seq)?;
                }
                _ => budget.skip(line_no, "FASTQ record")?,
            }
        }
    } else {
        let mut current: Option<(usize, String, String)> = None;
        for line in lines {
            let (line_no, line) = line?;
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('>') {
                if let Some((at, name, seq)) = current.take() {
                    push_record(&mut records, &mut budget, at, &name, seq)?;
                }
                current = Some((line_no, name.to_string(), String::new()));
            } else if let Some((_, _, seq)) = current.as_mut() {
                seq.push_str(line.trim());
            } else {
                budget.skip(line_no, "FASTA line")?;
            }
        }
        if let Some((at, name, seq)) = current {
            push_record(&mut records, &mut budget, at, &name, seq)?;
        }
    }

    if budget.skipped > 0 {
        log::warn!("Skipped {} malformed reads", budget.skipped);
    }
    Ok(Loaded {
        records,
        skipped: budget.skipped,
    })
}

fn push_record(
    records: &mut Vec<ReadRecord>,
    budget: &mut ErrorBudget,
    line_no: usize,
    header: &str,
    seq: String,
) -> Result<()> {
    if !is_valid_sequence(&seq) {
        return budget.skip(line_no, "sequence");
    }
    let name = header.split_whitespace().next().unwrap_or_default();
    records.push(ReadRecord::new(name, seq.to_ascii_uppercase()));
    Ok(())
}

/// Reads a tab separated match table:
/// ```text
/// <read>\t<class id>\t<bit score>\t<expected>\t<percent identity>
/// ```
/// Consecutive lines with the same read name form one [`ReadBlock`]; a line
/// with only a read name yields a read without matches.
pub fn read_match_table<P: AsRef<Path>>(path: P, cname: &str, max_parse_errors: usize) -> Result<Loaded<ReadBlock>> {
    read_match_table_from(open_reader(path)?, cname, max_parse_errors)
}

pub fn read_match_table_from<R: BufRead>(reader: R, cname: &str, max_parse_errors: usize) -> Result<Loaded<ReadBlock>> {
    let mut budget = ErrorBudget::new(max_parse_errors);
    let mut records: Vec<ReadBlock> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let name = fields[0];
        if name.is_empty() {
            budget.skip(line_no, "match line")?;
            continue;
        }

        if records.last().map_or(true, |last| last.name != name) {
            records.push(ReadBlock::new(name));
        }
        if fields.len() == 1 {
            continue;
        }
        let last = records.len() - 1;
        match parse_match(&fields, cname) {
            Some(m) => records[last].matches.push(m),
            None => budget.skip(line_no, "match line")?,
        }
    }

    if budget.skipped > 0 {
        log::warn!("Skipped {} malformed match lines", budget.skipped);
    }
    Ok(Loaded {
        records,
        skipped: budget.skipped,
    })
}

fn parse_match(fields: &[&str], cname: &str) -> Option<MatchBlock> {
    if fields.len() < 5 {
        return None;
    }
    let id: ClassId = fields[1].parse().ok()?;
    let bit_score: f32 = fields[2].parse().ok()?;
    let expected: f32 = fields[3].parse().ok()?;
    let percent_identity: f32 = fields[4].parse().ok()?;
    Some(MatchBlock::new(bit_score, expected, percent_identity).with_class(cname, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TAXONOMY;
    use std::io::Write;

    #[test]
    fn test_fasta_multiline_and_invalid() {
        let text = ">r1 first read\nACGT\nacgt\n>r2\nAC-GT\n>r3\nGGCC\n";
        let loaded = read_sequences_from(text.as_bytes(), 10).unwrap();
        assert_eq!(loaded.skipped, 1);
        assert_eq!(
            loaded.records,
            vec![ReadRecord::new("r1", "ACGTACGT"), ReadRecord::new("r3", "GGCC")]
        );
    }

    #[test]
    fn test_fastq() {
        let text = "@q1 x\nACGTN\n+\nIIIII\n@q2\n\n+\n\n@q3\nTTTT\n+\nIIII\n";
        let loaded = read_sequences_from(text.as_bytes(), 10).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0], ReadRecord::new("q1", "ACGTN"));
        assert_eq!(loaded.records[1].name, "q3");
        assert!(loaded.skipped >= 1);
    }

    #[test]
    fn test_empty_input() {
        let loaded = read_sequences_from(b"".as_slice(), 0).unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.skipped, 0);
        let loaded = read_sequences_from(b"\n\n".as_slice(), 0).unwrap();
        assert!(loaded.records.is_empty());
    }

    #[test]
    fn test_error_threshold_escalates() {
        let text = ">a\n123\n>b\n456\n>c\n789\n";
        let result = read_sequences_from(text.as_bytes(), 2);
        assert!(matches!(result, Err(Error::TooManyParseErrors { count: 3, limit: 2 })));
    }

    #[test]
    fn test_gzipped_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fa.gz");
        let file = File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        gz.write_all(b">r1\nACGTACGT\n").unwrap();
        gz.finish().unwrap();

        let loaded = read_sequences(&path, 0).unwrap();
        assert_eq!(loaded.records, vec![ReadRecord::new("r1", "ACGTACGT")]);
    }

    #[test]
    fn test_match_table_groups_reads() {
        let text = "r1\t562\t120.5\t1e-30\t98.0\n\
                    r1\t561\t110\t1e-25\t95\n\
                    r2\n\
                    r3\tnot-a-number\t1\t1\t1\n\
                    r3\t2\t60\t1e-5\t80\n";
        let loaded = read_match_table_from(text.as_bytes(), TAXONOMY, 5).unwrap();
        assert_eq!(loaded.skipped, 1);
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.records[0].match_count(), 2);
        assert_eq!(loaded.records[0].match_at(1).class_id(TAXONOMY), 561);
        assert_eq!(loaded.records[1].match_count(), 0);
        assert_eq!(loaded.records[2].match_count(), 1);
    }
}
