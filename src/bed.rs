//! BED reading and writing

use std::io::{BufRead, Write};

use crate::error::WarpError;
use crate::regions::GenomeRange;
use crate::Result;

/// Read BED records into ranges.
///
/// Requires at least three columns; a fourth column becomes the range name
/// and a sixth the strand. Comment (`#`), `track` and `browser` lines are
/// skipped.
pub fn read_bed<R: BufRead>(reader: R) -> Result<Vec<GenomeRange>> {
    let mut ranges = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_number = i as u64 + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(WarpError::parse(
                line_number,
                "BED record has less than 3 columns",
            ));
        }
        let start: i64 = fields[1].parse().map_err(|_| {
            WarpError::parse(line_number, format!("invalid start: {:?}", fields[1]))
        })?;
        let end: i64 = fields[2]
            .parse()
            .map_err(|_| WarpError::parse(line_number, format!("invalid end: {:?}", fields[2])))?;
        let mut range = GenomeRange::new(fields[0], start, end);
        if fields.len() > 3 {
            range = range.with_name(fields[3]);
        }
        if fields.len() > 5 {
            range = range.with_strand(fields[5].parse()?);
        }
        ranges.push(range);
    }
    Ok(ranges)
}

/// Write three-column BED records.
pub fn write_bed<W: Write>(mut writer: W, ranges: &[GenomeRange]) -> Result<()> {
    for range in ranges {
        writeln!(writer, "{}\t{}\t{}", range.chromosome, range.start, range.end)?;
    }
    Ok(())
}

/// Write six-column BED records (name, placeholder score, strand).
pub fn write_named_bed<W: Write>(mut writer: W, ranges: &[GenomeRange]) -> Result<()> {
    for range in ranges {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t.\t{}",
            range.chromosome, range.start, range.end, range.name, range.strand
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;

    #[test]
    fn test_read_bed_minimal() {
        let input = "chr1\t10\t20\nchr2\t0\t5\n";
        let ranges = read_bed(input.as_bytes()).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], GenomeRange::new("chr1", 10, 20));
        assert_eq!(ranges[1], GenomeRange::new("chr2", 0, 5));
    }

    #[test]
    fn test_read_bed_named_and_stranded() {
        let input = "chr1\t10\t20\tchr1.1\t.\t-\n";
        let ranges = read_bed(input.as_bytes()).unwrap();
        assert_eq!(ranges[0].name, "chr1.1");
        assert_eq!(ranges[0].strand, Strand::Negative);
    }

    #[test]
    fn test_read_bed_skips_comments_and_blank_lines() {
        let input = "# a comment\ntrack name=foo\n\nchr1\t1\t2\n";
        assert_eq!(read_bed(input.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_read_bed_rejects_short_records() {
        assert!(read_bed("chr1\t10\n".as_bytes()).is_err());
        assert!(read_bed("chr1\tx\t20\n".as_bytes()).is_err());
    }

    #[test]
    fn test_write_bed_round_trip() {
        let ranges = vec![GenomeRange::new("chr1", 10, 20)];
        let mut buf = Vec::new();
        write_bed(&mut buf, &ranges).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "chr1\t10\t20\n");
    }

    #[test]
    fn test_write_named_bed() {
        let ranges = vec![GenomeRange::new("chr1", 10, 20)
            .with_name("chr1.1")
            .with_strand(Strand::Negative)];
        let mut buf = Vec::new();
        write_named_bed(&mut buf, &ranges).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "chr1\t10\t20\tchr1.1\t.\t-\n");
        let back = read_bed(text.as_bytes()).unwrap();
        assert_eq!(back, ranges);
    }
}
