//! Reference-sequence access
//!
//! The transform engine only ever asks a genome assembly two questions:
//! "what bases are in `[start, end)` of this chromosome" and "how long is
//! this chromosome". [`FastaIndex`] captures exactly that, and the engine is
//! injected with one index per assembly. Two implementations are provided:
//! a file-backed [`IndexedFasta`] that loads whole chromosomes on demand,
//! and an in-memory [`MemoryFasta`] for tests and small genomes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::WarpError;
use crate::Result;

/// Result of a sequence fetch.
///
/// A missing chromosome is an expected condition (regions lifted onto
/// contigs absent from the target FASTA are silently dropped), so it is a
/// value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceFetch {
    /// Uppercased bases over the requested range.
    Known(String),
    /// The chromosome does not exist in this assembly.
    MissingChromosome,
}

impl SequenceFetch {
    /// The bases, if the chromosome exists.
    pub fn known(self) -> Option<String> {
        match self {
            SequenceFetch::Known(s) => Some(s),
            SequenceFetch::MissingChromosome => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, SequenceFetch::MissingChromosome)
    }
}

/// Read-only oracle over one genome assembly's reference sequence.
///
/// Implementations must be thread-safe: the pipeline hands the same index
/// to parallel per-region transforms.
pub trait FastaIndex: Send + Sync {
    /// Bases over `[start, end)` of the named chromosome, uppercased.
    ///
    /// Either bound may be `-1`: a `-1` start means "from 0", a `-1` end
    /// means "to the chromosome end". An end past the chromosome end is
    /// clamped. An unknown chromosome yields
    /// [`SequenceFetch::MissingChromosome`] (and is cached so the backing
    /// file is not rescanned).
    fn get(&self, reference_name: &str, start: i64, end: i64) -> Result<SequenceFetch>;

    /// Length of the named chromosome, or `None` if absent.
    fn chromosome_size(&self, reference_name: &str) -> Option<i64>;

    /// Reference names and lengths in the assembly's natural order.
    fn reference_order(&self) -> Vec<(String, i64)>;
}

fn clamp_range(len: i64, start: i64, end: i64) -> (usize, usize) {
    let start = if start == -1 { 0 } else { start.max(0) };
    let end = if end == -1 || end > len { len } else { end };
    if start >= end {
        return (0, 0);
    }
    (start as usize, end as usize)
}

/// File-backed FASTA access.
///
/// Construction scans the file once, recording the byte offset and sequence
/// length of every chromosome. Chromosomes are loaded whole on first access
/// and cached; [`IndexedFasta::preload`] swaps the cache to a chosen working
/// set. CRLF line endings fail the scan with [`WarpError::BadFasta`].
#[derive(Debug)]
pub struct IndexedFasta {
    path: PathBuf,
    /// Chromosome name → byte offset of its header line.
    jump_table: HashMap<String, u64>,
    sizes: HashMap<String, i64>,
    /// Names in file order.
    order: Vec<String>,
    /// Loaded chromosomes; `None` marks a cached missing chromosome.
    cache: RwLock<HashMap<String, Option<Arc<String>>>>,
}

impl IndexedFasta {
    /// Open a FASTA file and build its jump table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| WarpError::Io {
            msg: format!("failed to open FASTA {}: {e}", path.display()),
        })?;
        let mut reader = BufReader::new(file);

        let mut jump_table = HashMap::new();
        let mut sizes = HashMap::new();
        let mut order = Vec::new();

        let mut position: u64 = 0;
        let mut current: Option<String> = None;
        let mut length: i64 = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            let line = strip_newline(&path, &buf)?;
            if let Some(rest) = line.strip_prefix('>') {
                if let Some(chromosome) = current.take() {
                    sizes.insert(chromosome, length);
                    length = 0;
                }
                let name = rest.split_whitespace().next().unwrap_or("").to_string();
                jump_table.insert(name.clone(), position);
                order.push(name.clone());
                current = Some(name);
            } else {
                length += line.len() as i64;
            }
            position += n as u64;
        }
        if let Some(chromosome) = current.take() {
            sizes.insert(chromosome, length);
        }

        Ok(Self {
            path,
            jump_table,
            sizes,
            order,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Load the requested chromosomes and evict everything else.
    pub fn preload(&self, names: &[String]) -> Result<()> {
        let mut loaded = HashMap::new();
        {
            let cache = self.cache.read().expect("fasta cache poisoned");
            for name in names {
                if let Some(entry) = cache.get(name) {
                    loaded.insert(name.clone(), entry.clone());
                }
            }
        }
        for name in names {
            if loaded.contains_key(name) {
                continue;
            }
            loaded.insert(name.clone(), self.read_chromosome(name)?);
        }
        *self.cache.write().expect("fasta cache poisoned") = loaded;
        Ok(())
    }

    /// Read one chromosome's bases from the file, or `None` if absent.
    fn read_chromosome(&self, name: &str) -> Result<Option<Arc<String>>> {
        let Some(&offset) = self.jump_table.get(name) else {
            return Ok(None);
        };
        let file = File::open(&self.path).map_err(|e| WarpError::Io {
            msg: format!("failed to open FASTA {}: {e}", self.path.display()),
        })?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::new();
        reader.read_until(b'\n', &mut buf)?;
        let header = strip_newline(&self.path, &buf)?;
        if header.strip_prefix('>').and_then(|r| r.split_whitespace().next()) != Some(name) {
            return Err(WarpError::BadFasta {
                path: self.path.display().to_string(),
                msg: format!("jump table points at the wrong record for {name}"),
            });
        }

        let mut bases =
            String::with_capacity(*self.sizes.get(name).unwrap_or(&0) as usize);
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            let line = strip_newline(&self.path, &buf)?;
            if line.starts_with('>') {
                break;
            }
            bases.push_str(&line.trim().to_uppercase());
        }
        Ok(Some(Arc::new(bases)))
    }

    fn chromosome(&self, name: &str) -> Result<Option<Arc<String>>> {
        if let Some(entry) = self
            .cache
            .read()
            .expect("fasta cache poisoned")
            .get(name)
        {
            return Ok(entry.clone());
        }
        let loaded = self.read_chromosome(name)?;
        if loaded.is_none() {
            warn!(chromosome = name, "chromosome not present in FASTA");
        }
        let mut cache = self.cache.write().expect("fasta cache poisoned");
        let entry = cache.entry(name.to_string()).or_insert_with(|| loaded);
        Ok(entry.clone())
    }
}

fn strip_newline<'a>(path: &Path, buf: &'a [u8]) -> Result<&'a str> {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    if line.contains(&b'\r') {
        return Err(WarpError::BadFasta {
            path: path.display().to_string(),
            msg: "DOS (CRLF) line endings are not supported".to_string(),
        });
    }
    std::str::from_utf8(line).map_err(|_| WarpError::BadFasta {
        path: path.display().to_string(),
        msg: "non-UTF-8 content".to_string(),
    })
}

impl FastaIndex for IndexedFasta {
    fn get(&self, reference_name: &str, start: i64, end: i64) -> Result<SequenceFetch> {
        let Some(bases) = self.chromosome(reference_name)? else {
            return Ok(SequenceFetch::MissingChromosome);
        };
        let (start, end) = clamp_range(bases.len() as i64, start, end);
        Ok(SequenceFetch::Known(bases[start..end].to_string()))
    }

    fn chromosome_size(&self, reference_name: &str) -> Option<i64> {
        self.sizes.get(reference_name).copied()
    }

    fn reference_order(&self) -> Vec<(String, i64)> {
        self.order
            .iter()
            .map(|name| (name.clone(), *self.sizes.get(name).unwrap_or(&0)))
            .collect()
    }
}

/// In-memory FASTA for tests and small genomes.
#[derive(Debug, Default)]
pub struct MemoryFasta {
    /// (name, uppercased bases) in insertion order.
    sequences: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl MemoryFasta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chromosome; bases are uppercased on insertion.
    pub fn insert(&mut self, name: impl Into<String>, bases: impl AsRef<str>) {
        let name = name.into();
        self.index.insert(name.clone(), self.sequences.len());
        self.sequences.push((name, bases.as_ref().to_uppercase()));
    }

    /// Build from (name, bases) pairs.
    pub fn from_pairs<I, N, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: AsRef<str>,
    {
        let mut fasta = Self::new();
        for (name, bases) in pairs {
            fasta.insert(name, bases);
        }
        fasta
    }
}

impl FastaIndex for MemoryFasta {
    fn get(&self, reference_name: &str, start: i64, end: i64) -> Result<SequenceFetch> {
        let Some(&slot) = self.index.get(reference_name) else {
            return Ok(SequenceFetch::MissingChromosome);
        };
        let bases = &self.sequences[slot].1;
        let (start, end) = clamp_range(bases.len() as i64, start, end);
        Ok(SequenceFetch::Known(bases[start..end].to_string()))
    }

    fn chromosome_size(&self, reference_name: &str) -> Option<i64> {
        self.index
            .get(reference_name)
            .map(|&slot| self.sequences[slot].1.len() as i64)
    }

    fn reference_order(&self) -> Vec<(String, i64)> {
        self.sequences
            .iter()
            .map(|(name, bases)| (name.clone(), bases.len() as i64))
            .collect()
    }
}
