use anyhow::{Context as AnyhowContext, Result};
use corpus_segmenter::ids::SentenceKey;
use corpus_segmenter::{Chunk, SegmentedChunk, SegmentedDocument, Sentence, SentenceWindow, SubChunk};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const SUBCHUNKS_FILE: &str = "subchunks.jsonl";
pub const SENTENCES_FILE: &str = "sentences.jsonl";
pub const WINDOWS_FILE: &str = "windows.jsonl";
pub const REPORT_FILE: &str = "verification.md";
pub const COMPACT_FILE: &str = "sentences_compact.jsonl";

/// One JSON record per line
struct JsonlWriter {
    path: PathBuf,
    out: BufWriter<File>,
    records: usize,
}

impl JsonlWriter {
    fn create(path: PathBuf) -> Result<Self> {
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            records: 0,
        })
    }

    fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)
            .with_context(|| format!("failed to serialize record for {}", self.path.display()))?;
        self.out
            .write_all(b"\n")
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        self.records += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<usize> {
        self.out
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        log::debug!("Wrote {} records to {}", self.records, self.path.display());
        Ok(self.records)
    }
}

/// Exported row: the record plus its inclusive char end
#[derive(Serialize)]
struct WithInclusiveEnd<'a, T: Serialize> {
    #[serde(flatten)]
    record: &'a T,
    /// `None` for an empty span
    char_end_incl: Option<usize>,
}

/// Record counts written per output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WrittenCounts {
    pub chunks: usize,
    pub sub_chunks: usize,
    pub sentences: usize,
    pub windows: usize,
}

/// Streams segmented documents into the output directory
pub struct OutputWriter {
    chunks: JsonlWriter,
    sub_chunks: JsonlWriter,
    sentences: JsonlWriter,
    windows: Option<JsonlWriter>,
}

impl OutputWriter {
    /// Create the directory and truncate the record files
    pub fn create(dir: &Path, with_windows: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let windows = if with_windows {
            Some(JsonlWriter::create(dir.join(WINDOWS_FILE))?)
        } else {
            let stale = dir.join(WINDOWS_FILE);
            if stale.exists() {
                fs::remove_file(&stale)
                    .with_context(|| format!("failed to remove stale {}", stale.display()))?;
            }
            None
        };

        Ok(Self {
            chunks: JsonlWriter::create(dir.join(CHUNKS_FILE))?,
            sub_chunks: JsonlWriter::create(dir.join(SUBCHUNKS_FILE))?,
            sentences: JsonlWriter::create(dir.join(SENTENCES_FILE))?,
            windows,
        })
    }

    /// Write one document in chunk, sub-chunk, sentence order
    pub fn write_document(&mut self, document: &SegmentedDocument) -> Result<()> {
        for segmented in &document.chunks {
            self.chunks.write(&segmented.chunk)?;
            for sub_chunk in &segmented.sub_chunks {
                self.sub_chunks.write(&WithInclusiveEnd {
                    record: sub_chunk,
                    char_end_incl: sub_chunk.char_span.end_inclusive(),
                })?;
            }
            for sentence in &segmented.sentences {
                self.sentences.write(&WithInclusiveEnd {
                    record: sentence,
                    char_end_incl: sentence.char_span.end_inclusive(),
                })?;
            }
        }
        Ok(())
    }

    pub fn write_windows(&mut self, windows: &[SentenceWindow]) -> Result<()> {
        if let Some(writer) = self.windows.as_mut() {
            for window in windows {
                writer.write(window)?;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<WrittenCounts> {
        Ok(WrittenCounts {
            chunks: self.chunks.finish()?,
            sub_chunks: self.sub_chunks.finish()?,
            sentences: self.sentences.finish()?,
            windows: self.windows.map(JsonlWriter::finish).transpose()?.unwrap_or(0),
        })
    }
}

/// Read every record of a JSONL file, skipping blank lines
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("invalid record at {}:{}", path.display(), idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Reload an output directory and regroup records under their chunks.
///
/// Chunk order follows `chunks.jsonl`; sub-chunks and sentences keep their
/// file order within a chunk. Records naming an unknown chunk are dropped
/// with a warning.
pub fn load_segmented(dir: &Path) -> Result<Vec<SegmentedChunk>> {
    let chunks: Vec<Chunk> = read_jsonl(&dir.join(CHUNKS_FILE))?;
    let sub_chunks: Vec<SubChunk> = read_jsonl(&dir.join(SUBCHUNKS_FILE))?;
    let sentences: Vec<Sentence> = read_jsonl(&dir.join(SENTENCES_FILE))?;

    let mut index: HashMap<String, usize> = HashMap::with_capacity(chunks.len());
    let mut grouped: Vec<SegmentedChunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        index.insert(chunk.id.clone(), grouped.len());
        grouped.push(SegmentedChunk {
            chunk,
            sub_chunks: Vec::new(),
            sentences: Vec::new(),
        });
    }

    let mut orphans = 0usize;
    for sub_chunk in sub_chunks {
        match index.get(&sub_chunk.chunk_id) {
            Some(&pos) => grouped[pos].sub_chunks.push(sub_chunk),
            None => orphans += 1,
        }
    }
    for sentence in sentences {
        match index.get(&sentence.chunk_id) {
            Some(&pos) => grouped[pos].sentences.push(sentence),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        log::warn!("{orphans} records reference chunks missing from {CHUNKS_FILE}");
    }

    Ok(grouped)
}

/// Sentence row of the compact export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSentence {
    pub chunk_id: String,
    pub subchunk_id: Option<String>,
    pub sentence_id: String,
    pub text: String,
}

/// Write `sentences_compact.jsonl` ordered by chunk, sub-chunk, then sentence.
///
/// Unanchored sentences sort before anchored ones of the same chunk. Rows whose
/// id does not parse go last, in file order.
pub fn write_compact(dir: &Path) -> Result<usize> {
    let sentences: Vec<Sentence> = read_jsonl(&dir.join(SENTENCES_FILE))?;

    let mut keyed: Vec<(Option<SentenceKey>, Sentence)> = sentences
        .into_iter()
        .map(|sentence| (SentenceKey::parse(&sentence.id), sentence))
        .collect();
    let unparsed = keyed.iter().filter(|(key, _)| key.is_none()).count();
    if unparsed > 0 {
        log::warn!("{unparsed} sentence ids could not be parsed; they are written last");
    }
    keyed.sort_by_key(|(key, _)| (key.is_none(), *key));

    let mut writer = JsonlWriter::create(dir.join(COMPACT_FILE))?;
    for (_, sentence) in keyed {
        writer.write(&CompactSentence {
            chunk_id: sentence.chunk_id,
            subchunk_id: sentence.sub_chunk_id,
            sentence_id: sentence.id,
            text: sentence.text,
        })?;
    }
    writer.finish()
}
