//! Structural and windowed chunking
//!
//! Structural chunking aligns chunk boundaries to parsed declaration
//! boundaries so each retrievable unit is a semantic one. Windowed chunking
//! is the universal fallback: greedy line accumulation against a character
//! budget, with line overlap between consecutive windows. Oversized
//! structural chunks are re-split with the windowed algorithm so embedding
//! cost stays bounded.

use crate::indexer::ast_parser::AstParser;
use crate::indexer::language::ParsedLanguage;
use crate::types::{ChunkPart, ChunkStrategy, ChunkingMode};

/// A structural chunk may exceed the character budget by this factor before
/// it gets re-split
const OVERSIZE_FACTOR: f64 = 1.35;

pub struct StructuralChunker {
    mode: ChunkingMode,
    chunk_size: usize,
    overlap_lines: usize,
}

impl StructuralChunker {
    pub fn new(mode: ChunkingMode, chunk_size: usize, overlap_lines: usize) -> Self {
        Self {
            mode,
            chunk_size,
            overlap_lines,
        }
    }

    /// Chunk one file's text
    ///
    /// Structural chunking applies only when the mode asks for it and the
    /// language has a parser; every other file is windowed. A parse failure
    /// or a file with no chunkable declaration also falls back to windowed
    /// chunking, so every text file is indexable.
    pub fn chunk(&self, text: &str, language: Option<ParsedLanguage>) -> Vec<ChunkPart> {
        if text.is_empty() {
            return Vec::new();
        }

        if self.mode == ChunkingMode::Structural
            && let Some(lang) = language
        {
            match self.chunk_structural(text, lang) {
                Ok(Some(parts)) => return parts,
                Ok(None) => {
                    tracing::debug!(
                        "No chunkable declarations in {} file, using windowed chunking",
                        lang.name()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Structural chunking failed for {} file, using windowed chunking: {e}",
                        lang.name()
                    );
                }
            }
        }

        self.chunk_windowed(text)
    }

    fn chunk_windowed(&self, text: &str) -> Vec<ChunkPart> {
        let lines: Vec<&str> = text.lines().collect();

        windowed_ranges(&lines, self.chunk_size, self.overlap_lines)
            .into_iter()
            .map(|(start, end)| ChunkPart {
                start_line: start + 1,
                end_line: end + 1,
                content: lines[start..=end].join("\n"),
                strategy: ChunkStrategy::Windowed,
                node_type: None,
                symbol: None,
            })
            .collect()
    }

    /// Returns `Ok(None)` when the file has no chunkable declaration
    fn chunk_structural(
        &self,
        text: &str,
        language: ParsedLanguage,
    ) -> anyhow::Result<Option<Vec<ChunkPart>>> {
        let mut parser = AstParser::new(language)?;
        let declarations = parser.declarations(text)?;
        if declarations.is_empty() {
            return Ok(None);
        }

        let lines: Vec<&str> = text.lines().collect();
        let budget = (self.chunk_size as f64 * OVERSIZE_FACTOR) as usize;
        let mut parts = Vec::new();

        for decl in declarations {
            let start = decl.start_line.min(lines.len());
            let end = decl.end_line.min(lines.len());
            if start == 0 || start > end {
                continue;
            }

            let node_lines = &lines[start - 1..end];
            let content = node_lines.join("\n");
            let trimmed = content.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.len() > budget {
                // Re-split oversized declarations with the windowed
                // algorithm, translating relative line numbers back into
                // absolute file line numbers. The sub-chunks stay tagged
                // structural and keep the declaration's metadata.
                for (sub_start, sub_end) in
                    windowed_ranges(node_lines, self.chunk_size, self.overlap_lines)
                {
                    let sub_content = node_lines[sub_start..=sub_end].join("\n");
                    let sub_trimmed = sub_content.trim();
                    if sub_trimmed.is_empty() {
                        continue;
                    }
                    parts.push(ChunkPart {
                        start_line: start + sub_start,
                        end_line: start + sub_end,
                        content: sub_trimmed.to_string(),
                        strategy: ChunkStrategy::Structural,
                        node_type: Some(decl.node_type.clone()),
                        symbol: decl.symbol.clone(),
                    });
                }
            } else {
                parts.push(ChunkPart {
                    start_line: start,
                    end_line: end,
                    content: trimmed.to_string(),
                    strategy: ChunkStrategy::Structural,
                    node_type: Some(decl.node_type),
                    symbol: decl.symbol,
                });
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }

        parts.sort_by_key(|p| (p.start_line, p.end_line));
        Ok(Some(parts))
    }
}

/// Greedy line-window chunking over a slice of lines
///
/// Returns 0-based inclusive `(start, end)` index ranges. Lines accumulate
/// until adding the next one would push the joined length (one newline per
/// join) past `chunk_size`; a window always holds at least one line, even
/// one longer than the whole budget. After emitting, the next window starts
/// `min(overlap_lines, window_line_count - 1)` lines before the previous
/// end + 1, which nets an advance of at least one line per window, so the
/// sequence is finite for any overlap setting.
fn windowed_ranges(
    lines: &[&str],
    chunk_size: usize,
    overlap_lines: usize,
) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if lines.is_empty() {
        return ranges;
    }

    let mut start = 0;
    loop {
        let mut end = start;
        let mut len = lines[start].len();
        while end + 1 < lines.len() && len + 1 + lines[end + 1].len() <= chunk_size {
            end += 1;
            len += 1 + lines[end].len();
        }

        ranges.push((start, end));

        if end + 1 >= lines.len() {
            break;
        }

        let window_lines = end - start + 1;
        let back = overlap_lines.min(window_lines - 1);
        start = end + 1 - back;
    }

    ranges
}
