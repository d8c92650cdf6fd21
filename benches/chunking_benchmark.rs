use criterion::{Criterion, black_box, criterion_group, criterion_main};
use review_rag::indexer::{ParsedLanguage, StructuralChunker};
use review_rag::types::ChunkingMode;

fn synthetic_typescript(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        source.push_str(&format!(
            r#"export function handler{i}(input: string): string {{
    const trimmed = input.trim();
    if (trimmed.length === 0) {{
        throw new Error("empty input for handler{i}");
    }}
    return trimmed.toUpperCase();
}}

"#
        ));
    }
    source
}

fn bench_chunking(c: &mut Criterion) {
    let source = synthetic_typescript(200);

    c.bench_function("structural_chunking_200_functions", |b| {
        let chunker = StructuralChunker::new(ChunkingMode::Structural, 1200, 2);
        b.iter(|| chunker.chunk(black_box(&source), Some(ParsedLanguage::TypeScript)));
    });

    c.bench_function("windowed_chunking_200_functions", |b| {
        let chunker = StructuralChunker::new(ChunkingMode::Windowed, 1200, 2);
        b.iter(|| chunker.chunk(black_box(&source), None));
    });
}

criterion_group!(benches, bench_chunking);
criterion_main!(benches);
