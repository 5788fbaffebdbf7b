//! End-to-end chunking behaviour over whole documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use tenk_chunk::{ApproximateCounter, Chunker, FilingChunker, TokenCounter};
use tenk_core::{ChunkingConfig, Document, SectionKey, SectionOutcome};

const WORDS: [&str; 6] = [
    "revenue ",
    "customers ",
    "satellite ",
    "contracts ",
    "backlog ",
    "services ",
];

/// ASCII paragraph of exactly `len` characters ending in a period.
fn filler(lead: &str, len: usize) -> String {
    let mut text = String::from(lead);
    let mut i = 0;
    while text.len() < len - 1 {
        text.push_str(WORDS[i % WORDS.len()]);
        i += 1;
    }
    text.truncate(len - 1);
    text.push('.');
    text
}

fn document(sections: Vec<(SectionKey, String)>) -> Document {
    Document {
        ticker: "ORBT".to_string(),
        company_name: "Orbit Systems Inc.".to_string(),
        cik: "1234567".to_string(),
        filing_date: "2024-03-01".to_string(),
        fiscal_year: 2023,
        form_type: "10-K".to_string(),
        industry: "Aerospace".to_string(),
        sic_code: "3760".to_string(),
        sections: sections.into_iter().collect::<BTreeMap<_, _>>(),
    }
}

fn chunker(config: ChunkingConfig) -> FilingChunker {
    FilingChunker::with_token_counter(config, Arc::new(ApproximateCounter))
}

/// Item1 with headers and paragraphs of varying size.
fn long_business_section() -> String {
    let mut parts = Vec::new();
    for (h, header) in ["Business Overview", "Our Products", "Human Capital Resources"]
        .iter()
        .enumerate()
    {
        parts.push(header.to_string());
        for p in 0..9 {
            let lead = format!("Paragraph {} {} ", h, p);
            parts.push(filler(&lead, 300 + (p * 137) % 900));
        }
    }
    parts.join("\n\n")
}

#[test]
fn scenario_a_tiny_section_unavailable() {
    let doc = document(vec![(SectionKey::Item1, filler("Overview ", 50))]);
    let result = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();

    assert_eq!(result.chunk_count(), 0);
    match &result.sections[0] {
        (SectionKey::Item1, SectionOutcome::Unavailable { reason }) => {
            assert!(reason.contains("50 chars"))
        }
        other => panic!("expected unavailable item1, got {:?}", other),
    }
}

#[test]
fn scenario_b_exact_minimum_is_one_chunk() {
    // 266 + 2 + 265 + 2 + 265 = 800 chars = 200 tokens
    let text = [
        filler("Alpha ", 266),
        filler("Bravo ", 265),
        filler("Charlie ", 265),
    ]
    .join("\n\n");
    assert_eq!(ApproximateCounter.count(&text), 200);

    let doc = document(vec![(SectionKey::Item1, text.clone())]);
    let result = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();
    let chunks = result.section(SectionKey::Item1);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].total_chunks, 1);
    assert_eq!(chunks[0].token_count, 200);
    assert_eq!(chunks[0].text, text);
}

#[test]
fn scenario_c_one_risk_per_chunk() {
    // 820 chars = 205 tokens each, just above the 200 minimum
    let risks: Vec<String> = (0..5)
        .map(|i| filler(&format!("We may face risk {} because ", i), 820))
        .collect();
    let doc = document(vec![(SectionKey::Item1a, risks.join("\n\n"))]);
    let result = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();
    let chunks = result.section(SectionKey::Item1a);

    assert_eq!(chunks.len(), 5);
    for (i, chunk) in chunks.iter().enumerate() {
        assert!(chunk.text.starts_with(&format!("We may face risk {} ", i)));
        assert_eq!(chunk.text.matches("We may face risk").count(), 1);
        assert!(chunk.metadata.risk_type.is_some());
    }
}

#[test]
fn scenario_c_holds_when_openers_fit_in_overlap() {
    let config = ChunkingConfig {
        min_chunk_tokens: 50,
        overlap_tokens: 100,
        ..ChunkingConfig::default()
    };
    // 220 chars = 55 tokens each, below 2 x overlap
    let risks: Vec<String> = (0..5)
        .map(|i| filler(&format!("We may face risk {} because ", i), 220))
        .collect();
    let doc = document(vec![(SectionKey::Item1a, risks.join("\n\n"))]);
    let result = chunker(config).chunk_document(&doc).unwrap();
    let chunks = result.section(SectionKey::Item1a);

    assert_eq!(chunks.len(), 5);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.text, risks[i]);
        assert_eq!(chunk.text.matches("We may face risk").count(), 1);
    }
}

#[test]
fn scenario_d_oversized_paragraph_split_at_sentences() {
    let config = ChunkingConfig {
        max_tokens_item1: 100,
        min_chunk_tokens: 20,
        overlap_tokens: 10,
        ..ChunkingConfig::default()
    };
    // 31 sentences of 39 chars
    let sentences: Vec<String> = (0..31)
        .map(|i| format!("Sentence {:02} describes contract backlog.", i))
        .collect();
    let paragraph = sentences.join(" ");
    assert!(ApproximateCounter.count(&paragraph) >= 300);

    let doc = document(vec![(SectionKey::Item1, paragraph.clone())]);
    let result = chunker(config).chunk_document(&doc).unwrap();
    let chunks = result.section(SectionKey::Item1);

    assert!(chunks.len() >= 3);
    for chunk in chunks {
        assert!(chunk.token_count <= 100);
        assert!(chunk.text.ends_with("backlog."));
        assert!(chunk.text.starts_with("Sentence "));
    }
    let rejoined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(rejoined.join(" "), paragraph);
}

#[test]
fn plain_paragraphs_overlap_by_one_paragraph() {
    // 600 chars = 150 tokens each, below 2 x overlap
    let paragraphs: Vec<String> = (0..12)
        .map(|i| filler(&format!("Paragraph {:02} ", i), 600))
        .collect();
    let doc = document(vec![(SectionKey::Item1, paragraphs.join("\n\n"))]);
    let result = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();
    let chunks = result.section(SectionKey::Item1);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].text.ends_with(&paragraphs[6]));
    assert!(chunks[1].text.starts_with(&paragraphs[6]));
    assert!(chunks[1].text.ends_with(&paragraphs[11]));
}

#[test]
fn chunking_is_deterministic() {
    let risks: Vec<String> = (0..6)
        .map(|i| filler(&format!("Our results could suffer from event {} and ", i), 700))
        .collect();
    let doc = document(vec![
        (SectionKey::Item1, long_business_section()),
        (SectionKey::Item1a, risks.join("\n\n")),
    ]);

    let first = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();
    let second = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();

    let serialize = |chunks: &[tenk_core::Chunk]| serde_json::to_string(chunks).unwrap();
    for key in SectionKey::ALL {
        assert_eq!(
            serialize(first.section(key)),
            serialize(second.section(key))
        );
    }
    assert!(first.chunk_count() > 2);
}

#[test]
fn chunk_invariants_hold() {
    let config = ChunkingConfig::default();
    let doc = document(vec![(SectionKey::Item1, long_business_section())]);
    let result = chunker(config.clone()).chunk_document(&doc).unwrap();
    let chunks = result.section(SectionKey::Item1);
    let budget = config.budget_for(SectionKey::Item1);

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
        assert_eq!(chunk.total_chunks, chunks.len());
        assert_eq!(chunk.chunk_id, format!("ORBT_item1_2023_chunk_{}", i));
        assert_eq!(chunk.token_count, ApproximateCounter.count(&chunk.text));
        assert!(chunk.token_count <= budget.max_tokens);
        if i + 1 < chunks.len() {
            assert!(chunk.token_count >= budget.min_chunk_tokens);
        }
        assert!(!chunk.text.contains("Human Capital Resources"));
    }
}

#[test]
fn content_hash_tracks_text_only() {
    let text = filler("Stable business description ", 900);
    let a = document(vec![(SectionKey::Item1, text.clone())]);
    let mut b = document(vec![(SectionKey::Item1, text.to_uppercase())]);
    b.ticker = "OTHR".to_string();

    let chunker = chunker(ChunkingConfig::default());
    let a = chunker.chunk_document(&a).unwrap();
    let b = chunker.chunk_document(&b).unwrap();
    let (a, b) = (&a.section(SectionKey::Item1)[0], &b.section(SectionKey::Item1)[0]);

    assert_eq!(a.content_hash, b.content_hash);
    assert_ne!(a.chunk_id, b.chunk_id);
}

#[test]
fn every_body_paragraph_survives() {
    let section = long_business_section();
    let doc = document(vec![(SectionKey::Item1, section.clone())]);
    let result = chunker(ChunkingConfig::default())
        .chunk_document(&doc)
        .unwrap();
    let chunks = result.section(SectionKey::Item1);

    let body: Vec<&str> = section
        .split("\n\n")
        .filter(|p| p.starts_with("Paragraph "))
        .collect();
    assert_eq!(body.len(), 27);
    for paragraph in body {
        assert!(
            chunks.iter().any(|c| c.text.contains(paragraph)),
            "lost paragraph {:?}",
            &paragraph[..16]
        );
    }
}

#[test]
fn short_intro_before_oversized_paragraph_is_kept() {
    let intro = filler("Our launch business serves ", 200);
    let missions: Vec<String> = (0..200)
        .map(|i| format!("Mission {:03} delivered a payload to orbit.", i))
        .collect();
    let text = ["Launch Services".to_string(), intro.clone(), missions.join(" ")].join("\n\n");

    let config = ChunkingConfig::default();
    let budget = config.budget_for(SectionKey::Item1);
    let doc = document(vec![(SectionKey::Item1, text)]);
    let result = chunker(config).chunk_document(&doc).unwrap();
    let chunks = result.section(SectionKey::Item1);

    assert!(chunks.len() >= 2);
    assert!(chunks[0].text.starts_with(&intro));
    assert_eq!(chunks[0].metadata.subsection.as_deref(), Some("Launch Services"));
    for (i, chunk) in chunks.iter().enumerate() {
        assert!(chunk.token_count <= budget.max_tokens);
        if i + 1 < chunks.len() {
            assert!(chunk.token_count >= budget.min_chunk_tokens);
        }
    }
    for mission in &missions {
        assert!(chunks.iter().any(|c| c.text.contains(mission.as_str())));
    }
}
