use lexidx::{CodecKind, IndexConfig, InvertedIndex, NaiveMatcher, NormalizingTokenizer, Tokenizer, WhitespaceTokenizer};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const COMMENTS: &[(u32, &str)] = &[
    (445_828, "The rector of the university spoke at the morning assembly"),
    (445_829, "Students walked to the library early in the morning"),
    (445_830, "Politics was discussed by the rector and the students"),
    (445_831, "Nobody wanted to walk in the rain"),
    (445_832, "The university library opens early, students said"),
    (445_833, "Parliamentary politics rarely interests first year students"),
    (445_834, "A walk through the campus in the early morning"),
];

fn build(tokenizer: Arc<dyn Tokenizer>, codec: CodecKind) -> (InvertedIndex, NaiveMatcher) {
    let mut index = InvertedIndex::with_config(tokenizer.clone(), IndexConfig { codec });
    let mut naive = NaiveMatcher::new(tokenizer);
    for &(id, text) in COMMENTS {
        index.insert_document(id, text).unwrap();
        naive.insert_document(id, text);
    }
    (index, naive)
}

fn ids(hits: &[lexidx::SearchHit]) -> Vec<u32> {
    hits.iter().map(|h| h.doc_id).collect()
}

#[test]
fn every_document_has_its_own_record() {
    let (index, naive) = build(Arc::new(NormalizingTokenizer::default()), CodecKind::Delta);
    assert_eq!(index.num_docs(), COMMENTS.len());
    assert_eq!(naive.len(), COMMENTS.len());
    for &(id, text) in COMMENTS {
        assert_eq!(index.document(id), Some(text));
    }
}

#[test]
fn every_indexed_term_has_postings() {
    let tok = Arc::new(NormalizingTokenizer::default());
    let (index, _) = build(tok.clone(), CodecKind::Delta);
    for &(id, text) in COMMENTS {
        for term in tok.tokenize(text) {
            assert!(index.postings_for(&term).unwrap().contains_key(&id), "{term} missing for {id}");
        }
    }
    assert!(index.postings_for("daldkaslkdalksdkl").unwrap().is_empty());
}

#[test]
fn inflected_queries_find_the_same_documents() {
    let (index, _) = build(Arc::new(NormalizingTokenizer::default()), CodecKind::Delta);
    let walked = ids(&index.search("walking").unwrap());
    let walks = ids(&index.search("walk").unwrap());
    assert_eq!(walked, walks);
    assert_eq!(walked.len(), 3);
}

#[test]
fn search_results_contain_the_first_query_term() {
    let tok = Arc::new(NormalizingTokenizer::default());
    let (index, _) = build(tok.clone(), CodecKind::Delta);
    for query in ["early morning", "students", "politics", "rector university"] {
        let first = tok.tokenize(query).remove(0);
        let hits = index.search(query).unwrap();
        assert!(!hits.is_empty(), "{query}");
        for hit in hits {
            assert!(tok.tokenize(&hit.text).contains(&first));
        }
    }
}

#[test]
fn naive_results_are_indexed_candidates() {
    let (index, naive) = build(Arc::new(NormalizingTokenizer::default()), CodecKind::Gamma);
    for query in ["early morning", "students library", "rector", "politics students", "walk rain", "zebra"] {
        let expected = naive.search(query);
        let candidates: HashSet<u32> = ids(&index.search(query).unwrap()).into_iter().collect();
        assert!(expected.iter().all(|id| candidates.contains(id)), "{query}");

        let mut conjunctive = ids(&index.search_all(query).unwrap());
        let mut expected = expected;
        conjunctive.sort_unstable();
        expected.sort_unstable();
        assert_eq!(conjunctive, expected, "{query}");
    }
}

#[test]
fn full_matches_rank_before_partial_ones() {
    let (index, _) = build(Arc::new(NormalizingTokenizer::default()), CodecKind::Delta);
    let hits = index.search("students early library").unwrap();
    let counts: Vec<u32> = hits.iter().map(|h| h.match_count).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(hits[0].match_count, 3);
}

#[test]
fn search_survives_compression_round_trip() {
    for codec in [CodecKind::Gamma, CodecKind::Delta] {
        let (mut index, _) = build(Arc::new(NormalizingTokenizer::default()), codec);
        let queries = ["walked out", "early", "politics", "morning rector", "rain rain"];
        let before: Vec<_> = queries.iter().map(|q| index.search(q).unwrap()).collect();
        let terms_before = index.num_terms();

        index.compress().unwrap();
        assert_eq!(index.num_terms(), terms_before);
        let during: Vec<_> = queries.iter().map(|q| index.search(q).unwrap()).collect();

        index.decompress().unwrap();
        let after: Vec<_> = queries.iter().map(|q| index.search(q).unwrap()).collect();

        assert_eq!(before, during);
        assert_eq!(before, after);
    }
}

#[test]
fn compression_shrinks_a_larger_corpus() {
    let mut index = InvertedIndex::new(Arc::new(WhitespaceTokenizer));
    for id in 0..2_000u32 {
        let text: Vec<String> = (0..12).map(|w| format!("w{}", (id * 7 + w * 13) % 97)).collect();
        index.insert_document(id, text.join(" ")).unwrap();
    }
    let raw = index.stats();
    index.compress().unwrap();
    let coded = index.stats();
    assert_eq!(raw.num_postings, coded.num_postings);
    assert!(coded.postings_bytes * 2 < raw.postings_bytes, "{raw:?} vs {coded:?}");
}

fn corpus() -> impl Strategy<Value = Vec<(u32, Vec<u8>)>> {
    prop::collection::vec((0u32..500, prop::collection::vec(0u8..12, 1..10)), 1..40)
}

fn render(words: &[u8]) -> String {
    words.iter().map(|w| format!("t{w}")).collect::<Vec<_>>().join(" ")
}

proptest! {
    #[test]
    fn compression_is_transparent(docs in corpus(), query in prop::collection::vec(0u8..14, 0..4)) {
        let mut index = InvertedIndex::new(Arc::new(WhitespaceTokenizer));
        for (id, words) in &docs {
            index.insert_document(*id, render(words)).unwrap();
        }
        let query = render(&query);
        let terms: Vec<String> = (0..14).map(|w| format!("t{w}")).collect();

        let hits = index.search(&query).unwrap();
        let all = index.search_all(&query).unwrap();
        let postings: Vec<_> = terms.iter().map(|t| index.postings_for(t).unwrap().into_owned()).collect();

        index.compress().unwrap();
        prop_assert_eq!(&index.search(&query).unwrap(), &hits);
        prop_assert_eq!(&index.search_all(&query).unwrap(), &all);
        for (t, p) in terms.iter().zip(&postings) {
            prop_assert_eq!(&index.postings_for(t).unwrap().into_owned(), p);
        }

        index.decompress().unwrap();
        prop_assert_eq!(&index.search(&query).unwrap(), &hits);
        for (t, p) in terms.iter().zip(&postings) {
            prop_assert_eq!(&index.postings_for(t).unwrap().into_owned(), p);
        }
    }

    #[test]
    fn stored_ids_match_postings(docs in corpus()) {
        let mut index = InvertedIndex::new(Arc::new(WhitespaceTokenizer));
        let mut distinct = HashSet::new();
        for (id, words) in &docs {
            index.insert_document(*id, render(words)).unwrap();
            distinct.insert(*id);
        }
        prop_assert_eq!(index.num_docs(), distinct.len());
        for w in 0..12u8 {
            for id in index.postings_for(&format!("t{w}")).unwrap().keys() {
                prop_assert!(index.contains(*id));
            }
        }
    }
}
