use std::time::Duration;

use gramdex::{
    Document, GramIndex, IndexConfig, IndexDocument, MemoryStore, SearchRequest, SearchResults,
};

fn new_index() -> GramIndex<MemoryStore> {
    GramIndex::new(MemoryStore::new(), IndexConfig::new("test")).unwrap()
}

fn put(index: &GramIndex<MemoryStore>, id: u64, score: u32, content: &str) {
    index
        .index(IndexDocument::new(Vec::new(), score, content).with_int_id(id))
        .unwrap();
}

fn int_id(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn search(index: &GramIndex<MemoryStore>, request: SearchRequest) -> SearchResults {
    index.search(&request).unwrap()
}

fn ids(index: &GramIndex<MemoryStore>, query: &str) -> Vec<u64> {
    search(index, SearchRequest::new(query))
        .documents
        .iter()
        .filter_map(Document::int_id)
        .collect()
}

#[test]
fn test_single_characters() {
    let index = new_index();
    put(&index, 1, 1, "a b c d e f");
    put(&index, 2, 2, "d e f g h i");

    assert_eq!(ids(&index, ""), vec![2, 1]);
    assert_eq!(ids(&index, "d e f"), vec![2, 1]);
    assert_eq!(ids(&index, "d e f -i"), vec![1]);

    // Reindex with a higher score.
    put(&index, 1, 3, "a b c d e g");
    assert_eq!(ids(&index, ""), vec![1, 2]);

    assert!(index.rescore(&int_id(2), 4).unwrap());
    assert_eq!(ids(&index, ""), vec![2, 1]);
    assert_eq!(ids(&index, "g -i"), vec![1]);
    assert_eq!(ids(&index, "-i"), vec![1]);

    assert!(index.delete(&int_id(2)).unwrap());
    assert_eq!(ids(&index, ""), vec![1]);
    assert_eq!(ids(&index, "-i"), vec![1]);
}

#[test]
fn test_trigram_lifecycle() {
    let index = new_index();

    put(&index, 1, 1, "abcdefg");
    let results = search(&index, SearchRequest::new("cdef"));
    assert_eq!(results.documents.len(), 1);
    assert_eq!(results.documents[0].content, "abcdefg");

    put(&index, 1, 0, "abcefg");
    assert!(ids(&index, "cdef").is_empty());

    assert!(index.rescore(&int_id(1), 100).unwrap());
    let results = search(&index, SearchRequest::new("cef"));
    assert_eq!(results.documents.len(), 1);
    assert_eq!(results.documents[0].score, 100);

    put(&index, 2, 0, "efg abc");
    assert_eq!(ids(&index, "efg abc").len(), 2);

    assert!(index.rescore(&int_id(2), 200).unwrap());
    assert_eq!(ids(&index, "efg abc"), vec![2, 1]);
    assert_eq!(ids(&index, "\"efg abc\""), vec![2]);

    put(&index, 3, 0, "can't");
    assert_eq!(ids(&index, "can't"), vec![3]);
    assert_eq!(ids(&index, "can t"), vec![3]);
}

#[test]
fn test_exclusion_with_pagination() {
    let index = new_index();
    for i in 0..20u64 {
        let text = (0..20u64)
            .filter(|&j| j != i)
            .map(|j| j.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        put(&index, i, i as u32 + 1, &text);
    }

    let first = search(&index, SearchRequest::new("5 -\"5 6 7 8\"").with_limit(2));
    let first_ids: Vec<u64> = first.documents.iter().filter_map(Document::int_id).collect();
    assert_eq!(first_ids, vec![8, 7]);
    assert!(first.next.is_some());

    let second = search(
        &index,
        SearchRequest::new("5 -\"5 6 7 8\"")
            .with_limit(2)
            .with_resume(first.next),
    );
    let second_ids: Vec<u64> = second.documents.iter().filter_map(Document::int_id).collect();
    assert_eq!(second_ids, vec![6]);
    assert!(second.next.is_none());

    assert_eq!(ids(&index, "0 -19"), vec![19]);
}

#[test]
fn test_thai() {
    let index = new_index();
    put(&index, 100, 1, "เดะทักไปป");
    put(&index, 101, 1, "เดะทกไปปั");
    assert_eq!(ids(&index, "ทัก"), vec![100]);
}

#[test]
fn test_arabic() {
    let index = new_index();
    put(&index, 200, 1, "عايزه بنت اسألها على حاجه ضروري");
    put(&index, 201, 1, "حاجه ضروري");
    assert_eq!(ids(&index, "بنت"), vec![200]);
}

#[test]
fn test_folding() {
    let index = new_index();
    put(&index, 1, 1, "Crème Brûlée");
    assert_eq!(ids(&index, "creme brulee"), vec![1]);
    assert_eq!(ids(&index, "CRÈME"), vec![1]);
}

#[test]
fn test_pagination_visits_every_document_once() {
    let index = new_index();
    for i in 0..50u64 {
        // Ties on score fall back to the internal index.
        put(&index, i, (i % 5) as u32, &format!("common word {i}"));
    }

    let mut seen = Vec::new();
    let mut keys = Vec::new();
    let mut resume = None;
    loop {
        let results = search(
            &index,
            SearchRequest::new("common")
                .with_limit(7)
                .with_resume(resume.take()),
        );
        assert!(results.documents.len() <= 7);
        for doc in &results.documents {
            seen.push(doc.int_id().unwrap());
            keys.push(doc.key());
        }
        match results.next {
            Some(next) => resume = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 50);
    let mut unique = seen.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 50);
    assert!(keys.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_alternatives() {
    let index = new_index();
    put(&index, 1, 1, "red apple");
    put(&index, 2, 2, "green apple");
    put(&index, 3, 3, "red pear");
    put(&index, 4, 4, "yellow banana");

    assert_eq!(ids(&index, "apple red|green"), vec![2, 1]);
    assert_eq!(ids(&index, "pear|banana"), vec![4, 3]);

    let results = search(&index, SearchRequest::new("apple -red|green"));
    assert!(results.documents.is_empty());
    assert!(results.metrics.error.is_some());
}

#[test]
fn test_fuzzy_segments() {
    let index = new_index();
    put(&index, 1, 1, "internationalization");
    put(&index, 2, 1, "internationalizatio");

    // Long terms tolerate a missing gram.
    assert_eq!(ids(&index, "internationalization").len(), 2);
    // Phrases do not.
    assert_eq!(ids(&index, "\"internationalization\""), vec![1]);

    let strict = search(
        &index,
        SearchRequest::new("internationalization").with_fuzzy(0, 0),
    );
    assert_eq!(strict.documents.len(), 1);
}

#[test]
fn test_missing_terms_and_unknown_symbols() {
    let index = new_index();
    put(&index, 1, 1, "hello world");

    assert!(ids(&index, "zebra").is_empty());
    assert!(ids(&index, "...").is_empty());
    assert_eq!(ids(&index, "-zebra"), vec![1]);
}

#[test]
fn test_timeout_reports_partial_results() {
    let config = IndexConfig::builder()
        .namespace("slow")
        .poll_interval(1)
        .build()
        .unwrap();
    let index = GramIndex::new(MemoryStore::new(), config).unwrap();
    for i in 0..10u64 {
        put(&index, i, 1, "tick tock");
    }

    let results = search(
        &index,
        SearchRequest::new("tick").with_timeout(Duration::ZERO),
    );
    assert!(results.timed_out);
    assert!(results.metrics.timed_out);
    assert!(results.next.is_some());

    // Resuming without a deadline reaches every document exactly once.
    let mut seen: Vec<u64> = results.documents.iter().filter_map(Document::int_id).collect();
    let rest = search(
        &index,
        SearchRequest::new("tick")
            .with_limit(100)
            .with_resume(results.next),
    );
    assert!(!rest.timed_out);
    assert!(rest.next.is_none());
    seen.extend(rest.documents.iter().filter_map(Document::int_id));
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<u64>>());

    let results = search(&index, SearchRequest::new("tick"));
    assert!(!results.timed_out);
    assert_eq!(results.documents.len(), 10);
}

#[test]
fn test_timed_out_alternatives_resume() {
    let config = IndexConfig::builder()
        .namespace("slow-or")
        .poll_interval(1)
        .build()
        .unwrap();
    let index = GramIndex::new(MemoryStore::new(), config).unwrap();
    for i in 0..12u64 {
        put(&index, i, i as u32, ["tick", "tock", "tack"][i as usize % 3]);
    }

    let first = search(
        &index,
        SearchRequest::new("tick|tock").with_timeout(Duration::ZERO),
    );
    assert!(first.timed_out);
    assert!(first.next.is_some());

    let mut seen: Vec<u64> = first.documents.iter().filter_map(Document::int_id).collect();
    let mut resume = first.next;
    while let Some(key) = resume.take() {
        let page = search(
            &index,
            SearchRequest::new("tick|tock")
                .with_limit(3)
                .with_resume(Some(key)),
        );
        seen.extend(page.documents.iter().filter_map(Document::int_id));
        resume = page.next;
    }
    assert_eq!(seen, vec![10, 9, 7, 6, 4, 3, 1, 0]);
}

#[test]
fn test_metrics() {
    let index = new_index();
    put(&index, 1, 1, "metrics are counted");
    let results = search(&index, SearchRequest::new("metrics"));
    assert_eq!(results.metrics.query, "metrics");
    assert!(!results.metrics.collected.is_empty());
    assert!(results.metrics.error.is_none());
    assert!(results.metrics.to_string().contains("\"query\":\"metrics\""));
}

#[test]
fn test_namespace_buckets() {
    let index = GramIndex::new(MemoryStore::new(), IndexConfig::new("left")).unwrap();
    put(&index, 1, 1, "shared text");
    assert_eq!(ids(&index, "shared"), vec![1]);

    let names = index.store().bucket_names();
    assert!(!names.is_empty());
    assert!(names.iter().all(|name| name.starts_with(b"left")));
}
