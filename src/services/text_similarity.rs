use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::normalize_category;

use super::{sort_by_score_then_recency, RecommendError, ScoredPost, Snapshot};

/// Minimum cosine similarity for a post to appear in the ranking
const SIMILARITY_THRESHOLD: f64 = 0.05;

/// Score assigned to posts matched through the category fallback
const CATEGORY_FALLBACK_SCORE: f64 = 0.03;

/// Maximum number of related posts returned for a reference post
const RELATED_LIMIT: usize = 6;

/// Words carrying no signal, removed during tokenization
const STOP_WORDS: [&str; 18] = [
    "the", "and", "is", "in", "to", "with", "a", "of", "for", "on", "at", "by", "an", "from",
    "as", "it", "this", "that",
];

/// Splits text into lower-cased tokens, dropping stop words.
///
/// A token starts at an alphanumeric or underscore character and may
/// continue with word characters, `+` or `-`; trailing `+`/`-` runs are
/// trimmed. Hyphenated terms such as `covid-19` survive as one token.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in lower.chars() {
        let word_char = ch.is_alphanumeric() || ch == '_';
        if word_char || (!current.is_empty() && (ch == '+' || ch == '-')) {
            current.push(ch);
        } else if !current.is_empty() {
            push_token(&mut tokens, std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, current);
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, mut token: String) {
    while token.ends_with('+') || token.ends_with('-') {
        token.pop();
    }
    if !token.is_empty() && !STOP_WORDS.contains(&token.as_str()) {
        tokens.push(token);
    }
}

/// Term frequency: token count over document length
fn term_frequency(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_default() += 1.0;
    }
    let total = tokens.len() as f64;
    for value in counts.values_mut() {
        *value /= total;
    }
    counts
}

/// Smoothed inverse document frequency over the catalog
///
/// `ln((N + 1) / (df + 1)) + 1`; the +1 terms keep the weight defined
/// for a single-post catalog and for terms present in every document.
fn inverse_document_frequency<'a>(docs: &'a [Vec<String>]) -> HashMap<&'a str, f64> {
    let n = docs.len() as f64;
    let mut document_frequency: HashMap<&str, f64> = HashMap::new();

    for tokens in docs {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for token in unique {
            *document_frequency.entry(token).or_default() += 1.0;
        }
    }

    document_frequency
        .into_iter()
        .map(|(token, df)| (token, ((n + 1.0) / (df + 1.0)).ln() + 1.0))
        .collect()
}

/// TF-IDF vector: term frequency weighted by catalog-wide IDF
///
/// Terms absent from the catalog weigh zero, matching the behavior of
/// a vectorizer fitted on the catalog alone.
fn tfidf_vector<'a>(
    tf: &HashMap<&'a str, f64>,
    idf: &HashMap<&str, f64>,
) -> HashMap<&'a str, f64> {
    tf.iter()
        .map(|(&token, &weight)| (token, weight * idf.get(token).copied().unwrap_or(0.0)))
        .collect()
}

/// Cosine similarity between two sparse vectors, in [0, 1]
fn cosine_similarity(a: &HashMap<&str, f64>, b: &HashMap<&str, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(token, &weight)| b.get(token).map(|&other| weight * other))
        .sum();
    let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Ranks catalog posts by lexical similarity to a free-text query.
///
/// Posts are scored by cosine similarity between TF-IDF vectors of the
/// query and each post's title + body. Posts under the similarity floor
/// are dropped; when the query names a catalog category, posts in that
/// category are appended at a fixed fallback score. Zero overlap yields
/// an empty ranking, not an error.
pub fn score_by_text(query: &str, snapshot: &Snapshot) -> Result<Vec<ScoredPost>, RecommendError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(RecommendError::InvalidQuery);
    }

    let posts = snapshot.posts();
    let docs: Vec<Vec<String>> = posts.iter().map(|p| tokenize(&p.document())).collect();
    let idf = inverse_document_frequency(&docs);

    let query_tokens = tokenize(query);
    let query_tf = term_frequency(&query_tokens);
    let query_vec = tfidf_vector(&query_tf, &idf);

    let mut ranked: Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)> = Vec::new();
    let mut included: HashSet<Uuid> = HashSet::new();

    for (post, tokens) in posts.iter().zip(&docs) {
        let tf = term_frequency(tokens);
        let vector = tfidf_vector(&tf, &idf);
        let score = cosine_similarity(&query_vec, &vector);
        if score >= SIMILARITY_THRESHOLD {
            ranked.push((score, post.created_at, post.id));
            included.insert(post.id);
        }
    }

    append_category_fallback(query, snapshot, &included, &mut ranked);

    sort_by_score_then_recency(&mut ranked);
    Ok(collect_scored(ranked))
}

/// When the query itself names a known category, surface that category's
/// posts even without token overlap.
fn append_category_fallback(
    query: &str,
    snapshot: &Snapshot,
    included: &HashSet<Uuid>,
    ranked: &mut Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)>,
) {
    let label = normalize_category(query);
    if !snapshot.category_labels().contains(label.as_str()) {
        return;
    }
    for post in snapshot.posts() {
        if post.has_category(&label) && !included.contains(&post.id) {
            ranked.push((CATEGORY_FALLBACK_SCORE, post.created_at, post.id));
        }
    }
}

/// Ranks posts related to an existing post.
///
/// The reference post's own title + body serves as the query document;
/// the post itself is excluded and the ranking is capped.
pub fn related_posts(post_id: Uuid, snapshot: &Snapshot) -> Result<Vec<ScoredPost>, RecommendError> {
    let target = snapshot
        .post(post_id)
        .ok_or(RecommendError::UnknownPost(post_id))?;

    let posts = snapshot.posts();
    let docs: Vec<Vec<String>> = posts.iter().map(|p| tokenize(&p.document())).collect();
    let idf = inverse_document_frequency(&docs);

    let target_tokens = tokenize(&target.document());
    let target_tf = term_frequency(&target_tokens);
    let target_vec = tfidf_vector(&target_tf, &idf);

    let mut ranked: Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)> = Vec::new();
    for (post, tokens) in posts.iter().zip(&docs) {
        if post.id == post_id {
            continue;
        }
        let tf = term_frequency(tokens);
        let vector = tfidf_vector(&tf, &idf);
        let score = cosine_similarity(&target_vec, &vector);
        if score >= SIMILARITY_THRESHOLD {
            ranked.push((score, post.created_at, post.id));
        }
    }

    sort_by_score_then_recency(&mut ranked);
    ranked.truncate(RELATED_LIMIT);
    Ok(collect_scored(ranked))
}

fn collect_scored(ranked: Vec<(f64, chrono::DateTime<chrono::Utc>, Uuid)>) -> Vec<ScoredPost> {
    ranked
        .into_iter()
        .map(|(score, _, post_id)| ScoredPost { post_id, score })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as StdHashSet;

    use crate::models::{LikeGraph, Post};

    fn post(title: &str, body: &str, categories: &[&str]) -> Post {
        Post::new(
            title.to_string(),
            body.to_string(),
            categories.iter().map(|c| c.to_string()).collect(),
            Uuid::new_v4(),
        )
    }

    fn snapshot_of(posts: Vec<Post>) -> Snapshot {
        Snapshot::new(posts, LikeGraph::new(), StdHashSet::new())
    }

    #[test]
    fn test_tokenize_case_folds_and_splits() {
        assert_eq!(
            tokenize("Dogs, CATS; birds!"),
            vec!["dogs", "cats", "birds"]
        );
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        assert_eq!(tokenize("the cat and the dog"), vec!["cat", "dog"]);
    }

    #[test]
    fn test_tokenize_keeps_hyphenated_terms() {
        assert_eq!(tokenize("covid-19 updates"), vec!["covid-19", "updates"]);
        // Trailing symbol runs are trimmed back to the word
        assert_eq!(tokenize("c++"), vec!["c"]);
    }

    #[test]
    fn test_empty_query_is_invalid() {
        let snapshot = snapshot_of(vec![post("a", "b", &[])]);
        assert_eq!(
            score_by_text("   ", &snapshot).unwrap_err(),
            RecommendError::InvalidQuery
        );
    }

    #[test]
    fn test_identical_vectors_have_unit_cosine() {
        let tokens = tokenize("dogs are great");
        let docs = vec![tokens.clone()];
        let idf = inverse_document_frequency(&docs);
        let tf = term_frequency(&tokens);
        let vector = tfidf_vector(&tf, &idf);

        assert!((cosine_similarity(&vector, &vector) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_query_ranks_overlapping_posts_and_drops_disjoint() {
        let p1 = post("cats and dogs", "", &["Pets"]);
        let p2 = post("dogs are great", "", &["Pets"]);
        let p3 = post("stock market news", "", &["Finance"]);
        let (id1, id2, id3) = (p1.id, p2.id, p3.id);

        let snapshot = snapshot_of(vec![p1, p2, p3]);
        let ranked = score_by_text("dogs", &snapshot).unwrap();

        let ids: Vec<Uuid> = ranked.iter().map(|s| s.post_id).collect();
        assert!(ids.contains(&id1));
        assert!(ids.contains(&id2));
        // No shared vocabulary with the query
        assert!(!ids.contains(&id3));
        for scored in &ranked {
            assert!(scored.score > 0.0 && scored.score <= 1.0);
        }
    }

    #[test]
    fn test_score_monotonicity() {
        let exact = post("dogs dogs dogs", "", &[]);
        let partial = post("dogs and other animals", "", &[]);
        let (exact_id, partial_id) = (exact.id, partial.id);

        let snapshot = snapshot_of(vec![partial, exact]);
        let ranked = score_by_text("dogs", &snapshot).unwrap();

        let score_of = |id: Uuid| ranked.iter().find(|s| s.post_id == id).unwrap().score;
        assert!(score_of(exact_id) >= score_of(partial_id));
    }

    #[test]
    fn test_zero_overlap_yields_empty_ranking() {
        let snapshot = snapshot_of(vec![post("stock market news", "finance report", &[])]);
        let ranked = score_by_text("dogs", &snapshot).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_deterministic_over_fixed_snapshot() {
        let snapshot = snapshot_of(vec![
            post("cats and dogs", "pets everywhere", &[]),
            post("dogs are great", "walking dogs daily", &[]),
            post("dog training", "train your dogs", &[]),
        ]);

        let first = score_by_text("dogs", &snapshot).unwrap();
        let second = score_by_text("dogs", &snapshot).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_category_fallback_surfaces_category_posts() {
        let categorized = post("quiet walks", "morning routine", &["Pets"]);
        let other = post("stock market news", "", &["Finance"]);
        let categorized_id = categorized.id;

        let snapshot = snapshot_of(vec![categorized, other]);
        // "pets" shares no token with either document but names a category
        let ranked = score_by_text("pets", &snapshot).unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].post_id, categorized_id);
        assert!((ranked[0].score - CATEGORY_FALLBACK_SCORE).abs() < 1e-9);
    }

    #[test]
    fn test_related_posts_excludes_reference_and_caps() {
        let reference = post("dogs", "dogs dogs dogs", &[]);
        let reference_id = reference.id;
        let mut posts = vec![reference];
        for i in 0..8 {
            posts.push(post(&format!("dogs story {i}"), "dogs everywhere", &[]));
        }

        let snapshot = snapshot_of(posts);
        let related = related_posts(reference_id, &snapshot).unwrap();

        assert_eq!(related.len(), RELATED_LIMIT);
        assert!(related.iter().all(|s| s.post_id != reference_id));
    }

    #[test]
    fn test_related_posts_unknown_post() {
        let snapshot = snapshot_of(vec![post("a", "b", &[])]);
        let missing = Uuid::new_v4();
        assert_eq!(
            related_posts(missing, &snapshot).unwrap_err(),
            RecommendError::UnknownPost(missing)
        );
    }
}
