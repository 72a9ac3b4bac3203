//! Identifier normalization for name matching.
//!
//! Folds identifiers to a canonical lowercase form so that `user_id`,
//! `UserID`, and `userId` all compare equal. A second variant additionally
//! strips one trailing domain token (`CreatedAt` -> `created`), which lets
//! timestamp- and id-suffixed fields match their bare counterparts.

/// Domain tokens stripped by [`normalize_stripped`], longest first so that
/// `ids` wins over `id` and `id` over a bare `at` suffix check.
const DOMAIN_SUFFIXES: [&str; 5] = ["timestamp", "ids", "utc", "id", "at"];

/// Fold an identifier to its canonical form.
///
/// Splits on non-alphanumeric separators and on CamelCase transitions
/// (lowercase-to-uppercase always splits; an uppercase run followed by a
/// lowercase letter splits before the last uppercase, so `XMLParser` splits
/// into `XML` and `Parser`), lowercases every piece, and concatenates.
///
/// Total and pure; idempotent by construction (the output contains only
/// lowercase alphanumerics, which no rule splits further).
pub fn normalize(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    // Lowercasing makes the camel-case split points invisible once the
    // pieces are concatenated, so folding reduces to dropping separators.
    for &c in &chars {
        if !c.is_alphanumeric() {
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Whether a word boundary falls immediately before `chars[i]`.
///
/// Exposed for the word-aware callers below; `normalize` itself only needs
/// the concatenation.
fn boundary_before(chars: &[char], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = chars[i - 1];
    let c = chars[i];
    if !prev.is_alphanumeric() {
        return true;
    }
    if prev.is_lowercase() && c.is_uppercase() {
        return true;
    }
    // Uppercase run followed by lowercase: split before the run's last
    // letter (`XMLParser` -> `XML` | `Parser`).
    if prev.is_uppercase()
        && c.is_uppercase()
        && chars.get(i + 1).is_some_and(|n| n.is_lowercase())
    {
        return true;
    }
    false
}

/// Like [`normalize`], then strip one trailing domain token.
///
/// The longest matching suffix from [`DOMAIN_SUFFIXES`] is removed, at most
/// once, and only when a non-empty remainder is left: `createdat` becomes
/// `created`, but `at` and `id` stay whole.
pub fn normalize_stripped(ident: &str) -> String {
    let folded = normalize(ident);
    for suffix in DOMAIN_SUFFIXES {
        if let Some(rest) = folded.strip_suffix(suffix) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    folded
}

/// Split an identifier into its normalized words.
///
/// Same boundary rules as [`normalize`]; used where per-word output reads
/// better than the folded form (placeholder transform names, reports).
pub fn split_words(ident: &str) -> Vec<String> {
    let chars: Vec<char> = ident.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if boundary_before(&chars, i) && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
