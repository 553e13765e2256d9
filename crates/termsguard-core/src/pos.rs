//! Part-of-speech tagging for distillation.
//!
//! [`PosTagger`] is the seam for a real linguistic model. [`HeuristicTagger`]
//! is the built-in fallback: context-free lexicon and suffix rules over the
//! lemma, so re-tagging a distilled string reproduces the same classes.

use std::collections::HashSet;
use std::sync::LazyLock;

use unicode_segmentation::UnicodeSegmentation;

/// Coarse universal part-of-speech classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Noun,
    ProperNoun,
    Verb,
    Numeral,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Adposition,
    Conjunction,
    Auxiliary,
    Particle,
}

impl Pos {
    /// Open classes that carry the content of a clause.
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Noun | Self::ProperNoun | Self::Verb | Self::Numeral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub lemma: String,
    pub pos: Pos,
}

/// Tokenizes, lemmatizes and tags a text.
pub trait PosTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Lexicon and suffix based tagger. Deterministic and model-free.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTagger;

impl PosTagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        text.unicode_words()
            .enumerate()
            .map(|(i, word)| {
                let lower = word.to_lowercase();
                let lemma = lemmatize(&lower);
                let pos = classify(word, &lower, &lemma, i == 0);
                TaggedToken {
                    text: word.to_string(),
                    lemma,
                    pos,
                }
            })
            .collect()
    }
}

fn classify(word: &str, lower: &str, lemma: &str, sentence_initial: bool) -> Pos {
    if is_numeric(lower) {
        return Pos::Numeral;
    }
    if let Some(pos) = closed_class(lemma) {
        return pos;
    }
    if lemma != lower && (lower.ends_with("ing") || lower.ends_with("ed")) {
        return Pos::Verb;
    }
    if VERB_LEMMAS.contains(lemma) {
        return Pos::Verb;
    }
    if !sentence_initial && word.chars().next().is_some_and(char::is_uppercase) {
        return Pos::ProperNoun;
    }
    Pos::Noun
}

fn is_numeric(lower: &str) -> bool {
    lower.chars().next().is_some_and(|c| c.is_ascii_digit()) || NUMBER_WORDS.contains(lower)
}

fn closed_class(lemma: &str) -> Option<Pos> {
    let table: [(&LazyLock<HashSet<&'static str>>, Pos); 8] = [
        (&AUXILIARIES, Pos::Auxiliary),
        (&DETERMINERS, Pos::Determiner),
        (&PRONOUNS, Pos::Pronoun),
        (&ADPOSITIONS, Pos::Adposition),
        (&CONJUNCTIONS, Pos::Conjunction),
        (&PARTICLES, Pos::Particle),
        (&ADVERBS, Pos::Adverb),
        (&ADJECTIVES, Pos::Adjective),
    ];
    if let Some((_, pos)) = table.iter().find(|(set, _)| set.contains(lemma)) {
        return Some(*pos);
    }
    if is_ly_adverb(lemma) {
        return Some(Pos::Adverb);
    }
    if is_suffix_adjective(lemma) {
        return Some(Pos::Adjective);
    }
    None
}

fn is_ly_adverb(lemma: &str) -> bool {
    lemma.len() >= 5
        && lemma.ends_with("ly")
        && !lemma.ends_with("ply")
        && !lemma.ends_with("ily")
        && !LY_NOUNS.contains(lemma)
}

fn is_suffix_adjective(lemma: &str) -> bool {
    lemma.ends_with("ous")
        || lemma.ends_with("ful")
        || (lemma.len() > 5 && lemma.ends_with("less"))
        || (lemma.len() >= 6 && (lemma.ends_with("able") || lemma.ends_with("ible")))
}

/// Reduce a lowercase word to its lemma.
///
/// Suffix rules are applied until nothing changes, so the result is a fixed
/// point: `lemmatize(lemmatize(w)) == lemmatize(w)`.
pub fn lemmatize(lower: &str) -> String {
    let mut current = lower.to_string();
    // Every rule except the irregular table shortens the word, and irregular
    // results are fixed points, so this terminates well within the bound.
    for _ in 0..16 {
        match lemma_step(&current) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

fn lemma_step(w: &str) -> Option<String> {
    if let Some(base) = irregular(w) {
        return Some(base.to_string());
    }
    if IRREGULAR_BASES.contains(w) || is_closed_word(w) || !w.chars().any(char::is_alphabetic) {
        return None;
    }
    if let Some(stem) = w.strip_suffix("'s").or_else(|| w.strip_suffix("’s")) {
        return Some(stem.to_string());
    }
    if let Some(stem) = w.strip_suffix("sses") {
        return Some(format!("{stem}ss"));
    }
    if w.len() > 4
        && let Some(stem) = w.strip_suffix("ies")
    {
        return Some(format!("{stem}y"));
    }
    for suffix in ["xes", "ches", "shes"] {
        if w.len() > suffix.len() + 1 && w.ends_with(suffix) {
            return Some(w[..w.len() - 2].to_string());
        }
    }
    if w.len() > 3
        && w.ends_with('s')
        && !w.ends_with("ss")
        && !w.ends_with("us")
        && !w.ends_with("is")
    {
        return Some(w[..w.len() - 1].to_string());
    }
    if w.len() >= 4
        && !w.ends_with("eed")
        && let Some(stem) = w.strip_suffix("ed")
        && has_vowel(stem)
    {
        return Some(restore_verb_stem(stem));
    }
    if w.len() >= 5
        && let Some(stem) = w.strip_suffix("ing")
        && stem.len() >= 2
        && has_vowel(stem)
    {
        return Some(restore_verb_stem(stem));
    }
    None
}

/// Rebuild a verb base after stripping "-ed" or "-ing".
fn restore_verb_stem(stem: &str) -> String {
    let with_e = format!("{stem}e");
    if VERB_LEMMAS.contains(with_e.as_str()) {
        return with_e;
    }
    if VERB_LEMMAS.contains(stem) {
        return stem.to_string();
    }
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 2
        && bytes[n - 1].is_ascii_alphabetic()
        && bytes[n - 1] == bytes[n - 2]
        && !matches!(bytes[n - 1], b'l' | b's' | b'z')
    {
        return stem[..n - 1].to_string();
    }
    if let Some(head) = stem.strip_suffix('i') {
        return format!("{head}y");
    }
    if ["at", "bl", "iz", "is", "iv", "ur", "ag"].iter().any(|s| stem.ends_with(s)) {
        return with_e;
    }
    stem.to_string()
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
}

fn irregular(w: &str) -> Option<&'static str> {
    Some(match w {
        "is" | "are" | "was" | "were" | "been" | "being" | "am" => "be",
        "has" | "had" | "having" => "have",
        "does" | "did" | "done" | "doing" => "do",
        "children" => "child",
        "minors" => "minor",
        "cookies" => "cookie",
        "men" => "man",
        "women" => "woman",
        "made" => "make",
        "given" | "gave" => "give",
        "taken" | "took" => "take",
        "sold" => "sell",
        "kept" => "keep",
        "held" => "hold",
        "sent" => "send",
        "shown" => "show",
        "written" | "wrote" => "write",
        _ => return None,
    })
}

/// Results of [`irregular`]; never reduced further.
static IRREGULAR_BASES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "be", "have", "do", "child", "minor", "cookie", "man", "woman", "make", "give", "take",
        "sell", "keep", "hold", "send", "show", "write", "data", "news", "always", "series",
    ]
    .into_iter()
    .collect()
});

fn is_closed_word(w: &str) -> bool {
    [
        &AUXILIARIES,
        &DETERMINERS,
        &PRONOUNS,
        &ADPOSITIONS,
        &CONJUNCTIONS,
        &PARTICLES,
        &ADVERBS,
        &ADJECTIVES,
    ]
    .iter()
    .any(|set| set.contains(w))
        || NUMBER_WORDS.contains(w)
}

fn set(words: &[&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

static AUXILIARIES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "can", "could", "shall", "should", "will", "would", "may", "might",
        "must", "ought", "don't", "doesn't", "didn't", "can't", "cannot", "won't", "wouldn't",
        "shouldn't", "isn't", "aren't", "wasn't", "weren't", "we'll", "we're", "we've",
        "you'll", "you're", "you've",
    ])
});

static DETERMINERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "a", "an", "the", "this", "that", "these", "those", "each", "every", "all", "any",
        "some", "no", "such", "either", "neither", "another", "both",
    ])
});

static PRONOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "i", "me", "my", "mine", "myself", "we", "us", "our", "ours", "ourselves", "you",
        "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
        "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
        "themselves", "who", "whom", "whose", "which", "what", "whoever", "whatever",
        "anyone", "anything", "someone", "something", "everyone", "everything", "nobody",
        "nothing", "none",
    ])
});

static ADPOSITIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "about", "above", "across", "after", "against", "along", "among", "around", "as", "at",
        "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite",
        "during", "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on",
        "onto", "out", "outside", "over", "past", "per", "since", "through", "throughout",
        "to", "toward", "towards", "under", "until", "till", "upon", "via", "with", "within",
        "without", "regarding", "concerning", "including", "notwithstanding", "pursuant",
    ])
});

static CONJUNCTIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "and", "or", "but", "nor", "so", "yet", "if", "unless", "whether", "while", "whilst",
        "although", "though", "because", "than", "whereas", "where", "when", "whenever",
        "wherever", "provided",
    ])
});

static PARTICLES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| set(&["not", "n't"]));

static ADVERBS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "also", "very", "just", "only", "never", "always", "often", "sometimes", "however",
        "therefore", "thus", "hence", "here", "there", "now", "then", "still", "even", "ever",
        "soon", "already", "again", "further", "furthermore", "moreover", "otherwise", "how",
        "why", "too", "else", "instead", "perhaps", "almost", "once", "twice", "anytime",
        "hereby", "herein", "thereof", "therein", "indefinitely", "forever",
    ])
});

static ADJECTIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "personal", "other", "own", "same", "new", "legal", "necessary", "relevant", "certain",
        "specific", "general", "public", "private", "free", "full", "additional", "available",
        "appropriate", "following", "prior", "previous", "current", "former", "different",
        "various", "several", "many", "much", "more", "most", "less", "least", "few", "good",
        "high", "low", "large", "small", "long", "short", "able", "unable", "sole", "entire",
        "commercial", "international", "reasonable", "applicable", "sure", "clear", "explicit",
        "express", "late", "early", "last", "next", "whole", "total", "limited", "unlimited",
    ])
});

static NUMBER_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "fifteen", "twenty", "thirty", "forty", "fifty", "sixty", "ninety",
        "hundred", "thousand", "million",
    ])
});

static LY_NOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&["assembly", "monopoly", "anomaly", "ally", "rally", "july", "italy", "jelly"])
});

static VERB_LEMMAS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "collect", "use", "share", "store", "retain", "keep", "process", "disclose", "sell",
        "transfer", "delete", "remove", "erase", "update", "change", "modify", "provide",
        "receive", "obtain", "require", "request", "make", "give", "take", "include", "notify",
        "inform", "monitor", "track", "protect", "secure", "encrypt", "access", "allow",
        "permit", "agree", "consent", "withdraw", "revoke", "accept", "send", "hold", "write",
        "show", "limit", "restrict", "deny", "grant", "base", "determine", "continue",
        "believe", "operate", "create", "enable", "disable", "advertise", "analyze", "analyse",
        "anonymize", "combine", "archive", "purge", "preserve", "maintain", "distribute",
        "transmit", "exchange", "rent", "monetize", "publish", "post", "amend", "revise",
        "indemnify", "waive", "terminate", "suspend", "verify", "comply", "rely", "supply",
        "apply", "occur", "need", "proceed", "exceed", "subscribe", "acknowledge", "reserve",
        "license", "log", "record", "capture", "gather", "harvest", "observe", "acquire",
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<(String, Pos)> {
        HeuristicTagger
            .tag(text)
            .into_iter()
            .map(|t| (t.lemma, t.pos))
            .collect()
    }

    #[test]
    fn lemmatizes_inflections() {
        assert_eq!(lemmatize("parties"), "party");
        assert_eq!(lemmatize("processes"), "process");
        assert_eq!(lemmatize("services"), "service");
        assert_eq!(lemmatize("collected"), "collect");
        assert_eq!(lemmatize("shared"), "share");
        assert_eq!(lemmatize("sharing"), "share");
        assert_eq!(lemmatize("stored"), "store");
        assert_eq!(lemmatize("applied"), "apply");
        assert_eq!(lemmatize("stopping"), "stop");
        assert_eq!(lemmatize("is"), "be");
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("days"), "day");
        assert_eq!(lemmatize("company's"), "company");
    }

    #[test]
    fn lemmatize_is_a_fixed_point() {
        for w in [
            "proceeded", "parties", "processes", "notices", "shared", "monitoring", "used",
            "addresses", "breaches", "anonymized", "things", "days", "always", "status",
        ] {
            let once = lemmatize(w);
            assert_eq!(lemmatize(&once), once, "{w} → {once}");
        }
    }

    #[test]
    fn leaves_short_and_closed_words() {
        assert_eq!(lemmatize("thing"), "thing");
        assert_eq!(lemmatize("always"), "always");
        assert_eq!(lemmatize("unless"), "unless");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("180"), "180");
    }

    #[test]
    fn tags_closed_classes() {
        let t = tags("We will not share the data with them");
        assert_eq!(
            t,
            vec![
                ("we".into(), Pos::Pronoun),
                ("will".into(), Pos::Auxiliary),
                ("not".into(), Pos::Particle),
                ("share".into(), Pos::Verb),
                ("the".into(), Pos::Determiner),
                ("data".into(), Pos::Noun),
                ("with".into(), Pos::Adposition),
                ("them".into(), Pos::Pronoun),
            ]
        );
    }

    #[test]
    fn tags_numbers_and_proper_nouns() {
        let t = tags("Logs are kept by Acme for 180 days");
        assert_eq!(t[0], ("log".into(), Pos::Verb));
        assert_eq!(t[2], ("keep".into(), Pos::Verb));
        assert_eq!(t[4], ("acme".into(), Pos::ProperNoun));
        assert_eq!(t[6], ("180".into(), Pos::Numeral));
        assert_eq!(t[7], ("day".into(), Pos::Noun));
    }

    #[test]
    fn tags_modifiers() {
        let t = tags("promptly delete harmless personal records");
        assert_eq!(t[0].1, Pos::Adverb);
        assert_eq!(t[1].1, Pos::Verb);
        assert_eq!(t[2].1, Pos::Adjective);
        assert_eq!(t[3].1, Pos::Adjective);
        assert_eq!(t[4], ("record".into(), Pos::Verb));
    }

    #[test]
    fn supply_is_not_an_adverb() {
        assert_eq!(tags("supply")[0].1, Pos::Verb);
        assert_eq!(tags("family")[0].1, Pos::Noun);
    }
}
