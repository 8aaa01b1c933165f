//! Text normalization: contraction expansion, tagging, lemmatization and
//! filtering down to content-bearing lemmas.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::{Captures, Regex};

use crate::lexicon::{ADJ_SUFFIXES, CONTRACTION_SUFFIXES, Lexicon, NOUN_SUFFIXES};

/// Universal part-of-speech tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Propn,
    Verb,
    Aux,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Cconj,
    Sconj,
    Part,
    Num,
    Intj,
    Punct,
    X,
}

impl PosTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::Propn => "PROPN",
            PosTag::Verb => "VERB",
            PosTag::Aux => "AUX",
            PosTag::Adj => "ADJ",
            PosTag::Adv => "ADV",
            PosTag::Pron => "PRON",
            PosTag::Det => "DET",
            PosTag::Adp => "ADP",
            PosTag::Cconj => "CCONJ",
            PosTag::Sconj => "SCONJ",
            PosTag::Part => "PART",
            PosTag::Num => "NUM",
            PosTag::Intj => "INTJ",
            PosTag::Punct => "PUNCT",
            PosTag::X => "X",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_ascii_uppercase().as_str() {
            "NOUN" => PosTag::Noun,
            "PROPN" => PosTag::Propn,
            "VERB" => PosTag::Verb,
            "AUX" => PosTag::Aux,
            "ADJ" => PosTag::Adj,
            "ADV" => PosTag::Adv,
            "PRON" => PosTag::Pron,
            "DET" => PosTag::Det,
            "ADP" => PosTag::Adp,
            "CCONJ" => PosTag::Cconj,
            "SCONJ" => PosTag::Sconj,
            "PART" => PosTag::Part,
            "NUM" => PosTag::Num,
            "INTJ" => PosTag::Intj,
            "PUNCT" => PosTag::Punct,
            "X" => PosTag::X,
            other => return Err(format!("Unknown POS tag: {other}")),
        };
        Ok(tag)
    }
}

/// Tags kept by default: nouns, adjectives, verbs and adverbs.
pub fn default_allowed_tags() -> HashSet<PosTag> {
    [PosTag::Noun, PosTag::Adj, PosTag::Verb, PosTag::Adv]
        .into_iter()
        .collect()
}

/// A tagged and lemmatized token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub tag: PosTag,
    pub lemma: String,
}

impl Token {
    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }
}

static CONTRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:[a-z]+(?:['’][a-z]+)+|gonna|wanna|gotta|gimme|lemme|dunno|kinda|sorta|outta)\b",
    )
    .expect("contraction pattern is valid")
});

/// Rule-based English normalizer backed by the shared [`Lexicon`].
#[derive(Clone, Debug)]
pub struct Normalizer {
    lexicon: &'static Lexicon,
    allowed: HashSet<PosTag>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(default_allowed_tags())
    }
}

impl Normalizer {
    pub fn new(allowed: HashSet<PosTag>) -> Self {
        Normalizer {
            lexicon: Lexicon::english(),
            allowed,
        }
    }

    pub fn allowed_tags(&self) -> &HashSet<PosTag> {
        &self.allowed
    }

    /// Lower-cased content lemmas of `text`, in original order.
    ///
    /// # Example
    /// ```
    /// use moodguard::Normalizer;
    /// let lemmas = Normalizer::default().normalize("I don't feel safe at home");
    /// assert_eq!(lemmas, vec!["feel", "safe", "home"]);
    /// ```
    pub fn normalize(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let expanded = self.expand_contractions(text);
        self.tag(&expanded)
            .into_iter()
            .filter(|t| self.allowed.contains(&t.tag))
            .filter(|t| t.is_alpha())
            .filter(|t| !self.lexicon.is_stop_word(&t.text.to_lowercase()))
            .filter(|t| !self.lexicon.is_stop_word(&t.lemma))
            .map(|t| t.lemma)
            .collect()
    }

    /// Normalize many texts in parallel; output order matches input order.
    pub fn normalize_all(&self, texts: &[String]) -> Vec<Vec<String>> {
        texts.par_iter().map(|t| self.normalize(t)).collect()
    }

    /// Expand contractions, keeping a leading capital (`I'm` -> `I am`).
    pub fn expand_contractions(&self, text: &str) -> String {
        CONTRACTION_RE
            .replace_all(text, |caps: &Captures| {
                let original = &caps[0];
                let key = original.replace('’', "'").to_lowercase();
                match self.expand_word(&key) {
                    Some(expanded) => match_case(original, &expanded),
                    None => original.to_string(),
                }
            })
            .into_owned()
    }

    fn expand_word(&self, key: &str) -> Option<String> {
        if let Some(exp) = self.lexicon.contraction(key) {
            return Some(exp.to_string());
        }
        CONTRACTION_SUFFIXES.iter().find_map(|(suffix, exp)| {
            let stem = key.strip_suffix(suffix)?;
            (!stem.is_empty()).then(|| format!("{stem}{exp}"))
        })
    }

    /// Tokenize and tag `text`, attaching a lower-case lemma to every token.
    pub fn tag(&self, text: &str) -> Vec<Token> {
        let lex = self.lexicon;
        let mut out: Vec<Token> = Vec::new();
        let mut sentence_start = true;
        let mut verb_slot = false;

        for raw in split_tokens(text) {
            let lower = raw.to_lowercase();
            let prev = out.last().map(|t| t.tag);
            let prev_word = out.last().map(|t| t.text.to_lowercase());
            let tag = if raw.chars().all(char::is_alphanumeric) {
                if raw.chars().all(|c| c.is_ascii_digit()) {
                    PosTag::Num
                } else if raw.chars().any(|c| c.is_ascii_digit()) {
                    PosTag::X
                } else {
                    self.tag_word(raw, &lower, prev, prev_word.as_deref(), sentence_start, verb_slot)
                }
            } else if raw.starts_with('\'') {
                PosTag::Part
            } else {
                PosTag::Punct
            };

            verb_slot = match tag {
                PosTag::Aux | PosTag::Part => true,
                PosTag::Pron => lex.subject_pronouns.contains(lower.as_str()),
                PosTag::Adv => verb_slot,
                _ => false,
            };
            sentence_start = tag == PosTag::Punct && matches!(raw, "." | "!" | "?");

            let lemma = self.lemmatize(&lower, tag);
            out.push(Token {
                text: raw.to_string(),
                tag,
                lemma,
            });
        }
        out
    }

    fn tag_word(
        &self,
        raw: &str,
        lower: &str,
        prev: Option<PosTag>,
        prev_word: Option<&str>,
        sentence_start: bool,
        verb_slot: bool,
    ) -> PosTag {
        let lex = self.lexicon;
        let w = lower;

        if lex.auxiliaries.contains(w) {
            return PosTag::Aux;
        }
        if lex.particles.contains(w) {
            return PosTag::Part;
        }
        if lex.pronouns.contains(w) || lex.possessives.contains(w) {
            return PosTag::Pron;
        }
        if lex.determiners.contains(w) {
            return PosTag::Det;
        }
        if lex.adpositions.contains(w) {
            return PosTag::Adp;
        }
        if lex.coordinators.contains(w) {
            return PosTag::Cconj;
        }
        if lex.subordinators.contains(w) {
            return PosTag::Sconj;
        }
        if lex.numerals.contains(w) {
            return PosTag::Num;
        }
        if lex.interjections.contains(w) {
            return PosTag::Intj;
        }

        if !sentence_start && is_capitalized(raw) {
            return PosTag::Propn;
        }

        if lex.adjectives.contains(w) || lex.irregular_adjectives.contains_key(w) {
            return PosTag::Adj;
        }
        if lex.adverbs.contains(w) {
            return PosTag::Adv;
        }

        let noun_slot = matches!(
            prev,
            Some(PosTag::Det | PosTag::Adj | PosTag::Adp | PosTag::Num | PosTag::Noun | PosTag::Propn)
        ) || prev_word.is_some_and(|p| lex.possessives.contains(p));
        let inflected = w.len() > 4 && (w.ends_with("ed") || w.ends_with("ing"));
        let verb_like = lex.verbs.contains(w)
            || lex.irregular_verbs.contains_key(w)
            || lex.verbs.contains(self.verb_lemma(w).as_str());

        if lex.nouns.contains(w) && !(verb_slot && verb_like) {
            return PosTag::Noun;
        }
        if verb_like || inflected {
            if verb_slot || w.ends_with("ed") {
                return PosTag::Verb;
            }
            return if noun_slot { PosTag::Noun } else { PosTag::Verb };
        }
        if w.len() > 3 && w.ends_with("ly") {
            return PosTag::Adv;
        }
        if ADJ_SUFFIXES.iter().any(|s| w.len() > s.len() + 2 && w.ends_with(s)) {
            return PosTag::Adj;
        }
        if NOUN_SUFFIXES.iter().any(|s| w.len() > s.len() + 2 && w.ends_with(s)) {
            return PosTag::Noun;
        }
        if verb_slot {
            return PosTag::Verb;
        }
        PosTag::Noun
    }

    /// Lemma of a lower-case word under the given tag.
    pub fn lemmatize(&self, word: &str, tag: PosTag) -> String {
        match tag {
            PosTag::Verb | PosTag::Aux => self.verb_lemma(word),
            PosTag::Noun => self.noun_lemma(word),
            PosTag::Adj => self.adj_lemma(word),
            _ => word.to_string(),
        }
    }

    fn verb_lemma(&self, w: &str) -> String {
        let lex = self.lexicon;
        if let Some(base) = lex.irregular_verbs.get(w) {
            return base.to_string();
        }
        if lex.verbs.contains(w) {
            return w.to_string();
        }
        if let Some(stem) = w.strip_suffix("ies").filter(|s| s.len() > 1) {
            return format!("{stem}y");
        }
        if let Some(stem) = w.strip_suffix("ied").filter(|s| s.len() > 1) {
            return format!("{stem}y");
        }
        if let Some(stem) = w.strip_suffix("ing").filter(|s| s.len() > 1 && has_vowel(s)) {
            return self.restore_stem(stem);
        }
        if let Some(stem) = w.strip_suffix("ed").filter(|s| s.len() > 1 && has_vowel(s)) {
            return self.restore_stem(stem);
        }
        if let Some(stem) = w.strip_suffix("es") {
            if stem.ends_with("ss")
                || stem.ends_with('x')
                || stem.ends_with("ch")
                || stem.ends_with("sh")
                || stem.ends_with('z')
            {
                return stem.to_string();
            }
        }
        if let Some(stem) = w.strip_suffix('s').filter(|s| s.len() > 1 && !s.ends_with('s')) {
            return stem.to_string();
        }
        w.to_string()
    }

    /// Undo an `-ed`/`-ing` removal: restore a dropped `e` or undouble.
    fn restore_stem(&self, stem: &str) -> String {
        let lex = self.lexicon;
        if lex.verbs.contains(stem) {
            return stem.to_string();
        }
        let with_e = format!("{stem}e");
        if lex.verbs.contains(with_e.as_str()) {
            return with_e;
        }
        match undouble(stem) {
            Some((short, last)) if stem.chars().count() >= 3 && !is_vowel(last) => {
                if matches!(last, 'l' | 's' | 'z') {
                    return stem.to_string();
                }
                return short.to_string();
            }
            _ => {}
        }
        if stem.len() > 5 {
            if let Some(short) = stem.strip_suffix('k').filter(|s| s.ends_with("ic")) {
                return short.to_string();
            }
        }
        const E_ENDINGS: &[&str] = &[
            "at", "iz", "is", "us", "ur", "bl", "dl", "gl", "pl", "tl", "kl", "v", "c", "u",
        ];
        if E_ENDINGS.iter().any(|e| stem.ends_with(e)) {
            return with_e;
        }
        if measure(stem) == 1 && ends_cvc(stem) {
            return with_e;
        }
        stem.to_string()
    }

    fn noun_lemma(&self, w: &str) -> String {
        let lex = self.lexicon;
        if let Some(base) = lex.irregular_nouns.get(w) {
            return base.to_string();
        }
        if lex.nouns.contains(w) {
            return w.to_string();
        }
        if w.len() > 4 {
            if let Some(stem) = w.strip_suffix("ies") {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = w.strip_suffix("es") {
            if stem.ends_with("ss")
                || stem.ends_with('x')
                || stem.ends_with("ch")
                || stem.ends_with("sh")
                || stem.ends_with("zz")
            {
                return stem.to_string();
            }
        }
        let keep = ["ss", "us", "is", "ous"].iter().any(|s| w.ends_with(s));
        if w.len() > 3 && w.ends_with('s') && !keep {
            return w[..w.len() - 1].to_string();
        }
        w.to_string()
    }

    fn adj_lemma(&self, w: &str) -> String {
        let lex = self.lexicon;
        if let Some(base) = lex.irregular_adjectives.get(w) {
            return base.to_string();
        }
        if lex.adjectives.contains(w) {
            return w.to_string();
        }
        for suffix in ["iest", "ier"] {
            if let Some(stem) = w.strip_suffix(suffix).filter(|s| s.len() > 1) {
                return format!("{stem}y");
            }
        }
        for suffix in ["est", "er"] {
            if let Some(stem) = w.strip_suffix(suffix) {
                if lex.adjectives.contains(stem) {
                    return stem.to_string();
                }
                if let Some((short, _)) = undouble(stem) {
                    if stem.chars().count() >= 3 && lex.adjectives.contains(short) {
                        return short.to_string();
                    }
                }
            }
        }
        w.to_string()
    }
}

// ---- Internal helpers ----

/// Split into alphanumeric runs, apostrophe clitics (`'s`) and single
/// punctuation characters.
fn split_tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = text.char_indices().peekable();
    while let Some((start, c)) = iter.next() {
        if c.is_whitespace() {
            continue;
        }
        let mut end = start + c.len_utf8();
        if c.is_alphanumeric() || ((c == '\'' || c == '’') && iter.peek().is_some_and(|(_, n)| n.is_alphabetic())) {
            while let Some(&(i, n)) = iter.peek() {
                if !n.is_alphanumeric() {
                    break;
                }
                end = i + n.len_utf8();
                iter.next();
            }
        }
        out.push(&text[start..end]);
    }
    out
}

fn match_case(original: &str, expanded: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return expanded.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = expanded.chars();
        if let Some(first) = chars.next() {
            return first.to_uppercase().chain(chars).collect();
        }
    }
    expanded.to_string()
}

fn is_capitalized(raw: &str) -> bool {
    let mut chars = raw.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    first.is_uppercase() && raw != "I" && rest.iter().any(|c| c.is_lowercase())
}

fn is_vowel_byte(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// `stem` without its last character when that character is doubled
/// ("stopp" -> "stop"), plus the character itself.
fn undouble(stem: &str) -> Option<(&str, char)> {
    let mut tail = stem.char_indices().rev();
    let (at, last) = tail.next()?;
    let (_, prev) = tail.next()?;
    (last == prev).then(|| (&stem[..at], last))
}

fn has_vowel(s: &str) -> bool {
    s.bytes().any(|b| is_vowel_byte(b) || b == b'y')
}

/// Consonant/vowel pattern; `y` after a consonant counts as a vowel.
fn cv_pattern(s: &str) -> Vec<bool> {
    let mut vowels: Vec<bool> = Vec::with_capacity(s.len());
    for (i, b) in s.bytes().enumerate() {
        let v = is_vowel_byte(b) || (b == b'y' && i > 0 && !vowels[i - 1]);
        vowels.push(v);
    }
    vowels
}

/// Number of vowel-consonant sequences.
fn measure(s: &str) -> usize {
    let p = cv_pattern(s);
    p.windows(2).filter(|w| w[0] && !w[1]).count()
}

fn ends_cvc(s: &str) -> bool {
    let p = cv_pattern(s);
    let b = s.as_bytes();
    let n = p.len();
    n >= 3 && !p[n - 3] && p[n - 2] && !p[n - 1] && !matches!(b[n - 1], b'w' | b'x' | b'y')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> Vec<String> {
        Normalizer::default().normalize(text)
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        assert!(norm("").is_empty());
        assert!(norm("   \n\t ").is_empty());
    }

    #[test]
    fn scenario_sentences_keep_content_lemmas() {
        assert_eq!(norm("I feel ignored at home"), vec!["feel", "ignore", "home"]);
        assert_eq!(norm("I had a panic attack today"), vec!["panic", "attack", "today"]);
        assert_eq!(norm("I cut myself last night"), vec!["cut", "night"]);
    }

    #[test]
    fn output_is_lowercase_alphabetic_and_not_stop_words() {
        let n = Normalizer::default();
        let lex = Lexicon::english();
        let text = "My PARENTS don't listen!!! I'm 16 and I've been crying since 3am, it's awful.";
        for lemma in n.normalize(text) {
            assert!(lemma.chars().all(|c| c.is_alphabetic() && c.is_lowercase()), "{lemma}");
            assert!(!lex.is_stop_word(&lemma), "{lemma}");
        }
    }

    #[test]
    fn contractions_are_expanded_with_case() {
        let n = Normalizer::default();
        assert_eq!(n.expand_contractions("I'm fine, don't worry"), "I am fine, do not worry");
        assert_eq!(n.expand_contractions("Can't sleep"), "Cannot sleep");
        assert_eq!(n.expand_contractions("we’re gonna fail"), "we are going to fail");
        assert_eq!(n.expand_contractions("Mom's car"), "Mom's car");
    }

    #[test]
    fn verb_lemmas_follow_inflection_rules() {
        let n = Normalizer::default();
        let cases = [
            ("ignored", "ignore"),
            ("stopped", "stop"),
            ("crying", "cry"),
            ("cried", "cry"),
            ("hated", "hate"),
            ("felt", "feel"),
            ("panicking", "panic"),
            ("listened", "listen"),
            ("yelled", "yell"),
            ("worries", "worry"),
            ("died", "die"),
        ];
        for (word, lemma) in cases {
            assert_eq!(n.lemmatize(word, PosTag::Verb), lemma, "{word}");
        }
    }

    #[test]
    fn noun_and_adjective_lemmas() {
        let n = Normalizer::default();
        assert_eq!(n.lemmatize("parents", PosTag::Noun), "parent");
        assert_eq!(n.lemmatize("stories", PosTag::Noun), "story");
        assert_eq!(n.lemmatize("classes", PosTag::Noun), "class");
        assert_eq!(n.lemmatize("children", PosTag::Noun), "child");
        assert_eq!(n.lemmatize("stress", PosTag::Noun), "stress");
        assert_eq!(n.lemmatize("sadder", PosTag::Adj), "sad");
        assert_eq!(n.lemmatize("worse", PosTag::Adj), "bad");
        assert_eq!(n.lemmatize("happier", PosTag::Adj), "happy");
    }

    #[test]
    fn non_ascii_stems_are_cut_on_char_boundaries() {
        let n = Normalizer::default();
        assert!(norm("I a\u{4e79}ed today").contains(&"today".to_string()));
        assert_eq!(n.lemmatize("a\u{4e79}er", PosTag::Adj), "a\u{4e79}er");
        assert_eq!(n.lemmatize("a\u{4e79}\u{4e79}er", PosTag::Adj), "a\u{4e79}\u{4e79}er");
        assert_eq!(n.restore_stem("a\u{4e79}\u{4e79}"), "a\u{4e79}");
        assert_eq!(undouble("\u{e9}\u{e9}t\u{e9}\u{e9}"), Some(("\u{e9}\u{e9}t\u{e9}", '\u{e9}')));
        assert_eq!(undouble("x"), None);
    }

    #[test]
    fn measure_and_cvc_follow_porter_definitions() {
        assert_eq!(measure("tree"), 0);
        assert_eq!(measure("trouble"), 1);
        assert_eq!(measure("oaten"), 2);
        assert_eq!(cv_pattern("toy"), vec![false, true, false]);
        assert_eq!(cv_pattern("sky"), vec![false, false, true]);
        assert!(ends_cvc("hop"));
        assert!(!ends_cvc("snow"));
        assert!(!ends_cvc("fix"));
        assert!(!ends_cvc("hoop"));
    }

    #[test]
    fn proper_nouns_and_numbers_are_dropped() {
        assert_eq!(norm("Yesterday Sarah yelled at me 5 times"), vec!["yesterday", "yell", "time"]);
    }

    #[test]
    fn allowed_tags_restrict_output() {
        let only_nouns = Normalizer::new([PosTag::Noun].into_iter().collect());
        assert_eq!(only_nouns.normalize("I had a panic attack today"), vec!["panic", "attack", "today"]);
        assert_eq!(only_nouns.normalize("I feel ignored"), Vec::<String>::new());
    }

    #[test]
    fn parallel_normalization_preserves_order() {
        let n = Normalizer::default();
        let texts = vec!["I cut myself last night".to_string(), String::new(), "panic".to_string()];
        let out = n.normalize_all(&texts);
        assert_eq!(out, vec![vec!["cut".to_string(), "night".to_string()], vec![], vec!["panic".to_string()]]);
    }

    #[test]
    fn pos_tags_parse_from_strings() {
        assert_eq!("noun".parse::<PosTag>().unwrap(), PosTag::Noun);
        assert!("verbish".parse::<PosTag>().is_err());
    }
}
