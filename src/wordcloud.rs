//! Frequency-weighted word cloud.

use std::collections::HashMap;
use std::fmt::Write as _;

use rust_stemmers::{Algorithm, Stemmer};

use crate::chart::{Svg, escape};
use crate::lexicon::Lexicon;

const WIDTH: f64 = 1600.0;
const HEIGHT: f64 = 900.0;
const BACKGROUND: &str = "#AB9EE2";
const MIN_FONT: f64 = 10.0;
const MAX_WORDS: usize = 200;
/// Light to dark reds; bigger words get darker shades.
const REDS: [&str; 6] = ["#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#99000d"];

/// Word -> count, most frequent first, ties broken alphabetically.
pub fn frequencies<S: AsRef<str>>(tokens: &[S]) -> Vec<(String, usize)> {
    let lex = Lexicon::english();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        let t = t.as_ref();
        if t.is_empty() || lex.is_cloud_stop_word(t) {
            continue;
        }
        *counts.entry(t).or_insert(0) += 1;
    }
    let mut out: Vec<(String, usize)> = merge_variants(counts);
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Fold words sharing a Snowball stem into their most frequent spelling.
fn merge_variants(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let stemmer = Stemmer::create(Algorithm::English);
    let mut groups: HashMap<String, (String, usize, usize)> = HashMap::new();
    for (word, count) in counts {
        let stem = stemmer.stem(word).into_owned();
        let group = groups
            .entry(stem)
            .or_insert_with(|| (word.to_string(), 0, 0));
        group.2 += count;
        if count > group.1 || (count == group.1 && word < group.0.as_str()) {
            group.0 = word.to_string();
            group.1 = count;
        }
    }
    groups.into_values().map(|(w, _, total)| (w, total)).collect()
}

/// Render a word cloud from a token multiset, or `None` if nothing is left
/// to draw.
pub fn build_word_cloud<S: AsRef<str>>(tokens: &[S]) -> Option<Svg> {
    let freqs = frequencies(tokens);
    if freqs.is_empty() {
        log::info!("Word cloud skipped: no tokens");
        return None;
    }
    let placed = layout(&freqs[..freqs.len().min(MAX_WORDS)]);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{BACKGROUND}"/>"#);
    for word in &placed {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            word.x,
            word.y,
            word.font,
            word.color,
            escape(&word.text)
        );
    }
    svg.push_str("</svg>\n");
    log::debug!("Word cloud placed {} of {} words", placed.len(), freqs.len());
    Some(Svg::new(svg))
}

struct Placed {
    text: String,
    font: f64,
    x: f64,
    y: f64,
    color: &'static str,
}

#[derive(Clone, Copy)]
struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    fn centered(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect {
            x0: x - w / 2.0,
            y0: y - h / 2.0,
            x1: x + w / 2.0,
            y1: y + h / 2.0,
        }
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    fn inside_canvas(&self) -> bool {
        self.x0 >= 0.0 && self.y0 >= 0.0 && self.x1 <= WIDTH && self.y1 <= HEIGHT
    }
}

/// Deterministic spiral placement; words that cannot fit are shrunk, then
/// dropped once they reach the minimum font size.
fn layout(freqs: &[(String, usize)]) -> Vec<Placed> {
    let max_count = freqs.first().map_or(1, |(_, c)| *c).max(1) as f64;
    let max_font = HEIGHT / 4.0;
    let mut taken: Vec<Rect> = Vec::new();
    let mut out = Vec::new();

    for (rank, (word, count)) in freqs.iter().enumerate() {
        // Square-root relative scaling keeps rare words readable.
        let rel = (*count as f64 / max_count).sqrt();
        let mut font = (MIN_FONT + (max_font - MIN_FONT) * rel).max(MIN_FONT);
        loop {
            if let Some((x, y, rect)) = find_spot(word, font, &taken) {
                taken.push(rect);
                let shade = ((rel * (REDS.len() - 1) as f64).round() as usize).min(REDS.len() - 1);
                out.push(Placed {
                    text: word.clone(),
                    font,
                    x,
                    y,
                    color: REDS[shade],
                });
                break;
            }
            if font <= MIN_FONT {
                log::trace!("No room for {word} (rank {rank})");
                break;
            }
            font = (font * 0.8).max(MIN_FONT);
        }
    }
    out
}

fn find_spot(word: &str, font: f64, taken: &[Rect]) -> Option<(f64, f64, Rect)> {
    let w = font * 0.6 * word.chars().count() as f64 + 4.0;
    let h = font * 1.1;
    let (cx, cy) = (WIDTH / 2.0, HEIGHT / 2.0);
    let mut t = 0.0f64;
    while t < 400.0 {
        let r = 4.0 * t;
        let x = cx + r * t.cos();
        let y = cy + r * 0.56 * t.sin();
        let rect = Rect::centered(x, y, w, h);
        if rect.inside_canvas() && !taken.iter().any(|o| o.overlaps(&rect)) {
            return Some((x, y, rect));
        }
        if r > WIDTH {
            break;
        }
        t += 0.1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_bag_renders_nothing() {
        let none: Vec<String> = Vec::new();
        assert!(build_word_cloud(&none).is_none());
        assert!(build_word_cloud(&["the", "and", "of"]).is_none());
    }

    #[test]
    fn frequencies_filter_stop_words_and_sort() {
        let f = frequencies(&["panic", "the", "night", "panic", "attack"]);
        assert_eq!(
            f,
            vec![
                ("panic".to_string(), 2),
                ("attack".to_string(), 1),
                ("night".to_string(), 1)
            ]
        );
    }

    #[test]
    fn inflectional_variants_are_merged() {
        let f = frequencies(&["feeling", "feelings", "feelings", "exam"]);
        assert_eq!(f[0], ("feelings".to_string(), 3));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn cloud_contains_every_word_with_bigger_font_for_frequent_ones() {
        let tokens = ["panic", "panic", "panic", "night", "feel"];
        let svg = build_word_cloud(&tokens).unwrap();
        let s = svg.as_str();
        for w in ["panic", "night", "feel"] {
            assert!(s.contains(&format!(">{w}</text>")), "{w} missing");
        }
        let size_of = |w: &str| -> f64 {
            let line = s.lines().find(|l| l.ends_with(&format!(">{w}</text>"))).unwrap();
            let start = line.find("font-size=\"").unwrap() + 11;
            let rest = &line[start..];
            rest[..rest.find('"').unwrap()].parse().unwrap()
        };
        assert!(size_of("panic") > size_of("night"));
    }

    #[test]
    fn layout_is_deterministic() {
        let tokens: Vec<String> = (0..50).map(|i| format!("word{}", i % 7)).collect();
        assert_eq!(build_word_cloud(&tokens), build_word_cloud(&tokens));
    }
}
