use std::collections::HashSet;

use regex::Regex;

use crate::columns::nearest_column;
use crate::model::PositionedFragment;
use crate::normalize::collapse_whitespace;
use crate::rows::VisualRow;

const PHONE_PATTERN: &str = r"\(?\b\d{3}\)?[\s.\-]\d{3}[\s.\-]\d{4}\b";

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

fn significant_words(text: &str) -> HashSet<String> {
    words(text)
        .filter(|word| word.chars().count() >= 2 && !word.chars().all(|ch| ch.is_ascii_digit()))
        .collect()
}

pub(crate) fn fingerprint(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

pub(crate) struct KeywordSet {
    keywords: HashSet<String>,
}

impl KeywordSet {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|keyword| keyword.trim().to_lowercase()).collect(),
        }
    }

    pub fn score(&self, text: &str) -> usize {
        words(text).filter(|word| self.keywords.contains(word)).count()
    }
}

/// Picks the best-scoring header candidate among the first `scan` rows.
/// Returns `None` when no row reaches `min_score`; ties keep the earliest row.
pub(crate) fn find_header_row(
    rows: &[VisualRow<'_>],
    keywords: &KeywordSet,
    scan: usize,
    min_score: usize,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, row) in rows.iter().take(scan).enumerate() {
        let score = keywords.score(&row.text());
        if score >= min_score && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Debug, Clone)]
struct Phrase {
    left: f32,
    right: f32,
    above: Vec<String>,
    text: String,
}

impl Phrase {
    fn overlaps(&self, fragment: &PositionedFragment) -> bool {
        fragment.x <= self.right && fragment.right() >= self.left
    }

    fn title(&self) -> String {
        let mut parts = self.above.clone();
        parts.push(self.text.clone());
        collapse_whitespace(&parts.join(" "))
    }
}

fn phrases(header: &VisualRow<'_>, gap: f32) -> Vec<Phrase> {
    let mut out: Vec<Phrase> = Vec::new();
    for fragment in &header.fragments {
        let text = fragment.text.trim();
        match out.last_mut() {
            Some(phrase) if fragment.x - phrase.right < gap => {
                phrase.text.push(' ');
                phrase.text.push_str(text);
                phrase.right = phrase.right.max(fragment.right());
            }
            _ => out.push(Phrase {
                left: fragment.x,
                right: fragment.right(),
                above: Vec::new(),
                text: text.to_string(),
            }),
        }
    }
    out
}

/// Builds one title per column from the header row.
///
/// Close header fragments merge into multi-word titles, and fragments from
/// the rows in `wrapped` (top to bottom, directly above the header) that sit
/// over a title are prefixed to it.
pub(crate) fn header_titles(
    header: &VisualRow<'_>,
    wrapped: &[VisualRow<'_>],
    columns: &[f32],
    gap: f32,
) -> Vec<String> {
    let mut header_phrases = phrases(header, gap);

    for row in wrapped {
        for fragment in &row.fragments {
            if let Some(phrase) = header_phrases
                .iter_mut()
                .find(|phrase| phrase.overlaps(fragment))
            {
                phrase.above.push(fragment.text.trim().to_string());
            }
        }
    }

    let mut titles = vec![String::new(); columns.len()];
    if columns.is_empty() {
        return titles;
    }
    for phrase in &header_phrases {
        let title = &mut titles[nearest_column(columns, phrase.left)];
        if !title.is_empty() {
            title.push(' ');
        }
        title.push_str(&phrase.title());
    }
    titles
}

pub(crate) struct HeaderProfile<'k> {
    fingerprint: String,
    band: HashSet<String>,
    words: HashSet<String>,
    overlap: f32,
    keywords: &'k KeywordSet,
    banner_max_chars: usize,
    phone: Regex,
}

impl<'k> HeaderProfile<'k> {
    pub fn new(
        header_text: &str,
        band_texts: &[String],
        overlap: f32,
        keywords: &'k KeywordSet,
        banner_max_chars: usize,
    ) -> Self {
        Self {
            fingerprint: fingerprint(header_text),
            band: band_texts
                .iter()
                .map(|text| fingerprint(text))
                .filter(|text| !text.is_empty())
                .collect(),
            words: significant_words(header_text),
            overlap,
            keywords,
            banner_max_chars,
            phone: Regex::new(PHONE_PATTERN).expect("hardcoded phone regex is valid"),
        }
    }

    /// Exact match of the header or one of its wrapped title lines, or
    /// enough of the header's significant words.
    pub fn is_repeated_header(&self, text: &str) -> bool {
        let row = fingerprint(text);
        if row == self.fingerprint || self.band.contains(&row) {
            return true;
        }
        if self.words.is_empty() {
            return false;
        }

        let row_words = significant_words(text);
        let shared = self.words.intersection(&row_words).count();
        shared as f32 / self.words.len() as f32 >= self.overlap
    }

    /// Phone numbers, keyword-heavy lines and very short lines near the top
    /// of a continuation page are letterhead or running headers.
    pub fn is_banner(&self, text: &str) -> bool {
        self.phone.is_match(text)
            || self.keywords.score(text) >= 3
            || text.trim().chars().count() < self.banner_max_chars
    }
}
