//! Variant generator
//!
//! Produces lexical variants of a root domain. Generation is a pure function
//! of the root and the rule set: no randomness, no I/O, and a fixed rule and
//! character iteration order, so two runs yield the same candidates with the
//! same fuzzer labels.
//!
//! When several rules produce the same string, the first rule wins the label.

mod domain;
mod tables;

pub use domain::{RootDomain, is_valid_hostname};

use std::collections::HashSet;

use crate::error::Result;
use crate::variant::DomainVariant;
use tables::{SEQUENCE_GLYPHS, SWAP_TLDS, VOWELS, glyphs, qwerty_neighbours};

/// A named mutation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuzzRule {
    Addition,
    Bitsquatting,
    Homoglyph,
    Hyphenation,
    Insertion,
    Omission,
    Repetition,
    Replacement,
    Subdomain,
    Transposition,
    VowelSwap,
    Various,
    TldSwap,
}

impl FuzzRule {
    /// Every rule, in generation order
    pub const ALL: [FuzzRule; 13] = [
        FuzzRule::Addition,
        FuzzRule::Bitsquatting,
        FuzzRule::Homoglyph,
        FuzzRule::Hyphenation,
        FuzzRule::Insertion,
        FuzzRule::Omission,
        FuzzRule::Repetition,
        FuzzRule::Replacement,
        FuzzRule::Subdomain,
        FuzzRule::Transposition,
        FuzzRule::VowelSwap,
        FuzzRule::Various,
        FuzzRule::TldSwap,
    ];

    /// Label recorded on variants produced by this rule
    pub fn name(&self) -> &'static str {
        match self {
            FuzzRule::Addition => "addition",
            FuzzRule::Bitsquatting => "bitsquatting",
            FuzzRule::Homoglyph => "homoglyph",
            FuzzRule::Hyphenation => "hyphenation",
            FuzzRule::Insertion => "insertion",
            FuzzRule::Omission => "omission",
            FuzzRule::Repetition => "repetition",
            FuzzRule::Replacement => "replacement",
            FuzzRule::Subdomain => "subdomain",
            FuzzRule::Transposition => "transposition",
            FuzzRule::VowelSwap => "vowel-swap",
            FuzzRule::Various => "various",
            FuzzRule::TldSwap => "tld-swap",
        }
    }

    /// Full candidate hosts for `root`, before validation and dedup
    fn apply(&self, root: &RootDomain) -> Vec<String> {
        let label: Vec<char> = root.domain().chars().collect();
        let labels = match self {
            FuzzRule::Addition => addition(&label),
            FuzzRule::Bitsquatting => bitsquatting(&label),
            FuzzRule::Homoglyph => homoglyph(&label),
            FuzzRule::Hyphenation => hyphenation(&label),
            FuzzRule::Insertion => insertion(&label),
            FuzzRule::Omission => omission(&label),
            FuzzRule::Repetition => repetition(&label),
            FuzzRule::Replacement => replacement(&label),
            FuzzRule::Subdomain => subdomain(&label),
            FuzzRule::Transposition => transposition(&label),
            FuzzRule::VowelSwap => vowel_swap(&label),
            FuzzRule::Various => return various(root),
            FuzzRule::TldSwap => {
                return SWAP_TLDS
                    .iter()
                    .filter(|tld| **tld != root.tld())
                    .map(|tld| root.assemble(root.domain(), tld))
                    .collect();
            }
        };

        labels
            .into_iter()
            .map(|l| root.assemble(&l, root.tld()))
            .collect()
    }
}

/// Generates variants of one root domain
#[derive(Debug, Clone)]
pub struct DomainFuzzer {
    root: RootDomain,
    rules: Vec<FuzzRule>,
}

impl DomainFuzzer {
    /// Parse the root domain and use every rule
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` if `root` is not `[scheme://]host[/path][?query]`
    /// with a valid host.
    pub fn new(root: &str) -> Result<Self> {
        Ok(Self {
            root: RootDomain::parse(root)?,
            rules: FuzzRule::ALL.to_vec(),
        })
    }

    /// Restrict generation to `rules`, in the given order
    pub fn with_rules(mut self, rules: &[FuzzRule]) -> Self {
        self.rules = rules.to_vec();
        self
    }

    /// The parsed root domain
    pub fn root(&self) -> &RootDomain {
        &self.root
    }

    /// Generate the candidate set
    ///
    /// Every candidate is a valid hostname, differs from the root host and is
    /// unique by string value.
    pub fn generate(&self) -> Vec<DomainVariant> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(self.root.host().to_string());

        let mut variants = Vec::new();
        for rule in &self.rules {
            for candidate in rule.apply(&self.root) {
                let candidate = candidate.to_ascii_lowercase();
                if !is_valid_hostname(&candidate) || seen.contains(&candidate) {
                    continue;
                }
                seen.insert(candidate.clone());
                variants.push(DomainVariant::new(rule.name(), candidate));
            }
        }

        tracing::debug!(
            "Generated {} variants of {} with {} rules",
            variants.len(),
            self.root.host(),
            self.rules.len()
        );
        variants
    }
}

/// Generate variants of `root` with every rule
pub fn generate(root: &str) -> Result<Vec<DomainVariant>> {
    Ok(DomainFuzzer::new(root)?.generate())
}

fn splice(label: &[char], start: usize, end: usize, insert: &str) -> String {
    let mut out: String = label[..start].iter().collect();
    out.push_str(insert);
    out.extend(&label[end..]);
    out
}

fn addition(label: &[char]) -> Vec<String> {
    let base: String = label.iter().collect();
    ('a'..='z')
        .chain('0'..='9')
        .map(|c| format!("{}{}", base, c))
        .collect()
}

fn bitsquatting(label: &[char]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, c) in label.iter().enumerate() {
        for bit in 0..8 {
            let flipped = (*c as u8) ^ (1 << bit);
            if flipped.is_ascii_lowercase() || flipped.is_ascii_digit() || flipped == b'-' {
                out.push(splice(label, i, i + 1, &(flipped as char).to_string()));
            }
        }
    }
    out
}

fn homoglyph(label: &[char]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, c) in label.iter().enumerate() {
        for glyph in glyphs(*c) {
            out.push(splice(label, i, i + 1, glyph));
        }
    }

    let text: String = label.iter().collect();
    for (sequence, glyph) in SEQUENCE_GLYPHS {
        for (idx, _) in text.match_indices(sequence) {
            out.push(format!("{}{}{}", &text[..idx], glyph, &text[idx + sequence.len()..]));
        }
    }
    out
}

fn hyphenation(label: &[char]) -> Vec<String> {
    (1..label.len()).map(|i| splice(label, i, i, "-")).collect()
}

fn insertion(label: &[char]) -> Vec<String> {
    let mut out = Vec::new();
    for i in 1..label.len().saturating_sub(1) {
        let c = label[i];
        for k in qwerty_neighbours(c).chars() {
            out.push(splice(label, i, i + 1, &format!("{}{}", k, c)));
            out.push(splice(label, i, i + 1, &format!("{}{}", c, k)));
        }
    }
    out
}

fn omission(label: &[char]) -> Vec<String> {
    (0..label.len()).map(|i| splice(label, i, i + 1, "")).collect()
}

fn repetition(label: &[char]) -> Vec<String> {
    label
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, c)| splice(label, i, i, &c.to_string()))
        .collect()
}

fn replacement(label: &[char]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, c) in label.iter().enumerate() {
        for k in qwerty_neighbours(*c).chars() {
            out.push(splice(label, i, i + 1, &k.to_string()));
        }
    }
    out
}

fn subdomain(label: &[char]) -> Vec<String> {
    (1..label.len())
        .filter(|i| !matches!(label[*i], '-' | '.') && !matches!(label[*i - 1], '-' | '.'))
        .map(|i| splice(label, i, i, "."))
        .collect()
}

fn transposition(label: &[char]) -> Vec<String> {
    (0..label.len().saturating_sub(1))
        .filter(|i| label[*i] != label[*i + 1])
        .map(|i| {
            let mut swapped = label.to_vec();
            swapped.swap(i, i + 1);
            swapped.into_iter().collect()
        })
        .collect()
}

fn vowel_swap(label: &[char]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, c) in label.iter().enumerate() {
        if !VOWELS.contains(*c) {
            continue;
        }
        for vowel in VOWELS.chars().filter(|v| v != c) {
            out.push(splice(label, i, i + 1, &vowel.to_string()));
        }
    }
    out
}

fn various(root: &RootDomain) -> Vec<String> {
    let tld = root.tld();
    let flat_tld = tld.replace('.', "");
    let mut out = vec![
        root.assemble(&format!("{}{}", root.domain(), flat_tld), tld),
        root.assemble(&format!("{}-{}", root.domain(), flat_tld), tld),
    ];
    if let Some((_, last)) = tld.rsplit_once('.') {
        out.push(root.assemble(root.domain(), last));
    }
    out
}
