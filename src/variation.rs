use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::Tone;

/// Picks `catalog[index mod len]`, or `""` for an empty catalog.
pub fn choose_variant(catalog: &[String], index: usize) -> &str {
    if catalog.is_empty() {
        return "";
    }
    &catalog[index % catalog.len()]
}

/// Phrase lists the template engine draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseCatalog {
    pub urgent_leads: Vec<String>,
    pub angry_leads: Vec<String>,
    pub hopeful_leads: Vec<String>,
    pub why_it_matters: Vec<String>,
    pub ctas: Vec<String>,
    pub closers: Vec<String>,
}

impl Default for PhraseCatalog {
    fn default() -> Self {
        Self {
            urgent_leads: strings(&[
                "Urgent:",
                "Right now:",
                "Heads up:",
                "This can't wait:",
            ]),
            angry_leads: strings(&[
                "Enough.",
                "This is outrageous.",
                "We are not letting this slide.",
                "Unacceptable.",
            ]),
            hopeful_leads: strings(&[
                "Good news worth sharing:",
                "There's real momentum here:",
                "Here's some hope:",
                "We can win this:",
            ]),
            why_it_matters: strings(&[
                "It affects our neighbors directly.",
                "Decisions like this shape our community for years.",
                "Staying quiet is how it passes.",
                "Local pressure works when we show up.",
            ]),
            ctas: strings(&[
                "Share this with someone who needs it.",
                "Show up and bring a friend.",
                "Call your reps today.",
                "RSVP and spread the word.",
                "Sign up and pass it on.",
            ]),
            closers: strings(&[
                "We keep us safe.",
                "See you there.",
                "Stay loud.",
                "Together we win.",
            ]),
        }
    }
}

impl PhraseCatalog {
    pub fn empty() -> Self {
        Self {
            urgent_leads: Vec::new(),
            angry_leads: Vec::new(),
            hopeful_leads: Vec::new(),
            why_it_matters: Vec::new(),
            ctas: Vec::new(),
            closers: Vec::new(),
        }
    }

    pub fn leads(&self, tone: Tone) -> &[String] {
        match tone {
            Tone::Plain => &[],
            Tone::Urgent => &self.urgent_leads,
            Tone::Angry => &self.angry_leads,
            Tone::Hopeful => &self.hopeful_leads,
        }
    }

    pub fn lead(&self, tone: Tone, index: usize) -> &str {
        choose_variant(self.leads(tone), index)
    }

    pub fn why(&self, index: usize) -> &str {
        choose_variant(&self.why_it_matters, index)
    }

    pub fn cta(&self, index: usize) -> &str {
        choose_variant(&self.ctas, index)
    }

    pub fn closer(&self, index: usize) -> &str {
        choose_variant(&self.closers, index)
    }
}

/// How batch positions map to variation indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VariationOrder {
    #[default]
    Sequential,
    Shuffled { seed: u64 },
}

impl VariationOrder {
    /// One variation index per batch position. Shuffling only permutes phrasing;
    /// the same seed always yields the same permutation.
    pub fn indices(self, count: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..count).collect();
        if let VariationOrder::Shuffled { seed } = self {
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }
        indices
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
