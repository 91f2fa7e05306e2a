//! Motivation quotes shown during a break.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::storage::Language;

/// Fallback line when motivation is disabled.
pub const DEFAULT_PROMPT: &str = "Look away at something 20 feet away.";

const ENGLISH: &[&str] = &[
    "Look at something 20 feet away.",
    "Take a deep breath and relax.",
    "Blink often to keep your eyes hydrated.",
    "Stretch your neck and shoulders.",
    "Drink some water.",
    "Your eyes need rest to stay sharp.",
    "Focus on something distant.",
    "Relax your jaw and shoulders.",
    "Give your mind a moment of silence.",
    "Stare out the window and pretend you're in a music video.",
    "Your monitor misses you, but it needs space.",
    "A quick blink is a tiny nap for your eyes.",
    "Hydrate before you dy-drate! (Wait, just drink water).",
    "The pixels will be here when you get back.",
    "Is that a bird? Is that a plane? No, it's just a break.",
    "If you can read this, you're not looking 20 feet away!",
    "Rumor has it, blinking makes you 1% more awesome.",
    "Stretch like a cat. No one is watching. Probably.",
];

const HINDI: &[&str] = &[
    "Tension nahi lene ka, break lene ka!",
    "Ae Circuit, isko bol break lene ko!",
    "Bhidu, aankhein hai toh jahaan hai. Relax kar!",
    "Load nahi lene ka, mast rehne ka.",
    "Kya re bhidu, thak gaya kya?",
    "Jadoo ki jhappi... for your eyes.",
    "All Izz Well!",
];

const GUJARATI: &[&str] = &["Carrom ramwanu, juice peevanu, majja ni life!"];

pub fn quotes_for(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => ENGLISH,
        Language::Hindi => HINDI,
        Language::Gujarati => GUJARATI,
    }
}

/// Pick one quote uniformly from every enabled language.
/// Returns `None` when no language is enabled.
pub fn pick<R: Rng + ?Sized>(rng: &mut R, languages: &BTreeSet<Language>) -> Option<&'static str> {
    let pool: Vec<&'static str> = languages
        .iter()
        .flat_map(|lang| quotes_for(*lang).iter().copied())
        .collect();
    pool.choose(rng).copied()
}
