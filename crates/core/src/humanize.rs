use rand::seq::IndexedRandom;
use rand::Rng;

pub const FOLLOW_UP_PROBABILITY: f64 = 0.45;

pub const OPENERS: &[&str] = &[
    "Got you.",
    "Yep, here's the gist.",
    "Good question.",
    "Alright, quick breakdown:",
    "Okay, so...",
    "Sure thing.",
    "Love that you're asking this.",
];

pub const FALLBACKS: &[&str] = &[
    "Hmm, I'm not 100% sure I got that. Can you rephrase it in a simpler way?",
    "I might be missing your point. Are you asking about climate change, pollution, recycling, or living sustainably?",
    "I didn't catch that fully. Try asking it like you would to a friend, short and simple.",
    "Not totally sure. Give me one keyword (like 'plastic', 'recycling', 'climate') and I'll jump in.",
];

pub fn follow_ups(tag: &str) -> &'static [&'static str] {
    match tag {
        "climate_change" => &[
            "Want the main causes, the effects, or what you can do personally?",
            "Do you want a super short summary or the detailed version?",
        ],
        "pollution" => &[
            "Are you more worried about air, water, or plastic pollution?",
            "Want a few easy ways to reduce pollution day-to-day?",
        ],
        "recycling" => &[
            "Tell me what item you're trying to recycle and I'll help you sort it.",
            "Want a quick checklist for recycling correctly?",
        ],
        "plastic_waste" => &[
            "Want easy swaps to cut single-use plastic?",
            "Are you dealing with plastic at home, school, or work?",
        ],
        "water_conservation" => &[
            "Do you want tips for home, gardening, or both?",
            "Want the top 5 easiest water-saving moves?",
        ],
        "sustainable_living" => &[
            "What's your goal: save money, reduce waste, or cut carbon?",
            "Want a beginner plan you can start today?",
        ],
        "carbon_footprint" => &[
            "Want the biggest changes with the least effort?",
            "Do you want tips for travel, food, or home energy?",
        ],
        "renewable_energy" => &[
            "Want a simple comparison of solar vs wind vs hydro?",
            "Curious about renewable energy at home or just the basics?",
        ],
        _ => &[],
    }
}

pub fn pick_fallback<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FALLBACKS.choose(rng).copied().unwrap_or(FALLBACKS[0])
}

pub fn humanize<R: Rng + ?Sized>(base: &str, tag: &str, rng: &mut R) -> String {
    let opener = OPENERS.choose(rng).copied().unwrap_or_default();
    let follow_up = if rng.random_bool(FOLLOW_UP_PROBABILITY) {
        follow_ups(tag).choose(rng).copied()
    } else {
        None
    };

    let text = format!("{opener} {base}").trim().to_string();
    match follow_up {
        Some(question) => format!("{}\n\n{}", text.trim_end(), question.trim()),
        None => text,
    }
}
