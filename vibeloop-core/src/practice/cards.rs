//! The practice card deck and the static affirmation fallback.

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{CardCategory, PracticeCard};

const STANDARD_DECK: &[(&str, &str, &str, CardCategory)] = &[
    (
        "gratitude-1",
        "Three Small Things",
        "Name three small things that made today a little lighter.",
        CardCategory::Gratitude,
    ),
    (
        "gratitude-2",
        "Thank Your Body",
        "Thank one part of your body for what it carried you through today.",
        CardCategory::Gratitude,
    ),
    (
        "gratitude-3",
        "Quiet Helper",
        "Think of someone whose help you rarely notice. What do they make possible?",
        CardCategory::Gratitude,
    ),
    (
        "breath-1",
        "Box Breath",
        "Breathe in for four, hold for four, out for four, hold for four. Repeat four times.",
        CardCategory::Breath,
    ),
    (
        "breath-2",
        "Long Exhale",
        "Make every exhale twice as long as the inhale for ten breaths.",
        CardCategory::Breath,
    ),
    (
        "breath-3",
        "Sigh It Out",
        "Take two short inhales through the nose and one long sigh out. Notice what softens.",
        CardCategory::Breath,
    ),
    (
        "kindness-1",
        "Unasked Favor",
        "Do one helpful thing today that nobody asked you to do.",
        CardCategory::Kindness,
    ),
    (
        "kindness-2",
        "Gentle Voice",
        "Catch one harsh thought about yourself and say it again the way a friend would.",
        CardCategory::Kindness,
    ),
    (
        "kindness-3",
        "Send the Message",
        "Send a short note to someone you have been meaning to check in on.",
        CardCategory::Kindness,
    ),
    (
        "presence-1",
        "Five Senses",
        "Pause and name five things you see, four you hear and three you can touch.",
        CardCategory::Presence,
    ),
    (
        "presence-2",
        "Single Task",
        "Pick one ordinary task and give it your full attention from start to finish.",
        CardCategory::Presence,
    ),
    (
        "presence-3",
        "Slow Sip",
        "Drink your next glass of water slowly, noticing temperature and taste.",
        CardCategory::Presence,
    ),
    (
        "courage-1",
        "Small Brave Step",
        "Choose one thing you have been avoiding and take the smallest possible step toward it.",
        CardCategory::Courage,
    ),
    (
        "courage-2",
        "Say the True Thing",
        "Share one honest feeling with someone you trust.",
        CardCategory::Courage,
    ),
    (
        "courage-3",
        "Ask for Help",
        "Where could a little help make today easier? Ask for it.",
        CardCategory::Courage,
    ),
    (
        "affirmation-1",
        "Enough",
        "Repeat slowly: I am enough as I am, right now.",
        CardCategory::Affirmation,
    ),
    (
        "affirmation-2",
        "Room to Grow",
        "Repeat slowly: I can be a work in progress and still be worthy of care.",
        CardCategory::Affirmation,
    ),
    (
        "affirmation-3",
        "Steady Ground",
        "Repeat slowly: I have handled hard days before and I can handle this one.",
        CardCategory::Affirmation,
    ),
];

/// Affirmations used when the deck has no cards, one per day of the year.
/// December 31st of a leap year wraps around to the first entry.
pub const FALLBACK_AFFIRMATIONS: [&str; 365] = [
    "I meet today with an open heart.",
    "My pace is the right pace.",
    "I choose progress over perfection.",
    "Rest is part of the work.",
    "I am allowed to take up space.",
    "Small steps still move me forward.",
    "I can hold both calm and courage.",
    "Today I will notice what is going well.",
    "I release what I cannot control.",
    "My breath is always here to return to.",
    "I deserve the kindness I give others.",
    "I am growing, even when it is quiet.",
    "I begin again as many times as I need.",
    "My feelings are messengers, not masters.",
    "I can be gentle with myself today.",
    "I trust the timing of my life.",
    "I am worthy of rest without earning it.",
    "I let go of yesterday's weight.",
    "I speak to myself like a good friend.",
    "There is room in me for joy.",
    "I am learning, and that is enough.",
    "I honor my limits and my strengths.",
    "Peace begins with this breath.",
    "I give myself permission to slow down.",
    "I can say no without guilt.",
    "I am safe in this moment.",
    "My worth is not measured by my output.",
    "I welcome what today brings.",
    "I carry calm with me wherever I go.",
    "I am proud of how far I have come.",
    "I choose curiosity over judgment.",
    "I can do hard things, one at a time.",
    "My body deserves care and attention.",
    "I forgive myself for not knowing sooner.",
    "I am open to receiving good things.",
    "Every day is a fresh page.",
    "I notice beauty in ordinary moments.",
    "I am connected to the people who love me.",
    "I let my shoulders drop and my jaw soften.",
    "I am more than my worst day.",
    "I can ask for what I need.",
    "I am patient with my own becoming.",
    "I choose thoughts that support me.",
    "My voice matters.",
    "I trust myself to handle what comes.",
    "I am allowed to change my mind.",
    "Gratitude grounds me.",
    "I release the need to be perfect.",
    "I can pause before I respond.",
    "I am at home in my own skin.",
    "I make space for stillness.",
    "I celebrate small wins.",
    "I am resilient and resourceful.",
    "I can feel this and still be okay.",
    "My presence is a gift.",
    "I choose to see the good in myself.",
    "I am allowed to rest before I am tired.",
    "I let kindness lead today.",
    "I can start where I am.",
    "My heart knows the way home.",
    "I am supported more than I realize.",
    "I breathe in calm and breathe out tension.",
    "I am enough, exactly as I am.",
    "I give my best, and my best changes daily.",
    "I am a work of art in progress.",
    "I welcome joy without waiting for permission.",
    "I can rest my mind like I rest my body.",
    "My mistakes help me grow.",
    "I stay close to what matters most.",
    "I trust the wisdom of my body.",
    "I let go of comparison.",
    "I am becoming who I want to be.",
    "I have survived every hard day so far.",
    "I can find stillness inside the noise.",
    "I deserve good things.",
    "I am kind to my future self.",
    "Today I choose ease.",
    "I honor my need for quiet.",
    "I am brave enough to be soft.",
    "I let my light be seen.",
    "I can hold space for my own feelings.",
    "My path is my own.",
    "I greet myself with warmth this morning.",
    "I am allowed to feel proud.",
    "I can find one thing to be grateful for.",
    "I trust that I am learning what I need.",
    "I release tension with every exhale.",
    "I choose to be present.",
    "I am worthy of love and belonging.",
    "I can let this moment be simple.",
    "My needs are valid.",
    "I am grounded like a deep-rooted tree.",
    "I meet challenges with steady hands.",
    "I allow myself to be a beginner.",
    "My kindness makes a difference.",
    "I am free to create my own joy.",
    "I can turn toward myself with compassion.",
    "I notice my breath and come back.",
    "I am not behind; I am on my way.",
    "I make peace with what is.",
    "I welcome rest as a friend.",
    "I am a safe place for myself.",
    "I can let go of what drains me.",
    "My energy is precious, and I spend it wisely.",
    "I choose to believe in myself today.",
    "I am filled with quiet strength.",
    "I give myself credit for trying.",
    "I am allowed to outgrow old stories.",
    "I can be calm and still get things done.",
    "I treat my mind like a garden.",
    "I let laughter in today.",
    "I am patient with slow progress.",
    "My inner voice grows kinder every day.",
    "I trust the process, even when it is unclear.",
    "I choose to rest without apology.",
    "I am thankful for this body that carries me.",
    "I can begin my day again at any moment.",
    "I deserve to take care of myself.",
    "I am open to new possibilities.",
    "I let go of what is not mine to carry.",
    "I am steady in the middle of change.",
    "I can listen to my heart.",
    "My effort counts, even when unseen.",
    "I make room for what nourishes me.",
    "I am a calm center in a busy world.",
    "I choose connection over isolation.",
    "I can treat this day as a gentle experiment.",
    "I am allowed to want more.",
    "I let my breath set the pace.",
    "I honor the seasons of my life.",
    "My feelings pass like weather.",
    "I bring warmth to the people around me.",
    "I can accept help with grace.",
    "I am strong in ways I forget to notice.",
    "I choose to be kind when it is hard.",
    "I allow myself to enjoy this moment.",
    "I am learning to trust myself again.",
    "I can let today be good enough.",
    "My heart is open and protected.",
    "I release old habits that no longer serve me.",
    "I choose courage over comfort today.",
    "I am proud of my quiet victories.",
    "I can find calm in my next breath.",
    "I deserve a life that feels good from the inside.",
    "I notice when I need a break.",
    "I am capable of beautiful things.",
    "I let myself be seen as I am.",
    "I choose to focus on what I can do.",
    "My rest is productive too.",
    "I can soften into this day.",
    "I am allowed to take things slowly.",
    "I honor my story and all its chapters.",
    "I am worthy of my own attention.",
    "I choose to speak gently today.",
    "I can let worries float by like clouds.",
    "My body is wise and worth listening to.",
    "I am ready to receive what is good.",
    "I meet myself with patience.",
    "I choose hope again today.",
    "I can make one kind choice right now.",
    "I am part of something larger than myself.",
    "I give my mind permission to rest.",
    "My breath anchors me to now.",
    "I am allowed to celebrate myself.",
    "I welcome change as a guide.",
    "I can hold my boundaries with love.",
    "I am calm, clear and focused.",
    "I trust that things can get better.",
    "I choose peace over worry.",
    "I let go of the need to prove myself.",
    "I can be both a masterpiece and a work in progress.",
    "My joy is important.",
    "I am gentle with my growing edges.",
    "I am doing better than I think.",
    "I release expectations that weigh me down.",
    "I choose to nurture my spirit.",
    "I can find comfort within myself.",
    "My kindness starts with me.",
    "I am present with whatever arises.",
    "I let myself take a full, deep breath.",
    "I am enough in every season.",
    "I choose words that heal.",
    "I can let go and still be safe.",
    "My presence brings calm to others.",
    "I am worthy of a fresh start.",
    "I allow myself to shine.",
    "I trust my inner compass.",
    "I choose to rest in this moment.",
    "I can face today with an open mind.",
    "My heart has room for everyone, including me.",
    "I am steady, even when life wobbles.",
    "I take care of myself because I matter.",
    "I let joy surprise me.",
    "I can meet difficulty with softness.",
    "My progress is real, even if it is slow.",
    "I am grateful for this breath and the next.",
    "I choose to see possibility.",
    "I release the day and welcome rest.",
    "I can let love in.",
    "I am growing roots and wings.",
    "My needs deserve to be met.",
    "I bring curiosity to my discomfort.",
    "I am free to be myself.",
    "I choose to move at a kind pace.",
    "I can let small things stay small.",
    "My calm is stronger than my stress.",
    "I am surrounded by quiet support.",
    "I meet my emotions with understanding.",
    "I choose to honor my energy.",
    "I can take a mindful pause.",
    "My life is full of small gifts.",
    "I am allowed to not have it all figured out.",
    "I let go of harsh self-talk.",
    "I trust the good in people.",
    "I choose gentleness over hurry.",
    "I can carry lightness with me.",
    "My spirit is resilient.",
    "I am enough, with nothing to add.",
    "I open myself to wonder.",
    "I am safe to slow down.",
    "I choose to respond, not react.",
    "I can bring love to this moment.",
    "My heart is brave.",
    "I am thankful for the lessons of today.",
    "I let myself be still.",
    "I deserve patience from myself.",
    "I choose to trust my journey.",
    "I can begin with just one breath.",
    "My kindness ripples outward.",
    "I am filled with possibility.",
    "I let peace settle in my body.",
    "I welcome today's small adventures.",
    "I choose to rest my worries for now.",
    "I can be proud of trying.",
    "My heart is lighter when I forgive.",
    "I am the calm after the storm.",
    "I allow myself to feel deeply.",
    "I choose to show up for myself.",
    "I can let this day unfold.",
    "My breath is my steady friend.",
    "I am kinder to myself than yesterday.",
    "I release fear and make room for trust.",
    "I choose love as my starting point.",
    "I can sit with uncertainty.",
    "My thoughts do not define me.",
    "I am worth the effort I put into myself.",
    "I notice what makes me feel alive.",
    "I choose to be here now.",
    "I can hold my hopes gently.",
    "My story is still being written.",
    "I am calm and centered.",
    "I let go of rushing.",
    "I deserve moments of delight.",
    "I choose a gentle start.",
    "I can trust my next step.",
    "My heart is a quiet lantern.",
    "I am allowed to ask questions.",
    "I welcome ease into my day.",
    "I choose to be patient with others and myself.",
    "I can return to center.",
    "My efforts are planting seeds.",
    "I am deeply worthy.",
    "I let my mind wander and come back kindly.",
    "I honor the person I am becoming.",
    "I choose to feel what I feel.",
    "I can rest without earning it first.",
    "My inner peace is not for sale.",
    "I am grounded in this present moment.",
    "I release the urge to fix everything.",
    "I choose to savor something today.",
    "I can be a light for someone.",
    "My courage grows each time I use it.",
    "I am doing the best I can with what I have.",
    "I welcome a little more joy.",
    "I choose to listen more closely.",
    "I can let go of one worry right now.",
    "My life has meaning.",
    "I am allowed to be a work in progress.",
    "I bring compassion to my memories.",
    "I choose to trust myself a little more.",
    "I can relax my body one breath at a time.",
    "My calm voice guides me.",
    "I am filled with gratitude.",
    "I release what no longer fits.",
    "I choose kindness in my thoughts.",
    "I can find balance today.",
    "My worth was never in question.",
    "I am softening into rest.",
    "I let the good moments linger.",
    "I choose to be my own ally.",
    "I can handle this moment.",
    "My heart is open to healing.",
    "I am learning to love my whole self.",
    "I meet the day with steady breath.",
    "I choose clarity over chaos.",
    "I can give myself a moment of peace.",
    "My journey is worth honoring.",
    "I am wrapped in warmth and care.",
    "I let myself dream a little bigger.",
    "I choose to nourish my body and mind.",
    "I can end today with gratitude.",
    "My light does not dim in others' shadows.",
    "I am patient with the pace of healing.",
    "I release the pressure to please everyone.",
    "I choose to be present with my people.",
    "I can notice without judging.",
    "My calm is contagious.",
    "I am deserving of gentle care.",
    "I let go of the day's mistakes.",
    "I choose to honor my truth.",
    "I can breathe through this.",
    "My kindness is a strength.",
    "I am more resilient than I know.",
    "I welcome stillness into my evening.",
    "I choose to give myself grace.",
    "I can let today be enough.",
    "My heart is steady and sure.",
    "I am growing in my own time.",
    "I let my breath carry me home.",
    "I choose to meet myself where I am.",
    "I can trust the quiet.",
    "My mind is clear and calm.",
    "I am loved.",
    "I release tension from my shoulders and hands.",
    "I choose to begin with kindness.",
    "I can hold joy and sorrow together.",
    "My inner light is always on.",
    "I am thankful for who I am today.",
    "I let go of old fears.",
    "I choose to find the lesson.",
    "I can be still and know I am okay.",
    "My breath and I are partners.",
    "I am open to gentle surprises.",
    "I honor every small step.",
    "I choose to carry hope.",
    "I can care for myself without guilt.",
    "My spirit is bright.",
    "I am whole.",
    "I let the year carry me forward kindly.",
    "I give thanks for the ground beneath me.",
    "I choose to keep my promises to myself.",
    "I can walk slowly and still arrive.",
    "My hands are capable and kind.",
    "I am at peace with my pace.",
    "I let my smile come easily today.",
    "I choose to notice the sky.",
    "I can lean on the people who care.",
    "My quiet moments restore me.",
    "I am a friend to my own heart.",
    "I release the story that I am not enough.",
    "I choose to leave room for rest.",
    "I can take today one hour at a time.",
    "My gentleness is powerful.",
    "I am awake to the good around me.",
    "I let this breath be a new beginning.",
    "I choose to be curious about my feelings.",
    "I can lay my burdens down for a while.",
    "My growth deserves celebration.",
    "I am held by this moment.",
    "I welcome warmth into my evening.",
    "I choose to end the day softly.",
    "I can forgive and still keep my boundaries.",
    "My dreams are worth tending.",
    "I am calm waters beneath the waves.",
    "I close this year with a grateful heart.",
];

/// Id prefix for cards produced by the fallback table.
const FALLBACK_PREFIX: &str = "daily-affirmation-";

/// A set of drawable cards.
#[derive(Debug, Clone)]
pub struct CardDeck {
    cards: Vec<PracticeCard>,
}

impl CardDeck {
    pub fn new(cards: Vec<PracticeCard>) -> Self {
        Self { cards }
    }

    /// The built-in deck.
    pub fn standard() -> Self {
        let cards = STANDARD_DECK
            .iter()
            .map(|&(id, title, prompt, category)| PracticeCard {
                id: id.to_string(),
                title: title.to_string(),
                prompt: prompt.to_string(),
                category,
            })
            .collect();
        Self { cards }
    }

    pub fn cards(&self) -> &[PracticeCard] {
        &self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Pick a card uniformly, or the day's fallback affirmation if the deck is empty.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, date: NaiveDate) -> PracticeCard {
        match self.cards.choose(rng) {
            Some(card) => card.clone(),
            None => fallback_card(date),
        }
    }

    /// Look a card up by id, including fallback affirmations.
    pub fn find(&self, id: &str) -> Option<PracticeCard> {
        if let Some(card) = self.cards.iter().find(|c| c.id == id) {
            return Some(card.clone());
        }
        let index: usize = id.strip_prefix(FALLBACK_PREFIX)?.parse().ok()?;
        FALLBACK_AFFIRMATIONS
            .get(index)
            .map(|text| affirmation_card(index, text))
    }
}

impl Default for CardDeck {
    fn default() -> Self {
        Self::standard()
    }
}

/// Deterministic affirmation for `date`: `day_of_year mod table_len`.
pub fn fallback_card(date: NaiveDate) -> PracticeCard {
    let index = date.ordinal0() as usize % FALLBACK_AFFIRMATIONS.len();
    affirmation_card(index, FALLBACK_AFFIRMATIONS[index])
}

fn affirmation_card(index: usize, text: &str) -> PracticeCard {
    PracticeCard {
        id: format!("{}{}", FALLBACK_PREFIX, index),
        title: "Daily Affirmation".to_string(),
        prompt: text.to_string(),
        category: CardCategory::Affirmation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_standard_deck_ids_unique() {
        let deck = CardDeck::standard();
        let ids: HashSet<_> = deck.cards().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), deck.cards().len());
    }

    #[test]
    fn test_draw_comes_from_deck() {
        let deck = CardDeck::standard();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let card = deck.draw(&mut rng, date(6, 1));
            assert_eq!(deck.find(&card.id), Some(card));
        }
    }

    #[test]
    fn test_empty_deck_falls_back_deterministically() {
        let deck = CardDeck::new(Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        let a = deck.draw(&mut rng, date(3, 14));
        let b = deck.draw(&mut rng, date(3, 14));
        assert_eq!(a, b);
        assert_eq!(a.category, CardCategory::Affirmation);
        assert_eq!(deck.find(&a.id), Some(a));

        // Jan 1 is ordinal 0
        assert_eq!(fallback_card(date(1, 1)).prompt, FALLBACK_AFFIRMATIONS[0]);
        assert_eq!(
            fallback_card(date(1, 13)).prompt,
            FALLBACK_AFFIRMATIONS[12 % FALLBACK_AFFIRMATIONS.len()]
        );
    }

    #[test]
    fn test_fallback_covers_the_whole_year() {
        let prompts: HashSet<_> = FALLBACK_AFFIRMATIONS.iter().collect();
        assert_eq!(prompts.len(), 365);

        // Twelve days apart no longer lands on the same affirmation
        assert_ne!(fallback_card(date(1, 1)), fallback_card(date(1, 13)));
        assert_eq!(fallback_card(date(12, 30)).id, "daily-affirmation-364");
        // Leap-day overflow wraps to the start
        assert_eq!(fallback_card(date(12, 31)).prompt, FALLBACK_AFFIRMATIONS[0]);
    }

    #[test]
    fn test_find_unknown() {
        let deck = CardDeck::standard();
        assert!(deck.find("nope").is_none());
        assert!(deck.find("daily-affirmation-999").is_none());
    }
}
