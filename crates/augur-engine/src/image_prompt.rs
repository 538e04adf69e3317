//! Image prompt derivation
//!
//! Each narrative segment is mapped to an image prompt by an ordered rule
//! table: the first rule with a keyword contained in the segment
//! (case-insensitively) wins, and a fallback prompt covers everything else.
//! The default table knows the 78 tarot cards followed by a few elemental
//! themes; callers may supply their own through [`ImagePromptSource`].

/// Appended to every card scene
pub const CARD_STYLE_SUFFIX: &str = ", mystical tarot style, glowing ethereal atmosphere";

/// Used when no rule matches
pub const DEFAULT_IMAGE_PROMPT: &str =
    "A mystical tarot card with swirling fates and ethereal light in a dark room";

/// Anything that can turn a narrative segment into an image prompt
pub trait ImagePromptSource: Send + Sync {
    fn derive(&self, segment: &str) -> String;
}

/// One entry of the table: any keyword match yields `prompt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRule {
    keywords: Vec<String>,
    prompt: String,
}

impl PromptRule {
    #[must_use]
    pub fn new<I, S>(keywords: I, prompt: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            prompt: prompt.into(),
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// `lowered` must already be lowercase
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePromptTable {
    rules: Vec<PromptRule>,
    fallback: String,
}

impl Default for ImagePromptTable {
    fn default() -> Self {
        Self::tarot()
    }
}

impl ImagePromptTable {
    #[must_use]
    pub fn new(rules: Vec<PromptRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// The built-in table: tarot cards, then themes, then the generic card
    #[must_use]
    pub fn tarot() -> Self {
        let mut rules: Vec<PromptRule> = TAROT_SCENES
            .iter()
            .map(|(card, scene)| PromptRule::new([*card], format!("{scene}{CARD_STYLE_SUFFIX}")))
            .collect();
        rules.extend(
            THEME_RULES
                .iter()
                .map(|(keywords, prompt)| PromptRule::new(keywords.iter(), *prompt)),
        );
        Self::new(rules, DEFAULT_IMAGE_PROMPT)
    }

    /// Add a rule after the existing ones
    #[must_use]
    pub fn with_rule(mut self, rule: PromptRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[PromptRule] {
        &self.rules
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    #[must_use]
    pub fn derive(&self, segment: &str) -> String {
        let lowered = segment.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(&self.fallback, |rule| &rule.prompt)
            .clone()
    }
}

impl ImagePromptSource for ImagePromptTable {
    fn derive(&self, segment: &str) -> String {
        ImagePromptTable::derive(self, segment)
    }
}

const THEME_RULES: [(&[&str], &str); 4] = [
    (
        &["fire", "огонь"],
        "A fiery tarot card glowing with mystical flames in a dark void",
    ),
    (
        &["sea", "море"],
        "A tarot card with a turbulent sea under a stormy sky, mystical glow",
    ),
    (
        &["stars", "звезды", "звёзды"],
        "A tarot card with a starry night sky and glowing celestial symbols",
    ),
    (
        &["love", "любовь"],
        "A tarot card with two entwined figures under a glowing heart, mystical aura",
    ),
];

const TAROT_SCENES: [(&str, &str); 78] = [
    // Major arcana
    ("The Fool", "A carefree fool dancing at a cliff edge under a bright sky full of mystical symbols"),
    ("The Magician", "A magician raising a wand over an altar of glowing tarot cards"),
    ("The High Priestess", "A veiled priestess between two pillars in a moonlit temple of secrets"),
    ("The Empress", "A radiant empress resting in a lush garden bathed in golden light"),
    ("The Emperor", "A stern emperor on a stone throne beneath fiery skies"),
    ("The Hierophant", "A wise priest in a sacred hall lined with glowing scrolls"),
    ("The Lovers", "Two lovers beneath a starry sky, their fates intertwined by light"),
    ("The Chariot", "A warrior driving a chariot across a cosmic battlefield"),
    ("Strength", "A gentle figure taming a lion under a golden sun"),
    ("The Hermit", "A lone hermit holding a lantern on a foggy mountain at night"),
    ("Wheel of Fortune", "A great wheel of fate turning against a cosmic sky"),
    ("Justice", "A figure holding scales and a sword in a hall of light"),
    ("The Hanged Man", "A figure hanging upside down from a living tree, wrapped in a mystical glow"),
    ("Death", "A skeletal rider crossing a misty landscape where new shoots rise"),
    ("Temperance", "An angel pouring water between two cups beneath a rainbow"),
    ("The Devil", "Chained figures beneath a fiery inverted pentagram"),
    ("The Tower", "A crumbling tower struck by lightning on a stormy night"),
    ("The Star", "A serene figure pouring water into a glowing pool under a starry sky"),
    ("The Moon", "A moonlit path between two towers, wolves howling at mysterious shadows"),
    ("The Sun", "A bright sun shining on a joyful child in a golden field"),
    ("Judgement", "Figures rising toward a trumpet call from the clouds"),
    ("The World", "A dancer inside a cosmic wreath surrounded by glowing symbols"),
    // Wands
    ("Ace of Wands", "A glowing wand bursting into flame in a mystical void"),
    ("Two of Wands", "A figure holding a globe between two wands, overlooking a fiery horizon"),
    ("Three of Wands", "A figure watching ships sail beneath a blazing sky"),
    ("Four of Wands", "A celebration under a garlanded arch of four wands"),
    ("Five of Wands", "Five figures clashing with wands in a stormy scene"),
    ("Six of Wands", "A victorious rider crowned with laurels holding a wand high"),
    ("Seven of Wands", "A figure on a hilltop defending with a wand against shadows"),
    ("Eight of Wands", "Eight wands flying swiftly through a fiery sky"),
    ("Nine of Wands", "A weary guard leaning on a wand before a wall of nine"),
    ("Ten of Wands", "A burdened figure carrying ten wands through dim light"),
    ("Page of Wands", "A young explorer holding a wand in a blazing field"),
    ("Knight of Wands", "A knight charging through flames with a raised wand"),
    ("Queen of Wands", "A queen with a wand and a black cat on a fiery throne"),
    ("King of Wands", "A king with a wand ruling over a burning landscape"),
    // Cups
    ("Ace of Cups", "A glowing chalice overflowing with mystical water"),
    ("Two of Cups", "Two figures exchanging cups beneath a gentle sky"),
    ("Three of Cups", "Three friends dancing and raising cups in a joyful scene"),
    ("Four of Cups", "A figure under a tree ignoring four cups beneath a cloudy sky"),
    ("Five of Cups", "A cloaked figure mourning over spilled cups in a dark mist"),
    ("Six of Cups", "Children exchanging flower-filled cups in a nostalgic glow"),
    ("Seven of Cups", "A figure dreaming of seven cups floating in a misty vision"),
    ("Eight of Cups", "A traveller walking away from eight cups under the moon"),
    ("Nine of Cups", "A contented figure before nine cups in golden light"),
    ("Ten of Cups", "A happy family under a rainbow of ten cups"),
    ("Page of Cups", "A young dreamer holding a cup by a serene river"),
    ("Knight of Cups", "A knight offering a cup on a misty shore"),
    ("Queen of Cups", "A queen holding an ornate cup beside a tranquil sea"),
    ("King of Cups", "A king with a cup enthroned above calm waters"),
    // Swords
    ("Ace of Swords", "A glowing sword piercing a crown in a stormy sky"),
    ("Two of Swords", "A blindfolded figure holding two crossed swords by the sea"),
    ("Three of Swords", "A heart pierced by three swords in falling rain"),
    ("Four of Swords", "A knight resting on a tomb beneath four swords"),
    ("Five of Swords", "A victor gathering five swords on a tense battlefield"),
    ("Six of Swords", "A boat carrying six swords across a misty river"),
    ("Seven of Swords", "A figure sneaking away from camp with seven swords"),
    ("Eight of Swords", "A bound figure surrounded by eight swords"),
    ("Nine of Swords", "A figure waking in despair beneath nine swords"),
    ("Ten of Swords", "A fallen figure pierced by ten swords under a dark sky"),
    ("Page of Swords", "A young watcher with a sword in a windy field"),
    ("Knight of Swords", "A knight charging through a storm with a drawn sword"),
    ("Queen of Swords", "A queen with a raised sword seated against a clear sky"),
    ("King of Swords", "A king with a sword ruling from a storm-swept throne"),
    // Pentacles
    ("Ace of Pentacles", "A glowing pentacle held above a fertile garden"),
    ("Two of Pentacles", "A juggler balancing two pentacles by the rolling sea"),
    ("Three of Pentacles", "A craftsman carving three pentacles in a cathedral"),
    ("Four of Pentacles", "A miser clutching four pentacles in a dim vault"),
    ("Five of Pentacles", "Two beggars passing a lit window of five pentacles on a snowy night"),
    ("Six of Pentacles", "A generous merchant weighing coins and giving pentacles"),
    ("Seven of Pentacles", "A farmer resting on a hoe beside seven pentacles in a field"),
    ("Eight of Pentacles", "An artisan crafting eight pentacles at a workbench"),
    ("Nine of Pentacles", "A lady with a falcon among nine pentacles in a lush vineyard"),
    ("Ten of Pentacles", "Three generations beneath ten pentacles in a golden estate"),
    ("Page of Pentacles", "A young scholar studying a pentacle in a green field"),
    ("Knight of Pentacles", "A knight on a steady horse carrying a pentacle through farmland"),
    ("Queen of Pentacles", "A queen cradling a pentacle in a blooming garden"),
    ("King of Pentacles", "A king with a pentacle ruling over a golden land"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_covers_every_card_once() {
        let names: HashSet<&str> = TAROT_SCENES.iter().map(|(card, _)| *card).collect();
        assert_eq!(names.len(), 78);
        for suit in ["Wands", "Cups", "Swords", "Pentacles"] {
            assert_eq!(names.iter().filter(|n| n.ends_with(suit)).count(), 14);
        }
    }

    #[test]
    fn test_card_match_is_case_insensitive() {
        let table = ImagePromptTable::tarot();
        let prompt = table.derive("In your past lies THE TOWER, sudden and loud.");
        assert!(prompt.starts_with("A crumbling tower struck by lightning"));
        assert!(prompt.ends_with(CARD_STYLE_SUFFIX));
    }

    #[test]
    fn test_cards_win_over_themes() {
        let table = ImagePromptTable::tarot();
        let prompt = table.derive("The Sun brings fire and love.");
        assert!(prompt.starts_with("A bright sun"));
    }

    #[test]
    fn test_theme_keywords_in_both_languages() {
        let table = ImagePromptTable::tarot();
        assert!(table.derive("Your heart is on fire").starts_with("A fiery tarot card"));
        assert!(table.derive("Впереди огонь перемен").starts_with("A fiery tarot card"));
        assert!(table.derive("Calm SEA ahead").contains("turbulent sea"));
        assert!(table.derive("Смотри на звезды").contains("starry night"));
        assert!(table.derive("Любовь рядом").contains("entwined figures"));
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let table = ImagePromptTable::tarot();
        assert_eq!(table.derive("A quiet week."), DEFAULT_IMAGE_PROMPT);
        assert_eq!(table.derive(""), DEFAULT_IMAGE_PROMPT);
    }

    #[test]
    fn test_custom_table() {
        let table = ImagePromptTable::new(vec![PromptRule::new(["Raven"], "A raven")], "Nothing")
            .with_rule(PromptRule::new(["moon"], "A moon"));
        assert_eq!(table.derive("a raven under the moon"), "A raven");
        assert_eq!(table.derive("only the moon"), "A moon");
        assert_eq!(table.derive("sunrise"), "Nothing");
        assert_eq!(table.rules().len(), 2);
    }

    #[test]
    fn test_blank_keywords_never_match() {
        let rule = PromptRule::new(["", "  "], "never");
        let table = ImagePromptTable::new(vec![rule], "fallback");
        assert_eq!(table.derive("anything"), "fallback");
    }

    #[test]
    fn test_trait_object_dispatch() {
        let source: &dyn ImagePromptSource = &ImagePromptTable::tarot();
        assert!(source.derive("The Star").starts_with("A serene figure"));
    }
}
