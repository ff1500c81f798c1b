//! Bilingual datasets for the tribute page.
//!
//! Every user-facing string is a `Localized` pair picked at render time. The
//! English and Chinese tables are parallel: index `i` in one is the translation
//! of index `i` in the other.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteError};

// --- Language ----------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn parse(code: &str) -> Result<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "cn" | "chinese" => Ok(Language::Zh),
            other => Err(SiteError::UnsupportedLanguage(other.to_string())),
        }
    }

    pub fn from_is_english(is_english: bool) -> Self {
        if is_english { Language::En } else { Language::Zh }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Zh,
            Language::Zh => Language::En,
        }
    }

    pub fn is_english(self) -> bool {
        self == Language::En
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Localized<T> {
    pub en: T,
    pub zh: T,
}

impl<T> Localized<T> {
    pub const fn new(en: T, zh: T) -> Self {
        Self { en, zh }
    }

    pub fn get(&self, lang: Language) -> &T {
        match lang {
            Language::En => &self.en,
            Language::Zh => &self.zh,
        }
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Localized<U> {
        Localized { en: f(&self.en), zh: f(&self.zh) }
    }
}

impl Localized<&'static str> {
    pub fn to_owned_pair(&self) -> Localized<String> {
        self.map(|s| s.to_string())
    }
}

// --- Quote carousel ----------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub struct QuoteCollection {
    pub id: &'static str,
    pub quotes: Localized<&'static [Quote]>,
}

impl QuoteCollection {
    pub fn len(&self) -> usize {
        self.quotes.en.len().min(self.quotes.zh.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn quote(&self, index: usize) -> Option<Localized<Quote>> {
        Some(Localized::new(*self.quotes.en.get(index)?, *self.quotes.zh.get(index)?))
    }
}

const HIMYM_EN: &[Quote] = &[
    Quote { text: "The future is scary but you can't just run back to the past because it's familiar.", author: "Robin" },
    Quote { text: "Because sometimes even if you know how something's gonna end that doesn't mean you can't enjoy the ride.", author: "Ted" },
    Quote { text: "That's life, you know, we never end up where you thought you wanted to be.", author: "Marshall" },
    Quote { text: "We're going to get older whether we like it or not, so the only question is whether we get on with our lives, or desperately cling to the past.", author: "Ted" },
    Quote { text: "Look, you can't design your life like a building. It doesn't work that way. You just have to live it… and it'll design itself.", author: "Lily" },
    Quote { text: "I realized that I'm searching, searching for what I really want in life. And you know what? I have absolutely no idea what that is.", author: "Barney" },
    Quote { text: "So really the biggest mistake would be not to make that mistake, because then you'll go your whole life not knowing if something was a mistake or not.", author: "Lily" },
    Quote { text: "You can't cling to the past, because no matter how tightly you hold on, it's already gone.", author: "Ted" },
    Quote { text: "My search for truth is finished at last. I'm going home.", author: "Zima Blue" },
];

const HIMYM_ZH: &[Quote] = &[
    Quote { text: "未来虽然可怕，但你不能因为过去很熟悉很诱人而转身跑回去。", author: "Robin" },
    Quote { text: "因为有时候，即使你知道事情的结果也不代表你不能享受这个过程。", author: "Ted" },
    Quote { text: "这就是人生，永远不会尽如人意。", author: "Marshall" },
    Quote { text: "不管我们喜欢与否，我们都将变老。所以唯一的问题是我们选择继续生活下去还是可怜兮兮的守着过去。", author: "Ted" },
    Quote { text: "你不能想设计建筑那样去规划自己的人生。生活不需要草图，你只需融入其中，上天自有安排。", author: "Lily" },
    Quote { text: "我意识到我在寻找，寻找我生活中真正想要的东西。但是我完全不知道自己想要什么。", author: "Barney" },
    Quote { text: "人生中最大的错误就是不去犯错。因为如果你不去犯错，你一辈子都不会知道它到底是不是一个错误。", author: "Lily" },
    Quote { text: "你不能对过去念念不忘，因为无论你把回忆抓得多紧，它早已消失。", author: "Ted" },
    Quote { text: "我对真理的探寻终于结束了。我要回家了。", author: "Zima Blue" },
];

const ZIMA_EN: &[Quote] = &[Quote { text: "My search for truth is finished at last. I'm going home.", author: "Zima Blue" }];
const ZIMA_ZH: &[Quote] = &[Quote { text: "我对真相的探索终于结束了。我要回家了。", author: "齐马蓝" }];

pub const QUOTE_COLLECTIONS: &[QuoteCollection] = &[
    QuoteCollection { id: "himym", quotes: Localized::new(HIMYM_EN, HIMYM_ZH) },
    QuoteCollection { id: "zima", quotes: Localized::new(ZIMA_EN, ZIMA_ZH) },
];

pub const DEFAULT_QUOTE_SECTION: &str = "himym";
/// The carousel opens on the Zima Blue line.
pub const DEFAULT_QUOTE_INDEX: usize = 8;

pub fn quote_collection(id: &str) -> Option<&'static QuoteCollection> {
    QUOTE_COLLECTIONS.iter().find(|c| c.id == id)
}

// --- Essence cards -----------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EssenceQuote {
    pub title: &'static str,
    pub desc: &'static str,
}

pub const ESSENCE_CARD_SLOTS: usize = 4;

pub const ESSENCE_QUOTES: Localized<&[EssenceQuote]> = Localized::new(
    &[
        EssenceQuote { title: "The night is dark and full of terrors", desc: "Game of Thrones" },
        EssenceQuote { title: "I have a hangover. A hangover with a hangover", desc: "Black Books" },
        EssenceQuote { title: "Life is a beautiful robe crawling with lice", desc: "Zhang Ailing" },
        EssenceQuote { title: "Sometimes you have to run before you can walk", desc: "Iron Man" },
        EssenceQuote { title: "Winter is coming", desc: "Game of Thrones" },
        EssenceQuote { title: "I'm not great at the advice. Can I interest you in a sarcastic comment?", desc: "Chandler Bing" },
        EssenceQuote { title: "The way I see it, every life is a pile of good things and bad things", desc: "Doctor Who" },
        EssenceQuote { title: "We are all in the gutter, but some of us are looking at the stars", desc: "Oscar Wilde" },
        EssenceQuote { title: "In the end, we will remember not the words of our enemies, but the silence of our friends", desc: "Martin Luther King Jr." },
        EssenceQuote { title: "The only way to do great work is to love what you do", desc: "Steve Jobs" },
    ],
    &[
        EssenceQuote { title: "长夜漫漫，处处险恶", desc: "权力的游戏" },
        EssenceQuote { title: "我宿醉了。比宿醉还醉的宿醉", desc: "布莱克书店" },
        EssenceQuote { title: "人生是一袭华美的袍，爬满了虱子", desc: "张爱玲" },
        EssenceQuote { title: "有时候你必须先跑起来，才能学会走路", desc: "钢铁侠" },
        EssenceQuote { title: "凛冬将至", desc: "权力的游戏" },
        EssenceQuote { title: "我不擅长给建议。要不要来点讽刺的评论？", desc: "钱德勒·宾" },
        EssenceQuote { title: "在我看来，每个人的生活都是好事和坏事的堆积", desc: "神秘博士" },
        EssenceQuote { title: "我们都在阴沟里，但仍有人仰望星空", desc: "奥斯卡·王尔德" },
        EssenceQuote { title: "最终，我们记住的不是敌人的话语，而是朋友的沉默", desc: "马丁·路德·金" },
        EssenceQuote { title: "成就伟大工作的唯一方法就是热爱你所做的事", desc: "史蒂夫·乔布斯" },
    ],
);

pub fn essence_quote_count() -> usize {
    ESSENCE_QUOTES.en.len().min(ESSENCE_QUOTES.zh.len())
}

pub fn essence_quote(index: usize) -> Option<Localized<EssenceQuote>> {
    Some(Localized::new(*ESSENCE_QUOTES.en.get(index)?, *ESSENCE_QUOTES.zh.get(index)?))
}

// --- Card easter eggs --------------------------------------------------------

/// Easter egg hidden behind each essence card slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CardEggKind {
    Cyberpunk,
    Zote,
    RoseQuote,
    DondaWisdom,
}

impl CardEggKind {
    pub fn for_slot(slot: usize) -> Self {
        match slot % ESSENCE_CARD_SLOTS {
            0 => CardEggKind::Cyberpunk,
            1 => CardEggKind::Zote,
            2 => CardEggKind::RoseQuote,
            _ => CardEggKind::DondaWisdom,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            CardEggKind::Cyberpunk => "cyberpunk",
            CardEggKind::Zote => "zote",
            CardEggKind::RoseQuote => "roseQuote",
            CardEggKind::DondaWisdom => "dondaWisdom",
        }
    }

    pub fn audio(self) -> &'static str {
        match self {
            CardEggKind::Cyberpunk => "cyberpunk.mp3",
            CardEggKind::Zote => "zote.mp3",
            CardEggKind::RoseQuote => "rose.mp3",
            CardEggKind::DondaWisdom => "donda.mp3",
        }
    }

    pub fn message(self) -> Localized<&'static str> {
        match self {
            CardEggKind::Cyberpunk => Localized::new("Wake up, Samurai.", "醒醒，武士。"),
            CardEggKind::Zote => Localized::new("Zote the Mighty has arrived!", "强大的左特驾到！"),
            CardEggKind::RoseQuote => Localized::new("A rose for you.", "送你一朵玫瑰。"),
            CardEggKind::DondaWisdom => Localized::new("Listen to Donda.", "听听东达怎么说。"),
        }
    }

    /// Replacement card text, for kinds that rewrite their own card.
    pub fn card_override(self) -> Option<Localized<EssenceQuote>> {
        match self {
            CardEggKind::Cyberpunk => Some(Localized::new(
                EssenceQuote { title: "Wake the f*** up, Samurai. We have a city to burn", desc: "Cyberpunk 2077" },
                EssenceQuote { title: "醒醒，武士。我们还有座城市要烧", desc: "赛博朋克2077" },
            )),
            CardEggKind::RoseQuote => Some(Localized::new(
                EssenceQuote { title: "A rose by any other name would smell as sweet", desc: "Romeo and Juliet" },
                EssenceQuote { title: "玫瑰不叫玫瑰，依然芳香如故", desc: "罗密欧与朱丽叶" },
            )),
            CardEggKind::Zote | CardEggKind::DondaWisdom => None,
        }
    }
}

// --- Phoebe panel ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelText {
    pub title: &'static str,
    pub quote: &'static str,
    pub author: &'static str,
}

pub const PHOEBE_PANEL: Localized<PanelText> = Localized::new(
    PanelText { title: "Phoebe's Wisdom", quote: "NO, YOU ARE THE BOSS OF YOU!", author: "Phoebe Buffay" },
    PanelText { title: "菲比的智慧", quote: "NO, YOU ARE THE BOSS OF YOU!", author: "菲比·布菲" },
);

pub const DONDA_PANEL: Localized<PanelText> = Localized::new(
    PanelText { title: "Donda's Wisdom", quote: "Dream big, but never forget to do the work.", author: "Donda West" },
    PanelText { title: "东达的智慧", quote: "梦想要远大，但别忘了脚踏实地去做。", author: "东达·韦斯特" },
);

pub const ZOTE_TITLE: Localized<&str> = Localized::new("Zote's Precepts", "左特的箴言");
pub const ZOTE_AUTHOR: Localized<&str> = Localized::new("Zote the Mighty", "强大的左特");

/// Precept number paired with its text.
pub const ZOTE_PRECEPTS: &[(u32, Localized<&str>)] = &[
    (1, Localized::new(
        "Always Win Your Battles. Losing a battle earns you nothing and teaches you nothing.",
        "永远赢得你的战斗。输掉战斗一无所获，也学不到任何东西。",
    )),
    (2, Localized::new(
        "Never Let Them Laugh at You. Fools laugh at everything, even at their superiors.",
        "永远不要让他们嘲笑你。蠢人什么都笑，连比他们强的人也笑。",
    )),
    (3, Localized::new(
        "Always Be Rested. Fighting and adventuring take their toll on your body.",
        "永远保持休息充足。战斗和冒险会消耗你的身体。",
    )),
    (4, Localized::new(
        "Forget Your Past. The past is painful, and thinking about it only brings misery.",
        "忘记你的过去。过去是痛苦的，回想它只会带来不幸。",
    )),
    (5, Localized::new(
        "Strength Beats Strength. Overcome your opponent's strength with even more strength.",
        "力量胜过力量。用更强的力量去压倒对手的力量。",
    )),
    (57, Localized::new(
        "Never Forget the Precepts. Memorise them, and live by them always.",
        "永远不要忘记这些箴言。牢记它们，并永远遵循它们。",
    )),
];

/// Quote overrides applied by the Phoebe title and quote easter eggs.
pub const PHOEBE_HELLO: Localized<&str> = Localized::new("Hi, I'm Phoebe Buffay!", "嗨，我是菲比·布菲！");
pub const PHOEBE_BOSS: Localized<&str> = Localized::new("You are the boss of you!", "你才是你自己的老板！");

// --- Meditation --------------------------------------------------------------

pub const MEDITATION_LINES: &[Localized<&str>] = &[
    Localized::new("\"Sometimes, it's difficult even for me", "\"有时候 连我自己都很难理解"),
    Localized::new("to understand what I've become.", "我到底成为了什么"),
    Localized::new("And harder still to remember what I once was.", "更难记清楚我曾经是什么样子"),
    Localized::new("The blue of the tiles...", "瓷砖的蓝色"),
    Localized::new("Zima Blue, the manufacturer called it.", "齐马蓝 制作商这样称呼"),
    Localized::new("The first thing I ever saw.", "我见到的第一件物品"),
    Localized::new("This was where I began.", "一切从这里开始"),
    Localized::new("But it was my world.", "但那是我的世界"),
    Localized::new("It was all I knew, all I needed to know.", "是我了解的一切 也是我需要了解的一切"),
    Localized::new("And now?", "现在呢"),
    Localized::new("I will immerse myself.", "我将浸入泳池"),
    Localized::new("My search for truth is finished at last.", "我对真相的探索终于结束了"),
    Localized::new("I'm going home.\"", "我要回家了\""),
];

// --- Easter eggs -------------------------------------------------------------

/// State change an egg applies besides its audio and notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EggEffect {
    None,
    PhoebeQuote(Localized<&'static str>),
}

/// Static half of an easter egg; limits come from `EggConfig` at registration.
pub struct EggSpec {
    pub id: &'static str,
    pub selector: &'static str,
    pub audio: &'static str,
    pub message: Localized<&'static str>,
    pub effect: EggEffect,
    /// Effect fires after `EggConfig::lang_toggle_delay_ms`.
    pub delayed: bool,
}

pub const EASTER_EGGS: &[EggSpec] = &[
    EggSpec {
        id: "langToggle",
        selector: ".lang-toggle",
        audio: "they-dont-know.mp3",
        message: Localized::new(
            "They Don't Know That We Know They Know We Know.",
            "他们不知道我们知道他们知道我们知道。",
        ),
        effect: EggEffect::None,
        delayed: true,
    },
    EggSpec {
        id: "tributeClick",
        selector: ".tribute",
        audio: "tears.mp3",
        message: Localized::new("Tears I can't hold back...", "眼泪止不住地流..."),
        effect: EggEffect::None,
        delayed: false,
    },
    EggSpec {
        id: "pengClick",
        selector: ".final-text",
        audio: "computer.mp3",
        message: Localized::new("A Computer Scientist's Romance", "计算机科学家的浪漫"),
        effect: EggEffect::None,
        delayed: false,
    },
    EggSpec {
        id: "phoebeWisdom",
        selector: ".phoebe-title",
        audio: "im-phoebe-buffay-hi.mp3",
        message: PHOEBE_HELLO,
        effect: EggEffect::PhoebeQuote(PHOEBE_HELLO),
        delayed: false,
    },
    EggSpec {
        id: "phoebeWisdomBoss",
        selector: ".phoebe-quote",
        audio: "boss.mp3",
        message: PHOEBE_BOSS,
        effect: EggEffect::PhoebeQuote(PHOEBE_BOSS),
        delayed: false,
    },
];

pub fn egg_spec(id: &str) -> Option<&'static EggSpec> {
    EASTER_EGGS.iter().find(|e| e.id == id)
}

// --- Navigation --------------------------------------------------------------

pub struct NavSection {
    pub id: &'static str,
    pub label: Localized<&'static str>,
}

pub const NAV_SECTIONS: &[NavSection] = &[
    NavSection { id: "header", label: Localized::new("Top", "顶部") },
    NavSection { id: "color-display", label: Localized::new("Color", "颜色") },
    NavSection { id: "quote-section", label: Localized::new("Quote", "语录") },
    NavSection { id: "meditation", label: Localized::new("Meditation", "冥想") },
    NavSection { id: "essence", label: Localized::new("Essence", "精华") },
    NavSection { id: "phoebe-section", label: Localized::new("Phoebe", "菲比") },
];
