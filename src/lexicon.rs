//! English word tables used by the normalizer and the word-cloud filter.
//!
//! Built once per process behind [`Lexicon::english`] and shared read-only.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Stop-words checked against each token's lower-cased surface form.
const STOP_WORDS: &str = "a about above across after afterwards again against all almost alone along \
already also although always am among amongst amount an and another any anyhow anyone anything \
anyway anywhere are around as at back be became because become becomes becoming been before \
beforehand behind being below beside besides between beyond both bottom but by call can cannot ca \
could did do does doing done down due during each eight either eleven else elsewhere empty enough \
even ever every everyone everything everywhere except few fifteen fifty first five for former \
formerly forty four from front full further get give go had has have he hence her here hereafter \
hereby herein hereupon hers herself him himself his how however hundred i if in indeed into is it \
its itself just keep last latter latterly least less made make many may me meanwhile might mine \
more moreover most mostly move much must my myself name namely neither never nevertheless next \
nine no nobody none noone nor not nothing now nowhere of off often on once one only onto or other \
others otherwise our ours ourselves out over own part per perhaps please put quite rather re \
really regarding same say see seem seemed seeming seems serious several she should show side since \
six sixty so some somehow someone something sometime sometimes somewhere still such take ten than \
that the their them themselves then thence there thereafter thereby therefore therein thereupon \
these they third this those though three through throughout thru thus to together too top toward \
towards twelve twenty two under unless until up upon us used using various very via was we well \
were what whatever when whence whenever where whereafter whereas whereby wherein whereupon wherever \
whether which while whither who whoever whole whom whose why will with within without would yet \
you your yours yourself yourselves";

/// Render-time stop-word list for the word cloud.
const CLOUD_STOP_WORDS: &str = "i me my myself we our ours ourselves you you're you've you'll you'd \
your yours yourself yourselves he him his himself she she's her hers herself it it's its itself \
they them their theirs themselves what which who whom this that that'll these those am is are was \
were be been being have has had having do does did doing a an the and but if or because as until \
while of at by for with about against between into through during before after above below to \
from up down in out on off over under again further then once here there when where why how all \
any both each few more most other some such no nor not only own same so than too very s t can \
will just don don't should should've now d ll m o re ve y ain aren aren't couldn couldn't didn \
didn't doesn doesn't hadn hadn't hasn hasn't haven haven't isn isn't ma mightn mightn't mustn \
mustn't needn needn't shan shan't shouldn shouldn't wasn wasn't weren weren't won won't wouldn \
wouldn't";

const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "are not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("can't've", "cannot have"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("ma'am", "madam"),
    ("might've", "might have"),
    ("mightn't", "might not"),
    ("must've", "must have"),
    ("mustn't", "must not"),
    ("needn't", "need not"),
    ("shan't", "shall not"),
    ("she'd", "she would"),
    ("she'll", "she will"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that'd", "that would"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what's", "what is"),
    ("where's", "where is"),
    ("who's", "who is"),
    ("won't", "will not"),
    ("wouldn't", "would not"),
    ("would've", "would have"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
    ("gonna", "going to"),
    ("wanna", "want to"),
    ("gotta", "got to"),
    ("gimme", "give me"),
    ("lemme", "let me"),
    ("dunno", "do not know"),
    ("kinda", "kind of"),
    ("sorta", "sort of"),
    ("outta", "out of"),
];

/// Suffix expansions tried when a contraction is not listed verbatim.
pub(crate) const CONTRACTION_SUFFIXES: &[(&str, &str)] = &[
    ("n't", " not"),
    ("'ll", " will"),
    ("'ve", " have"),
    ("'re", " are"),
    ("'d", " would"),
    ("'m", " am"),
];

const PRONOUNS: &str = "i me mine myself you yours yourself yourselves he him himself she hers \
herself it itself we us ours ourselves they them theirs themselves who whom whose what which \
everyone everybody everything someone somebody something anyone anybody anything nobody nothing \
noone none";
const SUBJECT_PRONOUNS: &str = "i you he she it we they who";
const POSSESSIVES: &str = "my your his her its our their";
const DETERMINERS: &str = "a an the this that these those each every some any no all both either \
neither another such";
const ADPOSITIONS: &str = "about above across after against along among around at before behind \
below beneath beside besides between beyond by despite during except for from in inside into near \
of off on onto out outside over past through throughout till toward towards under underneath upon \
via with within without";
const COORDINATORS: &str = "and but or nor yet";
const SUBORDINATORS: &str = "because although though if unless whether while whereas since as \
than so";
const AUXILIARIES: &str = "am is are was were be been being have has had having do does did will \
would shall should can could may might must cannot ca wo";
const PARTICLES: &str = "not to";
const INTERJECTIONS: &str = "oh hey hi hello yes yeah okay ok wow ugh please";
const NUMERALS: &str = "one two three four five six seven eight nine ten eleven twelve twenty \
thirty forty fifty hundred thousand million";

const ADVERBS: &str = "very too also just really often always never sometimes again now then here \
there still even already soon ever quite rather almost maybe perhaps away back only much more most \
less least well how why when where anymore instead together else once twice later ago";
const ADJECTIVES: &str = "sad happy bad good lonely alone anxious angry upset afraid nervous \
hopeless helpless worthless useless weak tired scared worried stressed depressed bored excited \
isolated overwhelmed ashamed frightened terrified confused exhausted annoyed frustrated new old \
big small little great awful terrible horrible hard difficult easy whole last next same different \
own sick ill fine dark heavy empty numb safe unsafe calm normal weird strange real important ready \
sure able free long short high low young glad proud guilty jealous embarrassed mad crazy stupid \
ugly fat poor rich quiet loud cold hot late early busy";
/// Nouns that the suffix rules would otherwise misread.
const NOUNS: &str = "today tonight yesterday tomorrow family friend home school class homework \
exam test night day week morning parent mom dad mother father brother sister teacher life time \
body mind heart belly bully reply anxiety depression stress thing people person";
const VERBS: &str = "feel cut hurt think want need know like love hate cry scream yell fight \
argue worry panic attack ignore leave help talk listen sleep eat study fail pass breathe shake \
sweat hide run walk stay wait try start stop cope focus miss call text tell ask answer care hope \
use believe decide lose live move change die lie include continue manage realize save share scare \
force face choose bite write ride drive come become arrive behave blame compare complete create \
describe escape explore imagine improve judge notice prepare promise receive refuse remove relate \
require rise serve solve struggle suppose survive tire trade whine shame isolate abuse confuse \
pressure pause raise smile cause close practice graduate guide skip hit open visit listen enter \
offer want work play learn seem look watch happen wish kill harm bleed need feed agree free";

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("was", "be"), ("were", "be"), ("been", "be"), ("being", "be"), ("am", "be"), ("is", "be"),
    ("are", "be"), ("had", "have"), ("has", "have"), ("did", "do"), ("does", "do"), ("done", "do"),
    ("went", "go"), ("gone", "go"), ("goes", "go"), ("felt", "feel"), ("made", "make"),
    ("said", "say"), ("says", "say"), ("got", "get"), ("gotten", "get"), ("took", "take"),
    ("taken", "take"), ("came", "come"), ("saw", "see"), ("seen", "see"), ("knew", "know"),
    ("known", "know"), ("thought", "think"), ("told", "tell"), ("left", "leave"), ("lost", "lose"),
    ("kept", "keep"), ("gave", "give"), ("given", "give"), ("found", "find"), ("became", "become"),
    ("began", "begin"), ("begun", "begin"), ("brought", "bring"), ("bought", "buy"),
    ("caught", "catch"), ("fought", "fight"), ("taught", "teach"), ("sought", "seek"),
    ("meant", "mean"), ("slept", "sleep"), ("wept", "weep"), ("held", "hold"), ("heard", "hear"),
    ("ran", "run"), ("sat", "sit"), ("stood", "stand"), ("understood", "understand"),
    ("wrote", "write"), ("written", "write"), ("spoke", "speak"), ("spoken", "speak"),
    ("broke", "break"), ("broken", "break"), ("chose", "choose"), ("chosen", "choose"),
    ("drove", "drive"), ("driven", "drive"), ("ate", "eat"), ("eaten", "eat"), ("fell", "fall"),
    ("fallen", "fall"), ("forgot", "forget"), ("forgotten", "forget"), ("forgave", "forgive"),
    ("forgiven", "forgive"), ("grew", "grow"), ("grown", "grow"), ("hid", "hide"),
    ("hidden", "hide"), ("spent", "spend"), ("sent", "send"), ("built", "build"), ("lent", "lend"),
    ("bent", "bend"), ("paid", "pay"), ("laid", "lay"), ("died", "die"), ("lied", "lie"),
    ("tied", "tie"), ("dying", "die"), ("lying", "lie"), ("led", "lead"), ("fed", "feed"),
    ("fled", "flee"), ("met", "meet"), ("won", "win"), ("woke", "wake"), ("woken", "wake"),
    ("wore", "wear"), ("worn", "wear"), ("threw", "throw"), ("thrown", "throw"), ("blew", "blow"),
    ("drew", "draw"), ("flew", "fly"), ("swam", "swim"), ("sang", "sing"), ("rang", "ring"),
    ("drank", "drink"), ("sank", "sink"), ("shook", "shake"), ("shaken", "shake"),
    ("stole", "steal"), ("stolen", "steal"), ("struck", "strike"), ("swore", "swear"),
    ("tore", "tear"), ("torn", "tear"), ("beaten", "beat"), ("bit", "bite"), ("bitten", "bite"),
    ("froze", "freeze"), ("frozen", "freeze"), ("rode", "ride"), ("rose", "rise"),
    ("risen", "rise"), ("shot", "shoot"), ("stuck", "stick"), ("dealt", "deal"),
    ("dreamt", "dream"), ("learnt", "learn"), ("burnt", "burn"),
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"), ("people", "person"), ("men", "man"), ("women", "woman"),
    ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("lives", "life"), ("wives", "wife"),
    ("knives", "knife"), ("selves", "self"), ("leaves", "leaf"), ("halves", "half"),
    ("thieves", "thief"), ("wolves", "wolf"), ("shelves", "shelf"), ("geese", "goose"),
    ("movies", "movie"), ("cookies", "cookie"), ("lies", "lie"), ("ties", "tie"),
    ("heroes", "hero"), ("potatoes", "potato"), ("tomatoes", "tomato"),
];

const IRREGULAR_ADJECTIVES: &[(&str, &str)] = &[
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
];

pub(crate) const ADJ_SUFFIXES: &[&str] = &[
    "ful", "ous", "ive", "able", "ible", "less", "ish", "ical", "ic", "al", "ary", "ent", "ant",
];
pub(crate) const NOUN_SUFFIXES: &[&str] = &[
    "ness", "ment", "tion", "sion", "ity", "ship", "hood", "ism", "ance", "ence", "er", "or",
];

/// Shared English tables.
#[derive(Debug)]
pub struct Lexicon {
    pub(crate) stop_words: HashSet<&'static str>,
    pub(crate) cloud_stop_words: HashSet<&'static str>,
    pub(crate) contractions: HashMap<&'static str, &'static str>,
    pub(crate) pronouns: HashSet<&'static str>,
    pub(crate) subject_pronouns: HashSet<&'static str>,
    pub(crate) possessives: HashSet<&'static str>,
    pub(crate) determiners: HashSet<&'static str>,
    pub(crate) adpositions: HashSet<&'static str>,
    pub(crate) coordinators: HashSet<&'static str>,
    pub(crate) subordinators: HashSet<&'static str>,
    pub(crate) auxiliaries: HashSet<&'static str>,
    pub(crate) particles: HashSet<&'static str>,
    pub(crate) interjections: HashSet<&'static str>,
    pub(crate) numerals: HashSet<&'static str>,
    pub(crate) adverbs: HashSet<&'static str>,
    pub(crate) adjectives: HashSet<&'static str>,
    pub(crate) nouns: HashSet<&'static str>,
    pub(crate) verbs: HashSet<&'static str>,
    pub(crate) irregular_verbs: HashMap<&'static str, &'static str>,
    pub(crate) irregular_nouns: HashMap<&'static str, &'static str>,
    pub(crate) irregular_adjectives: HashMap<&'static str, &'static str>,
}

static ENGLISH: LazyLock<Lexicon> = LazyLock::new(Lexicon::build_english);

fn words(list: &'static str) -> HashSet<&'static str> {
    list.split_whitespace().collect()
}

impl Lexicon {
    /// The process-wide English lexicon, built on first use.
    pub fn english() -> &'static Lexicon {
        &ENGLISH
    }

    fn build_english() -> Lexicon {
        log::debug!("Building English lexicon");
        Lexicon {
            stop_words: words(STOP_WORDS),
            cloud_stop_words: words(CLOUD_STOP_WORDS),
            contractions: CONTRACTIONS.iter().copied().collect(),
            pronouns: words(PRONOUNS),
            subject_pronouns: words(SUBJECT_PRONOUNS),
            possessives: words(POSSESSIVES),
            determiners: words(DETERMINERS),
            adpositions: words(ADPOSITIONS),
            coordinators: words(COORDINATORS),
            subordinators: words(SUBORDINATORS),
            auxiliaries: words(AUXILIARIES),
            particles: words(PARTICLES),
            interjections: words(INTERJECTIONS),
            numerals: words(NUMERALS),
            adverbs: words(ADVERBS),
            adjectives: words(ADJECTIVES),
            nouns: words(NOUNS),
            verbs: words(VERBS),
            irregular_verbs: IRREGULAR_VERBS.iter().copied().collect(),
            irregular_nouns: IRREGULAR_NOUNS.iter().copied().collect(),
            irregular_adjectives: IRREGULAR_ADJECTIVES.iter().copied().collect(),
        }
    }

    /// True if `word` (lower case) is a normalizer stop-word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// True if `word` (lower case) is filtered out of the word cloud.
    pub fn is_cloud_stop_word(&self, word: &str) -> bool {
        self.cloud_stop_words.contains(word)
    }

    /// Expansion for a listed contraction (lower case, straight apostrophe).
    pub fn contraction(&self, word: &str) -> Option<&'static str> {
        self.contractions.get(word).copied()
    }
}
