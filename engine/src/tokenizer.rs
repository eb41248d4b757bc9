use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Turns raw text into the ordered sequence of normalized tokens the indices
/// consume. The same provider must tokenize the corpus and every query.
pub trait TokenStream: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> TokenStream for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Accent folding, lowercasing, English stopword removal and Snowball stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishTokenizer;

impl EnglishTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl TokenStream for EnglishTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let folded: String = text
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect::<String>()
            .to_lowercase();
        WORD.find_iter(&folded)
            .map(|m| m.as_str())
            .filter(|token| !is_stopword(token))
            .map(|token| STEMMER.stem(token).into_owned())
            .collect()
    }
}

/// Lowercase and split on whitespace. Suited to corpora that arrive
/// already normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl TokenStream for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    }
}

/// Provider selection for hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    #[default]
    English,
    Whitespace,
}

impl TokenizerKind {
    pub fn provider(&self) -> Box<dyn TokenStream> {
        match self {
            TokenizerKind::English => Box::new(EnglishTokenizer),
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer),
        }
    }
}

impl std::str::FromStr for TokenizerKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(TokenizerKind::English),
            "whitespace" => Ok(TokenizerKind::Whitespace),
            other => Err(crate::Error::InvalidInput(format!("unknown tokenizer '{other}'"))),
        }
    }
}
