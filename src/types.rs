use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::distance::DistanceAlgorithm;

///Size of the corpus the bundled frequency dictionaries were derived from,
///used as the denominator when turning counts into (log) probabilities
pub const CORPUS_SIZE: f64 = 1_024_908_267_229.0;

///Version tag written into persisted state; loads refuse anything else
pub const DATA_VERSION: u32 = 3;

///Controls how many suggestions a lookup returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    ///The single best suggestion: smallest distance, ties broken by highest count
    Top,
    ///All suggestions at the smallest distance found, highest count first
    Closest,
    ///All suggestions within the maximum distance, ordered by distance then count
    All,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Top
    }
}

///A candidate correction returned by lookup: the dictionary term, its edit
///distance from the input and its frequency count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub term: String,
    pub distance: usize,
    pub count: u64,
}

impl Suggestion {
    pub fn new(term: impl Into<String>, distance: usize, count: u64) -> Self {
        Suggestion {
            term: term.into(),
            distance,
            count,
        }
    }
}

impl Ord for Suggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| self.term.cmp(&other.term))
    }
}

impl PartialOrd for Suggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.term, self.distance, self.count)
    }
}

///Result of a word segmentation: the input with boundaries inserted, the
///corrected rendering, the summed edit cost and the summed log probability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    pub segmented_string: String,
    pub corrected_string: String,
    pub distance_sum: usize,
    pub log_prob_sum: f64,
}

///Construction-time options shared across the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    ///Maximum edit distance the delete index is precomputed for. Lookups may
    ///use any distance up to this value. Values above 3 explode index size.
    pub max_dictionary_edit_distance: usize,

    ///Number of leading characters per term that participate in delete
    ///variant generation. Longer prefixes raise accuracy and memory use.
    pub prefix_length: usize,

    ///Minimum cumulative count before a term is admitted into the dictionary;
    ///counts below it accumulate in a shadow map until they cross over
    pub count_threshold: u64,

    ///Which bundled distance metric verifies candidates
    pub distance_algorithm: DistanceAlgorithm,

    ///Per-character decay base used when scoring unseen words and bigrams
    pub smoothing_base: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_dictionary_edit_distance: 2,
            prefix_length: 7,
            count_threshold: 1,
            distance_algorithm: DistanceAlgorithm::DamerauOsa,
            smoothing_base: 10.0,
        }
    }
}

impl Config {
    pub fn with_max_dictionary_edit_distance(mut self, distance: usize) -> Self {
        self.max_dictionary_edit_distance = distance;
        self
    }
    pub fn with_prefix_length(mut self, length: usize) -> Self {
        self.prefix_length = length;
        self
    }
    pub fn with_count_threshold(mut self, threshold: u64) -> Self {
        self.count_threshold = threshold;
        self
    }
    pub fn with_distance_algorithm(mut self, algorithm: DistanceAlgorithm) -> Self {
        self.distance_algorithm = algorithm;
        self
    }
    pub fn with_smoothing_base(mut self, base: f64) -> Self {
        self.smoothing_base = base;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.prefix_length < 1 {
            return Err(Error::InvalidArgument(
                "prefix_length must be at least 1".into(),
            ));
        }
        if self.prefix_length < self.max_dictionary_edit_distance {
            return Err(Error::InvalidArgument(format!(
                "prefix_length ({}) must not be smaller than max_dictionary_edit_distance ({})",
                self.prefix_length, self.max_dictionary_edit_distance
            )));
        }
        if !(self.smoothing_base > 1.0) {
            return Err(Error::InvalidArgument(
                "smoothing_base must be greater than 1".into(),
            ));
        }
        Ok(())
    }
}

///Options for a single-term lookup
#[derive(Debug, Clone, Default)]
pub struct LookupParams {
    pub verbosity: Verbosity,

    ///Maximum edit distance for this query; None means the engine's
    ///max_dictionary_edit_distance. Must not exceed it.
    pub max_edit_distance: Option<usize>,

    ///Return the input itself (at distance max+1, count 0) when nothing matches
    pub include_unknown: bool,

    ///Copy the input's casing pattern onto every suggestion
    pub transfer_casing: bool,

    ///Inputs fully matched by this pattern pass through uncorrected
    pub ignore_pattern: Option<Regex>,
}

impl LookupParams {
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.max_edit_distance = Some(distance);
        self
    }
    pub fn with_include_unknown(mut self) -> Self {
        self.include_unknown = true;
        self
    }
    pub fn with_transfer_casing(mut self) -> Self {
        self.transfer_casing = true;
        self
    }
    pub fn with_ignore_pattern(mut self, pattern: Regex) -> Self {
        self.ignore_pattern = Some(pattern);
        self
    }
}

///Options for compound correction of a whole phrase
#[derive(Debug, Clone, Default)]
pub struct CompoundParams {
    ///Maximum edit distance per token; None means the engine's maximum
    pub max_edit_distance: Option<usize>,

    ///Pass numbers and acronyms through uncorrected
    pub ignore_non_words: bool,

    ///Copy the phrase's casing pattern onto the corrected output
    pub transfer_casing: bool,

    ///Split on whitespace only instead of the word pattern
    pub split_by_space: bool,
}

impl CompoundParams {
    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.max_edit_distance = Some(distance);
        self
    }
    pub fn with_ignore_non_words(mut self) -> Self {
        self.ignore_non_words = true;
        self
    }
    pub fn with_transfer_casing(mut self) -> Self {
        self.transfer_casing = true;
        self
    }
    pub fn with_split_by_space(mut self) -> Self {
        self.split_by_space = true;
        self
    }
}

///Options for word segmentation
#[derive(Debug, Clone, Default)]
pub struct SegmentParams {
    ///Maximum edit distance per candidate part; None means 0 (exact parts only)
    pub max_edit_distance: Option<usize>,

    ///Longest part considered; None means the engine's prefix_length
    pub max_segmentation_word_length: Option<usize>,

    ///Parts fully matched by this pattern pass through uncorrected
    pub ignore_pattern: Option<Regex>,
}

impl SegmentParams {
    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.max_edit_distance = Some(distance);
        self
    }
    pub fn with_max_segmentation_word_length(mut self, length: usize) -> Self {
        self.max_segmentation_word_length = Some(length);
        self
    }
    pub fn with_ignore_pattern(mut self, pattern: Regex) -> Self {
        self.ignore_pattern = Some(pattern);
        self
    }
}

///Errors surfaced to callers. Per-line parse and encoding problems in the
///loaders are recovered (skipped, counted, logged) and never appear here.
#[derive(Debug)]
pub enum Error {
    ///A query or configuration parameter is out of range
    InvalidArgument(String),
    ///File or stream failure at a loader or persistence boundary
    Io(std::io::Error),
    ///Persisted state could not be decoded
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Io(err) => write!(f, "i/o error: {}", err),
            Error::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
