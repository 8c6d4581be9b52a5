//! Analysis constants and runtime configuration defaults

// Tokenizer syntax
/// Symbols split out as standalone tokens by default
pub const DEFAULT_SYMBOLS: [&str; 5] = [".", ",", "?", "!", "\\"];
/// Separator between independently weighted sentences
pub const SENTENCE_SEPARATOR: char = ';';
/// Separator between a sentence and its base weight suffix
pub const WEIGHT_SEPARATOR: char = ':';
/// Base weight of a sentence without a weight suffix
pub const DEFAULT_BASE_WEIGHT: f64 = 1.0;
/// Weight multiplier per `(` … `)` nesting level
pub const EMPHASIS_UP_FACTOR: f64 = 1.1;
/// Weight multiplier per `[` … `]` nesting level
pub const EMPHASIS_DOWN_FACTOR: f64 = 0.9;

// Commas are too frequent to carry positional meaning
/// Token text that is never classified as moved
pub const UNMOVABLE_TOKEN: &str = ",";

/// Label given to every word node on creation
pub const DEFAULT_WORD_LABEL: &str = "[F]";

/// Ward linkage cut height used when none is given
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 1.0;

/// Maximum number of diff words for two prompts to be compared in the change graph
pub const DEFAULT_MAX_PAIR_DISTANCE: usize = 5;

// Edges whose weights agree to this many decimals are merged
/// Decimal places used when grouping edges by weight
pub const EDGE_WEIGHT_DECIMALS: i32 = 3;

/// Words too common to be meaningful graph edges
pub const DEFAULT_IGNORED_EDGE_WORDS: [&str; 11] = [
    ",", ".", "?", "by", "in", "the", "a", "he", "is", "and", "of",
];

// Output settings
/// Suffix added to analysis output filenames
pub const OUTPUT_SUFFIX: &str = "_analysis";
/// Extension of session input and analysis output files
pub const SESSION_EXTENSION: &str = "json";
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
