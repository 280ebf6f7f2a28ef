//! Closed stopword set used by the tokenizer.

/// Words excluded from keyword extraction, compared case-insensitively.
pub(crate) const STOP_WORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Pronouns
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves",
    "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "this", "that", "these", "those",
    // Prepositions
    "at", "by", "for", "from", "in", "of", "on", "to", "with",
    "about", "against", "between", "into", "through", "during",
    "before", "after", "above", "below", "up", "down", "out", "off",
    "over", "under", "again", "further", "then", "once",
    // Conjunctions
    "and", "but", "or", "nor", "so", "yet", "both", "either", "neither",
    // Auxiliary verbs
    "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing",
    "will", "would", "shall", "should", "may", "might", "must",
    "can", "could", "ought",
    // Common verbs
    "get", "got", "gets", "getting", "make", "made", "making",
    "go", "goes", "went", "going", "take", "takes", "took", "taking",
    "come", "comes", "came", "coming", "want", "wants", "wanted",
    "use", "uses", "used", "using", "find", "finds", "found",
    "give", "gives", "gave", "giving", "tell", "tells", "told",
    "work", "works", "worked", "working", "call", "calls", "called",
    "try", "tries", "tried", "trying", "need", "needs", "needed",
    "feel", "feels", "felt", "feeling", "become", "becomes", "became",
    "leave", "leaves", "left", "leaving", "put", "puts", "putting",
    "mean", "means", "meant", "meaning", "keep", "keeps", "kept",
    "let", "lets", "letting", "begin", "begins", "began", "beginning",
    "seem", "seems", "seemed", "seeming", "help", "helps", "helped",
    "show", "shows", "showed", "showing", "hear", "hears", "heard",
    "play", "plays", "played", "playing", "run", "runs", "ran",
    "move", "moves", "moved", "moving", "live", "lives", "lived",
    "believe", "believes", "believed", "believing",
    // Other common words
    "here", "there", "when", "where", "why", "how", "all", "many",
    "some", "few", "more", "most", "other", "such", "no", "not",
    "only", "own", "same", "than", "too", "very", "just", "now",
    "also", "well", "even", "back", "still", "way", "because",
    "however", "around", "since", "while", "whether",
];

/// Words too common to count as project identifiers.
pub(crate) const COMMON_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "what",
    "when", "where", "which", "while", "about", "after", "before",
    "between", "during", "under", "over", "through", "into",
];
