use std::collections::HashMap;

///Each term gets assigned an ID integer, carries no further meaning
pub type VocabId = u64;

///Frequency count of a term or bigram
pub type Count = u64;

///An interned dictionary entry. The surface string is stored exactly once;
///delete-index buckets refer to it by [VocabId].
#[derive(Debug, Clone)]
pub struct VocabValue {
    pub text: String,

    /// The absolute frequency count
    pub count: Count,
}

///Map integers (indices correspond to VocabId) to terms and their counts.
///Slots of removed terms are retired in place, ids are never reused.
pub type VocabDecoder = Vec<VocabValue>;

///Maps terms to integers
pub type VocabEncoder = HashMap<String, VocabId>;
