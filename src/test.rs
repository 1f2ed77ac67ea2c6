use crate::types::Config;
use crate::SpellModel;

///Shared fixture lexicon: a handful of common English words with corpus-scale
///counts, plus the words the segmentation tests spell out
pub const TEST_LEXICON: &[(&str, u64)] = &[
    ("the", 23135851162),
    ("of", 13151942776),
    ("and", 12997637966),
    ("to", 12136980858),
    ("in", 8469404971),
    ("for", 5933321709),
    ("is", 4705743816),
    ("on", 3750423199),
    ("that", 3400031103),
    ("quick", 41441278),
    ("brown", 124286481),
    ("fox", 23529394),
    ("jumps", 6439327),
    ("over", 1164919562),
    ("lazy", 14871045),
    ("dog", 109402205),
    ("cat", 92173442),
    ("members", 226656153),
    ("hello", 63238797),
    ("world", 360468339),
    ("park", 102565391),
];

pub fn get_test_model() -> SpellModel {
    get_test_model_with(Config::default())
}

pub fn get_test_model_with(config: Config) -> SpellModel {
    let mut model = SpellModel::new(config).expect("valid test configuration");
    for (term, count) in TEST_LEXICON {
        model.add_entry(term, *count);
    }
    model
}
