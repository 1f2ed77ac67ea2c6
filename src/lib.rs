use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

pub mod casing;
pub mod distance;
pub mod index;
pub mod persist;
pub mod test;
pub mod tokenize;
pub mod types;
pub mod vocab;

pub use crate::casing::*;
pub use crate::distance::*;
pub use crate::index::*;
pub use crate::persist::*;
pub use crate::tokenize::*;
pub use crate::types::*;
pub use crate::vocab::*;

///The correction engine: a frequency dictionary, a bigram dictionary and the
///precomputed delete index over term prefixes. All state lives on the
///instance; mutation is single-threaded, read-only lookups may run
///concurrently under external synchronization.
pub struct SpellModel {
    ///Interned dictionary entries, indexed by [VocabId]
    pub decoder: VocabDecoder,
    ///Maps each present term to its [VocabId]
    pub encoder: VocabEncoder,

    ///Counts still accumulating toward the count threshold
    pub below_threshold: HashMap<String, Count>,

    ///Bigram frequencies, keyed as "w1 w2"
    pub bigrams: HashMap<String, Count>,
    bigram_count_min: Count,

    ///The main index, mapping prefix-delete variants to term ids
    pub index: DeleteIndex,

    ///Character length of the longest term ever made present (an upper bound,
    ///removals leave it stale)
    max_length: usize,

    config: Config,
    comparer: Box<dyn StringDistance + Send + Sync>,
    word_pattern: Regex,
    corpus_pattern: Regex,

    ///Lines skipped by the loaders since construction
    pub entries_rejected: usize,
}

impl SpellModel {
    pub fn new(config: Config) -> Result<SpellModel, Error> {
        config.validate()?;
        let comparer = config.distance_algorithm.comparer();
        Ok(SpellModel {
            decoder: Vec::new(),
            encoder: HashMap::new(),
            below_threshold: HashMap::new(),
            bigrams: HashMap::new(),
            bigram_count_min: Count::MAX,
            index: DeleteIndex::new(),
            max_length: 0,
            config,
            comparer,
            word_pattern: Regex::new(WORD_PATTERN).expect("word pattern is valid"),
            corpus_pattern: Regex::new(CORPUS_TOKEN_PATTERN).expect("corpus pattern is valid"),
            entries_rejected: 0,
        })
    }

    ///Replace the distance metric with a user-provided implementation
    pub fn set_distance_metric(&mut self, comparer: Box<dyn StringDistance + Send + Sync>) {
        self.comparer = comparer;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    ///Number of present terms
    pub fn word_count(&self) -> usize {
        self.encoder.len()
    }

    ///Number of bigram entries
    pub fn bigram_count(&self) -> usize {
        self.bigrams.len()
    }

    ///Character length of the longest term ever made present
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    ///Smoothing floor for unseen bigrams: the smallest count seen so far, or
    ///1 while the bigram dictionary is empty
    pub fn bigram_count_min(&self) -> Count {
        if self.bigrams.is_empty() {
            1
        } else {
            self.bigram_count_min
        }
    }

    ///Tests if the dictionary has a specific term
    pub fn contains(&self, term: &str) -> bool {
        self.encoder.contains_key(term)
    }

    ///Frequency count of a present term
    pub fn count(&self, term: &str) -> Option<Count> {
        self.encoder
            .get(term)
            .map(|id| self.decoder[*id as usize].count)
    }

    ///Add a term with a frequency count. Counts accumulate: adding an already
    ///present term raises its count (saturating) without touching the delete
    ///index; counts below the threshold collect in a shadow map until the sum
    ///crosses over. Returns true iff the term became newly present and its
    ///delete variants were indexed.
    pub fn add_entry(&mut self, term: &str, count: Count) -> bool {
        if term.is_empty() || count == 0 {
            return false;
        }
        let mut count = count;
        if let Some(&id) = self.encoder.get(term) {
            let entry = &mut self.decoder[id as usize];
            entry.count = entry.count.saturating_add(count);
            return false;
        }
        if let Some(previous) = self.below_threshold.remove(term) {
            count = previous.saturating_add(count);
        }
        if count < self.config.count_threshold {
            self.below_threshold.insert(term.to_string(), count);
            return false;
        }
        self.insert_present(term, count);
        true
    }

    ///Intern a term as present and index all its prefix-delete variants
    fn insert_present(&mut self, term: &str, count: Count) {
        let id = self.decoder.len() as VocabId;
        self.encoder.insert(term.to_string(), id);
        self.decoder.push(VocabValue {
            text: term.to_string(),
            count,
        });
        let term_length = term.chars().count();
        if term_length > self.max_length {
            self.max_length = term_length;
        }
        for variant in edits_prefix(
            term,
            self.config.max_dictionary_edit_distance,
            self.config.prefix_length,
        ) {
            self.index.insert(variant_hash(&variant), id);
        }
    }

    ///Remove a term from the dictionary and the delete index. Returns false
    ///when the term is not present. `max_length` is not recomputed: it stays
    ///a valid upper bound and lookups use it only as a cap.
    pub fn remove_entry(&mut self, term: &str) -> bool {
        let id = match self.encoder.remove(term) {
            Some(id) => id,
            None => return false,
        };
        for variant in edits_prefix(
            term,
            self.config.max_dictionary_edit_distance,
            self.config.prefix_length,
        ) {
            self.index.remove(variant_hash(&variant), id);
        }
        //retire the slot; ids are never reused
        let entry = &mut self.decoder[id as usize];
        entry.text.clear();
        entry.count = 0;
        true
    }

    ///Insert a bigram. The key must consist of exactly two whitespace
    ///separated tokens; the count replaces any previous one, mirroring the
    ///bigram loader. Returns false for malformed keys or a zero count.
    pub fn add_bigram_entry(&mut self, key: &str, count: Count) -> bool {
        if count == 0 {
            return false;
        }
        let mut tokens = key.split_whitespace();
        let (first, second) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(first), Some(second), None) => (first, second),
            _ => return false,
        };
        self.bigrams.insert(format!("{} {}", first, second), count);
        if count < self.bigram_count_min {
            self.bigram_count_min = count;
        }
        true
    }

    ///Read a frequency dictionary from a file. See
    ///[load_dictionary_stream](Self::load_dictionary_stream).
    pub fn load_dictionary(
        &mut self,
        path: &str,
        term_index: usize,
        count_index: usize,
        separator: Option<&str>,
    ) -> Result<bool, Error> {
        let file = File::open(path)?;
        self.load_dictionary_stream(file, term_index, count_index, separator)
    }

    ///Read a frequency dictionary from a stream: one term and count per line,
    ///columns split by `separator` (None: any whitespace run) and addressed by
    ///the two zero-based indices; other columns are ignored. Lines that do
    ///not parse are skipped, counted in `entries_rejected` and logged.
    ///Returns whether any entry was accepted.
    pub fn load_dictionary_stream<R: Read>(
        &mut self,
        reader: R,
        term_index: usize,
        count_index: usize,
        separator: Option<&str>,
    ) -> Result<bool, Error> {
        if term_index == count_index {
            return Err(Error::InvalidArgument(
                "term_index and count_index must differ".into(),
            ));
        }
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        let mut line_number = 0usize;
        let mut any_accepted = false;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = decode_line(&buffer, line_number);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_columns(line, term_index, count_index, separator) {
                Some((term, count)) => {
                    self.add_entry(term, count);
                    any_accepted = true;
                }
                None => {
                    self.entries_rejected += 1;
                    warn!(line = line_number, "rejected dictionary line");
                }
            }
        }
        debug!(
            lines = line_number,
            words = self.word_count(),
            "dictionary loaded"
        );
        Ok(any_accepted)
    }

    ///Read a bigram dictionary from a file. See
    ///[load_bigram_dictionary_stream](Self::load_bigram_dictionary_stream).
    pub fn load_bigram_dictionary(
        &mut self,
        path: &str,
        term_index: usize,
        count_index: usize,
        separator: Option<&str>,
    ) -> Result<bool, Error> {
        let file = File::open(path)?;
        self.load_bigram_dictionary_stream(file, term_index, count_index, separator)
    }

    ///Read a bigram dictionary from a stream. With the default whitespace
    ///separator the key is the two adjacent tokens starting at `term_index`;
    ///with a custom separator the single `term_index`-th field holds the
    ///whole "w1 w2" key. Returns whether any entry was accepted.
    pub fn load_bigram_dictionary_stream<R: Read>(
        &mut self,
        reader: R,
        term_index: usize,
        count_index: usize,
        separator: Option<&str>,
    ) -> Result<bool, Error> {
        if term_index == count_index {
            return Err(Error::InvalidArgument(
                "term_index and count_index must differ".into(),
            ));
        }
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        let mut line_number = 0usize;
        let mut any_accepted = false;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = decode_line(&buffer, line_number);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = match separator {
                Some(separator) => line.split(separator).collect(),
                None => line.split_whitespace().collect(),
            };
            let key = match separator {
                Some(_) => fields.get(term_index).map(|field| field.to_string()),
                None => match (fields.get(term_index), fields.get(term_index + 1)) {
                    (Some(first), Some(second)) => Some(format!("{} {}", first, second)),
                    _ => None,
                },
            };
            let count = fields
                .get(count_index)
                .and_then(|field| field.trim().parse::<Count>().ok());
            let accepted = match (key, count) {
                (Some(key), Some(count)) => self.add_bigram_entry(&key, count),
                _ => false,
            };
            if accepted {
                any_accepted = true;
            } else {
                self.entries_rejected += 1;
                warn!(line = line_number, "rejected bigram line");
            }
        }
        debug!(
            lines = line_number,
            bigrams = self.bigram_count(),
            "bigram dictionary loaded"
        );
        Ok(any_accepted)
    }

    ///Build a dictionary from a plain-text corpus file. See
    ///[create_dictionary_stream](Self::create_dictionary_stream).
    pub fn create_dictionary(&mut self, path: &str) -> Result<bool, Error> {
        let file = File::open(path)?;
        self.create_dictionary_stream(file)
    }

    ///Build a dictionary from running text: every token (runs of Unicode
    ///letters; digits and punctuation never form tokens) is lowercased and
    ///counted once per occurrence. Returns whether any token was ingested.
    pub fn create_dictionary_stream<R: Read>(&mut self, reader: R) -> Result<bool, Error> {
        let pattern = self.corpus_pattern.clone();
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        let mut line_number = 0usize;
        let mut any_accepted = false;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = decode_line(&buffer, line_number);
            let line = line.to_lowercase();
            for token in pattern.find_iter(&line) {
                self.add_entry(token.as_str(), 1);
                any_accepted = true;
            }
        }
        debug!(
            lines = line_number,
            words = self.word_count(),
            "corpus ingested"
        );
        Ok(any_accepted)
    }

    ///Find dictionary terms within `max_edit_distance` of the input. How many
    ///are returned is governed by the verbosity; ordering is ascending
    ///distance, then descending count, then the term itself.
    pub fn lookup(&self, input: &str, params: &LookupParams) -> Result<Vec<Suggestion>, Error> {
        let max_edit_distance = params
            .max_edit_distance
            .unwrap_or(self.config.max_dictionary_edit_distance);
        if max_edit_distance > self.config.max_dictionary_edit_distance {
            return Err(Error::InvalidArgument(format!(
                "max_edit_distance ({}) exceeds max_dictionary_edit_distance ({})",
                max_edit_distance, self.config.max_dictionary_edit_distance
            )));
        }

        //inputs the ignore pattern matches in full pass through uncorrected
        if let Some(pattern) = &params.ignore_pattern {
            if matches_fully(pattern, input) {
                return Ok(vec![Suggestion::new(input, 0, 1)]);
            }
        }

        let lowered;
        let search_term = if params.transfer_casing {
            lowered = input.to_lowercase();
            lowered.as_str()
        } else {
            input
        };

        let mut suggestions = self.search(search_term, params.verbosity, max_edit_distance);

        if params.transfer_casing {
            let input_length = input.chars().count();
            for suggestion in suggestions.iter_mut() {
                suggestion.term = if suggestion.term.chars().count() == input_length {
                    transfer_casing_matching(input, &suggestion.term)
                } else {
                    transfer_casing_similar(input, &suggestion.term)
                };
            }
        }

        if suggestions.is_empty() && params.include_unknown {
            suggestions.push(Suggestion::new(input, max_edit_distance + 1, 0));
        }
        Ok(suggestions)
    }

    ///The candidate search behind [lookup](Self::lookup): a breadth-first
    ///queue of prefix deletes of the input, each probed against the delete
    ///index, each bucket member re-verified by exact distance. The current
    ///best distance tightens the queue pruning under Top and Closest.
    fn search(&self, input: &str, verbosity: Verbosity, max_edit_distance: usize) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = Vec::new();
        let input_chars: Vec<char> = input.chars().collect();
        let input_len = input_chars.len();

        //no dictionary term can be close enough to an input this long
        if input_len.saturating_sub(self.max_length) > max_edit_distance {
            return suggestions;
        }

        let mut considered_suggestions: HashSet<VocabId> = HashSet::new();

        if let Some(&exact_id) = self.encoder.get(input) {
            suggestions.push(Suggestion::new(
                input,
                0,
                self.decoder[exact_id as usize].count,
            ));
            if verbosity != Verbosity::All {
                //nothing can beat distance 0 under Top or Closest
                return suggestions;
            }
            considered_suggestions.insert(exact_id);
        }
        if max_edit_distance == 0 {
            return suggestions;
        }

        let prefix_length = self.config.prefix_length;
        let input_prefix_len = input_len.min(prefix_length);
        let mut candidates: Vec<String> = vec![input_chars[..input_prefix_len].iter().collect()];
        let mut considered_deletes: HashSet<String> = HashSet::new();
        let mut max_edit_distance_best = max_edit_distance;
        let mut pointer = 0;

        while pointer < candidates.len() {
            let candidate = std::mem::take(&mut candidates[pointer]);
            pointer += 1;
            let candidate_chars: Vec<char> = candidate.chars().collect();
            let candidate_len = candidate_chars.len();
            let len_diff = input_prefix_len - candidate_len;

            //candidates are ordered by delete depth: once the depth alone
            //exceeds the best distance, deeper ones cannot improve
            if len_diff > max_edit_distance_best {
                if verbosity == Verbosity::All {
                    continue;
                }
                break;
            }

            if let Some(bucket) = self.index.get(variant_hash(&candidate)) {
                for &suggestion_id in bucket {
                    let entry = &self.decoder[suggestion_id as usize];
                    let suggestion_chars: Vec<char> = entry.text.chars().collect();
                    let suggestion_len = suggestion_chars.len();
                    //length gates; equal lengths must be the candidate itself,
                    //anything else in the bucket is a hash collision
                    if suggestion_len.abs_diff(input_len) > max_edit_distance_best
                        || suggestion_len < candidate_len
                        || (suggestion_len == candidate_len && entry.text != candidate)
                    {
                        continue;
                    }
                    let suggestion_prefix_len = suggestion_len.min(prefix_length);
                    if suggestion_prefix_len > input_prefix_len
                        && suggestion_prefix_len - candidate_len > max_edit_distance_best
                    {
                        continue;
                    }

                    let distance;
                    if candidate_len == 0 {
                        //no characters in common: the distance is the longer length
                        distance = input_len.max(suggestion_len);
                        if distance > max_edit_distance_best
                            || !considered_suggestions.insert(suggestion_id)
                        {
                            continue;
                        }
                    } else if suggestion_len == 1 {
                        distance = if input_chars.contains(&suggestion_chars[0]) {
                            input_len - 1
                        } else {
                            input_len
                        };
                        if distance > max_edit_distance_best
                            || !considered_suggestions.insert(suggestion_id)
                        {
                            continue;
                        }
                    } else {
                        //prefix-suffix pruning before paying for the exact distance
                        let min_distance =
                            if prefix_length.saturating_sub(max_edit_distance) == candidate_len {
                                input_len.min(suggestion_len).saturating_sub(prefix_length)
                            } else {
                                0
                            };
                        if min_distance > 1
                            && input_chars[input_len + 1 - min_distance..]
                                != suggestion_chars[suggestion_len + 1 - min_distance..]
                        {
                            continue;
                        }
                        if min_distance > 0
                            && input_chars[input_len - min_distance]
                                != suggestion_chars[suggestion_len - min_distance]
                            && (input_chars[input_len - min_distance - 1]
                                != suggestion_chars[suggestion_len - min_distance]
                                || input_chars[input_len - min_distance]
                                    != suggestion_chars[suggestion_len - min_distance - 1])
                        {
                            continue;
                        }
                        if !considered_suggestions.insert(suggestion_id) {
                            continue;
                        }
                        distance = match self.comparer.distance(
                            input,
                            &entry.text,
                            max_edit_distance_best,
                        ) {
                            Some(distance) => distance,
                            None => continue,
                        };
                    }

                    if distance <= max_edit_distance_best {
                        let item = Suggestion::new(entry.text.clone(), distance, entry.count);
                        if !suggestions.is_empty() {
                            match verbosity {
                                Verbosity::Closest => {
                                    //a closer hit invalidates everything gathered so far
                                    if distance < max_edit_distance_best {
                                        suggestions.clear();
                                    }
                                }
                                Verbosity::Top => {
                                    if distance < max_edit_distance_best
                                        || item.count > suggestions[0].count
                                    {
                                        max_edit_distance_best = distance;
                                        suggestions[0] = item;
                                    }
                                    continue;
                                }
                                Verbosity::All => {}
                            }
                        }
                        if verbosity != Verbosity::All {
                            max_edit_distance_best = distance;
                        }
                        suggestions.push(item);
                    }
                }
            }

            //peel further deletes off this candidate
            if len_diff < max_edit_distance && candidate_len <= prefix_length {
                if verbosity != Verbosity::All && len_diff >= max_edit_distance_best {
                    continue;
                }
                for skip in 0..candidate_len {
                    let delete: String = candidate_chars
                        .iter()
                        .enumerate()
                        .filter(|(position, _)| *position != skip)
                        .map(|(_, c)| *c)
                        .collect();
                    if considered_deletes.insert(delete.clone()) {
                        candidates.push(delete);
                    }
                }
            }
        }

        if suggestions.len() > 1 {
            suggestions.sort();
        }
        suggestions
    }

    ///Correct a whole phrase: each token is corrected on its own, adjacent
    ///tokens may be merged when the glued form matches better, and tokens
    ///without a good correction are tried at every split point. Returns a
    ///single suggestion whose distance is the summed per-token distance and
    ///whose count is the weakest surviving frequency.
    pub fn lookup_compound(
        &self,
        phrase: &str,
        params: &CompoundParams,
    ) -> Result<Vec<Suggestion>, Error> {
        let max_edit_distance = params
            .max_edit_distance
            .unwrap_or(self.config.max_dictionary_edit_distance);
        if max_edit_distance > self.config.max_dictionary_edit_distance {
            return Err(Error::InvalidArgument(format!(
                "max_edit_distance ({}) exceeds max_dictionary_edit_distance ({})",
                max_edit_distance, self.config.max_dictionary_edit_distance
            )));
        }

        let terms = parse_words(&self.word_pattern, phrase, false, params.split_by_space);
        let terms_cased = if params.ignore_non_words {
            parse_words(&self.word_pattern, phrase, true, params.split_by_space)
        } else {
            Vec::new()
        };

        let token_params = LookupParams::default()
            .with_verbosity(Verbosity::Top)
            .with_max_edit_distance(max_edit_distance);

        let mut parts: Vec<Suggestion> = Vec::new();
        let mut last_was_merge = false;

        for (position, term) in terms.iter().enumerate() {
            if params.ignore_non_words {
                if parse_integer(term).is_some() {
                    parts.push(Suggestion::new(term.as_str(), 0, 0));
                    continue;
                }
                if let Some(cased) = terms_cased.get(position) {
                    if is_acronym(cased) {
                        parts.push(Suggestion::new(cased.as_str(), 0, 0));
                        continue;
                    }
                }
            }

            let suggestions = self.lookup(term, &token_params)?;
            let term_len = term.chars().count();

            //try gluing this token onto the previous one, but only when the
            //previous correction is imperfect and never twice in a row
            if position > 0 && !last_was_merge && term_len > 1 {
                let previous_best = parts.last().filter(|part| part.distance > 0).cloned();
                if let Some(previous_best) = previous_best {
                    let current_best = suggestions.first().cloned().unwrap_or_else(|| {
                        Suggestion::new(term.as_str(), max_edit_distance + 1, 0)
                    });
                    let pair_distance = previous_best.distance + current_best.distance;
                    let glued = format!("{}{}", terms[position - 1], term);
                    let combined = self.lookup(&glued, &token_params)?;
                    if let Some(combined_best) = combined.first() {
                        //the +1 pays for the boundary the merge removes
                        let merge_wins = combined_best.distance + 1 < pair_distance
                            || (combined_best.distance + 1 == pair_distance
                                && self.unigram_score(combined_best.count)
                                    > self.pair_score(
                                        &previous_best.term,
                                        &current_best.term,
                                        term_len,
                                    ));
                        if merge_wins {
                            let slot = parts.len() - 1;
                            parts[slot] = Suggestion::new(
                                combined_best.term.clone(),
                                combined_best.distance + 1,
                                combined_best.count,
                            );
                            last_was_merge = true;
                            continue;
                        }
                    }
                }
            }
            last_was_merge = false;

            //a perfect correction (or a single character) is taken as-is
            if suggestions.first().map_or(false, |s| s.distance == 0) || term_len == 1 {
                match suggestions.into_iter().next() {
                    Some(best) => parts.push(best),
                    None => parts.push(Suggestion::new(term.as_str(), max_edit_distance + 1, 0)),
                }
                continue;
            }

            //otherwise try every split point and keep the best-counted pair
            let mut best_split: Option<Suggestion> = suggestions.first().cloned();
            if term_len > 1 {
                let term_chars: Vec<char> = term.chars().collect();
                for cut in 1..term_len {
                    let head: String = term_chars[..cut].iter().collect();
                    let tail: String = term_chars[cut..].iter().collect();
                    let head_best = match self.lookup(&head, &token_params)?.into_iter().next() {
                        Some(best) => best,
                        None => continue,
                    };
                    let tail_best = match self.lookup(&tail, &token_params)?.into_iter().next() {
                        Some(best) => best,
                        None => continue,
                    };
                    let split_term = format!("{} {}", head_best.term, tail_best.term);
                    let split_distance = self
                        .comparer
                        .distance(term, &split_term, max_edit_distance)
                        .unwrap_or(max_edit_distance + 1);
                    if let Some(ref best) = best_split {
                        if split_distance > best.distance {
                            continue;
                        }
                        if split_distance < best.distance {
                            best_split = None;
                        }
                    }
                    let split_count = match self.bigrams.get(&split_term) {
                        Some(&bigram_count) => {
                            let mut boosted = bigram_count;
                            let rejoined = format!("{}{}", head_best.term, tail_best.term);
                            //splits that reproduce the input, or echo the
                            //single-term correction, outrank that correction
                            if let Some(single_best) = suggestions.first() {
                                if rejoined == *term {
                                    boosted = boosted.max(single_best.count.saturating_add(2));
                                } else if head_best.term == single_best.term
                                    || tail_best.term == single_best.term
                                {
                                    boosted = boosted.max(single_best.count.saturating_add(1));
                                }
                            } else if rejoined == *term {
                                boosted = boosted
                                    .max(head_best.count.max(tail_best.count).saturating_add(2));
                            }
                            boosted
                        }
                        None => {
                            //estimate the pair count from the independent word
                            //probabilities, capped by the smoothing floor
                            self.bigram_count_min().min(
                                (head_best.count as f64 / CORPUS_SIZE * tail_best.count as f64)
                                    as Count,
                            )
                        }
                    };
                    let split = Suggestion::new(split_term, split_distance, split_count);
                    if best_split
                        .as_ref()
                        .map_or(true, |best| split.count > best.count)
                    {
                        best_split = Some(split);
                    }
                }
            }
            match best_split {
                Some(best) => parts.push(best),
                None => parts.push(Suggestion::new(term.as_str(), max_edit_distance + 1, 0)),
            }
        }

        let mut joined = String::new();
        let mut distance_sum = 0;
        let mut minimum_count = Count::MAX;
        for part in &parts {
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(&part.term);
            distance_sum += part.distance;
            minimum_count = minimum_count.min(part.count);
        }
        if parts.is_empty() {
            minimum_count = 0;
        }
        if params.transfer_casing {
            joined = transfer_casing_similar(phrase, &joined);
        }
        Ok(vec![Suggestion::new(joined, distance_sum, minimum_count)])
    }

    ///log10 probability of a single term under the corpus model
    fn unigram_score(&self, count: Count) -> f64 {
        (count as f64 / CORPUS_SIZE).log10()
    }

    ///log10 probability of a token pair: its bigram frequency when known,
    ///otherwise the smoothing floor decayed by the current token's length
    fn pair_score(&self, previous: &str, current: &str, current_len: usize) -> f64 {
        let key = format!("{} {}", previous, current);
        match self.bigrams.get(&key) {
            Some(&count) => (count as f64 / CORPUS_SIZE).log10(),
            None => (self.bigram_count_min() as f64
                / (CORPUS_SIZE * self.config.smoothing_base.powi(current_len as i32)))
            .log10(),
        }
    }

    ///Smoothing floor for a part no unigram count vouches for
    fn unseen_score(&self, length: usize) -> f64 {
        (1.0 / (CORPUS_SIZE * self.config.smoothing_base.powi(length as i32))).log10()
    }

    ///Segment a character run (spaces optional) into the most probable word
    ///sequence, correcting each part within `max_edit_distance`. Dynamic
    ///program over a ring of Compositions: lower summed edit cost wins, ties
    ///go to the higher summed log probability.
    pub fn word_segmentation(
        &self,
        phrase: &str,
        params: &SegmentParams,
    ) -> Result<Composition, Error> {
        let max_edit_distance = params.max_edit_distance.unwrap_or(0);
        if max_edit_distance > self.config.max_dictionary_edit_distance {
            return Err(Error::InvalidArgument(format!(
                "max_edit_distance ({}) exceeds max_dictionary_edit_distance ({})",
                max_edit_distance, self.config.max_dictionary_edit_distance
            )));
        }
        let max_word_length = params
            .max_segmentation_word_length
            .unwrap_or(self.config.prefix_length);
        if max_word_length == 0 {
            return Err(Error::InvalidArgument(
                "max_segmentation_word_length must be at least 1".into(),
            ));
        }

        let chars: Vec<char> = phrase.chars().collect();
        if chars.is_empty() {
            return Ok(Composition::default());
        }

        let token_params = LookupParams {
            verbosity: Verbosity::Top,
            max_edit_distance: Some(max_edit_distance),
            include_unknown: false,
            transfer_casing: false,
            ignore_pattern: params.ignore_pattern.clone(),
        };

        let array_size = max_word_length.min(chars.len());
        let mut compositions: Vec<Composition> = vec![Composition::default(); array_size];

        for start in 0..chars.len() {
            let part_max = (chars.len() - start).min(max_word_length);
            for length in 1..=part_max {
                let raw_part: String = chars[start..start + length].iter().collect();

                let mut separator_length = 0;
                let mut part_ed = 0;
                let mut part = raw_part;
                if part.chars().next().map_or(false, |c| c.is_whitespace()) {
                    //the boundary already exists in the input
                    part = part.chars().skip(1).collect();
                } else {
                    //a space has to be inserted here
                    separator_length = 1;
                }
                //remaining internal spaces are stripped, each costing an edit
                part_ed += part.chars().count();
                part = part.chars().filter(|c| !c.is_whitespace()).collect();
                part_ed -= part.chars().count();

                let part = normalize_ligatures(&part);
                let part_len = part.chars().count();

                let results = self.lookup(&part, &token_params)?;
                let corrected;
                let part_log_prob;
                match results.first() {
                    Some(top) if top.distance == 0 => {
                        corrected = top.term.clone();
                        part_log_prob = self.unigram_score(top.count);
                    }
                    Some(top) if part_len == 1 || part_len == top.distance + 1 => {
                        //a correction rewriting nearly every character is no
                        //better evidence than an unknown word
                        corrected = top.term.clone();
                        part_ed += top.distance;
                        part_log_prob = self.unseen_score(part_len);
                    }
                    _ => {
                        corrected = part.clone();
                        part_ed += part_len;
                        part_log_prob = self.unseen_score(part_len);
                    }
                }

                let destination = (start + length - 1) % array_size;
                if start == 0 {
                    compositions[destination] = Composition {
                        segmented_string: part.clone(),
                        corrected_string: corrected,
                        distance_sum: part_ed,
                        log_prob_sum: part_log_prob,
                    };
                    continue;
                }

                let previous = compositions[(start - 1) % array_size].clone();
                let current = &compositions[destination];
                //a slot still holding a composition from the previous window
                //is overwritten unconditionally
                let replace = length == max_word_length
                    || ((previous.distance_sum + part_ed == current.distance_sum
                        || previous.distance_sum + separator_length + part_ed
                            == current.distance_sum)
                        && current.log_prob_sum < previous.log_prob_sum + part_log_prob)
                    || previous.distance_sum + separator_length + part_ed < current.distance_sum;
                if !replace {
                    continue;
                }
                let is_punctuation =
                    part_len == 1 && part.chars().next().map_or(false, |c| c.is_ascii_punctuation());
                compositions[destination] = if is_punctuation {
                    //punctuation carries no probability mass
                    Composition {
                        segmented_string: format!("{} {}", previous.segmented_string, part),
                        corrected_string: format!("{} {}", previous.corrected_string, part),
                        distance_sum: previous.distance_sum + part_ed,
                        log_prob_sum: previous.log_prob_sum,
                    }
                } else {
                    Composition {
                        segmented_string: format!("{} {}", previous.segmented_string, part),
                        corrected_string: format!("{} {}", previous.corrected_string, corrected),
                        distance_sum: previous.distance_sum + separator_length + part_ed,
                        log_prob_sum: previous.log_prob_sum + part_log_prob,
                    }
                };
            }
        }
        Ok(compositions[(chars.len() - 1) % array_size].clone())
    }

    ///Snapshot the dictionaries and construction parameters for persistence.
    ///The delete index is not included; it is rebuilt on load.
    pub fn snapshot(&self) -> PersistedState {
        let mut present_terms = BTreeMap::new();
        for (term, &id) in &self.encoder {
            present_terms.insert(term.clone(), self.decoder[id as usize].count);
        }
        PersistedState {
            data_version: DATA_VERSION,
            present_terms,
            below_threshold_terms: self
                .below_threshold
                .iter()
                .map(|(term, count)| (term.clone(), *count))
                .collect(),
            bigrams: self
                .bigrams
                .iter()
                .map(|(key, count)| (key.clone(), *count))
                .collect(),
            bigram_count_min: self.bigram_count_min,
            max_length: self.max_length,
            max_dictionary_edit_distance: self.config.max_dictionary_edit_distance,
            prefix_length: self.config.prefix_length,
            count_threshold: self.config.count_threshold,
        }
    }

    ///Reconstruct an engine from a snapshot. The distance metric is not part
    ///of the state; the default algorithm applies unless replaced afterwards.
    pub fn from_state(state: PersistedState) -> Result<SpellModel, Error> {
        let config = Config::default()
            .with_max_dictionary_edit_distance(state.max_dictionary_edit_distance)
            .with_prefix_length(state.prefix_length)
            .with_count_threshold(state.count_threshold);
        let mut model = SpellModel::new(config)?;
        for (term, count) in &state.present_terms {
            if *count > 0 {
                model.insert_present(term, *count);
            }
        }
        model.below_threshold = state.below_threshold_terms.into_iter().collect();
        model.bigrams = state.bigrams.into_iter().collect();
        model.bigram_count_min = state.bigram_count_min;
        //the persisted value may exceed the rebuilt one after removals; both
        //are valid upper bounds, keep the larger
        model.max_length = model.max_length.max(state.max_length);
        Ok(model)
    }

    pub fn save_state<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.snapshot().to_writer(writer)
    }

    pub fn load_state<R: Read>(reader: R) -> Result<SpellModel, Error> {
        Self::from_state(PersistedState::from_reader(reader)?)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), Error> {
        self.snapshot().to_file(Path::new(path))
    }

    pub fn load_from_file(path: &str) -> Result<SpellModel, Error> {
        Self::from_state(PersistedState::from_file(Path::new(path))?)
    }
}

impl Default for SpellModel {
    fn default() -> Self {
        SpellModel::new(Config::default()).expect("default configuration is valid")
    }
}

///Lossily decode a raw line, logging when bytes had to be replaced
fn decode_line(buffer: &[u8], line_number: usize) -> String {
    match String::from_utf8_lossy(buffer) {
        Cow::Borrowed(line) => line.to_string(),
        Cow::Owned(line) => {
            warn!(line = line_number, "replaced undecodable bytes");
            line
        }
    }
}

///Split a line and pull out the term and count columns
fn parse_columns<'a>(
    line: &'a str,
    term_index: usize,
    count_index: usize,
    separator: Option<&str>,
) -> Option<(&'a str, Count)> {
    let fields: Vec<&str> = match separator {
        Some(separator) => line.split(separator).collect(),
        None => line.split_whitespace().collect(),
    };
    let term = *fields.get(term_index)?;
    let count = fields.get(count_index)?.trim().parse::<Count>().ok()?;
    if term.is_empty() || count == 0 {
        return None;
    }
    Some((term, count))
}

///True when the pattern's first hit covers the whole input
fn matches_fully(pattern: &Regex, input: &str) -> bool {
    pattern
        .find(input)
        .map_or(false, |hit| hit.start() == 0 && hit.end() == input.len())
}
