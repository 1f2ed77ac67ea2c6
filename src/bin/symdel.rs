extern crate clap;

use std::io::{self, BufRead};

use clap::{App, Arg, ArgMatches, SubCommand};
use rayon::prelude::*;

use symdel::*;

pub fn common_arguments<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    let mut args: Vec<Arg> = Vec::new();
    args.push(
        Arg::with_name("dictionary")
            .long("dictionary")
            .short("d")
            .help("Frequency dictionary to load: one term and count per line, whitespace separated")
            .takes_value(true)
            .required(true),
    );
    args.push(
        Arg::with_name("bigrams")
            .long("bigrams")
            .short("b")
            .help("Bigram frequency dictionary: two adjacent terms and a count per line")
            .takes_value(true),
    );
    args.push(
        Arg::with_name("term-index")
            .long("term-index")
            .help("Zero-based column of the term in the dictionary file")
            .takes_value(true)
            .default_value("0"),
    );
    args.push(
        Arg::with_name("count-index")
            .long("count-index")
            .help("Zero-based column of the count in the dictionary file")
            .takes_value(true)
            .default_value("1"),
    );
    args.push(
        Arg::with_name("max-edit-distance")
            .long("max-edit-distance")
            .short("D")
            .help("Maximum edit distance for corrections (also what the index is built for)")
            .takes_value(true)
            .default_value("2"),
    );
    args.push(
        Arg::with_name("prefix-length")
            .long("prefix-length")
            .help("Number of leading characters per term the delete index covers")
            .takes_value(true)
            .default_value("7"),
    );
    args.push(
        Arg::with_name("count-threshold")
            .long("count-threshold")
            .help("Minimum cumulative count before a term is admitted")
            .takes_value(true)
            .default_value("1"),
    );
    args.push(
        Arg::with_name("levenshtein")
            .long("levenshtein")
            .help("Verify candidates with plain Levenshtein instead of Damerau-OSA"),
    );
    args.push(
        Arg::with_name("json")
            .long("json")
            .short("j")
            .help("Output JSON instead of TSV"),
    );
    args
}

fn model_from_arguments(matches: &ArgMatches) -> SpellModel {
    let config = Config::default()
        .with_max_dictionary_edit_distance(
            matches
                .value_of("max-edit-distance")
                .unwrap()
                .parse()
                .expect("max-edit-distance should be an integer"),
        )
        .with_prefix_length(
            matches
                .value_of("prefix-length")
                .unwrap()
                .parse()
                .expect("prefix-length should be an integer"),
        )
        .with_count_threshold(
            matches
                .value_of("count-threshold")
                .unwrap()
                .parse()
                .expect("count-threshold should be an integer"),
        )
        .with_distance_algorithm(if matches.is_present("levenshtein") {
            DistanceAlgorithm::Levenshtein
        } else {
            DistanceAlgorithm::DamerauOsa
        });
    let mut model = SpellModel::new(config).expect("Invalid configuration");
    let term_index: usize = matches
        .value_of("term-index")
        .unwrap()
        .parse()
        .expect("term-index should be an integer");
    let count_index: usize = matches
        .value_of("count-index")
        .unwrap()
        .parse()
        .expect("count-index should be an integer");
    let dictionary = matches.value_of("dictionary").unwrap();
    eprintln!("Loading dictionary {}...", dictionary);
    model
        .load_dictionary(dictionary, term_index, count_index, None)
        .expect("Error loading dictionary");
    if let Some(bigrams) = matches.value_of("bigrams") {
        eprintln!("Loading bigrams {}...", bigrams);
        model
            .load_bigram_dictionary(bigrams, 0, 2, None)
            .expect("Error loading bigram dictionary");
    }
    eprintln!(
        " - {} terms, {} bigrams, {} lines rejected",
        model.word_count(),
        model.bigram_count(),
        model.entries_rejected
    );
    model
}

fn output_suggestions_as_tsv(input: &str, suggestions: &[Suggestion]) {
    print!("{}", input);
    for suggestion in suggestions {
        print!("\t{}\t{}\t{}", suggestion.term, suggestion.distance, suggestion.count);
    }
    println!();
}

fn output_suggestions_as_json(input: &str, suggestions: &[Suggestion], seqnr: usize) {
    if seqnr > 1 {
        println!(",");
    }
    println!(
        "    {{ \"input\": \"{}\", \"suggestions\": [",
        input.replace('"', "\\\"")
    );
    let total = suggestions.len();
    for (i, suggestion) in suggestions.iter().enumerate() {
        print!(
            "        {{ \"term\": \"{}\", \"distance\": {}, \"count\": {} }}",
            suggestion.term.replace('"', "\\\""),
            suggestion.distance,
            suggestion.count
        );
        if i < total - 1 {
            println!(",");
        } else {
            println!();
        }
    }
    println!("    ] }}");
}

fn read_input_lines() -> Vec<String> {
    let stdin = io::stdin();
    stdin
        .lock()
        .lines()
        .filter_map(|line| line.ok())
        .filter(|line| !line.is_empty())
        .collect()
}

fn main() {
    let app = App::new("symdel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Symmetric-delete spelling correction, compound correction and word segmentation")
        .subcommand(
            SubCommand::with_name("lookup")
                .about("Correct single terms, one per line, read from standard input")
                .args(&common_arguments())
                .arg(
                    Arg::with_name("verbosity")
                        .long("verbosity")
                        .short("v")
                        .help("How many suggestions to return: top, closest or all")
                        .takes_value(true)
                        .default_value("top"),
                )
                .arg(
                    Arg::with_name("include-unknown")
                        .long("include-unknown")
                        .help("Echo inputs without any match instead of returning nothing"),
                )
                .arg(
                    Arg::with_name("transfer-casing")
                        .long("transfer-casing")
                        .help("Copy the input's casing pattern onto the suggestions"),
                ),
        )
        .subcommand(
            SubCommand::with_name("compound")
                .about("Correct whole phrases, one per line, read from standard input")
                .args(&common_arguments())
                .arg(
                    Arg::with_name("ignore-non-words")
                        .long("ignore-non-words")
                        .help("Pass numbers and acronyms through uncorrected"),
                )
                .arg(
                    Arg::with_name("transfer-casing")
                        .long("transfer-casing")
                        .help("Copy the phrase's casing pattern onto the output"),
                ),
        )
        .subcommand(
            SubCommand::with_name("segment")
                .about("Segment space-free lines from standard input into words")
                .args(&common_arguments())
                .arg(
                    Arg::with_name("max-word-length")
                        .long("max-word-length")
                        .help("Longest part the segmenter considers (defaults to the prefix length)")
                        .takes_value(true),
                ),
        );
    let matches = app.get_matches();

    match matches.subcommand() {
        ("lookup", Some(submatches)) => {
            let model = model_from_arguments(submatches);
            let params = {
                let mut params = LookupParams::default()
                    .with_verbosity(match submatches.value_of("verbosity").unwrap() {
                        "top" => Verbosity::Top,
                        "closest" => Verbosity::Closest,
                        "all" => Verbosity::All,
                        other => {
                            eprintln!("Unknown verbosity: {}", other);
                            std::process::exit(1);
                        }
                    });
                if submatches.is_present("include-unknown") {
                    params = params.with_include_unknown();
                }
                if submatches.is_present("transfer-casing") {
                    params = params.with_transfer_casing();
                }
                params
            };
            let inputs = read_input_lines();
            //lookups do not mutate the model, fan them out over all cores
            let results: Vec<Vec<Suggestion>> = inputs
                .par_iter()
                .map(|input| model.lookup(input, &params).expect("lookup failed"))
                .collect();
            if submatches.is_present("json") {
                println!("{{ \"results\": [");
                for (seqnr, (input, suggestions)) in inputs.iter().zip(results.iter()).enumerate() {
                    output_suggestions_as_json(input, suggestions, seqnr + 1);
                }
                println!("] }}");
            } else {
                for (input, suggestions) in inputs.iter().zip(results.iter()) {
                    output_suggestions_as_tsv(input, suggestions);
                }
            }
        }
        ("compound", Some(submatches)) => {
            let model = model_from_arguments(submatches);
            let mut params = CompoundParams::default();
            if submatches.is_present("ignore-non-words") {
                params = params.with_ignore_non_words();
            }
            if submatches.is_present("transfer-casing") {
                params = params.with_transfer_casing();
            }
            let inputs = read_input_lines();
            let results: Vec<Vec<Suggestion>> = inputs
                .par_iter()
                .map(|input| {
                    model
                        .lookup_compound(input, &params)
                        .expect("compound lookup failed")
                })
                .collect();
            if submatches.is_present("json") {
                println!("{{ \"results\": [");
                for (seqnr, (input, suggestions)) in inputs.iter().zip(results.iter()).enumerate() {
                    output_suggestions_as_json(input, suggestions, seqnr + 1);
                }
                println!("] }}");
            } else {
                for (input, suggestions) in inputs.iter().zip(results.iter()) {
                    output_suggestions_as_tsv(input, suggestions);
                }
            }
        }
        ("segment", Some(submatches)) => {
            let model = model_from_arguments(submatches);
            let mut params = SegmentParams::default()
                .with_max_edit_distance(model.config().max_dictionary_edit_distance);
            if let Some(length) = submatches.value_of("max-word-length") {
                params = params.with_max_segmentation_word_length(
                    length.parse().expect("max-word-length should be an integer"),
                );
            }
            let inputs = read_input_lines();
            let results: Vec<Composition> = inputs
                .par_iter()
                .map(|input| {
                    model
                        .word_segmentation(input, &params)
                        .expect("segmentation failed")
                })
                .collect();
            for (input, composition) in inputs.iter().zip(results.iter()) {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    input,
                    composition.segmented_string,
                    composition.corrected_string,
                    composition.distance_sum,
                    composition.log_prob_sum
                );
            }
        }
        _ => {
            eprintln!("No subcommand given; see --help");
            std::process::exit(1);
        }
    }
}
