use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_ngram_core::io::{parse_corpus, read_corpus};
use rs_ngram_core::smoothing::{AdditiveSmoothing, GoodTuringSmoothing, InterpolatedSmoothing, LaplaceSmoothing};
use rs_ngram_core::{Generator, NGramModel, StartSeed, TextCodec};

const CORPUS: &str = "\
<s> ali topu at mehmet ayşeye gitti </s>
<s> ali top at ayşe eve gitti </s>
<s> ayşe kitabı ver </s>
<s> ali topu mehmete at </s>
<s> ali topu at mehmet ayşeyle gitti </s>
";

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every grid search iteration
    env_logger::init();

    // A corpus file (one tokenized sentence per line) may be given as first argument
    let corpus = match std::env::args().nth(1) {
        Some(path) => read_corpus(&path)?,
        None => parse_corpus(CORPUS),
    };
    info!("corpus holds {} sentences", corpus.len());

    // Build a bigram model; every sentence feeds the count trie
    let mut bigram = NGramModel::from_corpus(&corpus, 2)?;
    println!("Vocabulary size: {}", bigram.vocabulary_size());
    println!("Count of '<s> ali': {}", bigram.count(&words("<s> ali")));

    // Fixed pseudo-count, then a Good-Turing discount of the same counts
    bigram.compute_probabilities(&LaplaceSmoothing::new())?;
    println!("Laplace P(ali | <s>) = {}", bigram.probability(&words("<s> ali")));
    bigram.compute_probabilities(&GoodTuringSmoothing)?;
    println!("Good-Turing P(ali | <s>) = {}", bigram.probability(&words("<s> ali")));

    // An unseen bigram falls back on the unseen probability of its level
    println!("Good-Turing P(ali | ayşe) = {}", bigram.probability(&words("ayşe ali")));
    println!("Perplexity: {}", bigram.perplexity(&corpus));

    // The additive delta is learned by 10-fold cross-validation
    let mut additive = AdditiveSmoothing::new();
    bigram.train_probabilities(&corpus, &mut additive)?;
    println!("Learned delta: {}", additive.delta());

    // Interpolation learns one weight per higher level
    let mut trigram = NGramModel::from_corpus(&corpus, 3)?;
    let mut interpolated = InterpolatedSmoothing::new();
    trigram.train_probabilities(&corpus, &mut interpolated)?;
    let (lambda1, lambda2) = interpolated.lambdas();
    println!("Learned lambdas: {lambda1}, {lambda2}");
    println!("Interpolated P(at | ali topu) = {}", trigram.probability(&words("ali topu at")));

    // Save as text and read it back
    let codec = TextCodec::<String>::new();
    let path = std::env::temp_dir().join("rs-ngram-exemple.ngram");
    trigram.save(&path, &codec)?;
    let loaded = NGramModel::<String>::load(&path, &codec)?;
    println!("Reloaded perplexity: {}", loaded.perplexity(&corpus));

    // Start seed can be set to
    // 'Empty' to start from the unigram level (smoothed here by the interpolation)
    // 'Random' uses a random path of size n from the model
    // 'Custom' uses the given symbols
    let generator = Generator::new(&loaded).with_max_length(20).with_end("</s>".to_owned());
    let mut rng = StdRng::seed_from_u64(42);
    for (i, seed) in [
        StartSeed::Custom(words("<s>")),
        StartSeed::Random(2),
        StartSeed::Empty,
    ]
    .iter()
    .enumerate()
    {
        match generator.generate(seed, &mut rng) {
            Some(sequence) => println!("Generated sentence {}: {}", i + 1, sequence.join(" ")),
            None => println!("Generated sentence {}: no start found", i + 1),
        }
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
