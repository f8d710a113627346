use rs_markov_core::{MarkovChain, ReplayNumberGenerator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Train from a pre-tokenized corpus (one sequence per line)
    // A .bin cache is written next to it and loaded on the next run
    let chain = MarkovChain::open("./data/illustrative.dat")?;

    // Tables are ordered, so this dump is the same on every run
    println!("{}", chain);

    // 0 picks "a" from the start tokens, 2 picks "chair" after "a",
    // 0 picks the end marker after "chair"
    let walk = chain.get_walk(ReplayNumberGenerator::new(vec![0, 2, 0]));
    println!("Replayed walk: {}", walk.collect_tokens()?.join(" "));

    // The inverse: which choices produce a given sentence?
    let sentence = ["a", "banana", "!", "and", "a", "table", "and", "a", "chair"];
    let choices = chain.find_walk_choices(&sentence)?;
    println!("Choices for '{}': {:?}", sentence.join(" "), choices);

    let replayed = chain.get_walk(ReplayNumberGenerator::new(choices)).collect_tokens()?;
    if replayed == sentence {
        println!("Replaying the choices gives the sentence back");
    } else {
        println!("Should not happen: replay gave '{}'", replayed.join(" "));
    }

    // Words never seen together cannot be reproduced
    match chain.find_walk_choices(&["a", "and"]) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Cannot reproduce 'a and': {}", e),
    }

    // Generate 10 random sentences
    for i in 0..10 {
        let tokens = chain.get_random_walk().collect_tokens()?;
        println!("Generated sentence {}: {}", i + 1, tokens.join(" "));
    }

    Ok(())
}
