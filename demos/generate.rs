//! Quick library demo - run with: cargo run --example generate [prompt]

use std::env;

use storyloom::model::{DEFAULT_CORPUS, StoryModel};
use storyloom::types::{GenParams, Genre};

fn main() {
    let prompt = env::args()
        .nth(1)
        .unwrap_or_else(|| "Once upon a time in a faraway kingdom".to_string());

    let model = StoryModel::train(DEFAULT_CORPUS);
    let params = GenParams {
        seed: Some(42),
        ..GenParams::default()
    };

    println!("Prompt: {}", prompt);
    println!();

    for genre in Genre::ALL {
        match model.generate(&prompt, genre, 1, &params) {
            Ok(stories) => {
                println!("[{}]", genre.label());
                println!("{}", stories[0].text);
                println!();
            }
            Err(e) => eprintln!("{}: {}", genre.label(), e),
        }
    }
}
