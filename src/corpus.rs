use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static CORPUS_DIR: Dir = include_dir!("src/corpus");

/// Embedded word list used to assemble practice passages. The engine
/// treats the produced text as an opaque string; any corpus that can
/// supply words works.
#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Corpus {
    pub fn new(file_name: String) -> Self {
        read_corpus_from_file(format!("{file_name}.json")).unwrap()
    }

    /// Assemble a space-separated passage of `number_of_words` words,
    /// sampled with replacement.
    pub fn passage(&self, number_of_words: usize) -> String {
        let rng = &mut rand::thread_rng();
        (0..number_of_words)
            .filter_map(|_| self.words.choose(rng))
            .cloned()
            .collect::<Vec<String>>()
            .join(" ")
    }
}

fn read_corpus_from_file(file_name: String) -> Result<Corpus, Box<dyn Error>> {
    let file = CORPUS_DIR.get_file(file_name).expect("Corpus file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let corpus = from_str(file_as_str).expect("Unable to deserialize corpus json");

    Ok(corpus)
}
