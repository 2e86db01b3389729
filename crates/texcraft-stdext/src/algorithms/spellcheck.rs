//! Spell checking using Levenshtein distance
//!
//! The single entry point [find_close_words] takes a word and a dictionary of valid words.
//! It returns every dictionary word together with its
//! [Levenshtein distance](https://en.wikipedia.org/wiki/Levenshtein_distance)
//! from the original word, closest first.
//!
//! ```
//! # use texcraft_stdext::algorithms::spellcheck::find_close_words;
//! let dictionary = vec!["def", "gdef", "let"];
//! let result = find_close_words(&dictionary, "dfe");
//! assert_eq!(result[0].word, "def");
//! ```
//!
//! The distance is computed with the standard dynamic program, keeping only two rows of the matrix.

/// A dictionary word and its distance from the search word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDiff {
    pub word: String,
    pub distance: usize,
}

/// Find words in the provided dictionary that are close to the search word.
///
/// The return value contains one element for every word in the dictionary, with
/// the closest matches first. Ties keep dictionary order.
pub fn find_close_words<S: AsRef<str>>(dictionary: &[S], word: &str) -> Vec<WordDiff> {
    let mut comparisons: Vec<WordDiff> = dictionary
        .iter()
        .map(|valid_word| WordDiff {
            word: valid_word.as_ref().to_string(),
            distance: levenshtein_distance(word, valid_word.as_ref()),
        })
        .collect();
    comparisons.sort_by_key(|diff| diff.distance);
    comparisons
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current: Vec<usize> = vec![0; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            current[j + 1] = if a_i == b_j {
                previous[j]
            } else {
                1 + previous[j].min(previous[j + 1]).min(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! levenshtein_tests {
        ($( ($name: ident, $a: expr, $b: expr, $want: expr), )+) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(levenshtein_distance($a, $b), $want);
                    assert_eq!(levenshtein_distance($b, $a), $want);
                }
            )+
        };
    }

    levenshtein_tests!(
        (both_empty, "", "", 0),
        (one_empty, "", "abc", 3),
        (identical, "ifnum", "ifnum", 0),
        (two_substitutions, "ifnum", "ifdim", 2),
        (one_insertion, "fi", "fii", 1),
        (kitten_sitting, "kitten", "sitting", 3),
    );

    #[test]
    fn closest_first() {
        let dictionary = vec!["iftrue", "iffalse", "ifnum"];
        let result = find_close_words(&dictionary, "iftru");
        assert_eq!(
            result[0],
            WordDiff {
                word: "iftrue".to_string(),
                distance: 1
            }
        );
        assert_eq!(result.len(), 3);
    }
}
