use regex::Regex;
use std::sync::LazyLock;

/// Innermost bracketed span, ASCII or full-width
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（][^()（）]*[)）]").expect("valid bracket regex"));

static LAUGH_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)kusa|草|wara|笑|lol").expect("valid laugh-word regex"));

static W_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[wW]{2,}").expect("valid w-run regex"));

/// Score the laughter in a chat message.
///
/// Bracketed asides are removed first, repeatedly, since removing an inner
/// pair can expose an outer one. Each laugh word scores 1, each run of two
/// or more `w` scores its length, and a single trailing `w` scores 1.
pub fn count_laughs(message: &str) -> u32 {
    let mut text = message.to_string();
    loop {
        let stripped = BRACKETED.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    let mut score = LAUGH_WORDS.find_iter(&text).count() as u32;
    let text = LAUGH_WORDS.replace_all(&text, "");

    score += W_RUN
        .find_iter(&text)
        .map(|run| run.as_str().chars().count() as u32)
        .sum::<u32>();
    let text = W_RUN.replace_all(&text, "");

    if text.trim().ends_with(['w', 'W']) {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_score_their_length() {
        assert_eq!(count_laughs("wwww"), 4);
        assert_eq!(count_laughs("それはwww"), 3);
        assert_eq!(count_laughs("WwW nice ww"), 5);
    }

    #[test]
    fn test_keywords_score_one_each() {
        assert_eq!(count_laughs("kusa"), 1);
        assert_eq!(count_laughs("KUSA 草 笑 lol"), 4);
        assert_eq!(count_laughs("warawara"), 2);
    }

    #[test]
    fn test_bracketed_text_is_ignored() {
        assert_eq!(count_laughs("(wwww)"), 0);
        assert_eq!(count_laughs("（草）"), 0);
        assert_eq!(count_laughs("(outer (inner) www) ok"), 0);
        assert_eq!(count_laughs("ww (lol)"), 2);
    }

    #[test]
    fn test_trailing_single_w() {
        assert_eq!(count_laughs("wooow"), 1);
        assert_eq!(count_laughs("ok w"), 1);
        assert_eq!(count_laughs("ok w  "), 1);
        assert_eq!(count_laughs("wow ok"), 0);
    }

    #[test]
    fn test_plain_text_scores_zero() {
        assert_eq!(count_laughs(""), 0);
        assert_eq!(count_laughs("good morning"), 0);
    }
}
