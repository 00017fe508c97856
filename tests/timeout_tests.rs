use retrace::{Error, Regex, RegexBuilder};
use std::time::{Duration, Instant};

fn catastrophic_input() -> String {
    let mut input = "a".repeat(40);
    input.push('!');
    input
}

#[test]
fn test_catastrophic_backtracking_times_out() {
    let timeout = Duration::from_millis(50);
    let re = Regex::with_timeout(r"(a+)+$", "", timeout).unwrap();
    let input = catastrophic_input();

    let start = Instant::now();
    let err = re.find(&input).expect_err("should time out");
    let elapsed = start.elapsed();

    match err {
        Error::MatchTimeout {
            pattern,
            input_len,
            timeout: reported,
        } => {
            assert_eq!(pattern, r"(a+)+$");
            assert_eq!(input_len, input.len());
            assert_eq!(reported, timeout);
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[test]
fn test_timeout_applies_to_every_operation() {
    let re = RegexBuilder::new(r"(a+)+$")
        .match_timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    let input = catastrophic_input();
    assert!(matches!(re.is_match(&input), Err(Error::MatchTimeout { .. })));
    assert!(matches!(
        re.replace_all(&input, "x"),
        Err(Error::MatchTimeout { .. })
    ));
    assert!(matches!(re.split(&input), Err(Error::MatchTimeout { .. })));

    let results: Vec<_> = re.find_iter(&input).collect();
    assert_eq!(results.len(), 1, "iteration should stop after a timeout");
    assert!(matches!(results[0], Err(Error::MatchTimeout { .. })));
}

#[test]
fn test_fast_matches_do_not_time_out() {
    let re = Regex::with_timeout(r"(\w+)\s(\w+)", "", Duration::from_millis(500)).unwrap();
    let m = re.find("hello world").unwrap().unwrap();
    assert_eq!(m.as_str(), "hello world");
    assert_eq!(re.match_timeout(), Some(Duration::from_millis(500)));

    // Each search gets a fresh budget.
    for _ in 0..100 {
        assert!(re.is_match("hello world").unwrap());
    }
}

#[test]
fn test_no_timeout_by_default() {
    let re = Regex::new(r"(a+)+b").unwrap();
    assert_eq!(re.match_timeout(), None);
    assert!(re.is_match("aaaaaaaaaab").unwrap());
}
