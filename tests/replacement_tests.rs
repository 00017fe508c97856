use retrace::Regex;

#[test]
fn test_replace_basic() {
    let re = Regex::new(r"world").unwrap();
    let result = re.replace("hello world", "universe").unwrap();
    assert_eq!(result, "hello universe");
}

#[test]
fn test_replace_no_match() {
    let re = Regex::new(r"xyz").unwrap();
    let result = re.replace("hello world", "universe").unwrap();
    assert_eq!(result, "hello world");
}

#[test]
fn test_replace_with_capture_groups() {
    let re = Regex::new(r"(\w+)@(\w+)").unwrap();
    assert_eq!(re.replace("user@host", "$2@$1").unwrap(), "host@user");
    assert_eq!(re.replace("user@host", "${2}@${1}").unwrap(), "host@user");
}

#[test]
fn test_replace_with_group_zero() {
    let re = Regex::new(r"\d+").unwrap();
    let result = re.replace("Price: $123", "[$0]").unwrap();
    assert_eq!(result, "Price: $[123]");
    let result = re.replace("Price: $123", "[$&]").unwrap();
    assert_eq!(result, "Price: $[123]");
}

#[test]
fn test_replace_named_groups() {
    let re = Regex::new(r"(?<first>\w+)\s(?<last>\w+)").unwrap();
    let result = re.replace("Jane Doe", "${last}, ${first}").unwrap();
    assert_eq!(result, "Doe, Jane");
}

#[test]
fn test_replace_special_references() {
    let re = Regex::new(r"(\w+)@(\w+)").unwrap();
    let text = "mail user@host now";
    assert_eq!(re.replace(text, "[$`]").unwrap(), "mail [mail ] now");
    assert_eq!(re.replace(text, "[$']").unwrap(), "mail [ now] now");
    assert_eq!(re.replace(text, "[$+]").unwrap(), "mail [host] now");
    assert_eq!(
        re.replace(text, "[$_]").unwrap(),
        "mail [mail user@host now] now"
    );
    assert_eq!(re.replace(text, "$$1").unwrap(), "mail $1 now");
}

#[test]
fn test_replace_unknown_references_are_literal() {
    let re = Regex::new(r"(a)").unwrap();
    assert_eq!(re.replace("a", "$2").unwrap(), "$2");
    assert_eq!(re.replace("a", "$10").unwrap(), "$10");
    assert_eq!(re.replace("a", "${nope}").unwrap(), "${nope}");
    assert_eq!(re.replace("a", "${1").unwrap(), "${1");
    assert_eq!(re.replace("a", "x$").unwrap(), "x$");
    assert_eq!(re.replace("a", "$x").unwrap(), "$x");
}

#[test]
fn test_replace_ecmascript_digits() {
    // ECMAScript takes the longest digit prefix which names a group.
    let re = Regex::with_flags(r"(a)", "e").unwrap();
    assert_eq!(re.replace("a", "$10").unwrap(), "a0");
    assert_eq!(re.replace("a", "$1").unwrap(), "a");
}

#[test]
fn test_replace_all() {
    let re = Regex::new(r"a").unwrap();
    assert_eq!(re.replace_all("banana", "-").unwrap(), "b-n-n-");

    let re = Regex::new(r"(\d+)").unwrap();
    assert_eq!(
        re.replace_all("1 and 22 and 333", "<$1>").unwrap(),
        "<1> and <22> and <333>"
    );
}

#[test]
fn test_replace_all_empty_matches() {
    let re = Regex::new(r"x*").unwrap();
    assert_eq!(re.replace_all("abc", "-").unwrap(), "-a-b-c-");
    let re = Regex::new(r"").unwrap();
    assert_eq!(re.replace_all("é", "|").unwrap(), "|é|");
}

#[test]
fn test_replacen() {
    let re = Regex::new(r"\d").unwrap();
    assert_eq!(re.replacen("1234", "x", 2, 0).unwrap(), "xx34");
    assert_eq!(re.replacen("1234", "x", 2, 1).unwrap(), "1xx4");
    assert_eq!(re.replacen("1234", "x", 0, 0).unwrap(), "1234");
    assert_eq!(re.replacen("1234", "x", -1, 0).unwrap(), "xxxx");
    assert!(re.replacen("1234", "x", 1, 5).is_err());
}

#[test]
fn test_replace_with_closure() {
    let re = Regex::new(r"\w+").unwrap();
    let upper = |m: &retrace::Match| m.as_str().to_uppercase();
    assert_eq!(re.replace_with("hello big world", upper).unwrap(), "HELLO big world");
    assert_eq!(
        re.replace_all_with("hello big world", upper).unwrap(),
        "HELLO BIG WORLD"
    );
    let mut seen = 0;
    let numbered = re
        .replacen_with(
            "a b c",
            |_| {
                seen += 1;
                seen.to_string()
            },
            2,
            0,
        )
        .unwrap();
    assert_eq!(numbered, "1 2 c");
}

#[test]
fn test_replace_right_to_left() {
    let re = Regex::with_flags(r"\d", "r").unwrap();
    assert_eq!(re.replace_all("a1b2", "<$&>").unwrap(), "a<1>b<2>");
    // Only the rightmost match is replaced.
    assert_eq!(re.replace("a1b2", "_").unwrap(), "a1b_");
    assert_eq!(re.replacen("1234", "x", 2, 4).unwrap(), "12xx");
}

#[test]
fn test_match_expand() {
    let re = Regex::new(r"(?<key>\w+)=(?<value>\w+)").unwrap();
    let m = re.find("x a=1 y").unwrap().unwrap();
    assert_eq!(m.expand("${value}:${key}"), "1:a");
    assert_eq!(m.expand("[$`|$']"), "[x | y]");
}

#[test]
fn test_repeated_templates() {
    let re = Regex::new(r"(\w)(\w)").unwrap();
    for _ in 0..3 {
        assert_eq!(re.replace_all("abcd", "$2$1").unwrap(), "badc");
        assert_eq!(re.replace_all("abcd", "$1").unwrap(), "ac");
    }
}

#[test]
fn test_split() {
    let re = Regex::new(r",\s*").unwrap();
    assert_eq!(re.split("a, b,c").unwrap(), vec!["a", "b", "c"]);
    assert_eq!(re.split("abc").unwrap(), vec!["abc"]);
    assert_eq!(re.split(",a,").unwrap(), vec!["", "a", ""]);
    assert_eq!(re.split("").unwrap(), vec![""]);
}

#[test]
fn test_split_empty_matches() {
    let re = Regex::new(r"").unwrap();
    assert_eq!(re.split("abc").unwrap(), vec!["", "a", "b", "c", ""]);
}

#[test]
fn test_split_includes_groups() {
    let re = Regex::new(r"(-)|(_)").unwrap();
    assert_eq!(re.split("a-b_c").unwrap(), vec!["a", "-", "b", "_", "c"]);
    let re = Regex::new(r"(-)(_)").unwrap();
    assert_eq!(re.split("a-_b").unwrap(), vec!["a", "-", "_", "b"]);
}

#[test]
fn test_splitn() {
    let re = Regex::new(r",").unwrap();
    assert_eq!(re.splitn("a,b,c", 2, 0).unwrap(), vec!["a", "b,c"]);
    assert_eq!(re.splitn("a,b,c", 1, 0).unwrap(), vec!["a,b,c"]);
    assert_eq!(re.splitn("a,b,c", 0, 0).unwrap(), vec!["a", "b", "c"]);
    assert_eq!(re.splitn("a,b,c", 0, 2).unwrap(), vec!["a,b", "c"]);
    assert!(re.splitn("a,b,c", 0, 9).is_err());
}

#[test]
fn test_split_right_to_left() {
    let re = Regex::with_flags(r",", "r").unwrap();
    assert_eq!(re.split("a,b,c").unwrap(), vec!["a", "b", "c"]);
    assert_eq!(re.splitn("a,b,c", 2, 5).unwrap(), vec!["a,b", "c"]);

    // Groups stay in group order.
    let re = Regex::with_flags(r"(-)(_)", "r").unwrap();
    assert_eq!(re.split("a-_b").unwrap(), vec!["a", "-", "_", "b"]);
}
