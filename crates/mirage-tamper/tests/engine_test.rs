//! End-to-end properties of the rewrite engine over realistic ledger lines.

use mirage_tamper::{apply, POSITION_RULE};

const LEDGER: &str = concat!(
    "{\"id\": 1, \"cash\": 1000.0, \"positions\": {\"NVDA\": 5000, \"AAPL\": 3}}\n",
    "{\"id\": 2, \"cash\": 998.5, \"positions\": {\"AAPL\": 4}}\n",
    "{\"id\": 3, \"note\": \"rebalance, manual\"}\n",
);

#[test]
fn field_scoped_rewrite_keeps_everything_else_byte_identical() {
    let mut buf = LEDGER.as_bytes().to_vec();
    assert!(apply(&mut buf, &POSITION_RULE));

    let out = String::from_utf8(buf).unwrap();
    let mut lines = out.lines();
    assert_eq!(
        lines.next().unwrap(),
        "{\"id\": 1, \"cash\": 1000.0, \"positions\": {\"NVDA\": 20  , \"AAPL\": 3}}"
    );
    // Records without the target field are untouched.
    assert_eq!(
        lines.next().unwrap(),
        "{\"id\": 2, \"cash\": 998.5, \"positions\": {\"AAPL\": 4}}"
    );
    assert_eq!(lines.next().unwrap(), "{\"id\": 3, \"note\": \"rebalance, manual\"}");
}

#[test]
fn length_invariance_over_a_corpus() {
    let corpus: &[&str] = &[
        LEDGER,
        "{\"positions\": {\"NVDA\": 5}}",
        "{\"positions\": {\"NVDA\": 5}}    ",
        "{\"positions\": {\"NVDA\": 123456789}}",
        "no structure at all",
        "\n\n\n",
        "{\"positions\"",
    ];
    for input in corpus {
        let mut buf = input.as_bytes().to_vec();
        apply(&mut buf, &POSITION_RULE);
        assert_eq!(buf.len(), input.len(), "length changed for {input:?}");
    }
}

#[test]
fn tampered_record_is_still_valid_json() {
    let mut buf = b"{\"id\": 7, \"positions\": {\"NVDA\": 5000, \"AAPL\": 3}}".to_vec();
    assert!(apply(&mut buf, &POSITION_RULE));

    let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(parsed["positions"]["NVDA"], 20);
    assert_eq!(parsed["positions"]["AAPL"], 3);
    assert_eq!(parsed["id"], 7);
}

#[test]
fn padded_shift_into_slack_is_still_valid_json() {
    // One-digit value, growth satisfied from the record's own trailing slack.
    let mut buf = b"{\"positions\": {\"NVDA\": 5, \"AAPL\": 3}}   \n".to_vec();
    let before = buf.len();
    assert!(apply(&mut buf, &POSITION_RULE));
    assert_eq!(buf.len(), before);

    let line = &buf[..buf.len() - 1];
    let parsed: serde_json::Value = serde_json::from_slice(line).unwrap();
    assert_eq!(parsed["positions"]["NVDA"], 20);
    assert_eq!(parsed["positions"]["AAPL"], 3);
}

#[test]
fn idempotent_on_already_tampered_data() {
    let mut buf = LEDGER.as_bytes().to_vec();
    assert!(apply(&mut buf, &POSITION_RULE));
    let first_pass = buf.clone();

    assert!(!apply(&mut buf, &POSITION_RULE));
    assert_eq!(buf, first_pass);
}

#[test]
fn chunk_boundary_splitting_the_field_is_left_alone() {
    let line = "{\"positions\": {\"NVDA\": 5000, \"AAPL\": 3}}";
    let (head, tail) = line.split_at(18); // mid-key: head ends in `{"NV`

    // The head's key scan runs off the end of the chunk and the tail has no
    // section marker, so both halves pass through unchanged.
    let mut head_buf = head.as_bytes().to_vec();
    apply(&mut head_buf, &POSITION_RULE);
    let mut tail_buf = tail.as_bytes().to_vec();
    apply(&mut tail_buf, &POSITION_RULE);

    assert_eq!(head_buf, head.as_bytes());
    assert_eq!(tail_buf, tail.as_bytes());
}
