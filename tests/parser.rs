use lurnip_import::parser::{DuplicateColumnPolicy, ParseOptions, QuoteMode};
use lurnip_import::{ImportKind, ParseError, parse, parse_with, validate};

#[test]
fn empty_content_is_empty_input() {
    assert_eq!(parse(""), Err(ParseError::EmptyInput));
    assert_eq!(ParseError::EmptyInput.to_string(), "The file is empty.");
}

#[test]
fn repeated_header_collapses_to_last_value() {
    let table = parse("Name,Name\nfirst,second\n").expect("parse duplicate header");
    assert_eq!(table.headers(), ["Name", "Name"]);
    assert_eq!(table.keys(), ["name", "name"]);
    assert_eq!(table.rows()[0].get("name"), Some("second"));
}

#[test]
fn repeated_header_rejected_under_strict_policy() {
    let options = ParseOptions {
        duplicate_columns: DuplicateColumnPolicy::Reject,
        ..ParseOptions::default()
    };
    let err = parse_with("Name,Name\nfirst,second\n", &options).unwrap_err();
    assert!(matches!(err, ParseError::DuplicateColumn { ref key, .. } if key == "name"));
}

#[test]
fn row_count_matches_non_blank_data_lines() {
    let text = "a,b,c\n\n1,2,3\n   \n4,5,6\r\n7,8,9\n\n";
    let table = parse(text).expect("parse");
    assert_eq!(table.row_count(), 3);
    assert!(table.rows().iter().all(|row| row.len() == 3));
    assert_eq!(table.rows()[2].values(), ["7", "8", "9"]);
}

#[test]
fn single_ragged_row_fails_whole_parse() {
    let err = parse("a,b\n1,2\n3,4\n5\n6,7").unwrap_err();
    assert_eq!(
        err,
        ParseError::RowShapeMismatch {
            row_number: 4,
            actual: 1,
            expected: 2
        }
    );
    assert_eq!(err.to_string(), "Row 4 has 1 columns, but expected 2.");
}

#[test]
fn extra_fields_are_also_ragged() {
    assert!(matches!(
        parse("a,b\n1,2,3"),
        Err(ParseError::RowShapeMismatch {
            actual: 3,
            expected: 2,
            ..
        })
    ));
}

#[test]
fn fields_and_headers_are_trimmed() {
    let table = parse("  Full Name ,  Email Address\n  Ada Lovelace ,ada@x.io   ").unwrap();
    assert_eq!(table.headers(), ["Full Name", "Email Address"]);
    assert_eq!(table.keys(), ["full_name", "email_address"]);
    assert_eq!(table.rows()[0].get("full_name"), Some("Ada Lovelace"));
}

#[test]
fn blank_header_cell_is_invalid() {
    let err = parse("name, ,email\na,b,c").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid headers detected (empty column names)."
    );
}

#[test]
fn quote_aware_mode_matches_split_mode_on_plain_input() {
    let text = "Name,Email\r\n\r\nAda,ada@x.io\r\nBob,bob@x.io\r\n";
    let quoted = ParseOptions {
        quoting: QuoteMode::Rfc4180,
        ..ParseOptions::default()
    };
    assert_eq!(parse(text).unwrap(), parse_with(text, &quoted).unwrap());
}

#[test]
fn quote_aware_mode_still_enforces_shape() {
    let quoted = ParseOptions {
        quoting: QuoteMode::Rfc4180,
        ..ParseOptions::default()
    };
    let err = parse_with("a,b\n\"x,y\"\n", &quoted).unwrap_err();
    assert!(matches!(
        err,
        ParseError::RowShapeMismatch {
            row_number: 2,
            actual: 1,
            expected: 2
        }
    ));
}

#[test]
fn tab_delimited_rows_keep_empty_edge_cells() {
    let text = "name\temail\tbatch\nAda\tada@x.io\t\n\tbob@x.io\tB1\n";
    for quoting in [QuoteMode::Split, QuoteMode::Rfc4180] {
        let options = ParseOptions {
            delimiter: b'\t',
            quoting,
            ..ParseOptions::default()
        };
        let table = parse_with(text, &options).expect("tab-delimited parse");
        assert_eq!(table.row_count(), 2, "{quoting:?}");
        assert_eq!(table.rows()[0].values(), ["Ada", "ada@x.io", ""]);
        assert_eq!(table.rows()[1].values(), ["", "bob@x.io", "B1"]);

        let errors = validate(&table, ImportKind::Student);
        let found: Vec<_> = errors
            .iter()
            .map(|e| (e.row_index, e.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![(0, "Batch is required for students"), (1, "Name is required")]
        );
    }
}

#[test]
fn quote_aware_mode_reads_stray_quotes_literally() {
    let quoted = ParseOptions {
        quoting: QuoteMode::Rfc4180,
        ..ParseOptions::default()
    };
    let table = parse_with("name,email\nO\"Brien,ob@x.io\n", &quoted).expect("lenient quoting");
    assert_eq!(table.rows()[0].get("name"), Some("O\"Brien"));
}

#[test]
fn quoted_empty_field_is_a_row_in_both_modes() {
    let text = "name\nAda\n\"\"\n   \nBob\n";
    let quoted = ParseOptions {
        quoting: QuoteMode::Rfc4180,
        ..ParseOptions::default()
    };
    let split = parse(text).unwrap();
    let rfc = parse_with(text, &quoted).unwrap();
    assert_eq!(split.row_count(), 3);
    assert_eq!(rfc.row_count(), 3);
    assert_eq!(split.rows()[1].get("name"), Some("\"\""));
    assert_eq!(rfc.rows()[1].get("name"), Some(""));
}
