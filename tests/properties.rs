use lurnip_import::{ImportKind, ParseError, parse, validate};
use proptest::prelude::*;

fn field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z][A-Za-z .'-]{0,12}",
        "[a-z]{1,6}@[a-z]{1,6}\\.[a-z]{2,3}",
        "[a-z@ .]{0,10}",
    ]
}

fn header() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Name".to_string()),
        Just("Full Name".to_string()),
        Just("Email".to_string()),
        Just("Email Address".to_string()),
        Just("Batch".to_string()),
        Just("class".to_string()),
        Just("Day of Week".to_string()),
        Just("Start Time".to_string()),
        Just("Course".to_string()),
        "[A-Za-z][A-Za-z0-9 ]{0,8}",
    ]
}

fn table_text() -> impl Strategy<Value = (usize, usize, String)> {
    prop::collection::vec(header(), 1..6).prop_flat_map(|headers| {
        let width = headers.len();
        prop::collection::vec(prop::collection::vec(field(), width), 0..12).prop_map(
            move |rows| {
                let mut text = headers.join(",");
                text.push('\n');
                for (idx, row) in rows.iter().enumerate() {
                    // blank lines in between must not count as rows
                    if idx % 3 == 1 {
                        text.push_str("\r\n");
                    }
                    text.push_str(&row.join(","));
                    text.push('\n');
                }
                let non_blank = rows
                    .iter()
                    .filter(|row| !row.join(",").trim().is_empty())
                    .count();
                (width, non_blank, text)
            },
        )
    })
}

proptest! {
    #[test]
    fn validation_is_deterministic((_, _, text) in table_text()) {
        let table = parse(&text).expect("generated tables are well formed");
        for kind in [ImportKind::Student, ImportKind::Teacher, ImportKind::Timetable] {
            prop_assert_eq!(validate(&table, kind), validate(&table, kind));
        }
    }

    #[test]
    fn parsed_rows_match_data_lines((width, non_blank, text) in table_text()) {
        // a single-column row of blanks is itself a blank line and is dropped
        let table = parse(&text).expect("generated tables are well formed");
        prop_assert_eq!(table.column_count(), width);
        prop_assert_eq!(table.row_count(), non_blank);
        prop_assert!(table.rows().iter().all(|row| row.len() == width));
    }

    #[test]
    fn one_ragged_row_rejects_everything(
        (width, _, text) in table_text(),
        extra in 1usize..3,
    ) {
        let ragged = vec!["x"; width + extra].join(",");
        let text = format!("{text}{ragged}\n");
        let is_shape_error = matches!(
            parse(&text),
            Err(ParseError::RowShapeMismatch { .. })
        );
        prop_assert!(is_shape_error);
    }
}
