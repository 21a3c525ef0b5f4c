use super::form::*;
use super::model::*;

fn bubble(id: i64, description: &str, due: DueBucket, is_complete: bool) -> Bubble {
    Bubble {
        id: BubbleId::new(id),
        description: description.to_string(),
        due,
        is_complete,
    }
}

#[test]
fn bucket_labels_round_trip_and_keep_choice_order() {
    let labels = DueBucket::ALL.map(DueBucket::label);
    assert_eq!(labels, ["Due today", "Due this week", "Due later(ish)"]);
    for bucket in DueBucket::ALL {
        assert_eq!(DueBucket::from_label(bucket.label()), Some(bucket));
    }
    assert_eq!(DueBucket::from_label("due today"), None);
    assert_eq!(DueBucket::from_label(" Due today"), None);
    assert_eq!(DueBucket::from_label("today"), None);
}

#[test]
fn bubble_id_parse_accepts_integer_like_values_only() {
    assert_eq!(BubbleId::parse("12"), Some(BubbleId::new(12)));
    assert_eq!(BubbleId::parse(" 7 "), Some(BubbleId::new(7)));
    assert_eq!(BubbleId::parse(""), None);
    assert_eq!(BubbleId::parse("abc"), None);
    assert_eq!(BubbleId::parse("1.5"), None);
}

#[test]
fn validate_trims_description_and_types_bucket() {
    let ok = validate("  Buy milk ", "Due today").expect("valid input");
    assert_eq!(
        ok,
        ValidatedBubble {
            description: "Buy milk".to_string(),
            due: DueBucket::Today,
        }
    );
}

#[test]
fn validate_rejects_blank_description() {
    for raw in ["", "   ", "\t\n"] {
        let err = validate(raw, "Due later(ish)").unwrap_err();
        assert_eq!(err.errors, vec![FormError::DescriptionRequired]);
        assert_eq!(err.errors[0].message(), "description required");
    }
}

#[test]
fn validate_rejects_unknown_bucket() {
    let err = validate("Write report", "Due tomorrow").unwrap_err();
    assert_eq!(err.errors, vec![FormError::InvalidBucket]);
    assert_eq!(err.errors[0].message(), "invalid bucket");
}

#[test]
fn validate_collects_errors_for_both_fields() {
    let err = validate(" ", "").unwrap_err();
    assert!(err.contains(FormError::DescriptionRequired));
    assert!(err.contains(FormError::InvalidBucket));
    assert_eq!(
        err.to_string(),
        "validation failed: description required; invalid bucket"
    );
}

#[test]
fn validate_enforces_description_length_in_chars() {
    let at_limit = "é".repeat(DESCRIPTION_MAX_CHARS);
    assert!(validate(&at_limit, "Due this week").is_ok());

    let too_long = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
    let err = validate(&too_long, "Due this week").unwrap_err();
    assert_eq!(err.errors, vec![FormError::DescriptionTooLong]);
}

#[test]
fn form_errors_split_by_field() {
    let form = BubbleForm::rejected(
        "",
        "nope",
        vec![
            FormError::DescriptionRequired,
            FormError::InvalidBucket,
            FormError::InvalidCsrfToken,
        ],
    );
    assert_eq!(
        form.field_errors(FIELD_DESCRIPTION),
        vec![FormError::DescriptionRequired]
    );
    assert_eq!(form.field_errors(FIELD_WHEN_DUE), vec![FormError::InvalidBucket]);
    assert_eq!(form.form_errors(), vec![FormError::InvalidCsrfToken]);

    let undecodable = BubbleForm::rejected("", "Due today", vec![FormError::DescriptionMalformed]);
    assert_eq!(
        undecodable.field_errors(FIELD_DESCRIPTION),
        vec![FormError::DescriptionMalformed]
    );
    assert_eq!(
        FormError::DescriptionMalformed.to_string(),
        "description could not be decoded"
    );

    let fresh = BubbleForm::fresh();
    assert!(fresh.errors.is_empty());
    assert_eq!(fresh.when_due, "Due today");
}

#[test]
fn partition_is_exhaustive_and_disjoint_over_active_bubbles() {
    let all = vec![
        bubble(1, "a", DueBucket::Today, false),
        bubble(2, "b", DueBucket::ThisWeek, false),
        bubble(3, "c", DueBucket::Later, false),
        bubble(4, "d", DueBucket::Today, true),
        bubble(5, "e", DueBucket::Later, false),
    ];
    let groups = ActiveGroups::partition(all.clone());

    assert_eq!(groups.len(), 4);
    for item in all.iter().filter(|b| b.is_active()) {
        let hits = DueBucket::ALL
            .iter()
            .filter(|due| groups.group(**due).contains(item))
            .count();
        assert_eq!(hits, 1, "bubble {} must land in exactly one group", item.id);
        assert!(groups.group(item.due).contains(item));
    }
    assert!(DueBucket::ALL
        .iter()
        .all(|due| groups.group(*due).iter().all(|b| !b.is_complete)));

    let done = completed(all);
    assert_eq!(done, vec![bubble(4, "d", DueBucket::Today, true)]);
}

#[test]
fn partition_of_nothing_is_empty() {
    let groups = ActiveGroups::partition(Vec::new());
    assert!(groups.is_empty());
    assert!(completed(Vec::new()).is_empty());
}
